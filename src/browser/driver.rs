use crate::{dom::ElementSnapshot, error::Result};
use async_trait::async_trait;
use std::{path::Path, time::Duration};

/// Where a property lookup starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementScope {
    /// The whole document
    Page,
    /// The `index`-th (0-based) match of `selector` in the document
    Nth { selector: String, index: usize },
}

/// The browser primitives the engine needs from a page.
///
/// Anything able to open a URL, find elements by CSS selector, read them,
/// click, type, screenshot and close satisfies this contract.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Open the page at `url` and wait for it to load
    async fn open(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Load a new URL in the same page and wait for it to load
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait until a pending navigation settles
    async fn wait_for_load(&self, timeout: Duration) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// Snapshot up to `limit` elements matching `selector`, in document order
    async fn query_all(&self, selector: &str, limit: usize) -> Result<Vec<ElementSnapshot>>;

    /// Wait until at least one element matches `selector`
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn click(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Type `text` into the first match of `selector`, replacing its value when `clear` is set
    async fn type_text(&self, selector: &str, text: &str, clear: bool, timeout: Duration) -> Result<()>;

    /// Read a DOM property of the first match of `selector` inside `scope`.
    ///
    /// Returns `None` when no element matches.
    async fn read_property(&self, scope: &ElementScope, selector: &str, property: &str) -> Result<Option<String>>;

    /// Capture the full page as PNG into `path`
    async fn screenshot(&self, path: &Path) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Creates a fresh, unopened driver for each run
pub trait DriverFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn PageDriver>>;
}
