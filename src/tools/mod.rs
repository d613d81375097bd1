//! The fixed action vocabulary and its dispatcher
//!
//! Each verb lives in its own module as a [`Tool`]; the [`Scrapper`] maps an
//! [`Action`] to its tool and turns every non-lifecycle failure into an
//! [`Observation`].

pub mod action;
pub mod dispatcher;
pub mod extract;
pub mod grammar;
pub mod interact;
pub mod navigate;
pub mod print;
pub mod summary;
pub mod utils;

pub use action::{Action, ActionKind, ExtractElementsParams, InteractParams, Interaction, NavigateParams};
pub use dispatcher::Scrapper;
pub use grammar::parse_action;

use crate::{browser::Session, error::Result, vision::PageDescriber};
use async_trait::async_trait;
use std::{fmt, path::PathBuf};

/// Result of one action, always carrying readable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Whether the action did what was asked
    pub success: bool,

    pub text: String,
}

impl Observation {
    pub fn success(text: impl Into<String>) -> Self {
        Self { success: true, text: non_empty(text.into()) }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self { success: false, text: non_empty(text.into()) }
    }

    /// Append a note for the proposer after a blank line
    pub fn annotate(&mut self, note: &str) {
        self.text.push_str("\n\n");
        self.text.push_str(note);
    }
}

fn non_empty(text: String) -> String {
    if text.trim().is_empty() { "(empty result)".to_string() } else { text }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Knobs shared by every tool
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Characters of element text kept when truncating
    pub text_budget: usize,

    /// Elements read per tag group by `page_summary`
    pub summary_limit: usize,

    /// Where `print_page` writes screenshots
    pub screenshot_dir: PathBuf,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { text_budget: 50, summary_limit: 50, screenshot_dir: std::env::temp_dir() }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_budget(mut self, budget: usize) -> Self {
        self.text_budget = budget;
        self
    }

    pub fn summary_limit(mut self, limit: usize) -> Self {
        self.summary_limit = limit;
        self
    }

    pub fn screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }
}

/// What a tool may touch while it runs
pub struct ToolContext<'a> {
    pub session: &'a Session,
    pub config: &'a DispatchConfig,
    pub describer: Option<&'a dyn PageDescriber>,
}

impl<'a> ToolContext<'a> {
    pub fn new(session: &'a Session, config: &'a DispatchConfig) -> Self {
        Self { session, config, describer: None }
    }

    pub fn with_describer(mut self, describer: Option<&'a dyn PageDescriber>) -> Self {
        self.describer = describer;
        self
    }
}

/// One verb of the action vocabulary
#[async_trait]
pub trait Tool: Send + Sync {
    type Params: Send + 'static;

    fn name(&self) -> &str;

    /// Run against the session. Element-level problems come back as failed observations;
    /// an `Err` is left for the dispatcher to classify.
    async fn execute_typed(&self, params: Self::Params, context: &ToolContext<'_>) -> Result<Observation>;
}
