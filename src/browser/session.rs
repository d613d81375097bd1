use crate::{browser::config::SessionConfig,
            browser::driver::{ElementScope, PageDriver},
            dom::ElementSnapshot,
            error::{Result, ScrapError}};
use std::{future::Future, path::Path, time::Duration};
use tokio::sync::{Mutex, MutexGuard};

/// Lifecycle of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Open,
    Closed,
}

struct SessionInner {
    driver: Box<dyn PageDriver>,
    state: SessionState,
}

/// One live browser page under the engine's control.
///
/// Every operation goes through a single mutex, so two operations never run
/// against the same page at once, and every wait is bounded by [`SessionConfig`].
pub struct Session {
    inner: Mutex<SessionInner>,
    config: SessionConfig,
}

impl Session {
    pub fn new(driver: Box<dyn PageDriver>, config: SessionConfig) -> Self {
        Self { inner: Mutex::new(SessionInner { driver, state: SessionState::Uninitialized }), config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Open the page at `url`. A session can be opened once.
    pub async fn open(&self, url: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            SessionState::Uninitialized => {}
            SessionState::Open => return Err(ScrapError::TabOperationFailed("Session is already open".to_string())),
            SessionState::Closed => return Err(ScrapError::SessionNotOpen("Session was already closed".to_string())),
        }

        log::info!("Opening session at {}", url);
        let timeout = self.config.navigation_timeout;
        let opened = bounded("open page", timeout, inner.driver.open(url, timeout)).await;

        match opened {
            Ok(()) => {
                inner.state = SessionState::Open;
                Ok(())
            }
            Err(e) => {
                // A half-launched browser still has to be released
                inner.state = SessionState::Closed;
                if let Err(close_err) = inner.driver.close().await {
                    log::debug!("Failed to release driver after open failure: {}", close_err);
                }
                Err(e)
            }
        }
    }

    /// Close the session. Only the first call reaches the driver; later calls are no-ops.
    pub async fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let previous = std::mem::replace(&mut inner.state, SessionState::Closed);
        match previous {
            SessionState::Closed => Ok(()),
            SessionState::Uninitialized => {
                // An interrupted open may have left a browser behind
                log::debug!("Closing a session that was never opened");
                inner.driver.close().await
            }
            SessionState::Open => {
                log::info!("Closing session");
                inner.driver.close().await
            }
        }
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, SessionInner>> {
        let inner = self.inner.lock().await;
        match inner.state {
            SessionState::Open => Ok(inner),
            SessionState::Uninitialized => Err(ScrapError::SessionNotOpen("Session was never initialized".to_string())),
            SessionState::Closed => Err(ScrapError::SessionNotOpen("Session is closed".to_string())),
        }
    }

    pub async fn current_url(&self) -> Result<String> {
        let inner = self.acquire().await?;
        bounded("read URL", self.config.element_timeout, inner.driver.current_url()).await
    }

    pub async fn title(&self) -> Result<String> {
        let inner = self.acquire().await?;
        bounded("read title", self.config.element_timeout, inner.driver.title()).await
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        let inner = self.acquire().await?;
        let timeout = self.config.navigation_timeout;
        bounded(&format!("navigation to {}", url), timeout, inner.driver.navigate(url, timeout)).await
    }

    pub async fn wait_for_load(&self) -> Result<()> {
        let inner = self.acquire().await?;
        let timeout = self.config.navigation_timeout;
        bounded("page load", timeout, inner.driver.wait_for_load(timeout)).await
    }

    pub async fn query_all(&self, selector: &str, limit: usize) -> Result<Vec<ElementSnapshot>> {
        let inner = self.acquire().await?;
        bounded(&format!("query '{}'", selector), self.config.element_timeout, inner.driver.query_all(selector, limit))
            .await
    }

    /// Wait for `selector` to appear
    pub async fn wait_for(&self, selector: &str) -> Result<()> {
        let inner = self.acquire().await?;
        let timeout = self.config.element_timeout;
        bounded(&format!("selector '{}'", selector), timeout, inner.driver.wait_for(selector, timeout)).await
    }

    /// Resolve the first element matching `selector`, waiting for it up to the element timeout.
    ///
    /// Returns `None` when it never shows up.
    pub async fn find(&self, selector: &str) -> Result<Option<ElementSnapshot>> {
        match self.wait_for(selector).await {
            Ok(()) => {}
            Err(ScrapError::ElementNotFound(_)) | Err(ScrapError::Timeout { .. }) => return Ok(None),
            Err(e) => return Err(e),
        }
        Ok(self.query_all(selector, 1).await?.into_iter().next())
    }

    pub async fn click(&self, selector: &str) -> Result<()> {
        let inner = self.acquire().await?;
        let timeout = self.config.element_timeout;
        bounded(&format!("click on '{}'", selector), timeout, inner.driver.click(selector, timeout)).await
    }

    /// Type into an element; `clear` replaces the current value instead of appending
    pub async fn type_text(&self, selector: &str, text: &str, clear: bool) -> Result<()> {
        let inner = self.acquire().await?;
        let timeout = self.config.element_timeout;
        bounded(&format!("typing into '{}'", selector), timeout, inner.driver.type_text(selector, text, clear, timeout))
            .await
    }

    pub async fn read_property(&self, scope: &ElementScope, selector: &str, property: &str) -> Result<Option<String>> {
        let inner = self.acquire().await?;
        bounded(
            &format!("property '{}' of '{}'", property, selector),
            self.config.element_timeout,
            inner.driver.read_property(scope, selector, property),
        )
        .await
    }

    pub async fn screenshot(&self, path: &Path) -> Result<()> {
        let inner = self.acquire().await?;
        bounded("screenshot", self.config.navigation_timeout, inner.driver.screenshot(path)).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.try_lock() {
            if inner.state == SessionState::Open {
                log::warn!("Session dropped while open; releasing the driver without a clean close");
            }
        }
    }
}

/// Await `future`, turning an elapsed `timeout` into [`ScrapError::Timeout`]
pub(crate) async fn bounded<T>(operation: &str, timeout: Duration, future: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ScrapError::Timeout { operation: operation.to_string(), timeout }),
    }
}
