use crate::{browser::config::{ConnectionOptions, LaunchOptions},
            browser::driver::{DriverFactory, ElementScope, PageDriver},
            dom::ElementSnapshot,
            error::{Result, ScrapError}};
use async_trait::async_trait;
use headless_chrome::{protocol::cdp::Page, Browser, Tab};
use serde::Deserialize;
use std::{ffi::OsStr,
          path::{Path, PathBuf},
          sync::Arc,
          time::Duration};
use tokio::sync::Mutex;

const QUERY_ELEMENTS_JS: &str = include_str!("js/query_elements.js");
const READ_PROPERTY_JS: &str = include_str!("js/read_property.js");
const CLEAR_VALUE_JS: &str = include_str!("js/clear_value.js");
const PAGE_SIZE_JS: &str = include_str!("js/page_size.js");

/// How a [`ChromeDriver`] obtains its browser
#[derive(Debug, Clone)]
pub enum BrowserTarget {
    Launch(LaunchOptions),
    Connect(ConnectionOptions),
}

/// [`PageDriver`] backed by headless_chrome over the DevTools protocol.
///
/// headless_chrome is blocking, so every call runs on tokio's blocking pool.
pub struct ChromeDriver {
    target: BrowserTarget,
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    busy: Arc<Mutex<()>>,
}

impl ChromeDriver {
    pub fn new(target: BrowserTarget) -> Self {
        Self { target, browser: None, tab: None, busy: Arc::new(Mutex::new(())) }
    }

    pub fn launch(options: LaunchOptions) -> Self {
        Self::new(BrowserTarget::Launch(options))
    }

    pub fn connect(options: ConnectionOptions) -> Self {
        Self::new(BrowserTarget::Connect(options))
    }

    fn tab(&self) -> Result<Arc<Tab>> {
        self.tab.clone().ok_or_else(|| ScrapError::SessionNotOpen("Chrome tab is not open".to_string()))
    }

    fn start_browser(target: &BrowserTarget) -> Result<Browser> {
        match target {
            BrowserTarget::Launch(options) => {
                let mut launch_opts = headless_chrome::LaunchOptions::default();

                // Ignore default arguments to prevent detection by anti-bot services
                launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
                launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

                launch_opts.idle_browser_timeout = options.idle_timeout;
                launch_opts.headless = options.headless;
                launch_opts.window_size = Some((options.window_width, options.window_height));
                launch_opts.sandbox = options.sandbox;

                if let Some(path) = &options.chrome_path {
                    launch_opts.path = Some(path.clone());
                }

                if let Some(dir) = &options.user_data_dir {
                    launch_opts.user_data_dir = Some(dir.clone());
                }

                Browser::new(launch_opts).map_err(|e| ScrapError::LaunchFailed(e.to_string()))
            }
            BrowserTarget::Connect(options) => {
                Browser::connect_with_timeout(options.ws_url.clone(), Duration::from_millis(options.timeout))
                    .map_err(|e| ScrapError::ConnectionFailed(e.to_string()))
            }
        }
    }

    fn evaluate_string(tab: &Tab, expression: &str) -> Result<Option<String>> {
        let result = tab.evaluate(expression, false).map_err(|e| ScrapError::EvaluationFailed(e.to_string()))?;
        Ok(match result.value {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        })
    }
}

/// Run a blocking headless_chrome call off the async executor.
///
/// The blocking task owns the `busy` guard, so a caller that stops waiting (a
/// session timeout) does not let the next call reach the tab before this one ends.
async fn blocking<T, F>(busy: &Arc<Mutex<()>>, operation: &'static str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let guard = busy.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        f()
    })
    .await
        .map_err(|e| ScrapError::TabOperationFailed(format!("{} task failed: {}", operation, e)))?
}

#[derive(Deserialize)]
struct PageSize {
    width: f64,
    height: f64,
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn open(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let target = self.target.clone();
        let url = url.to_string();

        let (browser, tab) = blocking(&self.busy, "open", move || {
            let browser = Self::start_browser(&target)?;
            let tab =
                browser.new_tab().map_err(|e| ScrapError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)
                .map_err(|e| ScrapError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
            tab.wait_until_navigated()
                .map_err(|e| ScrapError::NavigationFailed(format!("Navigation to {} did not complete: {}", url, e)))?;
            Ok((browser, tab))
        })
        .await?;

        self.browser = Some(browser);
        self.tab = Some(tab);
        Ok(())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let tab = self.tab()?;
        let url = url.to_string();
        blocking(&self.busy, "navigate", move || {
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)
                .map_err(|e| ScrapError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
            tab.wait_until_navigated()
                .map_err(|e| ScrapError::NavigationFailed(format!("Navigation to {} did not complete: {}", url, e)))?;
            Ok(())
        })
        .await
    }

    async fn wait_for_load(&self, timeout: Duration) -> Result<()> {
        let tab = self.tab()?;
        blocking(&self.busy, "wait_for_load", move || {
            tab.set_default_timeout(timeout);
            tab.wait_until_navigated().map_err(|e| ScrapError::NavigationFailed(format!("Page load timeout: {}", e)))?;
            Ok(())
        })
        .await
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.tab()?.get_url())
    }

    async fn title(&self) -> Result<String> {
        let tab = self.tab()?;
        blocking(&self.busy, "title", move || tab.get_title().map_err(|e| ScrapError::TabOperationFailed(e.to_string()))).await
    }

    async fn query_all(&self, selector: &str, limit: usize) -> Result<Vec<ElementSnapshot>> {
        let tab = self.tab()?;
        let expression = format!("{}({}, {})", QUERY_ELEMENTS_JS.trim(), serde_json::to_string(selector)?, limit);

        let json = blocking(&self.busy, "query_all", move || Self::evaluate_string(&tab, &expression)).await?;
        let json = json.ok_or_else(|| ScrapError::EvaluationFailed("No value returned from element query".to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let tab = self.tab()?;
        let selector = selector.to_string();
        blocking(&self.busy, "wait_for", move || {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)
                .map(|_| ())
                .map_err(|e| ScrapError::ElementNotFound(format!("Element '{}' not found: {}", selector, e)))
        })
        .await
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<()> {
        let tab = self.tab()?;
        let selector = selector.to_string();
        blocking(&self.busy, "click", move || {
            let element = tab
                .wait_for_element_with_custom_timeout(&selector, timeout)
                .map_err(|e| ScrapError::ElementNotFound(format!("Element '{}' not found: {}", selector, e)))?;
            element
                .click()
                .map_err(|e| ScrapError::ElementNotVisible(format!("Failed to click '{}': {}", selector, e)))?;
            Ok(())
        })
        .await
    }

    async fn type_text(&self, selector: &str, text: &str, clear: bool, timeout: Duration) -> Result<()> {
        let tab = self.tab()?;
        let selector = selector.to_string();
        let text = text.to_string();
        blocking(&self.busy, "type_text", move || {
            let element = tab
                .wait_for_element_with_custom_timeout(&selector, timeout)
                .map_err(|e| ScrapError::ElementNotFound(format!("Element '{}' not found: {}", selector, e)))?;

            if clear {
                let expression = format!("{}({})", CLEAR_VALUE_JS.trim(), serde_json::to_string(&selector)?);
                tab.evaluate(&expression, false).map_err(|e| ScrapError::EvaluationFailed(e.to_string()))?;
            }

            element
                .type_into(&text)
                .map_err(|e| ScrapError::ElementNotVisible(format!("Failed to type into '{}': {}", selector, e)))?;
            Ok(())
        })
        .await
    }

    async fn read_property(&self, scope: &ElementScope, selector: &str, property: &str) -> Result<Option<String>> {
        let tab = self.tab()?;
        let (scope_selector, index) = match scope {
            ElementScope::Page => (serde_json::Value::Null, 0),
            ElementScope::Nth { selector, index } => (serde_json::Value::String(selector.clone()), *index),
        };
        let expression = format!(
            "{}({}, {}, {}, {})",
            READ_PROPERTY_JS.trim(),
            scope_selector,
            index,
            serde_json::to_string(selector)?,
            serde_json::to_string(property)?
        );

        blocking(&self.busy, "read_property", move || Self::evaluate_string(&tab, &expression)).await
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let tab = self.tab()?;
        let path: PathBuf = path.to_path_buf();
        let size_expression = format!("{}()", PAGE_SIZE_JS.trim());

        blocking(&self.busy, "screenshot", move || {
            let clip = match Self::evaluate_string(&tab, &size_expression)? {
                Some(json) => {
                    let size: PageSize = serde_json::from_str(&json)?;
                    Some(Page::Viewport { x: 0.0, y: 0.0, width: size.width, height: size.height, scale: 1.0 })
                }
                None => None,
            };

            let png = tab
                .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, clip, true)
                .map_err(|e| ScrapError::ScreenshotFailed(e.to_string()))?;
            std::fs::write(&path, png)?;
            Ok(())
        })
        .await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(tab) = self.tab.take() {
            let closed = blocking(&self.busy, "close", move || {
                tab.close(false).map(|_| ()).map_err(|e| ScrapError::TabOperationFailed(e.to_string()))
            })
            .await;
            if let Err(e) = closed {
                log::debug!("Failed to close tab: {}", e);
            }
        }
        // Dropping the Browser terminates the launched process
        self.browser = None;
        Ok(())
    }
}

/// Hands out a fresh [`ChromeDriver`] per run
#[derive(Debug, Clone)]
pub struct ChromeDriverFactory {
    target: BrowserTarget,
}

impl ChromeDriverFactory {
    pub fn new(target: BrowserTarget) -> Self {
        Self { target }
    }

    pub fn launch(options: LaunchOptions) -> Self {
        Self::new(BrowserTarget::Launch(options))
    }
}

impl DriverFactory for ChromeDriverFactory {
    fn create(&self) -> Result<Box<dyn PageDriver>> {
        Ok(Box::new(ChromeDriver::new(self.target.clone())))
    }
}
