#![allow(dead_code)]

use async_trait::async_trait;
use scrap_engine::{agent::{ActionProposer, ProposalRequest},
                   browser::{DriverFactory, ElementScope, PageDriver, Session, SessionConfig},
                   dom::ElementSnapshot,
                   error::{Result, ScrapError},
                   vision::PageDescriber};
use std::{collections::{HashMap, HashSet, VecDeque},
          path::Path,
          sync::{Arc, Mutex},
          time::Duration};
use tokio_util::sync::CancellationToken;

/// In-memory page shared between a test and the drivers it hands out
#[derive(Default)]
pub struct FakePage {
    pub url: String,
    pub title: String,
    /// Elements per exact selector string, in document order
    pub elements: HashMap<String, Vec<ElementSnapshot>>,
    /// Property values keyed by (scope, selector, property); scope is "page" or "<selector>#<index>"
    pub properties: HashMap<(String, String, String), String>,
    /// Selectors whose waits never finish
    pub hanging: HashSet<String>,
    pub fail_open: bool,
    /// Every driver call, in order
    pub ops: Vec<String>,
    pub created: usize,
    pub closed: usize,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string(), title: "Fake page".to_string(), ..Default::default() }
    }

    pub fn element(mut self, selector: &str, snapshot: ElementSnapshot) -> Self {
        self.elements.entry(selector.to_string()).or_default().push(snapshot);
        self
    }

    pub fn property(mut self, scope: &str, selector: &str, property: &str, value: &str) -> Self {
        self.properties.insert((scope.to_string(), selector.to_string(), property.to_string()), value.to_string());
        self
    }

    pub fn hanging(mut self, selector: &str) -> Self {
        self.hanging.insert(selector.to_string());
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn shared(self) -> Arc<Mutex<FakePage>> {
        Arc::new(Mutex::new(self))
    }
}

/// Visible element with optional class and text
pub fn visible(tag: &str, class: &str, text: &str) -> ElementSnapshot {
    let mut snapshot = ElementSnapshot::new(tag).with_visibility(true);
    if !class.is_empty() {
        snapshot = snapshot.with_attribute("class", class);
    }
    if !text.is_empty() {
        snapshot = snapshot.with_text(text);
    }
    snapshot
}

pub struct FakeDriver {
    page: Arc<Mutex<FakePage>>,
}

impl FakeDriver {
    pub fn new(page: Arc<Mutex<FakePage>>) -> Self {
        Self { page }
    }

    fn record(&self, op: String) {
        self.page.lock().unwrap().ops.push(op);
    }

    fn exists(&self, selector: &str) -> bool {
        self.page.lock().unwrap().elements.get(selector).is_some_and(|e| !e.is_empty())
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn open(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("open {}", url));
        let mut page = self.page.lock().unwrap();
        if page.fail_open {
            return Err(ScrapError::LaunchFailed("no browser here".to_string()));
        }
        page.url = url.to_string();
        Ok(())
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("navigate {}", url));
        if url.contains("unreachable") {
            return Err(ScrapError::NavigationFailed(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)));
        }
        self.page.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn wait_for_load(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.lock().unwrap().url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.page.lock().unwrap().title.clone())
    }

    async fn query_all(&self, selector: &str, limit: usize) -> Result<Vec<ElementSnapshot>> {
        self.record(format!("query {}", selector));
        let page = self.page.lock().unwrap();
        Ok(page.elements.get(selector).map(|e| e.iter().take(limit).cloned().collect()).unwrap_or_default())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<()> {
        let hanging = self.page.lock().unwrap().hanging.contains(selector);
        if hanging {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.exists(selector) { Ok(()) } else { Err(ScrapError::ElementNotFound(selector.to_string())) }
    }

    async fn click(&self, selector: &str, _timeout: Duration) -> Result<()> {
        if !self.exists(selector) {
            return Err(ScrapError::ElementNotFound(selector.to_string()));
        }
        self.record(format!("click {}", selector));
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str, clear: bool, _timeout: Duration) -> Result<()> {
        if !self.exists(selector) {
            return Err(ScrapError::ElementNotFound(selector.to_string()));
        }
        let mode = if clear { "fill" } else { "type" };
        self.record(format!("{} {} {}", mode, selector, text));
        Ok(())
    }

    async fn read_property(&self, scope: &ElementScope, selector: &str, property: &str) -> Result<Option<String>> {
        let scope = match scope {
            ElementScope::Page => "page".to_string(),
            ElementScope::Nth { selector, index } => format!("{}#{}", selector, index),
        };
        let page = self.page.lock().unwrap();
        Ok(page.properties.get(&(scope, selector.to_string(), property.to_string())).cloned())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record("screenshot".to_string());
        std::fs::write(path, b"\x89PNG fake")?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.record("close".to_string());
        self.page.lock().unwrap().closed += 1;
        Ok(())
    }
}

pub struct FakeFactory {
    pub page: Arc<Mutex<FakePage>>,
}

impl FakeFactory {
    pub fn new(page: Arc<Mutex<FakePage>>) -> Self {
        Self { page }
    }
}

impl DriverFactory for FakeFactory {
    fn create(&self) -> Result<Box<dyn PageDriver>> {
        self.page.lock().unwrap().created += 1;
        Ok(Box::new(FakeDriver::new(self.page.clone())))
    }
}

/// Short bounds so timeout paths finish quickly
pub fn quick_config() -> SessionConfig {
    SessionConfig::new().element_timeout(Duration::from_millis(100)).navigation_timeout(Duration::from_millis(200))
}

/// An already opened session over `page`
pub async fn open_session(page: &Arc<Mutex<FakePage>>) -> Arc<Session> {
    let url = page.lock().unwrap().url.clone();
    let session = Arc::new(Session::new(Box::new(FakeDriver::new(page.clone())), quick_config()));
    session.open(&url).await.unwrap();
    session
}

pub fn ops(page: &Arc<Mutex<FakePage>>) -> Vec<String> {
    page.lock().unwrap().ops.clone()
}

/// Hands out canned proposals in order and remembers every request
pub struct ScriptedProposer {
    responses: Mutex<VecDeque<String>>,
    pub requests: Mutex<Vec<ProposalRequest>>,
    /// Cancel this token and stall once the given turn is reached
    stall: Option<(usize, CancellationToken)>,
}

impl ScriptedProposer {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
            stall: None,
        }
    }

    pub fn stalling_at(mut self, turn: usize, cancel: CancellationToken) -> Self {
        self.stall = Some((turn, cancel));
        self
    }

    pub fn requests(&self) -> Vec<ProposalRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionProposer for ScriptedProposer {
    async fn propose(&self, request: ProposalRequest) -> Result<String> {
        let turn = request.turn;
        self.requests.lock().unwrap().push(request);

        if let Some((stall_turn, cancel)) = &self.stall {
            if turn >= *stall_turn {
                cancel.cancel();
                std::future::pending::<()>().await;
            }
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ScrapError::ProposerFailed("out of proposals".to_string()))
    }
}

/// Describes every screenshot with the same sentence and remembers the paths it saw
#[derive(Default)]
pub struct FixedDescriber {
    pub seen: Mutex<Vec<std::path::PathBuf>>,
}

#[async_trait]
impl PageDescriber for FixedDescriber {
    async fn describe(&self, screenshot: &Path) -> Result<String> {
        assert!(screenshot.exists(), "screenshot must exist while it is described");
        self.seen.lock().unwrap().push(screenshot.to_path_buf());
        Ok("A catalogue page listing twenty books.".to_string())
    }
}
