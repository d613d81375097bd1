use crate::{agent::site_label,
            browser::{DriverFactory, ElementScope, Session, SessionConfig},
            dom::collapse_whitespace,
            error::{Result, ScrapError},
            script::{ExtractStep, ForEachStep, Script, Step},
            tools::utils::normalize_url};
use std::{collections::HashMap, fmt, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Line emitted when an `extract` selector matches nothing
pub const ELEMENT_NOT_FOUND: &str = "Element not found";

/// A step that stopped the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// 0-based position in the script
    pub index: usize,
    pub action: &'static str,
    pub message: String,
}

/// Text produced by a script run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// One block per step that produced text, in step order
    pub blocks: Vec<String>,

    /// Set when a step failed and the remaining steps were skipped
    pub failure: Option<StepFailure>,

    pub cancelled: bool,
}

impl ScriptOutput {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && !self.cancelled
    }

    /// Blocks joined by a blank line
    pub fn text(&self) -> String {
        self.blocks.join("\n\n")
    }
}

impl fmt::Display for ScriptOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Replays scripts, one fresh session per run
pub struct ScriptRunner {
    factory: Arc<dyn DriverFactory>,
    session_config: SessionConfig,
    cancel: CancellationToken,
}

impl ScriptRunner {
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self { factory, session_config: SessionConfig::default(), cancel: CancellationToken::new() }
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolve `script` against `values` and run it.
    ///
    /// Validation problems are returned before any browser is created. Once the
    /// session is open, a failing step stops the run but the output gathered so
    /// far is still returned.
    pub async fn run(&self, script: &Script, values: &HashMap<String, String>) -> Result<ScriptOutput> {
        let script = script.resolve(values).inspect_err(|e| {
            if let Some(report) = e.missing_input_report() {
                log::error!("{}\nRequired inputs:\n{}", e, report);
            }
        })?;

        let label = site_label(&script.site);
        let session = Session::new(self.factory.create()?, self.session_config.clone());

        let site_url = normalize_url(&script.site);
        log::debug!("[{}] accessing '{}'", label, site_url);
        let output = tokio::select! {
            _ = self.cancel.cancelled() => Ok(ScriptOutput { cancelled: true, ..ScriptOutput::default() }),
            opened = session.open(&site_url) => match opened {
                Ok(()) => self.run_steps(&label, &session, &script.steps).await,
                Err(e) => Err(e),
            },
        };

        if let Err(e) = session.close().await {
            log::warn!("[{}] failed to close session: {}", label, e);
        }
        output
    }

    async fn run_steps(&self, label: &str, session: &Session, steps: &[Step]) -> Result<ScriptOutput> {
        let mut output = ScriptOutput::default();

        for (index, step) in steps.iter().enumerate() {
            if self.cancel.is_cancelled() {
                output.cancelled = true;
                break;
            }
            log::debug!("[{}] running '{}'", label, step.name());

            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    output.cancelled = true;
                    break;
                }
                result = run_step(session, step) => result,
            };

            match result {
                Ok(Some(text)) => output.blocks.push(text),
                Ok(None) => {}
                Err(e) if e.is_lifecycle() => return Err(e),
                Err(e) => {
                    log::error!("[{}] error running '{}': {}", label, step.name(), e);
                    output.failure = Some(StepFailure { index, action: step.name(), message: e.to_string() });
                    break;
                }
            }
        }

        if output.cancelled {
            log::info!("[{}] cancelled", label);
        }
        log::debug!("[{}] steps finished", label);
        Ok(output)
    }
}

async fn run_step(session: &Session, step: &Step) -> Result<Option<String>> {
    match step {
        Step::Navigate { url } => {
            session.navigate(&normalize_url(url)).await?;
            session.wait_for_load().await?;
            Ok(None)
        }
        Step::Fill { selector, text } => {
            if session.find(selector).await?.is_none() {
                return Err(ScrapError::ElementNotFound(selector.clone()));
            }
            session.type_text(selector, text, true).await?;
            Ok(None)
        }
        Step::Click { selector } => {
            session.wait_for(selector).await?;
            session.click(selector).await?;
            session.wait_for_load().await?;
            Ok(None)
        }
        Step::Extract(extract) => Ok(Some(extract_block(session, &ElementScope::Page, extract).await?)),
        Step::ForEach(for_each) => Ok(Some(for_each_blocks(session, for_each).await?)),
    }
}

/// `LABEL: value` lines for one extract step
async fn extract_block(session: &Session, scope: &ElementScope, step: &ExtractStep) -> Result<String> {
    let mut lines = Vec::with_capacity(step.properties.len());
    for (property, label) in &step.properties {
        match session.read_property(scope, &step.selector, property).await? {
            Some(value) => lines.push(format!("{}: {}", label.to_uppercase(), collapse_whitespace(&value))),
            None => return Ok(ELEMENT_NOT_FOUND.to_string()),
        }
    }
    Ok(lines.join("\n"))
}

async fn for_each_blocks(session: &Session, step: &ForEachStep) -> Result<String> {
    session.wait_for(&step.selector).await?;
    let count = session.query_all(&step.selector, step.limit).await?.len();
    let header = step.label.to_uppercase();

    let mut blocks = Vec::with_capacity(count);
    for index in 0..count {
        let scope = ElementScope::Nth { selector: step.selector.clone(), index };
        let mut block = vec![format!("{} #{}", header, index + 1)];
        for extract in &step.steps {
            block.push(extract_block(session, &scope, extract).await?);
        }
        blocks.push(block.join("\n"));
    }
    Ok(blocks.join("\n"))
}
