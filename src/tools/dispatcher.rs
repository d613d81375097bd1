use crate::{browser::Session,
            error::{Result, ScrapError},
            tools::{extract::ExtractElementsTool,
                    grammar::parse_action,
                    interact::InteractTool,
                    navigate::NavigateTool,
                    print::PrintPageTool,
                    summary::PageSummaryTool,
                    Action,
                    ActionKind,
                    DispatchConfig,
                    Observation,
                    Tool,
                    ToolContext},
            vision::PageDescriber};
use std::sync::Arc;

/// Observation returned for the terminal verb
pub const END_NAVIGATION: &str = "Ending the navigation.";

/// Runs actions against one session.
///
/// Element-level and timeout failures never escape: they come back as failed
/// observations the proposer can read. Only lifecycle errors are returned as `Err`.
pub struct Scrapper {
    session: Arc<Session>,
    config: DispatchConfig,
    describer: Option<Arc<dyn PageDescriber>>,
}

impl Scrapper {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session, config: DispatchConfig::default(), describer: None }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_describer(mut self, describer: Arc<dyn PageDescriber>) -> Self {
        self.describer = Some(describer);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Parse and run one action expression. Grammar problems become failed observations.
    pub async fn run_expression(&self, expression: &str) -> Result<Observation> {
        match parse_action(expression) {
            Ok(action) => self.execute(action).await,
            Err(e) => Ok(Self::rejection(&e)),
        }
    }

    /// Observation for an expression that could not be turned into an action
    pub fn rejection(error: &ScrapError) -> Observation {
        match error {
            ScrapError::UnknownAction(name) => {
                let available: Vec<String> = ActionKind::ALL.iter().map(|k| k.signature()).collect();
                Observation::failure(format!(
                    "Action '{}' not found. Available actions: {}",
                    name,
                    available.join(", ")
                ))
            }
            other => Observation::failure(format!("Error: {}", other)),
        }
    }

    pub async fn execute(&self, action: Action) -> Result<Observation> {
        let kind = action.kind();
        log::debug!("Dispatching {}", kind);

        let context =
            ToolContext::new(&self.session, &self.config).with_describer(self.describer.as_deref());

        let result = match action {
            Action::ExtractElements(params) => ExtractElementsTool.execute_typed(params, &context).await,
            Action::InteractWithElement(params) => InteractTool.execute_typed(params, &context).await,
            Action::PrintPage => PrintPageTool.execute_typed((), &context).await,
            Action::PageSummary => PageSummaryTool.execute_typed((), &context).await,
            Action::Navigate(params) => NavigateTool.execute_typed(params, &context).await,
            Action::EndNavigation { .. } => Ok(Observation::success(END_NAVIGATION)),
        };

        match result {
            Ok(observation) => Ok(observation),
            Err(e) if e.is_lifecycle() => Err(e),
            Err(e) => {
                log::warn!("{} failed: {}", kind, e);
                Ok(Observation::failure(format!("Error: {} failed: {}", kind, e)))
            }
        }
    }
}
