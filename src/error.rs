use std::time::Duration;
use thiserror::Error;

/// Errors raised by the scrap engine
#[derive(Error, Debug)]
pub enum ScrapError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element not visible: {0}")]
    ElementNotVisible(String),

    #[error("Timed out after {timeout:?} waiting for {operation}")]
    Timeout { operation: String, timeout: Duration },

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Session is not open: {0}")]
    SessionNotOpen(String),

    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Missing required input variables: {}", .missing.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(", "))]
    MissingInput {
        /// Missing input names paired with their declared descriptions
        missing: Vec<(String, String)>,
    },

    #[error("Placeholders used but not declared in 'input': {}", .0.join(", "))]
    UndeclaredPlaceholder(Vec<String>),

    #[error("Invalid scrap script: {0}")]
    InvalidScript(String),

    #[error("Scrap script not found: {0}")]
    ScriptNotFound(String),

    #[error("Description failed: {0}")]
    DescriptionFailed(String),

    #[error("Proposer failed: {0}")]
    ProposerFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapError {
    /// Whether the error concerns the lifetime of the session itself rather than a single operation.
    ///
    /// These are the only errors the dispatcher lets escape instead of turning them into observations.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, ScrapError::SessionNotOpen(_) | ScrapError::LaunchFailed(_) | ScrapError::ConnectionFailed(_))
    }

    /// Lines describing missing inputs as `name: description`
    pub fn missing_input_report(&self) -> Option<String> {
        match self {
            ScrapError::MissingInput { missing } => Some(
                missing
                    .iter()
                    .map(|(name, description)| format!("- {}: {}", name, description))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ScrapError>;
