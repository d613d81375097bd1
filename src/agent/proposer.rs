use crate::{error::Result, tools::Observation};
use async_trait::async_trait;

/// Everything the proposer sees before choosing the next action
#[derive(Debug, Clone)]
pub struct ProposalRequest {
    /// The navigation goal as given by the caller
    pub query: String,

    /// Result of the previous action, or the initial page summary
    pub observation: Observation,

    /// Set after a malformed proposal, telling the proposer what to fix
    pub correction: Option<String>,

    /// 1-based turn number
    pub turn: usize,
}

/// Supplies one proposal per turn: free-form reasoning, the delimiter, then one action line.
#[async_trait]
pub trait ActionProposer: Send + Sync {
    async fn propose(&self, request: ProposalRequest) -> Result<String>;
}
