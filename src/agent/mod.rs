//! Proposer-driven navigation
//!
//! An external [`ActionProposer`] picks one action per turn. The [`ActionLoop`]
//! validates each proposal, runs it through the [`Scrapper`](crate::tools::Scrapper)
//! and feeds the observation back until a terminal action carries the final answer.

pub mod proposal;
pub mod proposer;
pub mod record;
pub mod runner;

pub use proposal::{split_proposal, Proposal, Rejection};
pub use proposer::{ActionProposer, ProposalRequest};
pub use record::{RunRecord, Turn, TurnKind};
pub use runner::{ActionLoop, LoopConfig, LoopReport, RunOutcome, DEFAULT_DELIMITER};

use crate::{browser::{DriverFactory, Session, SessionConfig},
            tools::{utils::normalize_url, DispatchConfig, Scrapper},
            vision::PageDescriber};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Host of `url`, used to label logs and to key stored scripts
pub fn site_label(url: &str) -> String {
    url::Url::parse(&normalize_url(url))
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.trim().to_string())
}

/// Opens a session, drives the action loop on it and always closes it again
pub struct ScrapingAgent {
    factory: Arc<dyn DriverFactory>,
    proposer: Arc<dyn ActionProposer>,
    describer: Option<Arc<dyn PageDescriber>>,
    session_config: SessionConfig,
    dispatch_config: DispatchConfig,
    loop_config: LoopConfig,
    cancel: CancellationToken,
}

impl ScrapingAgent {
    pub fn new(factory: Arc<dyn DriverFactory>, proposer: Arc<dyn ActionProposer>) -> Self {
        Self {
            factory,
            proposer,
            describer: None,
            session_config: SessionConfig::default(),
            dispatch_config: DispatchConfig::default(),
            loop_config: LoopConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_describer(mut self, describer: Arc<dyn PageDescriber>) -> Self {
        self.describer = Some(describer);
        self
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn with_dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatch_config = config;
        self
    }

    pub fn with_loop_config(mut self, config: LoopConfig) -> Self {
        self.loop_config = config;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run at its next transition
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Answer `query` starting from `url`
    pub async fn run(&self, url: &str, query: &str) -> LoopReport {
        let label = site_label(url);
        let url = normalize_url(url);

        let driver = match self.factory.create() {
            Ok(driver) => driver,
            Err(e) => return Self::unopened(&label, RunOutcome::SessionFailure(e.to_string())),
        };
        let session = Arc::new(Session::new(driver, self.session_config.clone()));

        let opened = tokio::select! {
            _ = self.cancel.cancelled() => Err(RunOutcome::Cancelled),
            opened = session.open(&url) => opened.map_err(|e| RunOutcome::SessionFailure(e.to_string())),
        };

        let report = match opened {
            Ok(()) => {
                let mut scrapper = Scrapper::new(session.clone()).with_config(self.dispatch_config.clone());
                if let Some(describer) = &self.describer {
                    scrapper = scrapper.with_describer(describer.clone());
                }

                ActionLoop::new(&scrapper, self.proposer.clone())
                    .with_config(self.loop_config.clone())
                    .with_cancellation(self.cancel.clone())
                    .with_label(label.clone())
                    .run(query)
                    .await
            }
            Err(outcome) => Self::unopened(&label, outcome),
        };

        if let Err(e) = session.close().await {
            log::warn!("[{}] failed to close session: {}", label, e);
        }
        report
    }

    fn unopened(label: &str, outcome: RunOutcome) -> LoopReport {
        log::error!("[{}] session could not be established: {:?}", label, outcome);
        LoopReport { outcome, record: RunRecord::new(label) }
    }
}
