use crate::{agent::{proposal::{split_proposal, Rejection},
                    proposer::{ActionProposer, ProposalRequest},
                    record::{RunRecord, TurnKind}},
            error::ScrapError,
            tools::{parse_action, Action, Observation, Scrapper}};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Separates reasoning from the action line unless configured otherwise
pub const DEFAULT_DELIMITER: &str = "ACTION:";

/// Knobs of the action loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub delimiter: String,

    /// Consecutive malformed proposals tolerated before the run fails
    pub max_retries: usize,

    /// Hard bound on proposals per run
    pub max_turns: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { delimiter: DEFAULT_DELIMITER.to_string(), max_retries: 3, max_turns: 100 }
    }
}

impl LoopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub fn max_turns(mut self, turns: usize) -> Self {
        self.max_turns = turns;
        self
    }
}

/// The single terminal result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(String),
    ProtocolFailure(String),
    SessionFailure(String),
    Cancelled,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Outcome plus the transcript that led to it
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub outcome: RunOutcome,
    pub record: RunRecord,
}

enum LoopState {
    AwaitProposal { observation: Observation, correction: Option<String> },
    Validate { text: String, observation: Observation },
    Execute { text: String, action: Action, violation: Option<String> },
    Terminal(RunOutcome),
}

/// Drives a proposer against an open session, one action per turn
pub struct ActionLoop<'a> {
    scrapper: &'a Scrapper,
    proposer: Arc<dyn ActionProposer>,
    config: LoopConfig,
    cancel: CancellationToken,
    label: String,
}

impl<'a> ActionLoop<'a> {
    pub fn new(scrapper: &'a Scrapper, proposer: Arc<dyn ActionProposer>) -> Self {
        Self {
            scrapper,
            proposer,
            config: LoopConfig::default(),
            cancel: CancellationToken::new(),
            label: String::from("run"),
        }
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Label prefixed to every log line of this run
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Run until a terminal action, a fatal error, the turn limit or cancellation.
    ///
    /// The session is left open; closing it belongs to whoever opened it.
    pub async fn run(&self, query: &str) -> LoopReport {
        let mut record = RunRecord::new(self.label.clone());
        let mut turn = 0;

        let mut state = match self.initial_observation().await {
            Ok(observation) => LoopState::AwaitProposal { observation, correction: None },
            Err(outcome) => LoopState::Terminal(outcome),
        };

        loop {
            if self.cancel.is_cancelled() && !matches!(state, LoopState::Terminal(_)) {
                log::info!("[{}] cancelled after {} turn(s)", self.label, turn);
                state = LoopState::Terminal(RunOutcome::Cancelled);
            }

            state = match state {
                LoopState::AwaitProposal { observation, correction } => {
                    turn += 1;
                    if turn > self.config.max_turns {
                        LoopState::Terminal(RunOutcome::ProtocolFailure(format!(
                            "Turn limit of {} reached without a final answer",
                            self.config.max_turns
                        )))
                    } else {
                        self.await_proposal(query, turn, observation, correction).await
                    }
                }
                LoopState::Validate { text, observation } => self.validate(turn, text, observation, &mut record),
                LoopState::Execute { text, action, violation } => {
                    self.execute(turn, text, action, violation, &mut record).await
                }
                LoopState::Terminal(outcome) => {
                    log::info!("[{}] finished after {} turn(s): {:?}", self.label, record.len(), outcome);
                    return LoopReport { outcome, record };
                }
            };
        }
    }

    async fn initial_observation(&self) -> std::result::Result<Observation, RunOutcome> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(RunOutcome::Cancelled),
            result = self.scrapper.execute(Action::PageSummary) => {
                result.map_err(|e| RunOutcome::SessionFailure(session_failure(&e)))
            }
        }
    }

    async fn await_proposal(
        &self,
        query: &str,
        turn: usize,
        observation: Observation,
        correction: Option<String>,
    ) -> LoopState {
        let request = ProposalRequest { query: query.to_string(), observation: observation.clone(), correction, turn };

        let proposed = tokio::select! {
            _ = self.cancel.cancelled() => return LoopState::Terminal(RunOutcome::Cancelled),
            proposed = self.proposer.propose(request) => proposed,
        };

        match proposed {
            Ok(text) => {
                log::debug!("[{}] turn {} proposal: {}", self.label, turn, text);
                LoopState::Validate { text, observation }
            }
            Err(e) => {
                log::error!("[{}] proposer failed on turn {}: {}", self.label, turn, e);
                LoopState::Terminal(RunOutcome::ProtocolFailure(e.to_string()))
            }
        }
    }

    fn validate(&self, turn: usize, text: String, observation: Observation, record: &mut RunRecord) -> LoopState {
        let proposal = match split_proposal(&text, &self.config.delimiter) {
            Ok(proposal) => proposal,
            Err(rejection) => return self.reject(turn, text, rejection, observation, record),
        };

        let action = match parse_action(&proposal.expression) {
            Ok(action) => action,
            Err(e) => {
                log::warn!("[{}] turn {} action rejected: {}", self.label, turn, e);
                let answer = Scrapper::rejection(&e);
                record.push(turn, text, TurnKind::Invalid, answer.text.clone());
                return LoopState::AwaitProposal { observation: answer, correction: None };
            }
        };

        if let Action::EndNavigation { payload } = &action {
            let payload = payload.clone().unwrap_or_else(|| proposal.trailing.clone());
            if payload.trim().is_empty() {
                return self.reject(turn, text, Rejection::EmptyPayload, observation, record);
            }
            record.push(turn, text, TurnKind::Terminal, payload.clone());
            return LoopState::Terminal(RunOutcome::Completed(payload));
        }

        let violation = proposal.has_trailing().then(|| {
            log::warn!(
                "[{}] turn {} carried more than the action line; only '{}' runs",
                self.label,
                turn,
                proposal.expression
            );
            format!(
                "NOTE: only one action runs per turn. '{}' was executed and everything after it was ignored.",
                proposal.expression
            )
        });

        LoopState::Execute { text, action, violation }
    }

    fn reject(
        &self,
        turn: usize,
        text: String,
        rejection: Rejection,
        observation: Observation,
        record: &mut RunRecord,
    ) -> LoopState {
        let notice = rejection.notice(&self.config.delimiter);
        record.push(turn, text, TurnKind::Rejected, notice.clone());

        let rejections = record.consecutive_rejections();
        log::warn!(
            "[{}] turn {} malformed ({}), {}/{} consecutive",
            self.label,
            turn,
            rejection,
            rejections,
            self.config.max_retries
        );

        if rejections >= self.config.max_retries {
            return LoopState::Terminal(RunOutcome::ProtocolFailure(format!(
                "{} consecutive malformed proposals, last one: {}",
                rejections, rejection
            )));
        }
        LoopState::AwaitProposal { observation, correction: Some(notice) }
    }

    async fn execute(
        &self,
        turn: usize,
        text: String,
        action: Action,
        violation: Option<String>,
        record: &mut RunRecord,
    ) -> LoopState {
        let executed = tokio::select! {
            _ = self.cancel.cancelled() => return LoopState::Terminal(RunOutcome::Cancelled),
            executed = self.scrapper.execute(action) => executed,
        };

        match executed {
            Ok(mut observation) => {
                if let Some(note) = violation {
                    observation.annotate(&note);
                }
                record.push(turn, text, TurnKind::Executed, observation.text.clone());
                LoopState::AwaitProposal { observation, correction: None }
            }
            Err(e) => {
                log::error!("[{}] session lost on turn {}: {}", self.label, turn, e);
                LoopState::Terminal(RunOutcome::SessionFailure(session_failure(&e)))
            }
        }
    }
}

fn session_failure(error: &ScrapError) -> String {
    format!("The browser session failed: {}", error)
}
