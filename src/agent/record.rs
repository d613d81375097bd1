use serde::Serialize;
use std::fmt::Write as _;

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// The action ran against the session
    Executed,
    /// Malformed proposal; nothing ran and a correction was sent
    Rejected,
    /// Well-formed but unparseable or unknown action; answered with an observation
    Invalid,
    /// Accepted terminal action
    Terminal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub number: usize,
    pub proposal: String,
    pub kind: TurnKind,
    /// What the proposer is shown next
    pub observation: String,
}

/// Ordered transcript of one action loop run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunRecord {
    label: String,
    turns: Vec<Turn>,
}

impl RunRecord {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), turns: Vec::new() }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn push(&mut self, number: usize, proposal: impl Into<String>, kind: TurnKind, observation: impl Into<String>) {
        self.turns.push(Turn { number, proposal: proposal.into(), kind, observation: observation.into() });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Rejected turns at the end of the record, with nothing accepted in between
    pub fn consecutive_rejections(&self) -> usize {
        self.turns.iter().rev().take_while(|t| t.kind == TurnKind::Rejected).count()
    }

    /// Count of turns that reached the session
    pub fn executed(&self) -> usize {
        self.turns.iter().filter(|t| t.kind == TurnKind::Executed).count()
    }

    /// Plain-text rendering for logs or files
    pub fn transcript(&self) -> String {
        let mut out = format!("Run: {}\n", self.label);
        for turn in &self.turns {
            let _ = write!(
                out,
                "\n## Turn {} ({:?})\n### Proposal\n{}\n### Observation\n{}\n",
                turn.number,
                turn.kind,
                turn.proposal.trim(),
                turn.observation.trim()
            );
        }
        out
    }
}
