//! Splitting a raw proposal into reasoning and the action line

use std::fmt;

/// A proposal that passed the delimiter check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub reasoning: String,

    /// First non-empty line after the delimiter
    pub expression: String,

    /// Lines after the action line, trimmed
    pub trailing: String,
}

impl Proposal {
    pub fn has_trailing(&self) -> bool {
        !self.trailing.is_empty()
    }
}

/// Why a proposal was sent back without running anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingDelimiter,
    EmptyAction,
    EmptyPayload,
}

impl Rejection {
    /// Corrective notice for the next proposal request
    pub fn notice(&self, delimiter: &str) -> String {
        match self {
            Rejection::MissingDelimiter => format!(
                "Your answer did not contain '{}'. Write your reasoning, then '{}' followed by exactly one action on the same line, e.g. {} page_summary()",
                delimiter, delimiter, delimiter
            ),
            Rejection::EmptyAction => format!("Nothing followed '{}'. Put exactly one action after it.", delimiter),
            Rejection::EmptyPayload => {
                "end_navigation needs the final answer, either as its argument or on the lines after the action."
                    .to_string()
            }
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::MissingDelimiter => "missing delimiter",
            Rejection::EmptyAction => "empty action",
            Rejection::EmptyPayload => "empty terminal payload",
        };
        f.write_str(text)
    }
}

/// Split `text` on the first occurrence of `delimiter`
pub fn split_proposal(text: &str, delimiter: &str) -> std::result::Result<Proposal, Rejection> {
    let (reasoning, rest) = text.split_once(delimiter).ok_or(Rejection::MissingDelimiter)?;

    let rest = rest.trim_start();
    let (expression, trailing) = match rest.split_once('\n') {
        Some((line, remainder)) => (line.trim(), remainder.trim()),
        None => (rest.trim(), ""),
    };

    if expression.is_empty() {
        return Err(Rejection::EmptyAction);
    }

    Ok(Proposal {
        reasoning: reasoning.trim().to_string(),
        expression: expression.to_string(),
        trailing: trailing.to_string(),
    })
}
