//! Lenient parsing of model responses.
//!
//! Only lines whose trimmed form starts with the exact prefix are recognized;
//! everything else is ignored. Missing fields never fail: they become
//! sentinel strings so downstream tables have no empty question cells.

use crate::prompts::{ANSWER_PREFIX, QUESTION_PREFIX};
use crate::LlmError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const MISSING_QUESTION: &str = "ERROR: No question generated";
pub const MISSING_ANSWER: &str = "ERROR: No answer generated, please retry";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Whether either field fell back to a sentinel.
    pub fn is_incomplete(&self) -> bool {
        self.question == MISSING_QUESTION || self.answer == MISSING_ANSWER
    }
}

fn prefixed<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.trim().strip_prefix(prefix).map(str::trim)
}

/// Every `Question: ` line, in order.
pub fn parse_questions(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| prefixed(line, QUESTION_PREFIX))
        .map(str::to_string)
        .collect()
}

/// The first `Question: ` and first `Answer: ` line, with sentinels for
/// whichever is missing.
pub fn parse_question_answer(response: &str) -> QaPair {
    let mut question = None;
    let mut answer = None;
    for line in response.lines() {
        if question.is_none() {
            question = prefixed(line, QUESTION_PREFIX);
        }
        if answer.is_none() {
            answer = prefixed(line, ANSWER_PREFIX);
        }
    }
    QaPair::new(
        question.unwrap_or(MISSING_QUESTION),
        answer.unwrap_or(MISSING_ANSWER),
    )
}

/// Decode the span from the first `[` to the last `]` as a JSON array.
pub fn parse_json_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, LlmError> {
    let start = text
        .find('[')
        .ok_or_else(|| LlmError::ParseError("no JSON array found (missing '[')".to_string()))?;
    let end = text
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| LlmError::ParseError("no JSON array found (missing ']')".to_string()))?;
    serde_json::from_str(&text[start..=end])
        .map_err(|e| LlmError::ParseError(format!("invalid JSON array: {e}")))
}
