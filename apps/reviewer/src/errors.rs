use std::fmt;

use thiserror::Error;

use crate::llm_client::LlmError;

/// A single schema violation found in the model's structured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// JSON path of the offending field, e.g. `experiences[0].bullets[2].score`.
    pub path: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors produced by a single review run.
///
/// Preprocessor and LLM errors propagate unchanged; the bot adapter turns any
/// of them into a failure embed via [`ReviewError::user_message`].
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Document conversion failed: {0}")]
    Conversion(String),

    #[error("Document extraction failed: {0}")]
    Extraction(String),

    #[error("Completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error("Model output is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Model output failed validation ({} violation(s)): {}", .0.len(), format_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ReviewError {
    /// Short, user-facing explanation sent back to the chat thread.
    pub fn user_message(&self) -> &'static str {
        match self {
            ReviewError::Conversion(_) | ReviewError::Extraction(_) => {
                "We couldn't read that PDF. Please make sure it isn't corrupted or password-protected and try again."
            }
            ReviewError::Completion(_) => {
                "Our reviewer is unavailable right now. Please try again in a few minutes."
            }
            ReviewError::Parse(_) | ReviewError::Validation(_) => {
                "Our reviewer returned feedback we couldn't understand. Please try posting your resume again."
            }
            ReviewError::Internal(_) => "Something went wrong while reviewing your resume.",
        }
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
