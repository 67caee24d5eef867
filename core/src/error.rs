use serde::{Deserialize, Serialize};

/// Internal failure inside the assessment engine.
///
/// None of these escape the public entry points in `calculator`, `path`,
/// `composer` and `navigator`: those catch the error, log it and return the
/// documented fallback. Only the `try_*` functions and the record store
/// surface them directly.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssessmentError {
    /// A known response key holds a value of the wrong shape
    /// (e.g. an array where a single choice is expected).
    #[error("response '{key}' has unexpected shape: expected {expected}")]
    ResponseShape { key: String, expected: &'static str },
    /// A step identifier could not be parsed (`"2.5"` or `"step2_5"` expected).
    #[error("invalid step id '{0}'")]
    InvalidStepId(String),
    /// Manual risk input outside the accepted range or referring to an unknown factor.
    #[error("invalid risk input: {0}")]
    InvalidRiskInput(String),
    /// The record store rejected or could not complete an operation.
    #[error("record store: {0}")]
    Store(String),
}

impl AssessmentError {
    pub fn shape(key: impl Into<String>, expected: &'static str) -> Self {
        AssessmentError::ResponseShape {
            key: key.into(),
            expected,
        }
    }

    /// Machine-readable code for this error (see [`codes`]).
    pub fn code(&self) -> &'static str {
        match self {
            AssessmentError::ResponseShape { .. } => codes::RESPONSE_SHAPE,
            AssessmentError::InvalidStepId(_) => codes::INVALID_STEP_ID,
            AssessmentError::InvalidRiskInput(_) => codes::INVALID_RISK_INPUT,
            AssessmentError::Store(_) => codes::STORE_ERROR,
        }
    }
}

/// Structured error envelope printed by tools built on the engine.
/// Carries enough context for a caller to fix its input without reading logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorReport {
    /// Machine-readable error code (e.g. "validation_failed", "invalid_step_id")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which step or field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Hint about what correct input looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

impl ErrorReport {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            field: None,
            docs_hint: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.docs_hint = Some(hint.into());
        self
    }
}

impl From<&AssessmentError> for ErrorReport {
    fn from(err: &AssessmentError) -> Self {
        let report = ErrorReport::new(err.code(), err.to_string());
        match err {
            AssessmentError::ResponseShape { key, .. } => report.with_field(key.clone()),
            AssessmentError::InvalidStepId(_) => {
                report.with_hint("Use a dotted id like 2.5 or a response key like step2_5")
            }
            _ => report,
        }
    }
}

/// Error codes used across the engine and its tools
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const RESPONSE_SHAPE: &str = "response_shape";
    pub const INVALID_STEP_ID: &str = "invalid_step_id";
    pub const INVALID_RISK_INPUT: &str = "invalid_risk_input";
    pub const STORE_ERROR: &str = "store_error";
    pub const CLI_ERROR: &str = "cli_error";
}
