use std::fmt;
use thiserror::Error;

/// Message shown to end users when an AI-backed operation fails. The underlying
/// error is logged for operators, never displayed.
pub const ANALYSIS_UNAVAILABLE: &str = "Could not load AI-powered analysis. Please try again later.";

#[derive(Error, Debug, Clone, PartialEq)]
#[error("field '{field}' violates {constraint} (actual: {actual_value})")]
pub struct ValidationError {
    pub field: String,
    pub constraint: String,
    pub actual_value: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, constraint: impl Into<String>, actual_value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
            actual_value: actual_value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    SchemaMismatch,
    NetworkFailure,
    Timeout,
    ModelRefusal,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SchemaMismatch => "schema mismatch",
            Self::NetworkFailure => "network failure",
            Self::Timeout => "timeout",
            Self::ModelRefusal => "model refusal",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone)]
#[error("{kind}: {detail}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub detail: String,
    /// Set when the model's output was parsed but failed schema validation.
    pub violation: Option<ValidationError>,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into(), violation: None }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::NetworkFailure, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Timeout, detail)
    }

    pub fn refusal(detail: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::ModelRefusal, detail)
    }

    pub fn schema_mismatch(detail: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::SchemaMismatch, detail)
    }

    pub fn from_violation(violation: ValidationError) -> Self {
        Self {
            kind: GenerationErrorKind::SchemaMismatch,
            detail: violation.to_string(),
            violation: Some(violation),
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::timeout(e.to_string())
        } else if e.is_decode() {
            GenerationError::schema_mismatch(e.to_string())
        } else {
            GenerationError::network(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum CivisError {
    #[error("Validation Failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Generation Failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Tool '{tool}' Failed: {reason}")]
    ToolExecution { tool: String, reason: String },

    #[error("Speech Synthesis Failed: {0}")]
    SpeechSynthesis(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CivisError {
    /// Short, non-technical text suitable for end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            CivisError::Validation(_) => "The request was incomplete or invalid. Please check the details and try again.",
            CivisError::NotFound(_) => "The requested issue could not be found.",
            _ => ANALYSIS_UNAVAILABLE,
        }
    }

    /// Generation failures are transient from the caller's point of view;
    /// everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CivisError::Generation(_))
    }

    pub fn generation_kind(&self) -> Option<GenerationErrorKind> {
        match self {
            CivisError::Generation(e) => Some(e.kind),
            _ => None,
        }
    }

    /// The schema violation behind this error, whether it came from the
    /// caller's input or from the model's output.
    pub fn violation(&self) -> Option<&ValidationError> {
        match self {
            CivisError::Validation(v) => Some(v),
            CivisError::Generation(e) => e.violation.as_ref(),
            _ => None,
        }
    }
}
