//! Structured error types shared across the ABC crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`AbcError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (stage, dimensions, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the SMC-ABC sampler.
///
/// Every variant is fatal for the run that raised it. Chains that exhaust
/// their attempt budget are not errors and never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum AbcError {
    /// Covariance matrix is not square or not positive definite.
    #[error("invalid covariance: {0}")]
    InvalidCovariance(ErrorInfo),
    /// No chain produced a usable weight in a stage.
    #[error("empty population: {0}")]
    EmptyPopulation(ErrorInfo),
    /// Re-estimated covariance contains NaN/Inf or too few effective samples.
    #[error("degenerate covariance: {0}")]
    DegenerateCovariance(ErrorInfo),
    /// Fixed tolerance schedule is shorter than the stages executed.
    #[error("schedule exhausted: {0}")]
    ScheduleExhausted(ErrorInfo),
    /// Invalid configuration detected before any simulation work.
    #[error("configuration error: {0}")]
    Configuration(ErrorInfo),
    /// The forward simulator reported a failure.
    #[error("simulation error: {0}")]
    Simulation(ErrorInfo),
    /// Serialization, schema and filesystem errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl AbcError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            AbcError::InvalidCovariance(info)
            | AbcError::EmptyPopulation(info)
            | AbcError::DegenerateCovariance(info)
            | AbcError::ScheduleExhausted(info)
            | AbcError::Configuration(info)
            | AbcError::Simulation(info)
            | AbcError::Serde(info) => info,
        }
    }

    /// Shorthand for a configuration error without context.
    pub fn config(code: &str, message: impl Into<String>) -> Self {
        AbcError::Configuration(ErrorInfo::new(code, message))
    }

    /// Wraps an I/O or serialization failure tied to a filesystem path.
    pub fn io(code: &str, err: impl ToString, path: &std::path::Path) -> Self {
        AbcError::Serde(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
