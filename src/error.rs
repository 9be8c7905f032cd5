//! Error taxonomy and the structured failure report returned across the
//! public train/detect boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Internal error taxonomy. Every variant is caught at the lifecycle-manager
/// boundary and converted into a [`FailureReport`]; none escapes to callers.
#[derive(Debug, Clone, Error)]
pub enum DetectorError {
    /// Malformed or empty record batch.
    #[error("invalid input: {0}")]
    Input(String),
    /// Scoring attempted before any successful fit or load.
    #[error("model not trained: {0}")]
    ModelState(String),
    /// Model artifact could not be read or written.
    #[error("persistence failed: {0}")]
    Persistence(String),
    /// Numeric failure during fit or predict.
    #[error("computation failed: {0}")]
    Computation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Input,
    ModelState,
    Persistence,
    Computation,
}

impl DetectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DetectorError::Input(_) => ErrorKind::Input,
            DetectorError::ModelState(_) => ErrorKind::ModelState,
            DetectorError::Persistence(_) => ErrorKind::Persistence,
            DetectorError::Computation(_) => ErrorKind::Computation,
        }
    }
}

/// Terminal status marker carried by every train/detect outcome. "success"
/// and "error" are the only two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Structured error result: callers inspect `status`, not control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub status: Status,
    pub error: String,
    pub kind: ErrorKind,
    pub timestamp: DateTime<Utc>,
}

impl From<DetectorError> for FailureReport {
    fn from(err: DetectorError) -> Self {
        Self {
            status: Status::Error,
            error: err.to_string(),
            kind: err.kind(),
            timestamp: Utc::now(),
        }
    }
}
