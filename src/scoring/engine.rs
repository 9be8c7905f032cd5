//! Maps raw anomaly scores to a bounded 0-100 threat score and a severity
//! level.

use crate::error::Status;
use crate::metrics::MetricsRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity bands over the 0-100 threat score. Ordered so a higher threat
/// score never maps to a lower level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Normal,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Normal => "NORMAL",
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Critical => "CRITICAL",
        }
    }
}

/// ((raw − offset) / threshold) · 100, clamped to [0, 100]. `threshold` is
/// the strictly negative spread the model calibrated at fit time, so the
/// result grows as `raw_score` falls below the decision boundary.
pub fn normalize(raw_score: f64, offset: f64, threshold: f64) -> f64 {
    (((raw_score - offset) / threshold) * 100.0).clamp(0.0, 100.0)
}

/// Top-down inclusive thresholds; ties resolve to the higher band.
pub fn classify(threat_score: f64) -> ThreatLevel {
    if threat_score >= 80.0 {
        ThreatLevel::Critical
    } else if threat_score >= 60.0 {
        ThreatLevel::High
    } else if threat_score >= 40.0 {
        ThreatLevel::Medium
    } else if threat_score >= 20.0 {
        ThreatLevel::Low
    } else {
        ThreatLevel::Normal
    }
}

/// Scoring outcome for a single metrics record. Created per call, never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub status: Status,
    pub timestamp: DateTime<Utc>,
    pub threat_score: f64,
    pub threat_level: ThreatLevel,
    pub is_anomaly: bool,
    /// Magnitude of the raw anomaly score; non-negative.
    pub confidence: f64,
    /// The record that was scored, echoed back to the caller.
    pub metrics: MetricsRecord,
}
