//! Model lifecycle: load-from-disk, fit, persist, and the scoring entry
//! point. The only component that mutates trained state.
//!
//! `train` and `detect` never panic and never let an error escape as control
//! flow; both return outcome values whose `status` field is the terminal
//! marker. Concurrent scoring against one detector reads the same immutable
//! trained model; concurrent training needs caller-side mutual exclusion.

use crate::config::DetectorConfig;
use crate::error::{DetectorError, FailureReport, Status};
use crate::features::{column_coverage, vectorize, ScalerParams, FEATURE_COLUMNS};
use crate::metrics::MetricsRecord;
use crate::model::IsolationForest;
use crate::scoring::{classify, normalize, ScoreResult};
use crate::storage::{ModelArtifact, ARTIFACT_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Lifecycle states. `Trained` is required for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Uninitialized,
    Loaded,
    Trained,
}

/// Successful training summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    pub status: Status,
    pub message: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub samples: usize,
    pub model_id: Uuid,
}

/// Outcome of a `train` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Training {
    Report(TrainReport),
    Failed(FailureReport),
}

impl Training {
    pub fn status(&self) -> Status {
        match self {
            Training::Report(_) => Status::Success,
            Training::Failed(_) => Status::Error,
        }
    }

    pub fn report(&self) -> Option<&TrainReport> {
        match self {
            Training::Report(r) => Some(r),
            Training::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReport> {
        match self {
            Training::Report(_) => None,
            Training::Failed(f) => Some(f),
        }
    }
}

/// Outcome of a `detect` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detection {
    Score(ScoreResult),
    Failed(FailureReport),
}

impl Detection {
    pub fn status(&self) -> Status {
        match self {
            Detection::Score(_) => Status::Success,
            Detection::Failed(_) => Status::Error,
        }
    }

    pub fn score(&self) -> Option<&ScoreResult> {
        match self {
            Detection::Score(s) => Some(s),
            Detection::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReport> {
        match self {
            Detection::Score(_) => None,
            Detection::Failed(f) => Some(f),
        }
    }
}

pub struct ThreatDetector {
    config: DetectorConfig,
    model: Option<ModelArtifact>,
}

impl ThreatDetector {
    /// Leave `Uninitialized`: load the artifact at the configured path when
    /// one is present and intact, otherwise start untrained (`Loaded`). An
    /// unreadable artifact is logged and ignored rather than trusted.
    pub fn open(config: DetectorConfig) -> Self {
        let model = if config.model_path.exists() {
            match ModelArtifact::load(&config.model_path) {
                Ok(artifact) => {
                    info!(
                        model_id = %artifact.model_id,
                        samples = artifact.samples,
                        "model artifact loaded"
                    );
                    Some(artifact)
                }
                Err(e) => {
                    warn!(
                        path = %config.model_path.display(),
                        error = %e,
                        "ignoring unreadable model artifact"
                    );
                    None
                }
            }
        } else {
            None
        };
        Self { config, model }
    }

    pub fn state(&self) -> DetectorState {
        if self.model.is_some() {
            DetectorState::Trained
        } else {
            DetectorState::Loaded
        }
    }

    pub fn model_id(&self) -> Option<Uuid> {
        self.model.as_ref().map(|m| m.model_id)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Fit on a historical batch and persist the artifact, overwriting any
    /// prior one. The in-memory model is swapped only after the artifact is
    /// on disk; a persistence failure leaves the previous state intact.
    pub fn train(&mut self, records: &[MetricsRecord]) -> Training {
        match self.try_train(records) {
            Ok(report) => Training::Report(report),
            Err(e) => {
                warn!(error = %e, "training failed");
                Training::Failed(FailureReport::from(e))
            }
        }
    }

    /// Score one record against the trained model. Does not mutate state;
    /// identical input against an unchanged model yields an identical score.
    pub fn detect(&self, record: &MetricsRecord) -> Detection {
        match self.try_detect(record) {
            Ok(result) => Detection::Score(result),
            Err(e) => {
                warn!(error = %e, "detection failed");
                Detection::Failed(FailureReport::from(e))
            }
        }
    }

    fn try_train(&mut self, records: &[MetricsRecord]) -> Result<TrainReport, DetectorError> {
        if records.is_empty() {
            return Err(DetectorError::Input("historical batch is empty".into()));
        }
        let coverage = column_coverage(records);
        if let Some((col, _)) = FEATURE_COLUMNS.iter().zip(coverage).find(|(_, n)| *n == 0) {
            return Err(DetectorError::Input(format!(
                "required field '{col}' is absent from every record"
            )));
        }

        let raw = vectorize(records);
        let scaler = ScalerParams::fit(&raw);
        let scaled = scaler.apply(&raw);
        let forest = IsolationForest::fit(self.config.model, &scaled)?;

        let artifact = ModelArtifact {
            version: ARTIFACT_VERSION,
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            samples: records.len(),
            scaler,
            forest,
        };
        artifact.save(&self.config.model_path)?;
        info!(
            model_id = %artifact.model_id,
            samples = artifact.samples,
            offset = artifact.forest.offset(),
            threshold = artifact.forest.threshold(),
            "model trained and persisted"
        );

        let report = TrainReport {
            status: Status::Success,
            message: "model trained successfully".to_string(),
            timestamp: Utc::now(),
            samples: artifact.samples,
            model_id: artifact.model_id,
        };
        self.model = Some(artifact);
        Ok(report)
    }

    fn try_detect(&self, record: &MetricsRecord) -> Result<ScoreResult, DetectorError> {
        let model = self.model.as_ref().ok_or_else(|| {
            DetectorError::ModelState("no trained model in memory or on disk".into())
        })?;

        let raw = vectorize(std::slice::from_ref(record));
        let scaled = model.scaler.apply(&raw);
        let scores = model.forest.score_samples(&scaled)?;
        let predictions = model.forest.predict(&scaled)?;
        let raw_score = scores
            .first()
            .copied()
            .ok_or_else(|| DetectorError::Computation("empty score batch".into()))?;

        let threat_score = normalize(raw_score, model.forest.offset(), model.forest.threshold());
        Ok(ScoreResult {
            status: Status::Success,
            timestamp: Utc::now(),
            threat_score,
            threat_level: classify(threat_score),
            is_anomaly: predictions.first().copied() == Some(-1),
            confidence: raw_score.abs(),
            metrics: record.clone(),
        })
    }
}
