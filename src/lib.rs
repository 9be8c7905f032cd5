//! Threat scoring engine — unsupervised anomaly detection over operational metrics.
//!
//! Modular structure:
//! - [`metrics`] — Raw metrics records and synthetic history generation
//! - [`features`] — Fixed-order vectorization and standardization
//! - [`model`] — Isolation forest fit/score/predict
//! - [`scoring`] — 0-100 threat score normalization and severity levels
//! - [`detector`] — Model lifecycle: load, train, persist, detect
//! - [`storage`] — Checksummed, atomically written model artifact
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod metrics;
pub mod features;
pub mod model;
pub mod scoring;
pub mod storage;
pub mod detector;
pub mod logging;

pub use config::DetectorConfig;
pub use detector::{Detection, DetectorState, ThreatDetector, Training};
pub use error::{DetectorError, FailureReport, Status};
pub use metrics::{MetricsRecord, SyntheticHistory};
pub use model::IsolationForest;
pub use scoring::{ScoreResult, ThreatLevel};
pub use logging::StructuredLogger;
