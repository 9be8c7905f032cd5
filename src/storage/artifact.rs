//! Checksummed JSON model artifact with atomic writes.
//!
//! On-disk layout: `{"checksum": "<base64 sha-256 of the model JSON>",
//! "model": {...}}`. Writes go through a named temp file in the destination
//! directory followed by an atomic rename; an aborted write never leaves a
//! partial artifact behind (the temp file is cleaned up on drop).

use crate::error::DetectorError;
use crate::features::ScalerParams;
use crate::model::IsolationForest;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

pub const ARTIFACT_VERSION: u32 = 1;

/// Everything needed to round-trip a fitted estimator: the forest, the
/// scaler statistics, and fit metadata. Calibration scalars live inside the
/// forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
    pub scaler: ScalerParams,
    pub forest: IsolationForest,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    checksum: String,
    model: serde_json::Value,
}

impl ModelArtifact {
    /// Serialize and atomically replace any prior artifact at `path`.
    pub fn save(&self, path: &Path) -> Result<(), DetectorError> {
        let model = serde_json::to_value(self)
            .map_err(|e| DetectorError::Persistence(format!("encode model: {e}")))?;
        let body = serde_json::to_vec(&model)
            .map_err(|e| DetectorError::Persistence(format!("encode model: {e}")))?;
        let envelope = Envelope {
            checksum: checksum(&body),
            model,
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)
            .map_err(|e| DetectorError::Persistence(format!("create temp file: {e}")))?;
        serde_json::to_writer(tmp.as_file(), &envelope)
            .map_err(|e| DetectorError::Persistence(format!("write artifact: {e}")))?;
        tmp.persist(path).map_err(|e| {
            DetectorError::Persistence(format!("rename into {}: {}", path.display(), e.error))
        })?;
        Ok(())
    }

    /// Read and verify the artifact at `path`. A checksum mismatch or decode
    /// failure is a persistence error; nothing is partially applied.
    pub fn load(path: &Path) -> Result<Self, DetectorError> {
        let data = std::fs::read(path)
            .map_err(|e| DetectorError::Persistence(format!("read {}: {e}", path.display())))?;
        let envelope: Envelope = serde_json::from_slice(&data)
            .map_err(|e| DetectorError::Persistence(format!("decode {}: {e}", path.display())))?;
        let body = serde_json::to_vec(&envelope.model)
            .map_err(|e| DetectorError::Persistence(format!("encode model: {e}")))?;
        if checksum(&body) != envelope.checksum {
            return Err(DetectorError::Persistence(format!(
                "checksum mismatch in {}",
                path.display()
            )));
        }
        serde_json::from_value(envelope.model)
            .map_err(|e| DetectorError::Persistence(format!("decode model: {e}")))
    }
}

fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    BASE64.encode(hasher.finalize())
}
