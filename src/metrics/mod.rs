//! Raw operational metrics records and synthetic history generation.

mod synthetic;

pub use synthetic::SyntheticHistory;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observation of named operational metrics (request_rate, error_rate,
/// response_time, payload_size, unique_ips, auth_failures). Unknown keys are
/// carried but ignored by the feature pipeline; a missing key is absent and
/// imputed downstream, never read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsRecord(pub BTreeMap<String, f64>);

impl MetricsRecord {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.get(field).copied()
    }

    pub fn set(&mut self, field: &str, value: f64) {
        self.0.insert(field.to_string(), value);
    }
}

impl<const N: usize> From<[(&str, f64); N]> for MetricsRecord {
    fn from(fields: [(&str, f64); N]) -> Self {
        Self(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}
