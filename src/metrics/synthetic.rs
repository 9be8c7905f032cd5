//! Synthetic historical metrics for provisioning-time training.
//! Baseline fields are drawn from per-field normal distributions; a fixed
//! fraction of records gets the attack-correlated fields amplified.

use super::MetricsRecord;
use crate::features::FEATURE_COLUMNS;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

/// (mean, std) per canonical feature column.
const BASELINE_PARAMS: [(f64, f64); 6] = [
    (100.0, 20.0),   // request_rate
    (0.05, 0.02),    // error_rate
    (200.0, 50.0),   // response_time
    (1024.0, 200.0), // payload_size
    (50.0, 10.0),    // unique_ips
    (2.0, 1.0),      // auth_failures
];

/// Multipliers applied to anomalous records.
const AMPLIFIED_FIELDS: [(&str, f64); 3] = [
    ("request_rate", 3.0),
    ("error_rate", 4.0),
    ("auth_failures", 5.0),
];

/// Generator for hourly-grained historical batches. Deterministic under a
/// fixed seed.
#[derive(Debug, Clone)]
pub struct SyntheticHistory {
    pub samples: usize,
    pub anomaly_fraction: f64,
    pub seed: u64,
}

impl Default for SyntheticHistory {
    fn default() -> Self {
        Self {
            samples: 1000,
            anomaly_fraction: 0.1,
            seed: 42,
        }
    }
}

impl SyntheticHistory {
    pub fn generate(&self) -> Vec<MetricsRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut records: Vec<MetricsRecord> = (0..self.samples)
            .map(|_| {
                let mut rec = MetricsRecord::default();
                for (col, (mean, std)) in FEATURE_COLUMNS.iter().zip(BASELINE_PARAMS) {
                    rec.set(col, normal(&mut rng, mean, std));
                }
                rec
            })
            .collect();

        let n_anomalies = ((self.samples as f64) * self.anomaly_fraction).round() as usize;
        for idx in index::sample(&mut rng, self.samples, n_anomalies.min(self.samples)) {
            let rec = &mut records[idx];
            for (col, factor) in AMPLIFIED_FIELDS {
                if let Some(v) = rec.get(col) {
                    rec.set(col, v * factor);
                }
            }
        }
        records
    }

    /// A record at the baseline means, e.g. for sanity-checking that
    /// in-distribution data scores low.
    pub fn centroid() -> MetricsRecord {
        let mut rec = MetricsRecord::default();
        for (col, (mean, _)) in FEATURE_COLUMNS.iter().zip(BASELINE_PARAMS) {
            rec.set(col, mean);
        }
        rec
    }

    /// The centroid with the attack-correlated fields amplified `factor`x.
    pub fn amplified(factor: f64) -> MetricsRecord {
        let mut rec = Self::centroid();
        for (col, _) in AMPLIFIED_FIELDS {
            if let Some(v) = rec.get(col) {
                rec.set(col, v * factor);
            }
        }
        rec
    }
}

/// Box-Muller transform; `rand` carries no gaussian sampler of its own.
fn normal(rng: &mut StdRng, mean: f64, std: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    mean + std * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
