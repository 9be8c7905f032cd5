//! Record batches → fixed-order feature matrix with column-mean imputation.

use super::{FEATURE_COLUMNS, FEATURE_DIM};
use crate::metrics::MetricsRecord;
use ndarray::Array2;

/// Build the n×6 feature matrix for a batch. A field absent from a record is
/// substituted with that column's mean over the records in the batch that
/// carry it; a column absent from every record degenerates to 0.0. Pure
/// function of the batch passed in; unknown fields are ignored.
pub fn vectorize(records: &[MetricsRecord]) -> Array2<f64> {
    let mut means = [0.0f64; FEATURE_DIM];
    for (c, col) in FEATURE_COLUMNS.iter().enumerate() {
        let mut sum = 0.0;
        let mut n = 0usize;
        for rec in records {
            if let Some(v) = rec.get(col) {
                sum += v;
                n += 1;
            }
        }
        if n > 0 {
            means[c] = sum / n as f64;
        }
    }

    let mut out = Array2::zeros((records.len(), FEATURE_DIM));
    for (r, rec) in records.iter().enumerate() {
        for (c, col) in FEATURE_COLUMNS.iter().enumerate() {
            out[[r, c]] = rec.get(col).unwrap_or(means[c]);
        }
    }
    out
}

/// Per-column count of records carrying the field. Training rejects batches
/// where a required column is entirely absent (imputation is undefined there).
pub fn column_coverage(records: &[MetricsRecord]) -> [usize; FEATURE_DIM] {
    let mut counts = [0usize; FEATURE_DIM];
    for rec in records {
        for (c, col) in FEATURE_COLUMNS.iter().enumerate() {
            if rec.get(col).is_some() {
                counts[c] += 1;
            }
        }
    }
    counts
}
