//! Feature preparation: records → fixed-order matrix → standardized batches.

mod scaler;
mod vectorizer;

pub use scaler::ScalerParams;
pub use vectorizer::{column_coverage, vectorize};

/// Canonical feature column order; one slot per required metric.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "request_rate",
    "error_rate",
    "response_time",
    "payload_size",
    "unique_ips",
    "auth_failures",
];

/// Number of feature columns.
pub const FEATURE_DIM: usize = FEATURE_COLUMNS.len();
