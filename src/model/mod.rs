//! Unsupervised anomaly estimation: a native isolation forest.

mod forest;

pub use forest::{ForestParams, IsolationForest};
