//! Isolation forest: an ensemble of randomized partitioning trees.
//!
//! Scores follow the path-length convention s(x) = −2^(−E[h(x)]/c(ψ)),
//! in [−1, 0); more negative = more anomalous, matching the predict sign
//! convention (−1 outlier, +1 normal). Two calibration scalars (offset,
//! threshold) are derived from the training-score distribution at fit time
//! and drive downstream normalization.

use crate::error::DetectorError;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Fit parameters. Contamination is the fraction of training data assumed
/// anomalous; it positions the decision boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            contamination: 0.1,
            seed: 42,
        }
    }
}

/// Per-tree subsample cap.
const MAX_TREE_SAMPLES: usize = 256;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// A fitted forest. Immutable once fit; re-fitting builds a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    params: ForestParams,
    trees: Vec<Node>,
    sample_size: usize,
    offset: f64,
    threshold: f64,
}

impl IsolationForest {
    /// Fit on a batch of ≥1 feature rows. Deterministic under `params.seed`.
    pub fn fit(params: ForestParams, batch: &Array2<f64>) -> Result<Self, DetectorError> {
        if batch.nrows() == 0 {
            return Err(DetectorError::Input("cannot fit on an empty batch".into()));
        }
        check_finite(batch)?;

        let n = batch.nrows();
        let sample_size = n.min(MAX_TREE_SAMPLES);
        let height_limit = (sample_size as f64).log2().ceil().max(0.0) as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let rows = index::sample(&mut rng, n, sample_size).into_vec();
            trees.push(build_node(batch, &rows, 0, height_limit, &mut rng));
        }

        let mut forest = Self {
            params,
            trees,
            sample_size,
            offset: 0.0,
            threshold: -1.0,
        };
        forest.calibrate(batch);
        Ok(forest)
    }

    /// Continuous anomaly score per row; more negative = more anomalous.
    pub fn score_samples(&self, batch: &Array2<f64>) -> Result<Vec<f64>, DetectorError> {
        check_finite(batch)?;
        Ok(batch.rows().into_iter().map(|row| self.score_row(row)).collect())
    }

    /// −1 marks an outlier, +1 normal, per input row.
    pub fn predict(&self, batch: &Array2<f64>) -> Result<Vec<i32>, DetectorError> {
        Ok(self
            .score_samples(batch)?
            .into_iter()
            .map(|s| if s < self.offset { -1 } else { 1 })
            .collect())
    }

    /// Score at the fitted decision boundary; scores below it are outliers.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Normalization denominator: boundary-to-anomalous-mass spread, always
    /// strictly negative.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn params(&self) -> ForestParams {
        self.params
    }

    fn score_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let c = average_path_length(self.sample_size);
        if c == 0.0 {
            // Single-sample trees carry no depth information.
            return -0.5;
        }
        let mean_path: f64 = self.trees.iter().map(|t| path_length(t, row)).sum::<f64>()
            / self.trees.len().max(1) as f64;
        -(2f64.powf(-mean_path / c))
    }

    fn calibrate(&mut self, batch: &Array2<f64>) {
        let scores: Vec<f64> = batch
            .rows()
            .into_iter()
            .map(|row| self.score_row(row))
            .collect();
        self.offset = percentile(&scores, self.params.contamination * 100.0);

        let below: Vec<f64> = scores.iter().copied().filter(|s| *s < self.offset).collect();
        let spread = if below.is_empty() {
            scores.iter().copied().fold(f64::INFINITY, f64::min) - self.offset
        } else {
            below.iter().sum::<f64>() / below.len() as f64 - self.offset
        };
        // The denominator must stay strictly negative so normalization is
        // defined and grows as scores fall below the boundary.
        self.threshold = if spread < -f64::EPSILON { spread } else { -1.0 };
    }
}

fn check_finite(batch: &Array2<f64>) -> Result<(), DetectorError> {
    if batch.iter().any(|v| !v.is_finite()) {
        return Err(DetectorError::Computation(
            "non-finite value in feature batch".into(),
        ));
    }
    Ok(())
}

fn build_node(
    batch: &Array2<f64>,
    rows: &[usize],
    depth: usize,
    limit: usize,
    rng: &mut StdRng,
) -> Node {
    if rows.len() <= 1 || depth >= limit {
        return Node::Leaf { size: rows.len() };
    }

    // Split candidates are the columns with spread among this node's rows.
    let mut candidates = Vec::with_capacity(batch.ncols());
    for c in 0..batch.ncols() {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &r in rows {
            let v = batch[[r, c]];
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if hi > lo {
            candidates.push((c, lo, hi));
        }
    }
    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let value = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.iter().copied().partition(|&r| batch[[r, feature]] < value);

    Node::Split {
        feature,
        value,
        left: Box::new(build_node(batch, &left, depth + 1, limit, rng)),
        right: Box::new(build_node(batch, &right, depth + 1, limit, rng)),
    }
}

fn path_length(tree: &Node, row: ArrayView1<'_, f64>) -> f64 {
    let mut node = tree;
    let mut depth = 0.0;
    loop {
        match node {
            Node::Leaf { size } => return depth + average_path_length(*size),
            Node::Split {
                feature,
                value,
                left,
                right,
            } => {
                node = if row[*feature] < *value {
                    left.as_ref()
                } else {
                    right.as_ref()
                };
                depth += 1.0;
            }
        }
    }
}

/// c(n): expected path length of an unsuccessful BST search over n points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile (q in [0, 100]) over unsorted values.
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// A dense cluster near the origin plus a handful of far-out rows.
    fn clustered_batch(n_normal: usize, n_outliers: usize) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(7);
        let rows = n_normal + n_outliers;
        let mut batch = Array2::zeros((rows, 6));
        for r in 0..n_normal {
            for c in 0..6 {
                batch[[r, c]] = rng.gen_range(-1.0..1.0);
            }
        }
        for r in n_normal..rows {
            for c in 0..6 {
                batch[[r, c]] = rng.gen_range(6.0..8.0);
            }
        }
        batch
    }

    #[test]
    fn fit_succeeds_on_single_row() {
        let batch = Array2::zeros((1, 6));
        let forest = IsolationForest::fit(ForestParams::default(), &batch).unwrap();
        let scores = forest.score_samples(&batch).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores[0].is_finite());
        assert!(forest.threshold() < 0.0);
    }

    #[test]
    fn deterministic_under_fixed_seed() {
        let batch = clustered_batch(200, 20);
        let a = IsolationForest::fit(ForestParams::default(), &batch).unwrap();
        let b = IsolationForest::fit(ForestParams::default(), &batch).unwrap();
        assert_eq!(a.score_samples(&batch).unwrap(), b.score_samples(&batch).unwrap());
        assert_eq!(a.offset(), b.offset());
        assert_eq!(a.threshold(), b.threshold());
    }

    #[test]
    fn outliers_score_more_negative_than_cluster() {
        let batch = clustered_batch(300, 30);
        let forest = IsolationForest::fit(ForestParams::default(), &batch).unwrap();
        let scores = forest.score_samples(&batch).unwrap();
        let cluster_mean: f64 = scores[..300].iter().sum::<f64>() / 300.0;
        let outlier_mean: f64 = scores[300..].iter().sum::<f64>() / 30.0;
        assert!(
            outlier_mean < cluster_mean,
            "outliers {outlier_mean} vs cluster {cluster_mean}"
        );
    }

    #[test]
    fn predict_flags_roughly_the_contamination_fraction() {
        let batch = clustered_batch(270, 30);
        let forest = IsolationForest::fit(ForestParams::default(), &batch).unwrap();
        let flagged = forest
            .predict(&batch)
            .unwrap()
            .into_iter()
            .filter(|p| *p == -1)
            .count();
        assert!((15..=60).contains(&flagged), "flagged {flagged} of 300");
    }

    #[test]
    fn predict_agrees_with_score_sign_convention() {
        let batch = clustered_batch(100, 10);
        let forest = IsolationForest::fit(ForestParams::default(), &batch).unwrap();
        let scores = forest.score_samples(&batch).unwrap();
        let preds = forest.predict(&batch).unwrap();
        for (s, p) in scores.iter().zip(&preds) {
            assert_eq!(*p == -1, *s < forest.offset());
        }
    }

    #[test]
    fn non_finite_input_is_a_computation_error() {
        let mut batch = Array2::zeros((4, 6));
        batch[[2, 3]] = f64::NAN;
        let err = IsolationForest::fit(ForestParams::default(), &batch).unwrap_err();
        assert!(matches!(err, DetectorError::Computation(_)));
    }

    #[test]
    fn average_path_length_is_monotonic() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let mut prev = 1.0;
        for n in 3..64 {
            let c = average_path_length(n);
            assert!(c > prev);
            prev = c;
        }
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(percentile(&values, 0.0), 0.0);
        assert_eq!(percentile(&values, 100.0), 3.0);
        assert_eq!(percentile(&values, 50.0), 1.5);
    }
}
