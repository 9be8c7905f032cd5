//! Per-column standardization. Statistics are fit over the training batch
//! and persisted with the model so scoring applies the same transform.

use super::FEATURE_DIM;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Column means and population standard deviations. Plain data so the
/// artifact can round-trip it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: [f64; FEATURE_DIM],
    pub std: [f64; FEATURE_DIM],
}

impl ScalerParams {
    /// Compute per-column mean and population standard deviation over a batch.
    pub fn fit(batch: &Array2<f64>) -> Self {
        let n = batch.nrows().max(1) as f64;
        let mut mean = [0.0; FEATURE_DIM];
        let mut std = [0.0; FEATURE_DIM];
        for c in 0..FEATURE_DIM {
            let col = batch.column(c);
            let m = col.sum() / n;
            let var = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            mean[c] = m;
            std[c] = var.sqrt();
        }
        Self { mean, std }
    }

    /// (value − mean)/std per column; a zero-variance column maps to 0.0.
    pub fn apply(&self, batch: &Array2<f64>) -> Array2<f64> {
        let mut out = batch.clone();
        for c in 0..FEATURE_DIM {
            let (m, s) = (self.mean[c], self.std[c]);
            for v in out.column_mut(c) {
                *v = if s == 0.0 { 0.0 } else { (*v - m) / s };
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn standardized_columns_have_zero_mean() {
        let batch = arr2(&[
            [1.0, 10.0, 5.0, 0.0, 2.0, 1.0],
            [3.0, 30.0, 5.0, 0.0, 4.0, 3.0],
        ]);
        let params = ScalerParams::fit(&batch);
        let scaled = params.apply(&batch);
        for c in 0..FEATURE_DIM {
            let sum: f64 = scaled.column(c).sum();
            assert!(sum.abs() < 1e-12, "column {c} mean not zero");
        }
    }

    #[test]
    fn zero_variance_column_maps_to_zero() {
        let batch = arr2(&[
            [1.0, 7.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 7.0, 0.0, 0.0, 0.0, 0.0],
        ]);
        let params = ScalerParams::fit(&batch);
        let scaled = params.apply(&batch);
        assert_eq!(scaled[[0, 1]], 0.0);
        assert_eq!(scaled[[1, 1]], 0.0);
    }

    #[test]
    fn persisted_params_transform_new_batches() {
        let train = arr2(&[
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 2.0, 2.0, 2.0, 2.0, 2.0],
        ]);
        let params = ScalerParams::fit(&train);
        let single = arr2(&[[4.0, 4.0, 4.0, 4.0, 4.0, 4.0]]);
        let scaled = params.apply(&single);
        // mean 1, std 1 per column → (4 − 1)/1.
        for c in 0..FEATURE_DIM {
            assert_eq!(scaled[[0, c]], 3.0);
        }
    }

    #[test]
    fn round_trips_through_serde() {
        let batch = arr2(&[
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            [2.0, 4.0, 6.0, 8.0, 10.0, 12.0],
        ]);
        let params = ScalerParams::fit(&batch);
        let json = serde_json::to_string(&params).unwrap();
        let back: ScalerParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
