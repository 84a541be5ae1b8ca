//! Linear booster evaluation.
//!
//! ```text
//! output[g] = bias[g] + Σ(feature[f] × weight[f, g])   over present features
//! ```

use crate::data::FeatureVector;
use crate::repr::gblinear::LinearModel;

/// Per-group linear outputs, without the base margin.
pub fn accumulate<F: FeatureVector + ?Sized>(model: &LinearModel, features: &F) -> Vec<f64> {
    let mut sums: Vec<f64> = (0..model.num_groups())
        .map(|group| f64::from(model.bias(group)))
        .collect();

    for feat_idx in 0..model.num_features() {
        let Some(value) = features.get(feat_idx) else {
            continue;
        };
        let value = f64::from(value);
        for (group, sum) in sums.iter_mut().enumerate() {
            *sum += value * f64::from(model.weight(feat_idx, group));
        }
    }

    sums
}
