//! Inference for loaded models.
//!
//! This module provides the evaluation pipeline for both tree-based (GBDT)
//! and linear (GBLinear) boosters.
//!
//! # Module Structure
//!
//! - [`gbdt`]: Tree ensemble traversal and accumulation
//! - [`gblinear`]: Linear model evaluation
//!
//! The functions here dispatch on the model's booster and add the base
//! margin; output transforms are applied by the caller.

pub mod gbdt;
pub mod gblinear;

use crate::data::FeatureVector;
use crate::error::PredictError;
use crate::model::{Booster, Model};

/// Raw per-group margins, base margin included.
///
/// Linear boosters have no trees, so `limit` is ignored for them; use
/// [`predict_margin`] to have such a limit rejected.
pub fn evaluate<F: FeatureVector + ?Sized>(
    model: &Model,
    features: &F,
    limit: Option<usize>,
) -> Vec<f64> {
    let mut sums = match model.booster() {
        Booster::Tree(forest) | Booster::Dart(forest) => gbdt::accumulate(forest, features, limit),
        Booster::Linear(linear) => gblinear::accumulate(linear, features),
    };

    let base_margin = model.base_margin();
    for sum in &mut sums {
        *sum += base_margin;
    }
    sums
}

/// Raw per-group margins, base margin included.
///
/// Linear boosters accept only `None` or `Some(0)` as a tree limit.
pub fn predict_margin<F: FeatureVector + ?Sized>(
    model: &Model,
    features: &F,
    limit: Option<usize>,
) -> Result<Vec<f64>, PredictError> {
    if let Booster::Linear(_) = model.booster() {
        if let Some(k) = limit.filter(|&k| k > 0) {
            return Err(PredictError::TreeLimitUnsupported(k));
        }
    }
    Ok(evaluate(model, features, limit))
}

/// Leaf index reached in each evaluated tree.
pub fn predict_leaf<F: FeatureVector + ?Sized>(
    model: &Model,
    features: &F,
    limit: Option<usize>,
) -> Result<Vec<u32>, PredictError> {
    match model.booster() {
        Booster::Tree(forest) | Booster::Dart(forest) => {
            Ok(gbdt::leaf_indices(forest, features, limit))
        }
        Booster::Linear(_) => Err(PredictError::LeafUnsupported),
    }
}
