//! Objective functions and output transformations.
//!
//! The [`Objective`] enum names the loss the model was trained with, as
//! recorded in the model file. Each objective maps to a [`Transform`] that
//! turns raw per-group margins into final predictions. For example, binary
//! classification uses sigmoid to convert logits to probabilities.
//!
//! Prediction entry points pick the transform explicitly: margin queries use
//! [`Transform::margin`] regardless of the objective, probability queries use
//! [`Objective::transform`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Output transformation applied to the per-group accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Single-output raw value, unchanged.
    Identity,
    /// Sigmoid: `1 / (1 + e^-x)`.
    Logistic,
    /// Softmax across groups, max-subtracted for stability.
    Softmax,
    /// Multi-output raw values, unchanged.
    MultiMargin,
    /// `e^x` per value (count and survival objectives).
    Exp,
    /// Index of the largest group value, as a single output.
    ArgMax,
}

impl Transform {
    /// Transform for raw margin queries on a model with `num_groups` outputs.
    #[inline]
    pub fn margin(num_groups: usize) -> Self {
        if num_groups > 1 {
            Self::MultiMargin
        } else {
            Self::Identity
        }
    }

    /// Apply the transformation to one row of group values in place.
    ///
    /// [`ArgMax`](Self::ArgMax) shrinks the row to a single value.
    pub fn apply(&self, values: &mut Vec<f64>) {
        match self {
            Self::Identity | Self::MultiMargin => {}
            Self::Logistic => {
                for val in values.iter_mut() {
                    *val = sigmoid(*val);
                }
            }
            Self::Exp => {
                for val in values.iter_mut() {
                    *val = val.exp();
                }
            }
            Self::Softmax => softmax_inplace(values),
            Self::ArgMax => {
                if !values.is_empty() {
                    let class_idx = argmax(values);
                    values.clear();
                    values.push(class_idx as f64);
                }
            }
        }
    }
}

/// Objective function recorded in a model.
///
/// Determines how raw model output is transformed for final predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Objective {
    // --- Regression ---
    /// Squared error loss (no transformation). Also `reg:linear`.
    #[default]
    SquaredError,

    /// Squared log error (no transformation).
    SquaredLogError,

    /// Pseudo-Huber error (no transformation).
    PseudoHuberError,

    /// Absolute error loss (no transformation).
    AbsoluteError,

    /// Logistic regression (sigmoid transform).
    RegLogistic,

    /// Tweedie regression (exp transform).
    Tweedie,

    /// Gamma regression (exp transform).
    Gamma,

    /// Poisson regression (exp transform).
    Poisson,

    // --- Binary Classification ---
    /// Binary logistic (sigmoid transform).
    BinaryLogistic,

    /// Binary logit raw (no transformation, return logits).
    BinaryLogitRaw,

    // --- Multiclass Classification ---
    /// Multiclass softmax (returns class index, not probabilities).
    MultiSoftmax,

    /// Multiclass softprob (softmax transform, returns probabilities).
    MultiSoftprob,

    // --- Ranking ---
    /// Pairwise ranking.
    RankPairwise,

    /// NDCG ranking.
    RankNdcg,

    /// MAP ranking.
    RankMap,

    // --- Survival ---
    /// Cox proportional hazards (exp transform).
    SurvivalCox,
}

impl Objective {
    /// Look up an objective by its toolkit name (e.g. `"binary:logistic"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let objective = match name {
            "reg:squarederror" | "reg:linear" => Self::SquaredError,
            "reg:squaredlogerror" => Self::SquaredLogError,
            "reg:pseudohubererror" => Self::PseudoHuberError,
            "reg:absoluteerror" => Self::AbsoluteError,
            "reg:logistic" => Self::RegLogistic,
            "reg:tweedie" => Self::Tweedie,
            "reg:gamma" => Self::Gamma,
            "count:poisson" => Self::Poisson,
            "binary:logistic" => Self::BinaryLogistic,
            "binary:logitraw" => Self::BinaryLogitRaw,
            "multi:softmax" => Self::MultiSoftmax,
            "multi:softprob" => Self::MultiSoftprob,
            "rank:pairwise" => Self::RankPairwise,
            "rank:ndcg" => Self::RankNdcg,
            "rank:map" => Self::RankMap,
            "survival:cox" => Self::SurvivalCox,
            _ => return None,
        };
        Some(objective)
    }

    /// Canonical toolkit name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SquaredError => "reg:squarederror",
            Self::SquaredLogError => "reg:squaredlogerror",
            Self::PseudoHuberError => "reg:pseudohubererror",
            Self::AbsoluteError => "reg:absoluteerror",
            Self::RegLogistic => "reg:logistic",
            Self::Tweedie => "reg:tweedie",
            Self::Gamma => "reg:gamma",
            Self::Poisson => "count:poisson",
            Self::BinaryLogistic => "binary:logistic",
            Self::BinaryLogitRaw => "binary:logitraw",
            Self::MultiSoftmax => "multi:softmax",
            Self::MultiSoftprob => "multi:softprob",
            Self::RankPairwise => "rank:pairwise",
            Self::RankNdcg => "rank:ndcg",
            Self::RankMap => "rank:map",
            Self::SurvivalCox => "survival:cox",
        }
    }

    /// Transform producing this objective's final predictions.
    pub fn transform(&self) -> Transform {
        match self {
            Self::SquaredError
            | Self::SquaredLogError
            | Self::PseudoHuberError
            | Self::AbsoluteError
            | Self::BinaryLogitRaw
            | Self::RankPairwise
            | Self::RankNdcg
            | Self::RankMap => Transform::Identity,

            Self::BinaryLogistic | Self::RegLogistic => Transform::Logistic,

            Self::Gamma | Self::Poisson | Self::Tweedie | Self::SurvivalCox => Transform::Exp,

            Self::MultiSoftprob => Transform::Softmax,

            Self::MultiSoftmax => Transform::ArgMax,
        }
    }

    /// Convert a base score from prediction space to margin space.
    ///
    /// Models written by toolkit 1.0 and later store the base score as a
    /// prediction (e.g. a probability); older models store the margin.
    pub fn prob_to_margin(&self, base_score: f32) -> f64 {
        let p = f64::from(base_score);
        match self.transform() {
            Transform::Logistic => -(1.0 / p - 1.0).ln(),
            Transform::Exp => p.ln(),
            _ => p,
        }
    }

    /// Whether this objective produces probabilities.
    pub fn produces_probabilities(&self) -> bool {
        matches!(self.transform(), Transform::Logistic | Transform::Softmax)
    }

    /// Whether this objective produces class indices.
    pub fn produces_class_indices(&self) -> bool {
        matches!(self, Self::MultiSoftmax)
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Objective {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| FormatError::UnknownObjective(s.to_string()))
    }
}

// =============================================================================
// Transform functions
// =============================================================================

/// Sigmoid function: 1 / (1 + exp(-x))
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Softmax in-place over a slice.
pub fn softmax_inplace(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }

    // Find max for numerical stability
    let max_val = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Compute exp(x - max) and sum
    let mut sum = 0.0f64;
    for val in values.iter_mut() {
        *val = (*val - max_val).exp();
        sum += *val;
    }

    // Normalize
    if sum > 0.0 {
        for val in values.iter_mut() {
            *val /= sum;
        }
    }
}

/// Argmax: index of the first maximum value.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = idx;
        }
    }
    best
}
