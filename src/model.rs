//! Loaded model: booster, metadata, and objective.
//!
//! [`Model`] is the in-memory result of decoding a model file. It is
//! immutable once built and shared read-only by every prediction call.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::objective::Objective;
use crate::repr::gbdt::Forest;
use crate::repr::gblinear::LinearModel;

// =============================================================================
// Model
// =============================================================================

/// A trained gradient boosting model (inference-ready).
///
/// Contains:
/// - A booster (tree ensemble, DART ensemble, or linear model)
/// - Model metadata (feature count, base score, format version, attributes)
/// - Objective function (for output transformation)
#[derive(Debug, Clone)]
pub struct Model {
    booster: Booster,
    meta: ModelMeta,
    objective: Objective,
}

impl Model {
    /// Create a new model.
    pub fn new(booster: Booster, meta: ModelMeta, objective: Objective) -> Self {
        Self {
            booster,
            meta,
            objective,
        }
    }

    /// The ensemble.
    #[inline]
    pub fn booster(&self) -> &Booster {
        &self.booster
    }

    /// Model metadata.
    #[inline]
    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Objective used for transformed predictions.
    #[inline]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Number of features declared by the model.
    #[inline]
    pub fn num_features(&self) -> usize {
        self.meta.num_features
    }

    /// Number of output groups (1 for regression, K for K-class).
    #[inline]
    pub fn num_groups(&self) -> usize {
        self.booster.num_groups()
    }

    /// Effective base margin added to every group accumulator.
    #[inline]
    pub fn base_margin(&self) -> f64 {
        self.meta.base_margin
    }

    /// Summary suitable for logging or serialization.
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            booster: self.booster.kind(),
            objective: self.meta.objective_name.clone(),
            num_features: self.num_features(),
            num_groups: self.num_groups(),
            num_trees: self.booster.num_trees(),
            base_score: self.meta.base_score,
            base_margin: self.meta.base_margin,
            version: format!("{}.{}", self.meta.major_version, self.meta.minor_version),
            attributes: self.meta.attributes.iter().cloned().collect(),
            eval_metrics: self.meta.eval_metrics.clone(),
        }
    }
}

// =============================================================================
// Booster
// =============================================================================

/// The ensemble type.
#[derive(Debug, Clone)]
pub enum Booster {
    /// Standard tree ensemble (gbtree).
    Tree(Forest),

    /// DART: trees with per-tree weights applied during inference.
    Dart(Forest),

    /// Linear booster (gblinear).
    Linear(LinearModel),
}

impl Booster {
    /// Booster name as recorded in the model file.
    pub fn kind(&self) -> &'static str {
        match self {
            Booster::Tree(_) => "gbtree",
            Booster::Dart(_) => "dart",
            Booster::Linear(_) => "gblinear",
        }
    }

    /// The underlying forest, for tree boosters.
    pub fn forest(&self) -> Option<&Forest> {
        match self {
            Booster::Tree(f) | Booster::Dart(f) => Some(f),
            Booster::Linear(_) => None,
        }
    }

    /// Number of trees in the booster (0 for linear).
    pub fn num_trees(&self) -> usize {
        self.forest().map_or(0, Forest::n_trees)
    }

    /// Number of output groups.
    pub fn num_groups(&self) -> usize {
        match self {
            Booster::Tree(f) | Booster::Dart(f) => f.n_groups() as usize,
            Booster::Linear(l) => l.num_groups(),
        }
    }
}

// =============================================================================
// Model Metadata
// =============================================================================

/// Model metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelMeta {
    /// Number of input features.
    pub num_features: usize,

    /// Base score as stored in the file.
    pub base_score: f32,

    /// Base score in margin space (added to raw predictions).
    pub base_margin: f64,

    /// Objective name as stored in the file.
    pub objective_name: String,

    /// Toolkit version that wrote the file.
    pub major_version: u32,
    pub minor_version: u32,

    /// Learner attributes, in file order.
    pub attributes: Vec<(String, String)>,

    /// Evaluation metric names.
    pub eval_metrics: Vec<String>,

    /// `max_delta_step` recorded by `count:poisson` models.
    pub max_delta_step: Option<String>,
}

impl ModelMeta {
    /// Look up a learner attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Serializable model summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub booster: &'static str,
    pub objective: String,
    pub num_features: usize,
    pub num_groups: usize,
    pub num_trees: usize,
    pub base_score: f32,
    pub base_margin: f64,
    pub version: String,
    pub attributes: BTreeMap<String, String>,
    pub eval_metrics: Vec<String>,
}
