//! High-level prediction facade.
//!
//! A [`Predictor`] owns one decoded [`Model`] and answers prediction queries
//! against it. It holds no mutable state and is `Send + Sync`, so a single
//! instance can be shared across threads without locking.
//!
//! # Example
//!
//! ```
//! use xgb_predictor::testing::{ModelBuilder, RawTree};
//! use xgb_predictor::{DenseFeatures, Predictor, SparseFeatures};
//!
//! let bytes = ModelBuilder::gbtree("binary:logistic")
//!     .num_feature(2)
//!     .tree(RawTree::new().split(1, 0.0, false, 1, 2).leaf(-1.0).leaf(1.0))
//!     .build();
//! let predictor = Predictor::from_bytes(&bytes).unwrap();
//!
//! let dense = DenseFeatures::new(vec![0.0, 2.5]);
//! let prob = predictor.predict_single(&dense).unwrap();
//! assert!(prob > 0.5);
//!
//! let sparse = SparseFeatures::from_pairs([(1, -3.0)]);
//! assert_eq!(predictor.predict_margin(&sparse), vec![-1.0]);
//! ```

use std::io::Read;

use rayon::prelude::*;
use tracing::debug;

use crate::compat::xgboost::{parse_model, read_model, LoadOptions};
use crate::config::PredictorConfig;
use crate::data::FeatureVector;
use crate::error::{FormatError, PredictError};
use crate::inference;
use crate::model::Model;
use crate::objective::{Objective, Transform};

/// Loaded model plus prediction entry points.
#[derive(Debug, Clone)]
pub struct Predictor {
    model: Model,
}

impl Predictor {
    /// Decode a model from a stream with default configuration.
    ///
    /// The stream is read to the end once; it is not retained.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FormatError> {
        Self::with_config(reader, PredictorConfig::default())
    }

    /// Decode a model from an in-memory buffer with default configuration.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        parse_model(bytes, &LoadOptions::default()).map(Self::from_model)
    }

    /// Decode a model from a stream, applying `config`.
    pub fn with_config<R: Read>(reader: R, config: PredictorConfig) -> Result<Self, FormatError> {
        let options = config.load_options()?;
        read_model(reader, &options).map(Self::from_model)
    }

    /// Wrap an already-built model.
    pub fn from_model(model: Model) -> Self {
        debug!(
            booster = model.booster().kind(),
            objective = %model.objective(),
            num_groups = model.num_groups(),
            num_trees = model.booster().num_trees(),
            "predictor ready"
        );
        Self { model }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[inline]
    pub fn objective(&self) -> Objective {
        self.model.objective()
    }

    #[inline]
    pub fn num_groups(&self) -> usize {
        self.model.num_groups()
    }

    #[inline]
    pub fn num_features(&self) -> usize {
        self.model.num_features()
    }

    // =========================================================================
    // Single row
    // =========================================================================

    /// Objective-transformed prediction over all trees.
    pub fn predict<F: FeatureVector + ?Sized>(&self, features: &F) -> Vec<f64> {
        let mut out = inference::evaluate(&self.model, features, None);
        self.objective().transform().apply(&mut out);
        out
    }

    /// Raw margin over all trees, one value per group.
    pub fn predict_margin<F: FeatureVector + ?Sized>(&self, features: &F) -> Vec<f64> {
        let mut out = inference::evaluate(&self.model, features, None);
        Transform::margin(self.num_groups()).apply(&mut out);
        out
    }

    /// Objective-transformed prediction using the first `limit` trees.
    ///
    /// `None` and `Some(0)` use every tree.
    pub fn predict_with_limit<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        limit: Option<usize>,
    ) -> Result<Vec<f64>, PredictError> {
        let mut out = inference::predict_margin(&self.model, features, limit)?;
        self.objective().transform().apply(&mut out);
        Ok(out)
    }

    /// Raw margin using the first `limit` trees.
    pub fn predict_margin_with_limit<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        limit: Option<usize>,
    ) -> Result<Vec<f64>, PredictError> {
        let mut out = inference::predict_margin(&self.model, features, limit)?;
        Transform::margin(self.num_groups()).apply(&mut out);
        Ok(out)
    }

    /// Leaf index reached in every tree.
    pub fn predict_leaf<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
    ) -> Result<Vec<u32>, PredictError> {
        inference::predict_leaf(&self.model, features, None)
    }

    /// Leaf index reached in each of the first `limit` trees.
    pub fn predict_leaf_with_limit<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        limit: Option<usize>,
    ) -> Result<Vec<u32>, PredictError> {
        inference::predict_leaf(&self.model, features, limit)
    }

    /// Transformed prediction for single-output models.
    pub fn predict_single<F: FeatureVector + ?Sized>(&self, features: &F) -> Result<f64, PredictError> {
        single(self.predict(features))
    }

    /// Raw margin for single-output models.
    pub fn predict_single_margin<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
    ) -> Result<f64, PredictError> {
        single(self.predict_margin(features))
    }

    // =========================================================================
    // Batch
    // =========================================================================

    /// Transformed predictions for many rows, in parallel.
    pub fn predict_batch<F: FeatureVector + Sync>(&self, rows: &[F]) -> Vec<Vec<f64>> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }

    /// Raw margins for many rows, in parallel.
    pub fn predict_margin_batch<F: FeatureVector + Sync>(&self, rows: &[F]) -> Vec<Vec<f64>> {
        rows.par_iter().map(|row| self.predict_margin(row)).collect()
    }
}

fn single(out: Vec<f64>) -> Result<f64, PredictError> {
    match out.as_slice() {
        [value] => Ok(*value),
        _ => Err(PredictError::NotSingleOutput(out.len())),
    }
}
