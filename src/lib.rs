//! xgb-predictor: scoring XGBoost legacy binary models in pure Rust.
//!
//! This crate decodes gradient-boosted models saved in the pre-JSON binary
//! layout (`gbtree`, `dart` and `gblinear` boosters) and evaluates them
//! against dense or sparse feature vectors, reproducing the training
//! toolkit's margins, probabilities, class indices and leaf indices.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::fs::File;
//! use xgb_predictor::{Predictor, SparseFeatures};
//!
//! let predictor = Predictor::from_reader(File::open("model.bin")?)?;
//! let features = SparseFeatures::from_pairs([(0, 1.0), (2, 3.0)]);
//! let prediction = predictor.predict(&features);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Structure
//!
//! - [`data`]: Feature vector abstraction (dense, sparse, slices)
//! - [`compat`]: Model file decoding
//! - [`repr`]: Tree and linear model representations
//! - [`inference`]: Ensemble evaluation
//! - [`objective`]: Output transforms
//! - [`testing`]: Assertion helpers and a binary model writer

pub mod compat;
pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod model;
pub mod objective;
pub mod predictor;
pub mod repr;
pub mod testing;

pub use config::PredictorConfig;
pub use data::{DenseFeatures, FeatureVector, SparseFeatures};
pub use error::{Error, FeatureError, FormatError, PredictError};
pub use model::{Booster, Model, ModelInfo, ModelMeta};
pub use objective::{Objective, Transform};
pub use predictor::Predictor;
