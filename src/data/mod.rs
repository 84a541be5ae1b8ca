//! Feature vector abstractions.
//!
//! This module provides the [`FeatureVector`] trait and the vectors the
//! predictor reads features from during tree traversal.
//!
//! # Storage Types
//!
//! - [`DenseFeatures`]: one value per feature index, NaN marks a missing value
//! - [`SparseFeatures`]: only present features are stored
//! - `[f32]` / `Vec<f32>`: plain slices behave like [`DenseFeatures`]
//!
//! # Missing Values
//!
//! A missing feature is `None` from [`FeatureVector::get`], never `Some(0.0)`.
//! Lookups past the end of a vector are missing rather than an error, so a
//! model can be evaluated against vectors from a narrower feature space.

mod dense;
mod sparse;
mod traits;

pub use dense::DenseFeatures;
pub use sparse::SparseFeatures;
pub use traits::FeatureVector;
