//! Error types.
//!
//! Three failure domains exist and each has its own enum:
//!
//! - [`FormatError`]: the model bytes could not be turned into a [`Model`].
//!   Fatal; no partially-built model ever escapes.
//! - [`FeatureError`]: a caller asked for a negative feature index.
//! - [`PredictError`]: a prediction mode the loaded booster cannot serve.
//!
//! [`Error`] wraps all three for callers that do not care which one occurred.
//!
//! [`Model`]: crate::Model

use thiserror::Error;

/// Errors raised while decoding a serialized model.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Input ended before `what` could be read.
    #[error("model truncated while reading {what}")]
    Truncated { what: &'static str },

    /// Underlying reader failed for a reason other than end-of-input.
    #[error("I/O error while reading model: {0}")]
    Io(#[from] std::io::Error),

    /// Model was written by a newer toolkit than this reader understands.
    #[error("unsupported model version {major}.{minor}")]
    UnsupportedVersion { major: u32, minor: u32 },

    /// Booster name is not one of `gbtree`, `dart`, `gblinear`.
    #[error("unknown booster `{0}`")]
    UnknownBooster(String),

    /// Objective name has no known output transform.
    #[error("unknown objective `{0}`")]
    UnknownObjective(String),

    /// A length-prefixed string was oversized or not UTF-8.
    #[error("invalid string for {what}: {reason}")]
    InvalidString {
        what: &'static str,
        reason: String,
    },

    /// A count field held a negative or implausibly large value.
    #[error("invalid {what}: {value}")]
    InvalidCount { what: &'static str, value: i64 },

    /// A node references a child outside its tree, or the node graph is not a tree.
    #[error("invalid node {node} in tree {tree}: {reason}")]
    InvalidNode {
        tree: usize,
        node: usize,
        reason: String,
    },

    /// A tree is assigned to an output group the model does not have.
    #[error("tree {tree} assigned to group {group}, but model has {num_groups} groups")]
    InvalidGroup {
        tree: usize,
        group: i32,
        num_groups: usize,
    },

    /// A vector field does not have the length implied by the header.
    #[error("{what} has length {actual}, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Bytes remained after the model when strict trailer checking is on.
    #[error("{0} unexpected trailing bytes after model")]
    TrailingBytes(usize),
}

/// Errors raised by feature lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    /// Feature indices are zero-based and non-negative.
    #[error("invalid feature index {0}: indices must be non-negative")]
    InvalidFeatureIndex(i64),
}

/// Errors raised by prediction calls the booster cannot serve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    /// Linear boosters have no trees to limit.
    #[error("tree limit {0} requested, but a linear booster has no trees")]
    TreeLimitUnsupported(usize),

    /// Linear boosters have no leaves.
    #[error("leaf index prediction requires a tree booster")]
    LeafUnsupported,

    /// `predict_single` was called on a model with a wider output.
    #[error("expected a single output value, model produces {0}")]
    NotSingleOutput(usize),
}

/// Umbrella error for callers that handle every failure the same way.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Predict(#[from] PredictError),
}
