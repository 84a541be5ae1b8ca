//! External format compatibility loaders.
//!
//! Loaders decode models written by other toolkits and convert them to
//! native types.

pub mod xgboost;

pub use xgboost::{parse_model, read_model, LoadOptions};
