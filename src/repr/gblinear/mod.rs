//! Gradient-boosted linear (GBLinear) canonical representations.
//!
//! # Weight Layout
//!
//! The weight matrix is stored as a flat array in feature-major, group-minor
//! order, the same order the toolkit serializes it in:
//!
//! ```text
//! weights[feature * num_groups + group] → coefficient
//! weights[num_features * num_groups + group] → bias
//! ```
//!
//! # Example
//!
//! ```
//! use xgb_predictor::repr::gblinear::LinearModel;
//!
//! // y = 0.5*x0 + 0.3*x1 + 0.1
//! let model = LinearModel::new(vec![0.5, 0.3, 0.1], 2, 1).unwrap();
//!
//! assert_eq!(model.weight(0, 0), 0.5);
//! assert_eq!(model.weight(1, 0), 0.3);
//! assert_eq!(model.bias(0), 0.1);
//! ```

mod model;

pub use model::{LinearModel, WeightsLenMismatch};
