//! Shared fixtures for integration tests.
//!
//! Models are written in memory with [`ModelBuilder`], so every fixture is a
//! real byte stream that goes through the full decoder.
//! For assertion helpers, use `xgb_predictor::testing`.

#![allow(dead_code)]

#[allow(unused_imports)]
pub use xgb_predictor::assert_approx_eq;
#[allow(unused_imports)]
pub use xgb_predictor::testing::{assert_slice_approx_eq, DEFAULT_TOLERANCE};

use xgb_predictor::testing::{ModelBuilder, RawTree};
use xgb_predictor::Predictor;

/// Install a subscriber so `RUST_LOG=xgb_predictor=trace` shows decoder logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Fixtures
// =============================================================================

/// Two-tree regression model over three features, base score 0.5.
///
/// ```text
/// tree 0:  f0 < 0.5 (missing: left)
///            ├─ 0.1
///            └─ f2 < 2.0 (missing: right)
///                 ├─ 0.2
///                 └─ 0.3
/// tree 1:  f1 < 1.0 (missing: left)
///            ├─ -0.15
///            └─ 0.25
/// ```
pub fn regression_builder() -> ModelBuilder {
    ModelBuilder::gbtree("reg:linear")
        .num_feature(3)
        .base_score(0.5)
        .tree(
            RawTree::new()
                .split(0, 0.5, true, 1, 2)
                .leaf(0.1)
                .split(2, 2.0, false, 3, 4)
                .leaf(0.2)
                .leaf(0.3),
        )
        .tree(RawTree::new().split(1, 1.0, true, 1, 2).leaf(-0.15).leaf(0.25))
}

pub fn regression_bytes() -> Vec<u8> {
    regression_builder().build()
}

pub fn regression_predictor() -> Predictor {
    Predictor::from_bytes(&regression_bytes()).expect("regression fixture")
}

/// Three classes, three rounds: tree `r * 3 + g` splits on feature `g`.
///
/// Leaves are `±(r + 1) * 0.1 * (g + 1)`; the left leaf is taken when the
/// feature is below 0.0 or missing.
pub fn multiclass_builder(objective: &str) -> ModelBuilder {
    let mut builder = ModelBuilder::gbtree(objective)
        .num_feature(3)
        .num_class(3)
        .base_score(0.5);
    for round in 0..3 {
        for group in 0..3 {
            let magnitude = (round + 1) as f32 * 0.1 * (group + 1) as f32;
            let tree = RawTree::new()
                .split(group as u32, 0.0, true, 1, 2)
                .leaf(-magnitude)
                .leaf(magnitude);
            builder = builder.tree_in_group(tree, group);
        }
    }
    builder
}

pub fn multiclass_predictor() -> Predictor {
    Predictor::from_bytes(&multiclass_builder("multi:softprob").build()).expect("multiclass fixture")
}

/// Expected raw margin of [`multiclass_builder`] for group `g` with all rounds.
pub fn multiclass_margin(feature_positive: [bool; 3], group: usize) -> f64 {
    let sign = if feature_positive[group] { 1.0 } else { -1.0 };
    // 0.1 * (g+1) * (1 + 2 + 3), plus the softprob base margin of 0.5
    sign * 0.6 * (group + 1) as f64 + 0.5
}
