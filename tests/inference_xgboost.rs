//! XGBoost inference tests: model decoding and prediction end to end.
//!
//! Test cases organized by booster type:
//! - gbtree: regression, binary, multiclass, leaf vectors
//! - dart: weighted trees
//! - gblinear: linear models

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use rstest::rstest;

use xgb_predictor::testing::{ModelBuilder, RawTree};
use xgb_predictor::{
    DenseFeatures, FeatureVector, Objective, PredictError, Predictor, SparseFeatures,
};

use common::{
    assert_slice_approx_eq, init_tracing, multiclass_builder, multiclass_margin,
    multiclass_predictor, regression_bytes, regression_predictor, DEFAULT_TOLERANCE,
};

// =============================================================================
// GBTree regression
// =============================================================================

#[test]
fn regression_sparse_scenario() {
    init_tracing();
    let predictor = regression_predictor();
    let features = SparseFeatures::from_map(HashMap::from([(0, 1.0), (2, 3.0)]));

    // tree 0: f0=1.0 goes right, f2=3.0 goes right -> 0.3
    // tree 1: f1 missing goes left -> -0.15
    let expected = 0.3 - 0.15 + 0.5;
    let out = predictor.predict(&features);
    assert_slice_approx_eq(&out, &[expected], DEFAULT_TOLERANCE, "predict");
    assert_slice_approx_eq(
        &predictor.predict_margin(&features),
        &[expected],
        DEFAULT_TOLERANCE,
        "margin",
    );
    assert_eq!(predictor.predict_leaf(&features).unwrap(), vec![4, 1]);
}

#[test]
fn regression_accessors() {
    let predictor = regression_predictor();
    assert_eq!(predictor.num_groups(), 1);
    assert_eq!(predictor.num_features(), 3);
    assert_eq!(predictor.objective(), Objective::SquaredError);
    assert_eq!(predictor.model().booster().num_trees(), 2);
}

#[test]
fn from_reader_matches_from_bytes() {
    let bytes = regression_bytes();
    let a = Predictor::from_bytes(&bytes).unwrap();
    let b = Predictor::from_reader(bytes.as_slice()).unwrap();
    let fv = [0.2f32, 3.0, 1.0];
    assert_eq!(a.predict(&fv[..]), b.predict(&fv[..]));
}

#[rstest]
#[case(Some(1), 0.3 + 0.5)]
#[case(Some(2), 0.3 - 0.15 + 0.5)]
#[case(Some(0), 0.3 - 0.15 + 0.5)]
#[case(Some(10), 0.3 - 0.15 + 0.5)]
#[case(None, 0.3 - 0.15 + 0.5)]
fn regression_tree_limit(#[case] limit: Option<usize>, #[case] expected: f64) {
    let predictor = regression_predictor();
    let fv = SparseFeatures::from_pairs([(0, 1.0), (2, 3.0)]);
    let out = predictor.predict_margin_with_limit(&fv, limit).unwrap();
    assert_abs_diff_eq!(out[0], expected, epsilon = DEFAULT_TOLERANCE);
}

#[test]
fn leaf_limit() {
    let predictor = regression_predictor();
    let fv = [0.0f32, 5.0, 0.0];
    assert_eq!(predictor.predict_leaf_with_limit(&fv[..], Some(1)).unwrap(), vec![1]);
    assert_eq!(predictor.predict_leaf(&fv[..]).unwrap(), vec![1, 2]);
}

// =============================================================================
// Missing values
// =============================================================================

#[rstest]
#[case::all_missing(vec![f32::NAN, f32::NAN, f32::NAN])]
#[case::one_present(vec![1.0, f32::NAN, f32::NAN])]
#[case::mixed(vec![f32::NAN, 2.0, 0.5])]
fn absent_sparse_key_routes_like_nan(#[case] dense: Vec<f32>) {
    let predictor = regression_predictor();
    let sparse = SparseFeatures::from_pairs(
        dense
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, &v)| (i, v)),
    );
    let dense = DenseFeatures::new(dense);
    assert_eq!(predictor.predict(&dense), predictor.predict(&sparse));
    assert_eq!(
        predictor.predict_leaf(&dense).unwrap(),
        predictor.predict_leaf(&sparse).unwrap()
    );
}

#[test]
fn zero_is_not_missing_unless_asked() {
    let predictor = regression_predictor();
    // f0 = 0.0 < 0.5 goes left; f1 = 0.0 < 1.0 goes left
    let present = DenseFeatures::new(vec![0.0, 0.0, 0.0]);
    // every feature missing: tree 0 defaults left, tree 1 defaults left
    let missing = DenseFeatures::zero_as_missing(vec![0.0, 0.0, 0.0]);
    assert_eq!(predictor.predict_leaf(&present).unwrap(), vec![1, 1]);
    assert_eq!(predictor.predict_leaf(&missing).unwrap(), vec![1, 1]);

    // f2 = 0.0 < 2.0 goes left when present, right (default) when missing
    let present = DenseFeatures::new(vec![1.0, 0.0, 0.0]);
    let missing = DenseFeatures::zero_as_missing(vec![1.0, 0.0, 0.0]);
    assert_eq!(predictor.predict_leaf(&present).unwrap()[0], 3);
    assert_eq!(predictor.predict_leaf(&missing).unwrap()[0], 4);
}

#[test]
fn short_vectors_read_as_missing() {
    let predictor = regression_predictor();
    let short = [1.0f32];
    let padded = [1.0f32, f32::NAN, f32::NAN];
    assert_eq!(predictor.predict(&short[..]), predictor.predict(&padded[..]));
}

// =============================================================================
// Binary classification
// =============================================================================

#[test]
fn binary_logistic_probability() {
    let bytes = ModelBuilder::gbtree("binary:logistic")
        .num_feature(1)
        .base_score(0.5)
        .tree(RawTree::new().split(0, 0.0, false, 1, 2).leaf(-0.4).leaf(0.8))
        .build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();

    let positive = predictor.predict_single(&[1.0f32][..]).unwrap();
    let margin = predictor.predict_single_margin(&[1.0f32][..]).unwrap();
    assert_abs_diff_eq!(margin, 0.8, epsilon = DEFAULT_TOLERANCE);
    assert_abs_diff_eq!(positive, 1.0 / (1.0 + (-0.8f64).exp()), epsilon = DEFAULT_TOLERANCE);

    // missing goes right (default_left = false)
    let missing = SparseFeatures::new();
    assert_abs_diff_eq!(
        predictor.predict_single(&missing).unwrap(),
        positive,
        epsilon = 1e-12
    );
}

// =============================================================================
// Multiclass
// =============================================================================

#[test]
fn multiclass_softprob() {
    let predictor = multiclass_predictor();
    assert_eq!(predictor.num_groups(), 3);

    let fv = DenseFeatures::new(vec![1.0, -1.0, 1.0]);
    let probs = predictor.predict(&fv);
    assert_eq!(probs.len(), 3);
    assert_abs_diff_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = DEFAULT_TOLERANCE);

    let margins = predictor.predict_margin(&fv);
    let positive = [true, false, true];
    for (group, &m) in margins.iter().enumerate() {
        assert_abs_diff_eq!(m, multiclass_margin(positive, group), epsilon = DEFAULT_TOLERANCE);
    }
    assert!(probs[2] > probs[0] && probs[0] > probs[1]);

    let leaves = predictor.predict_leaf(&fv).unwrap();
    assert_eq!(leaves, vec![2, 1, 2, 2, 1, 2, 2, 1, 2]);
}

#[test]
fn multiclass_limit_counts_trees_not_rounds() {
    let predictor = multiclass_predictor();
    let fv = DenseFeatures::new(vec![1.0, 1.0, 1.0]);

    // first four trees: round 0 for every class plus round 1 of class 0
    let out = predictor.predict_margin_with_limit(&fv, Some(4)).unwrap();
    let expected = [0.1 + 0.2 + 0.5, 0.2 + 0.5, 0.3 + 0.5];
    assert_slice_approx_eq(&out, &expected, DEFAULT_TOLERANCE, "limit 4");
    assert_eq!(predictor.predict_leaf_with_limit(&fv, Some(4)).unwrap().len(), 4);
}

#[test]
fn multiclass_softmax_returns_class() {
    let bytes = multiclass_builder("multi:softmax").build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();
    let fv = DenseFeatures::new(vec![1.0, 1.0, -1.0]);
    assert_eq!(predictor.predict(&fv), vec![1.0]);
    assert_eq!(predictor.predict_single(&fv), Ok(1.0));
    assert_eq!(predictor.predict_margin(&fv).len(), 3);
}

#[test]
fn vector_leaves() {
    let bytes = ModelBuilder::gbtree("multi:softprob")
        .num_feature(1)
        .num_class(2)
        .base_score(0.0)
        .size_leaf_vector(2)
        .tree(
            RawTree::new()
                .split(0, 0.5, true, 1, 2)
                .leaf(0.0)
                .leaf(0.0)
                .leaf_vector(2, vec![0.0, 0.0, 1.0, -1.0, -2.0, 2.0]),
        )
        .build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();
    let margins = predictor.predict_margin(&[0.0f32][..]);
    assert_slice_approx_eq(&margins, &[1.0, -1.0], 1e-12, "left leaf");
    let margins = predictor.predict_margin(&[1.0f32][..]);
    assert_slice_approx_eq(&margins, &[-2.0, 2.0], 1e-12, "right leaf");
}

// =============================================================================
// DART
// =============================================================================

#[test]
fn dart_weights_scale_trees() {
    let bytes = ModelBuilder::dart("reg:squarederror")
        .num_feature(1)
        .base_score(0.0)
        .tree(RawTree::stump(2.0))
        .tree(RawTree::stump(4.0))
        .weight_drop(vec![0.5, 0.25])
        .build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();
    assert_eq!(predictor.model().booster().kind(), "dart");
    assert_abs_diff_eq!(predictor.predict_single(&[0.0f32][..]).unwrap(), 2.0);
    assert_abs_diff_eq!(
        predictor
            .predict_margin_with_limit(&[0.0f32][..], Some(1))
            .unwrap()[0],
        1.0
    );
}

#[test]
fn dart_without_trees_has_no_weights() {
    let bytes = ModelBuilder::dart("reg:squarederror").base_score(0.25).build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();
    assert_eq!(predictor.predict(&[0.0f32][..]), vec![0.25]);
}

// =============================================================================
// GBLinear
// =============================================================================

#[test]
fn linear_regression() {
    // y = 0.5*x0 - 2*x1 + 0.1, base score 0.5
    let bytes = ModelBuilder::gblinear("reg:squarederror", 2, 1, vec![0.5, -2.0, 0.1])
        .base_score(0.5)
        .build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();

    let out = predictor.predict_single(&[2.0f32, 1.0][..]).unwrap();
    assert_abs_diff_eq!(out, 1.0 - 2.0 + 0.1 + 0.5, epsilon = DEFAULT_TOLERANCE);

    let sparse = SparseFeatures::from_pairs([(1, 1.0)]);
    assert_abs_diff_eq!(
        predictor.predict_single(&sparse).unwrap(),
        -2.0 + 0.1 + 0.5,
        epsilon = DEFAULT_TOLERANCE
    );
}

#[test]
fn linear_multiclass() {
    let weights = vec![
        1.0, 0.0, -1.0, // feature 0
        0.0, 0.0, 0.0, // bias
    ];
    let bytes = ModelBuilder::gblinear("multi:softprob", 1, 3, weights)
        .num_class(3)
        .base_score(0.0)
        .build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();
    assert_eq!(predictor.num_groups(), 3);
    let probs = predictor.predict(&[2.0f32][..]);
    assert_abs_diff_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = DEFAULT_TOLERANCE);
    assert!(probs[0] > probs[1] && probs[1] > probs[2]);
}

#[test]
fn linear_rejects_tree_queries() {
    let bytes = ModelBuilder::gblinear("reg:squarederror", 1, 1, vec![1.0, 0.0]).build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();
    let fv = [1.0f32];
    assert_eq!(
        predictor.predict_with_limit(&fv[..], Some(2)),
        Err(PredictError::TreeLimitUnsupported(2))
    );
    assert_eq!(predictor.predict_leaf(&fv[..]), Err(PredictError::LeafUnsupported));
    assert!(predictor.predict_with_limit(&fv[..], None).is_ok());
}

// =============================================================================
// Base score
// =============================================================================

#[rstest]
#[case::legacy_logistic("binary:logistic", 0, 0.5, 0.5)]
#[case::modern_logistic("binary:logistic", 1, 0.5, 0.0)]
#[case::modern_logistic_skewed("binary:logistic", 2, 0.8, (0.8f64 / 0.2).ln())]
#[case::modern_poisson("count:poisson", 1, 2.0, 2.0f64.ln())]
#[case::modern_identity("reg:squarederror", 1, 0.5, 0.5)]
fn base_margin_by_version(
    #[case] objective: &str,
    #[case] major: u32,
    #[case] base_score: f32,
    #[case] expected: f64,
) {
    let bytes = ModelBuilder::gbtree(objective)
        .version(major, 0)
        .base_score(base_score)
        .build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();
    assert_abs_diff_eq!(predictor.model().base_margin(), expected, epsilon = 1e-6);
    assert_abs_diff_eq!(
        predictor.predict_margin(&[0.0f32][..])[0],
        expected,
        epsilon = 1e-6
    );
}

// =============================================================================
// Metadata
// =============================================================================

#[test]
fn attributes_are_exposed() {
    let bytes = ModelBuilder::gbtree("count:poisson")
        .binf(true)
        .attribute("best_iteration", "41")
        .attribute("best_score", "0.12")
        .max_delta_step("0.7")
        .eval_metric("poisson-nloglik")
        .tree(RawTree::stump(0.1))
        .build();
    let predictor = Predictor::from_bytes(&bytes).unwrap();
    let meta = predictor.model().meta();
    assert_eq!(meta.attribute("best_iteration"), Some("41"));
    assert_eq!(meta.max_delta_step.as_deref(), Some("0.7"));

    let info = predictor.model().info();
    assert_eq!(info.booster, "gbtree");
    assert_eq!(info.objective, "count:poisson");
    assert_eq!(info.attributes.len(), 2);
    assert_eq!(info.eval_metrics, vec!["poisson-nloglik".to_string()]);
}

// =============================================================================
// Determinism & concurrency
// =============================================================================

#[test]
fn predictions_are_deterministic() {
    let predictor = multiclass_predictor();
    let fv = SparseFeatures::from_pairs([(0, 0.3), (2, -4.0)]);
    let first = predictor.predict(&fv);
    for _ in 0..100 {
        assert_eq!(predictor.predict(&fv), first);
    }
}

#[test]
fn shared_across_threads() {
    let predictor = Arc::new(multiclass_predictor());
    let fv = vec![0.5f32, -0.5, 0.5];
    let expected = predictor.predict(&fv);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let predictor = Arc::clone(&predictor);
            let fv = fv.clone();
            std::thread::spawn(move || predictor.predict(&fv))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn batch_prediction() {
    let predictor = multiclass_predictor();
    let rows: Vec<DenseFeatures> = (0..100)
        .map(|i| {
            let x = i as f32 / 50.0 - 1.0;
            DenseFeatures::new(vec![x, -x, x * 0.5])
        })
        .collect();
    let batch = predictor.predict_batch(&rows);
    assert_eq!(batch.len(), rows.len());
    for (row, out) in rows.iter().zip(&batch) {
        assert_eq!(out, &predictor.predict(row));
    }

    let margins = predictor.predict_margin_batch(&rows);
    assert_eq!(margins[0], predictor.predict_margin(&rows[0]));
}

#[test]
fn signed_lookup_rejects_negative_index() {
    let fv = DenseFeatures::new(vec![1.0]);
    assert!(fv.get_checked(-1).is_err());
    assert_eq!(fv.get_checked(0), Ok(Some(1.0)));
    assert!(SparseFeatures::with_origin([(0, 1.0)], 1).is_err());
}
