//! Linear model data structure.

/// Weight array length does not match `(num_features + 1) * num_groups`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightsLenMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl std::fmt::Display for WeightsLenMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "weights length {} doesn't match (num_features + 1) * num_groups = {}",
            self.actual, self.expected
        )
    }
}

impl std::error::Error for WeightsLenMismatch {}

/// Linear booster model (weights + bias).
///
/// Stores a weight matrix for linear prediction. The weights are laid out
/// in feature-major, group-minor order with bias in the last row:
///
/// ```text
/// weights[feature * num_groups + group] → coefficient
/// weights[num_features * num_groups + group] → bias
/// ```
///
/// # Example
///
/// ```
/// use xgb_predictor::repr::gblinear::LinearModel;
///
/// // 3 features, 2 output groups
/// let weights = vec![
///     0.1, 0.2,  // feature 0: group 0, group 1
///     0.3, 0.4,  // feature 1
///     0.5, 0.6,  // feature 2
///     0.0, 0.0,  // bias
/// ];
/// let model = LinearModel::new(weights, 3, 2).unwrap();
///
/// assert_eq!(model.weight(0, 0), 0.1);
/// assert_eq!(model.weight(0, 1), 0.2);
/// assert_eq!(model.bias(0), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    /// Flat weight array: (num_features + 1) × num_groups
    /// Layout: feature-major, group-minor. Last row is bias.
    weights: Box<[f32]>,

    /// Number of input features.
    num_features: usize,

    /// Number of output groups (1 for regression, K for K-class).
    num_groups: usize,
}

impl LinearModel {
    /// Create a new linear model from weights.
    ///
    /// `weights` must hold `(num_features + 1) * num_groups` values.
    pub fn new(
        weights: Vec<f32>,
        num_features: usize,
        num_groups: usize,
    ) -> Result<Self, WeightsLenMismatch> {
        let expected = (num_features + 1) * num_groups;
        if weights.len() != expected {
            return Err(WeightsLenMismatch {
                expected,
                actual: weights.len(),
            });
        }

        Ok(Self {
            weights: weights.into_boxed_slice(),
            num_features,
            num_groups,
        })
    }

    /// Number of input features.
    #[inline]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Number of output groups.
    #[inline]
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Get weight for a feature and group.
    #[inline]
    pub fn weight(&self, feature: usize, group: usize) -> f32 {
        debug_assert!(feature < self.num_features, "feature index out of bounds");
        debug_assert!(group < self.num_groups, "group index out of bounds");
        self.weights[feature * self.num_groups + group]
    }

    /// Get bias for a group.
    #[inline]
    pub fn bias(&self, group: usize) -> f32 {
        debug_assert!(group < self.num_groups, "group index out of bounds");
        self.weights[self.num_features * self.num_groups + group]
    }

    /// Raw access to weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}
