//! Sparse feature vector.

use std::collections::HashMap;

use super::traits::FeatureVector;
use crate::error::FeatureError;

/// Sparse feature storage: only present features are stored.
///
/// Any index without an entry is missing. NaN values passed in are dropped at
/// construction, so a stored entry is always a present value.
///
/// # Example
///
/// ```
/// use xgb_predictor::data::{FeatureVector, SparseFeatures};
///
/// let fv = SparseFeatures::from_pairs([(0, 1.0), (2, 3.0)]);
/// assert_eq!(fv.get(0), Some(1.0));
/// assert_eq!(fv.get(1), None);
/// assert_eq!(fv.get(2), Some(3.0));
///
/// // One-based input, e.g. from a LibSVM line "1:1.0 3:3.0"
/// let fv = SparseFeatures::with_origin([(1, 1.0), (3, 3.0)], 1).unwrap();
/// assert_eq!(fv.get(2), Some(3.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseFeatures {
    values: HashMap<usize, f32>,
}

impl SparseFeatures {
    /// Create an empty vector (every feature missing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an index to value map.
    pub fn from_map(values: HashMap<usize, f32>) -> Self {
        Self::from_pairs(values)
    }

    /// Create from `(index, value)` pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, f32)>) -> Self {
        let values = pairs.into_iter().filter(|(_, v)| !v.is_nan()).collect();
        Self { values }
    }

    /// Create from signed external indices, subtracting `origin` from each.
    ///
    /// Use `origin = 1` for one-based formats. Fails with
    /// [`FeatureError::InvalidFeatureIndex`] if any translated index is negative
    /// or the subtraction overflows.
    pub fn with_origin(
        pairs: impl IntoIterator<Item = (i64, f32)>,
        origin: i64,
    ) -> Result<Self, FeatureError> {
        let mut values = HashMap::new();
        for (index, value) in pairs {
            let shifted = index
                .checked_sub(origin)
                .ok_or(FeatureError::InvalidFeatureIndex(index))?;
            let shifted =
                usize::try_from(shifted).map_err(|_| FeatureError::InvalidFeatureIndex(shifted))?;
            if !value.is_nan() {
                values.insert(shifted, value);
            }
        }
        Ok(Self { values })
    }

    /// Number of present features.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over present `(index, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.values.iter().map(|(&i, &v)| (i, v))
    }
}

impl FeatureVector for SparseFeatures {
    #[inline]
    fn get(&self, index: usize) -> Option<f32> {
        self.values.get(&index).copied()
    }
}

impl FromIterator<(usize, f32)> for SparseFeatures {
    fn from_iter<I: IntoIterator<Item = (usize, f32)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
