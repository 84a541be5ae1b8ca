//! Dense feature vector.

use super::traits::FeatureVector;

/// Dense feature storage: position is the feature index.
///
/// NaN marks a missing value. Vectors built with
/// [`zero_as_missing`](Self::zero_as_missing) additionally treat `0.0` as
/// missing, which matches inputs exported from sparse formats where absent
/// entries were filled with zeros.
///
/// # Example
///
/// ```
/// use xgb_predictor::data::{DenseFeatures, FeatureVector};
///
/// let fv = DenseFeatures::new(vec![1.0, f32::NAN, 0.0]);
/// assert_eq!(fv.get(0), Some(1.0));
/// assert_eq!(fv.get(1), None);
/// assert_eq!(fv.get(2), Some(0.0));
/// assert_eq!(fv.get(3), None);
///
/// let fv = DenseFeatures::zero_as_missing(vec![1.0, 0.0]);
/// assert_eq!(fv.get(1), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DenseFeatures {
    values: Box<[f32]>,
    zero_as_missing: bool,
}

impl DenseFeatures {
    /// Create a dense vector; NaN entries are missing.
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        Self {
            values: values.into().into_boxed_slice(),
            zero_as_missing: false,
        }
    }

    /// Create a dense vector where both NaN and `0.0` are missing.
    pub fn zero_as_missing(values: impl Into<Vec<f32>>) -> Self {
        Self {
            values: values.into().into_boxed_slice(),
            zero_as_missing: true,
        }
    }

    /// Create a dense vector from `f64` values, narrowing to `f32`.
    ///
    /// Split thresholds are stored as `f32`, so features are compared at
    /// that precision regardless of the input type.
    pub fn from_f64(values: &[f64]) -> Self {
        Self::new(values.iter().map(|&v| v as f32).collect::<Vec<_>>())
    }

    /// Number of stored positions (present or missing).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no positions are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw stored values, including NaN markers.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl FeatureVector for DenseFeatures {
    #[inline]
    fn get(&self, index: usize) -> Option<f32> {
        let value = *self.values.get(index)?;
        if value.is_nan() || (self.zero_as_missing && value == 0.0) {
            None
        } else {
            Some(value)
        }
    }
}

impl From<Vec<f32>> for DenseFeatures {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

impl From<&[f32]> for DenseFeatures {
    fn from(values: &[f32]) -> Self {
        Self::new(values.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_missing_zero_is_not() {
        let fv = DenseFeatures::new(vec![0.0, f32::NAN]);
        assert_eq!(fv.get(0), Some(0.0));
        assert_eq!(fv.get(1), None);
    }

    #[test]
    fn zero_as_missing() {
        let fv = DenseFeatures::zero_as_missing(vec![0.0, -0.0, 2.5]);
        assert_eq!(fv.get(0), None);
        assert_eq!(fv.get(1), None);
        assert_eq!(fv.get(2), Some(2.5));
    }

    #[test]
    fn out_of_range_is_missing() {
        let fv = DenseFeatures::new(vec![1.0]);
        assert_eq!(fv.get(1), None);
        assert_eq!(fv.get(usize::MAX), None);
    }

    #[test]
    fn from_f64_narrows() {
        let fv = DenseFeatures::from_f64(&[0.1, f64::NAN]);
        assert_eq!(fv.get(0), Some(0.1f32));
        assert_eq!(fv.get(1), None);
        assert_eq!(fv.len(), 2);
    }
}
