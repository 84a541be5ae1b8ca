//! Core trait for feature access.

use crate::error::FeatureError;

/// Read-only view over the features of a single sample.
///
/// Provides the uniform lookup used during tree traversal, regardless of
/// whether the values are stored densely or sparsely.
///
/// # Missing Values
///
/// `get` returns `None` for a missing feature. Implementations must keep
/// missing distinct from `0.0`, and must return `None` (not panic) for
/// indices past the end of their storage.
pub trait FeatureVector {
    /// Value of feature `index`, or `None` when it is missing.
    fn get(&self, index: usize) -> Option<f32>;

    /// Signed lookup for callers that index with possibly-negative integers.
    ///
    /// Negative indices are a programming error on the caller's side and are
    /// reported as [`FeatureError::InvalidFeatureIndex`]; non-negative indices
    /// behave exactly like [`get`](Self::get).
    fn get_checked(&self, index: i64) -> Result<Option<f32>, FeatureError> {
        let index = usize::try_from(index).map_err(|_| FeatureError::InvalidFeatureIndex(index))?;
        Ok(self.get(index))
    }
}

impl FeatureVector for [f32] {
    #[inline]
    fn get(&self, index: usize) -> Option<f32> {
        match <[f32]>::get(self, index) {
            Some(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }
}

impl FeatureVector for Vec<f32> {
    #[inline]
    fn get(&self, index: usize) -> Option<f32> {
        FeatureVector::get(self.as_slice(), index)
    }
}

impl<F: FeatureVector + ?Sized> FeatureVector for &F {
    #[inline]
    fn get(&self, index: usize) -> Option<f32> {
        (**self).get(index)
    }
}
