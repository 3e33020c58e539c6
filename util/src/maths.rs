//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the closed range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Arccosine with the argument clamped into `[-1, 1]`.
///
/// Rounding can push a cosine computed from lengths fractionally outside the
/// valid domain, where `acos` would return `NaN`.
pub fn acos_clamped<T>(value: T) -> T
where
    T: Float
{
    clamp(&value, &-T::one(), &T::one()).acos()
}

/// Find the largest absolute element-wise difference between two sequences.
///
/// Returns the index and magnitude of the largest difference, or `None` if
/// the sequences are empty or of different lengths. Ties resolve to the lowest
/// index.
pub fn max_abs_diff<T>(from: &[T], to: &[T]) -> Option<(usize, T)>
where
    T: Float
{
    if from.len() != to.len() || from.is_empty() {
        return None;
    }

    let mut max = (0, T::zero());

    for (i, (a, b)) in from.iter().zip(to.iter()).enumerate() {
        let diff = (*b - *a).abs();
        if diff > max.1 {
            max = (i, diff);
        }
    }

    Some(max)
}
