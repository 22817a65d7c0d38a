//! Testing utilities.
//!
//! Assertion helpers shared by unit tests and integration tests.
//!
//! ```ignore
//! use ginfer::testing::{assert_scores_eq, DEFAULT_TOLERANCE};
//! ```

use crate::predict::PredictionOutput;
use approx::AbsDiffEq;

/// Default tolerance for floating point comparisons. Appropriate for
/// scores that are O(1).
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

/// Assert that two f32 values are approximately equal.
///
/// Uses absolute difference comparison with the given tolerance.
///
/// # Examples
///
/// ```
/// # use ginfer::assert_approx_eq;
/// assert_approx_eq!(1.0f32, 1.0001f32, 0.001);
/// ```
///
/// # Panics
///
/// Panics if the absolute difference exceeds tolerance.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                left_val, right_val, diff, tol
            );
        }
    }};
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)` - {}\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                format_args!($($arg)+), left_val, right_val, diff, tol
            );
        }
    }};
}

/// Assert that two slices of f32 values are approximately equal
/// element-wise.
///
/// # Panics
///
/// Panics if lengths differ or any element differs by more than tolerance.
pub fn assert_slice_approx_eq(actual: &[f32], expected: &[f32], tolerance: f32, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: length mismatch - got {}, expected {}",
        actual.len(),
        expected.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance,
            "{context}[{i}]: {a} ≠ {e} (diff={diff}, tolerance={tolerance})"
        );
    }
}

/// Assert that two [`PredictionOutput`]s are approximately equal.
///
/// # Panics
///
/// Panics if shapes differ or if any score differs by more than
/// [`DEFAULT_TOLERANCE`].
pub fn assert_scores_eq(actual: &PredictionOutput, expected: &PredictionOutput, context: &str) {
    assert_scores_eq_eps(actual, expected, DEFAULT_TOLERANCE, context);
}

/// Assert that two [`PredictionOutput`]s are approximately equal with a
/// custom epsilon. On failure, lists the rows that differ.
///
/// # Panics
///
/// Panics if shapes differ or if any score differs by more than epsilon.
pub fn assert_scores_eq_eps(
    actual: &PredictionOutput,
    expected: &PredictionOutput,
    epsilon: f32,
    context: &str,
) {
    if actual.shape() != expected.shape() {
        panic!(
            "\n{context}: shape mismatch\n- {:?}  (expected)\n+ {:?}  (actual)\n",
            expected.shape(),
            actual.shape()
        );
    }

    if actual.abs_diff_eq(expected, epsilon) {
        return;
    }

    let mut diff = String::new();
    for (i, (act_row, exp_row)) in actual.rows().zip(expected.rows()).enumerate() {
        let row_differs = act_row
            .iter()
            .zip(exp_row.iter())
            .any(|(a, e)| !a.abs_diff_eq(e, epsilon));
        if !row_differs {
            continue;
        }
        diff.push_str(&format!("[{i:3}] -"));
        for val in exp_row {
            diff.push_str(&format!(" {val:>12.6}"));
        }
        diff.push_str("  (expected)\n      +");
        for val in act_row {
            diff.push_str(&format!(" {val:>12.6}"));
        }
        diff.push_str("  (actual)\n");
    }
    panic!("\n{context}: scores differ (epsilon {epsilon:.0e})\n\n{diff}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_macro() {
        assert_approx_eq!(1.0f32, 1.0001f32, 0.001);
        assert_approx_eq!(-1.5f32, -1.5001f32, 0.001);
        assert_approx_eq!(0.0f32, 0.0f32, 1e-10, "with message");
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn approx_eq_macro_fails() {
        assert_approx_eq!(1.0f32, 2.0f32, 0.1);
    }

    #[test]
    fn slice_approx_eq() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [1.0001f32, 2.0001, 3.0001];
        assert_slice_approx_eq(&a, &b, 0.001, "test");
    }

    #[test]
    fn scores_eq_within_tolerance() {
        let a = PredictionOutput::new(vec![1.0, 2.0, 3.0], 3, 1);
        let b = PredictionOutput::new(vec![1.000005, 2.000005, 3.000005], 3, 1);
        assert_scores_eq(&a, &b, "test");
    }

    #[test]
    #[should_panic(expected = "scores differ")]
    fn scores_eq_reports_differing_rows() {
        let a = PredictionOutput::new(vec![1.0, 2.0], 2, 1);
        let b = PredictionOutput::new(vec![1.0, 2.5], 2, 1);
        assert_scores_eq(&a, &b, "test");
    }
}
