//! Pairwise bootstrap tests for differences in model performance.
//!
//! For models i and j the p-value is the proportion of repetitions in which
//! the comparison comes out the "other way":
//!
//! ```text
//! p_ij = #(e_i < e_j) / (n_rep - #(e_i == e_j))
//! p    = min(p_ij, 1 - p_ij)
//! ```
//!
//! Ties are removed from the denominator rather than counted as evidence, and
//! so are repetitions where either score is NaN.

use nalgebra::DMatrix;
use tracing::warn;

use crate::error::{RdmError, Result};
use crate::result::{EvaluationTensor, PairTestResult};

/// Pairwise bootstrap significance tests between models.
///
/// `evaluations` has shape (repetitions, models, ...); trailing axes are
/// averaged away first. The returned matrix is symmetric with ones on the
/// diagonal. Pairs that tie on every repetition get NaN and are listed in
/// [`PairTestResult::tied_pairs`].
///
/// # Errors
///
/// Returns [`RdmError::Validation`] for a tensor with fewer than two axes or
/// with no repetitions.
pub fn pair_tests(evaluations: &EvaluationTensor) -> Result<PairTestResult> {
    let scores = evaluations.collapse_trailing()?;
    pair_tests_matrix(&scores)
}

/// [`pair_tests`] on an already collapsed (repetitions, models) matrix.
///
/// # Errors
///
/// Returns [`RdmError::Validation`] when there are no repetitions.
pub fn pair_tests_matrix(scores: &DMatrix<f64>) -> Result<PairTestResult> {
    let (n_rep, n_models) = scores.shape();
    if n_rep == 0 {
        return Err(RdmError::Validation("pairwise tests need at least one repetition".into()));
    }

    let mut proportions = DMatrix::from_element(n_models, n_models, 1.0);
    let mut tied_pairs = Vec::new();

    for i in 0..n_models {
        for j in (i + 1)..n_models {
            let mut less = 0usize;
            let mut decided = 0usize;
            for r in 0..n_rep {
                let (a, b) = (scores[(r, i)], scores[(r, j)]);
                // NaN scores come from degenerate repetitions and carry no evidence.
                if a.is_nan() || b.is_nan() || a == b {
                    continue;
                }
                decided += 1;
                if a < b {
                    less += 1;
                }
            }
            let p = if decided == 0 {
                tied_pairs.push((i, j));
                f64::NAN
            } else {
                let p = less as f64 / decided as f64;
                p.min(1.0 - p)
            };
            proportions[(i, j)] = p;
            proportions[(j, i)] = p;
        }
    }

    if !tied_pairs.is_empty() {
        warn!(
            pairs = ?tied_pairs,
            "model pairs tied on every repetition; p-values undefined"
        );
    }

    Ok(PairTestResult {
        proportions,
        tied_pairs,
        n_repetitions: n_rep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_models() {
        // A < B < C on every repetition
        let scores = DMatrix::from_fn(50, 3, |r, m| m as f64 + 0.01 * r as f64);
        let result = pair_tests_matrix(&scores).unwrap();
        let p = &result.proportions;
        assert_eq!(p[(0, 1)], 0.0);
        assert_eq!(p[(1, 2)], 0.0);
        assert_eq!(p[(0, 2)], 0.0);
        assert_eq!(p.transpose(), *p);
        assert!(result.is_significant(0, 2, 0.05));
    }

    #[test]
    fn test_diagonal_is_one() {
        let scores = DMatrix::from_row_slice(3, 2, &[0.1, 0.2, 0.3, 0.1, 0.5, 0.6]);
        let result = pair_tests_matrix(&scores).unwrap();
        assert_eq!(result.proportions[(0, 0)], 1.0);
        assert_eq!(result.proportions[(1, 1)], 1.0);
        // 2 of 3 repetitions have model 0 < model 1 -> p = 1/3
        assert!((result.proportions[(0, 1)] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_leave_denominator() {
        // reps: less, tie, tie, greater -> p = 1/2
        let scores = DMatrix::from_row_slice(4, 2, &[0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 0.0]);
        let result = pair_tests_matrix(&scores).unwrap();
        assert!((result.proportions[(0, 1)] - 0.5).abs() < 1e-12);
        assert!(result.tied_pairs.is_empty());
    }

    #[test]
    fn test_nan_repetitions_are_skipped() {
        let scores = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, f64::NAN, 0.0, 2.0, 1.0]);
        let result = pair_tests_matrix(&scores).unwrap();
        assert!((result.proportions[(0, 1)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_tied_pair_is_reported() {
        let scores = DMatrix::from_row_slice(3, 3, &[1.0, 1.0, 0.0, 2.0, 2.0, 5.0, 3.0, 3.0, 1.0]);
        let result = pair_tests_matrix(&scores).unwrap();
        assert!(result.proportions[(0, 1)].is_nan());
        assert!(result.proportions[(1, 0)].is_nan());
        assert_eq!(result.tied_pairs, vec![(0, 1)]);
        assert!(!result.is_significant(0, 1, 0.05));
        assert!(result.proportions[(0, 2)].is_finite());
    }

    #[test]
    fn test_trailing_axes_are_averaged() {
        // (2 reps, 2 models, 2 patterns); model means per rep: [1, 2], [3, 2]
        let t = EvaluationTensor::from_shape_vec(
            vec![2, 2, 2],
            vec![0.0, 2.0, 1.0, 3.0, 3.0, 3.0, 2.0, 2.0],
        )
        .unwrap();
        let result = pair_tests(&t).unwrap();
        assert!((result.proportions[(0, 1)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_vector_tensor() {
        let t = EvaluationTensor::zeros(&[10]);
        assert!(matches!(pair_tests(&t), Err(RdmError::Validation(_))));
        let t = EvaluationTensor::zeros(&[0, 3]);
        assert!(matches!(pair_tests(&t), Err(RdmError::Validation(_))));
    }
}
