//! Result types returned by the estimators.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Degeneracy, RdmError, Result};
use crate::types::ComparisonMethod;

/// A repetition (fold or bootstrap draw) that was left out of an average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRepetition {
    /// Zero-based repetition index.
    pub index: usize,
    /// Why it was excluded.
    pub reason: Degeneracy,
}

/// A held-out fold dropped inside one bootstrap repetition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedFold {
    /// Bootstrap repetition the fold belongs to.
    pub repetition: usize,
    /// Fold index within that repetition's leave-one-out split.
    pub fold: usize,
    /// Why it was dropped.
    pub reason: Degeneracy,
}

/// Lower and upper bound on the best achievable model performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseCeiling {
    /// Lower bound: similarity of data pooled without the held-out RDMs.
    pub lower: f64,

    /// Upper bound: similarity of data pooled including the held-out RDMs.
    pub upper: f64,

    /// Comparison method the bounds are expressed in.
    pub method: ComparisonMethod,

    /// True for Kendall tau methods, whose pooled RDM is a rank-average
    /// approximation.
    pub approximate: bool,

    /// Number of folds or bootstrap draws that contributed.
    pub valid_repetitions: usize,

    /// Folds or draws excluded as degenerate.
    pub excluded: Vec<ExcludedRepetition>,

    /// Held-out folds dropped inside otherwise valid bootstrap repetitions.
    #[serde(default)]
    pub excluded_folds: Vec<ExcludedFold>,

    /// `lower > upper`. Kept as estimated rather than clipped.
    pub ordering_anomaly: bool,

    /// Seed the resampling used, when it was randomized.
    pub seed: Option<u64>,
}

impl NoiseCeiling {
    /// The `(lower, upper)` pair.
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Fraction of repetitions that were excluded.
    pub fn excluded_ratio(&self) -> f64 {
        let total = self.valid_repetitions + self.excluded.len();
        if total == 0 {
            return 0.0;
        }
        self.excluded.len() as f64 / total as f64
    }
}

/// Pairwise bootstrap test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairTestResult {
    /// Symmetric matrix of two-sided p-values, diagonal 1. NaN where every
    /// repetition tied.
    pub proportions: DMatrix<f64>,

    /// Model pairs `(i, j)`, `i < j`, whose scores tied on every repetition.
    pub tied_pairs: Vec<(usize, usize)>,

    /// Number of repetitions the p-values are based on.
    pub n_repetitions: usize,
}

impl PairTestResult {
    /// Number of models compared.
    pub fn n_models(&self) -> usize {
        self.proportions.nrows()
    }

    /// Whether models `i` and `j` differ at level `alpha`.
    ///
    /// Tied pairs (NaN p-value) are never significant.
    pub fn is_significant(&self, i: usize, j: usize, alpha: f64) -> bool {
        self.proportions[(i, j)] < alpha
    }
}

/// Scores of one or more models on a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluation {
    /// Scores, shaped as the model input dictates: `(n,)` for one model,
    /// `(n, models)` for a collection over several repetitions.
    pub evaluations: EvaluationTensor,

    /// Model names in evaluation order.
    pub model_names: Vec<String>,

    /// Comparison method of the scores.
    pub method: ComparisonMethod,

    /// Repetitions or folds whose scores are NaN because they were
    /// degenerate.
    pub excluded: Vec<ExcludedRepetition>,

    /// Seed of the resampling, for bootstrap evaluations.
    pub seed: Option<u64>,
}

impl ModelEvaluation {
    /// Mean score per model over repetitions, ignoring NaN entries.
    pub fn mean_scores(&self) -> Vec<f64> {
        let m = self.model_names.len().max(1);
        let mut sums = vec![0.0; m];
        let mut counts = vec![0usize; m];
        for (i, &v) in self.evaluations.as_slice().iter().enumerate() {
            if v.is_finite() {
                sums[i % m] += v;
                counts[i % m] += 1;
            }
        }
        sums.iter()
            .zip(&counts)
            .map(|(&s, &c)| if c == 0 { f64::NAN } else { s / c as f64 })
            .collect()
    }
}

/// Dense row-major array of evaluation scores.
///
/// The first axis indexes repetitions (bootstrap draws or folds), the second
/// indexes models; any further axes are averaged away before testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl EvaluationTensor {
    /// Zero-filled tensor of the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    /// Wrap row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`RdmError::Validation`] for an empty shape or a data length
    /// that does not match it.
    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        if shape.is_empty() {
            return Err(RdmError::Validation("evaluation tensor needs at least one axis".into()));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(RdmError::Validation(format!(
                "shape {:?} needs {} values, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Build a (repetitions, models) tensor from a matrix.
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let (rows, cols) = matrix.shape();
        let data = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| matrix[(r, c)])
            .collect();
        Self {
            shape: vec![rows, cols],
            data,
        }
    }

    /// Shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Row-major values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major values.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Value at a multi-index, or `None` when out of range.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.offset(index).map(|o| self.data[o])
    }

    /// Set the value at a multi-index.
    ///
    /// # Errors
    ///
    /// Returns [`RdmError::Validation`] when the index is out of range.
    pub fn set(&mut self, index: &[usize], value: f64) -> Result<()> {
        let offset = self.offset(index).ok_or_else(|| {
            RdmError::Validation(format!("index {:?} out of range for {:?}", index, self.shape))
        })?;
        self.data[offset] = value;
        Ok(())
    }

    /// Average trailing axes away, leaving a (repetitions, models) matrix.
    ///
    /// # Errors
    ///
    /// Returns [`RdmError::Validation`] for a tensor with fewer than two
    /// axes.
    pub fn collapse_trailing(&self) -> Result<DMatrix<f64>> {
        if self.shape.len() < 2 {
            return Err(RdmError::Validation(format!(
                "pairwise tests need a (repetitions, models, ...) tensor, got shape {:?}",
                self.shape
            )));
        }
        let (reps, models) = (self.shape[0], self.shape[1]);
        let inner: usize = self.shape[2..].iter().product();
        Ok(DMatrix::from_fn(reps, models, |r, m| {
            let start = (r * models + m) * inner;
            let block = &self.data[start..start + inner];
            if inner == 0 {
                f64::NAN
            } else {
                block.iter().sum::<f64>() / inner as f64
            }
        }))
    }

    fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        Some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_shape() {
        let t = EvaluationTensor::zeros(&[5]);
        assert_eq!(t.shape(), &[5]);
        assert!(t.as_slice().iter().all(|&v| v == 0.0));
        let t = EvaluationTensor::zeros(&[4, 3]);
        assert_eq!(t.as_slice().len(), 12);
    }

    #[test]
    fn test_get_set() {
        let mut t = EvaluationTensor::zeros(&[2, 3, 4]);
        t.set(&[1, 2, 3], 7.0).unwrap();
        assert_eq!(t.get(&[1, 2, 3]), Some(7.0));
        assert_eq!(t.as_slice()[23], 7.0);
        assert_eq!(t.get(&[2, 0, 0]), None);
        assert!(t.set(&[0, 0], 1.0).is_err());
    }

    #[test]
    fn test_collapse_averages_trailing_axes() {
        // shape (2, 2, 2): last axis averaged
        let t = EvaluationTensor::from_shape_vec(
            vec![2, 2, 2],
            vec![1.0, 3.0, 2.0, 2.0, 0.0, 4.0, 5.0, 7.0],
        )
        .unwrap();
        let m = t.collapse_trailing().unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m[(0, 0)], 2.0);
        assert_eq!(m[(0, 1)], 2.0);
        assert_eq!(m[(1, 0)], 2.0);
        assert_eq!(m[(1, 1)], 6.0);
    }

    #[test]
    fn test_collapse_rejects_vectors() {
        let t = EvaluationTensor::zeros(&[5]);
        assert!(matches!(t.collapse_trailing(), Err(RdmError::Validation(_))));
        assert!(EvaluationTensor::from_shape_vec(vec![2, 2], vec![1.0]).is_err());
    }

    #[test]
    fn test_from_matrix_is_row_major() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = EvaluationTensor::from_matrix(&m);
        assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(t.collapse_trailing().unwrap(), m);
    }

    #[test]
    fn test_mean_scores_skip_nan() {
        let evaluation = ModelEvaluation {
            evaluations: EvaluationTensor::from_shape_vec(
                vec![3, 2],
                vec![0.2, 0.4, f64::NAN, 0.6, 0.4, f64::NAN],
            )
            .unwrap(),
            model_names: vec!["a".into(), "b".into()],
            method: ComparisonMethod::Corr,
            excluded: Vec::new(),
            seed: Some(1),
        };
        let means = evaluation.mean_scores();
        assert!((means[0] - 0.3).abs() < 1e-12);
        assert!((means[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_excluded_ratio() {
        let nc = NoiseCeiling {
            lower: 0.4,
            upper: 0.6,
            method: ComparisonMethod::Cosine,
            approximate: false,
            valid_repetitions: 3,
            excluded: vec![ExcludedRepetition {
                index: 1,
                reason: Degeneracy::TooFewSamples { found: 1, required: 2 },
            }],
            excluded_folds: Vec::new(),
            ordering_anomaly: false,
            seed: None,
        };
        assert_eq!(nc.bounds(), (0.4, 0.6));
        assert!((nc.excluded_ratio() - 0.25).abs() < 1e-12);
    }
}
