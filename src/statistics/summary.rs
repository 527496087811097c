//! Aggregation of per-repetition estimates that skips degenerate repetitions.

use crate::error::{Degeneracy, RdmError, Result};
use crate::result::ExcludedRepetition;

/// Mean of per-repetition (lower, upper) estimates over valid repetitions.
#[derive(Debug, Clone, PartialEq)]
pub struct RepetitionSummary {
    /// Mean lower estimate.
    pub lower: f64,
    /// Mean upper estimate.
    pub upper: f64,
    /// Number of repetitions that contributed.
    pub valid: usize,
    /// Repetitions left out, with the reason.
    pub excluded: Vec<ExcludedRepetition>,
}

/// Average (lower, upper) pairs, excluding degenerate repetitions.
///
/// A repetition is excluded when it failed with [`RdmError::DegenerateSample`]
/// or when either value is non-finite. Any other error is returned as is.
///
/// # Errors
///
/// Propagates non-degenerate errors, and returns
/// [`RdmError::DegenerateSample`] when no repetition is valid.
pub fn aggregate_repetitions<I>(outcomes: I) -> Result<RepetitionSummary>
where
    I: IntoIterator<Item = Result<(f64, f64)>>,
{
    let mut sum_lower = 0.0;
    let mut sum_upper = 0.0;
    let mut valid = 0;
    let mut excluded = Vec::new();

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok((lower, upper)) if lower.is_finite() && upper.is_finite() => {
                sum_lower += lower;
                sum_upper += upper;
                valid += 1;
            }
            Ok(_) => excluded.push(ExcludedRepetition {
                index,
                reason: Degeneracy::NonFinite { context: format!("repetition {}", index) },
            }),
            Err(RdmError::DegenerateSample(reason)) => {
                excluded.push(ExcludedRepetition { index, reason })
            }
            Err(other) => return Err(other),
        }
    }

    if valid == 0 {
        return Err(RdmError::too_few(0, 1));
    }

    Ok(RepetitionSummary {
        lower: sum_lower / valid as f64,
        upper: sum_upper / valid as f64,
        valid,
        excluded,
    })
}
