//! Noise ceiling estimation.
//!
//! The noise ceiling bounds the performance the true model could reach
//! given the noise in the data:
//!
//! - **Lower bound**: the RDMs pooled *without* the held-out RDMs, compared
//!   with the held-out RDMs. This is what an imperfect model fitted to the
//!   rest of the data achieves.
//! - **Upper bound**: the RDMs pooled *with* the held-out RDMs (the ceiling
//!   set), compared with the held-out RDMs. No model can do better on average.
//!
//! Folds or bootstrap draws that turn out numerically degenerate are left out
//! of the averages and listed on the result, as are held-out folds dropped
//! inside a bootstrap draw.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::compare::mean_similarity;
use super::pooling::pool_rdm_quiet;
use crate::error::{RdmError, Result};
use crate::rdm::Rdms;
use crate::result::{ExcludedFold, NoiseCeiling};
use crate::statistics::{
    aggregate_repetitions, bootstrap_sample, bootstrap_sample_rdm, counter_rng_seed,
    sets_leave_one_out_rdm, Fold, RepetitionSummary,
};
use crate::types::ComparisonMethod;

/// What a bootstrap noise ceiling resamples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BootstrapScheme {
    /// Resample RDMs (subjects) only.
    #[default]
    Rdms,
    /// Resample RDMs and patterns (conditions).
    RdmsAndPatterns,
}

/// Cross-validated noise ceiling over precomputed folds.
///
/// For each fold, the train RDMs and the ceiling RDMs are pooled separately
/// and each pooled RDM is compared with every test RDM. The lower and upper
/// bounds are the means of these similarities over valid folds.
///
/// # Errors
///
/// - [`RdmError::Validation`] for an empty fold list or out-of-range fold
///   indices.
/// - [`RdmError::DegenerateSample`] when every fold is degenerate.
pub fn cv_noise_ceiling(rdms: &Rdms, folds: &[Fold], method: ComparisonMethod) -> Result<NoiseCeiling> {
    if folds.is_empty() {
        return Err(RdmError::Validation("cross-validation needs at least one fold".into()));
    }
    let summary = cv_summary(rdms, folds, method)?;
    Ok(finish(summary, Vec::new(), method, None))
}

/// Bootstrap noise ceiling.
///
/// Each of the `n_boot` repetitions draws a bootstrap resample (with an rng
/// seeded from `seed` and the repetition number), runs a leave-one-out
/// cross-validated noise ceiling inside the resample, and contributes its
/// lower and upper bound. Copies of the same source RDM are held out
/// together. Held-out folds dropped as degenerate inside a draw are listed
/// in [`NoiseCeiling::excluded_folds`]. Results are identical for identical
/// seeds regardless of the `parallel` feature.
///
/// # Errors
///
/// - [`RdmError::Validation`] for `n_boot == 0` or an unknown descriptor.
/// - [`RdmError::DegenerateSample`] when the collection has fewer than two
///   groups, or when every repetition is degenerate.
pub fn boot_noise_ceiling(
    rdms: &Rdms,
    method: ComparisonMethod,
    n_boot: usize,
    rdm_descriptor: &str,
    scheme: BootstrapScheme,
    seed: u64,
) -> Result<NoiseCeiling> {
    if n_boot == 0 {
        return Err(RdmError::Validation("bootstrap needs at least one repetition".into()));
    }
    let n_groups = rdms.groups_by(rdm_descriptor)?.len();
    if n_groups < 2 {
        return Err(RdmError::too_few(n_groups, 2));
    }

    let repetition = |r: usize| -> Result<RepetitionSummary> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, r as u64));
        let sample = match scheme {
            BootstrapScheme::Rdms => bootstrap_sample_rdm(rdms, rdm_descriptor, &mut rng)?.0,
            BootstrapScheme::RdmsAndPatterns => bootstrap_sample(rdms, rdm_descriptor, &mut rng)?.0,
        };
        let folds = sets_leave_one_out_rdm(&sample, rdm_descriptor)?;
        cv_summary(&sample, &folds, method)
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<Result<RepetitionSummary>> =
        crate::thread_pool::install(|| (0..n_boot).into_par_iter().map(repetition).collect());

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<Result<RepetitionSummary>> = (0..n_boot).map(repetition).collect();

    let mut excluded_folds = Vec::new();
    let bounds: Vec<Result<(f64, f64)>> = outcomes
        .into_iter()
        .enumerate()
        .map(|(r, outcome)| {
            outcome.map(|inner| {
                excluded_folds.extend(inner.excluded.into_iter().map(|ex| ExcludedFold {
                    repetition: r,
                    fold: ex.index,
                    reason: ex.reason,
                }));
                (inner.lower, inner.upper)
            })
        })
        .collect();

    let summary = aggregate_repetitions(bounds)?;
    Ok(finish(summary, excluded_folds, method, Some(seed)))
}

fn cv_summary(rdms: &Rdms, folds: &[Fold], method: ComparisonMethod) -> Result<RepetitionSummary> {
    aggregate_repetitions(folds.iter().map(|fold| fold_bounds(rdms, fold, method)))
}

fn fold_bounds(rdms: &Rdms, fold: &Fold, method: ComparisonMethod) -> Result<(f64, f64)> {
    if fold.train.is_empty() || fold.test.is_empty() || fold.ceiling.is_empty() {
        return Err(RdmError::too_few(0, 1));
    }
    let test = rdms.subset(&fold.test)?;
    let train = pool_rdm_quiet(&rdms.subset(&fold.train)?, method)?;
    let ceiling = pool_rdm_quiet(&rdms.subset(&fold.ceiling)?, method)?;
    let lower = mean_similarity(&train.rdm, &test, method)?;
    let upper = mean_similarity(&ceiling.rdm, &test, method)?;
    Ok((lower, upper))
}

fn finish(
    summary: RepetitionSummary,
    excluded_folds: Vec<ExcludedFold>,
    method: ComparisonMethod,
    seed: Option<u64>,
) -> NoiseCeiling {
    let ceiling = NoiseCeiling {
        lower: summary.lower,
        upper: summary.upper,
        method,
        approximate: method.is_rank_approximation(),
        valid_repetitions: summary.valid,
        excluded: summary.excluded,
        excluded_folds,
        ordering_anomaly: summary.lower > summary.upper,
        seed,
    };

    if ceiling.approximate {
        warn!(method = %method, "noise ceiling for tau based on averaged ranks");
    }
    if !ceiling.excluded.is_empty() {
        warn!(
            excluded = ceiling.excluded.len(),
            valid = ceiling.valid_repetitions,
            first = %ceiling.excluded[0].reason,
            "degenerate repetitions excluded from noise ceiling"
        );
    }
    if !ceiling.excluded_folds.is_empty() {
        warn!(
            excluded_folds = ceiling.excluded_folds.len(),
            first = %ceiling.excluded_folds[0].reason,
            "degenerate held-out folds dropped inside bootstrap repetitions"
        );
    }
    if ceiling.ordering_anomaly {
        warn!(
            lower = ceiling.lower,
            upper = ceiling.upper,
            "noise ceiling lower bound exceeds upper bound"
        );
    }
    debug!(
        method = %method,
        lower = ceiling.lower,
        upper = ceiling.upper,
        valid = ceiling.valid_repetitions,
        "noise ceiling estimated"
    );
    ceiling
}
