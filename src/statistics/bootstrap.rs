//! Bootstrap resampling over RDMs and patterns.
//!
//! Resamples draw with replacement and keep duplicates, so a resample of N
//! RDMs has N rows even when some source RDM was drawn several times. The
//! `index` rdm descriptor travels with each row, which lets downstream code
//! hold out every copy of a source RDM together.

use rand::Rng;

use crate::error::{RdmError, Result};
use crate::rdm::Rdms;

/// Counter-based RNG seed generation using SplitMix64.
///
/// This is a stateless PRF that generates deterministic, well-distributed
/// seeds from a base seed and counter. Each bootstrap repetition seeds its
/// own generator from `(base_seed, repetition)`, so results do not depend on
/// the order in which repetitions run.
///
/// # Arguments
///
/// * `base_seed` - Base random seed
/// * `counter` - Repetition counter (0, 1, 2, ...)
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    // SplitMix64: https://xoshiro.di.unimi.it/splitmix64.c
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Draw `n` indices from `0..n` with replacement.
pub fn resample_indices<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    (0..n).map(|_| rng.random_range(0..n)).collect()
}

/// Bootstrap the RDMs of a collection.
///
/// Groups are the distinct values of `rdm_descriptor` (use `"index"` for
/// one group per RDM). As many groups as exist are drawn with replacement
/// and every row of each drawn group is included.
///
/// Returns the resample and the source row of each resampled RDM.
///
/// # Errors
///
/// Returns [`RdmError::Validation`] if the descriptor does not exist.
pub fn bootstrap_sample_rdm<R: Rng + ?Sized>(
    rdms: &Rdms,
    rdm_descriptor: &str,
    rng: &mut R,
) -> Result<(Rdms, Vec<usize>)> {
    let groups = rdms.groups_by(rdm_descriptor)?;
    let rows: Vec<usize> = resample_indices(groups.len(), rng)
        .into_iter()
        .flat_map(|g| groups[g].1.iter().copied())
        .collect();
    Ok((rdms.subset(&rows)?, rows))
}

/// Bootstrap the patterns of a collection.
///
/// Draws P pattern indices with replacement. Duplicated patterns stay in the
/// resample with dissimilarity 0 to their own copies.
///
/// Returns the resample and the source pattern of each resampled pattern.
///
/// # Errors
///
/// Returns [`RdmError::DegenerateSample`] when fewer than two distinct
/// patterns were drawn, since such a resample carries no dissimilarity
/// structure.
pub fn bootstrap_sample_pattern<R: Rng + ?Sized>(
    rdms: &Rdms,
    rng: &mut R,
) -> Result<(Rdms, Vec<usize>)> {
    let mut patterns = resample_indices(rdms.n_cond(), rng);
    patterns.sort_unstable();
    let distinct = count_distinct_sorted(&patterns);
    if distinct < 2 {
        return Err(RdmError::too_few(distinct, 2));
    }
    Ok((rdms.subset_pattern(&patterns)?, patterns))
}

/// Bootstrap RDMs and patterns jointly.
///
/// Returns the resample, the source rows and the source patterns.
///
/// # Errors
///
/// See [`bootstrap_sample_rdm`] and [`bootstrap_sample_pattern`].
pub fn bootstrap_sample<R: Rng + ?Sized>(
    rdms: &Rdms,
    rdm_descriptor: &str,
    rng: &mut R,
) -> Result<(Rdms, Vec<usize>, Vec<usize>)> {
    let (by_rdm, rows) = bootstrap_sample_rdm(rdms, rdm_descriptor, rng)?;
    let (sample, patterns) = bootstrap_sample_pattern(&by_rdm, rng)?;
    Ok((sample, rows, patterns))
}

fn count_distinct_sorted(sorted: &[usize]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[0] != w[1]).count()
}
