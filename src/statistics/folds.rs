//! K-fold and leave-one-out partitions over RDM collections.
//!
//! Partitions are built over the distinct values of an rdm descriptor, so
//! all RDMs of one subject (or session) always fall into the same fold. With
//! the default `index` descriptor every RDM is its own group.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{RdmError, Result};
use crate::rdm::Rdms;

/// Which RDMs form the ceiling set of a fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CeilingPolicy {
    /// Every RDM, including the test fold (upper bound of the noise ceiling).
    #[default]
    All,
    /// The complement of the test fold (same as the train set).
    Train,
}

/// One train/test/ceiling partition of an RDM collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    /// Rows used to fit or pool.
    pub train: Vec<usize>,
    /// Rows held out for evaluation.
    pub test: Vec<usize>,
    /// Rows pooled for the upper bound.
    pub ceiling: Vec<usize>,
}

/// Split `n_groups` groups into `k` contiguous blocks.
///
/// Block sizes differ by at most one; the first `n_groups % k` blocks get
/// the extra element. Returns `(start, end)` ranges.
pub fn fold_bounds(n_groups: usize, k: usize) -> Vec<(usize, usize)> {
    let base = n_groups / k;
    let extra = n_groups % k;
    let mut bounds = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let size = base + usize::from(i < extra);
        bounds.push((start, start + size));
        start += size;
    }
    bounds
}

/// K-fold partition of an RDM collection.
///
/// The distinct values of `rdm_descriptor` are taken in first-appearance
/// order (or shuffled with `rng` when `random` is set) and split into `k_rdm`
/// contiguous blocks. Each block is the test set of one fold; the remaining
/// blocks form its train set; the ceiling set follows `ceiling`.
///
/// # Errors
///
/// Returns [`RdmError::DegenerateSample`] when `k_rdm < 2` or when there are
/// fewer groups than folds, and [`RdmError::Validation`] for an unknown
/// descriptor.
pub fn sets_k_fold_rdm<R: Rng + ?Sized>(
    rdms: &Rdms,
    k_rdm: usize,
    random: bool,
    rdm_descriptor: &str,
    ceiling: CeilingPolicy,
    rng: &mut R,
) -> Result<Vec<Fold>> {
    if k_rdm < 2 {
        return Err(RdmError::too_few(k_rdm, 2));
    }
    let mut groups = rdms.groups_by(rdm_descriptor)?;
    if groups.len() < k_rdm {
        return Err(RdmError::too_few(groups.len(), k_rdm));
    }
    if random {
        groups.shuffle(rng);
    }

    let all: Vec<usize> = (0..rdms.n_rdm()).collect();
    let folds = fold_bounds(groups.len(), k_rdm)
        .into_iter()
        .map(|(start, end)| {
            let mut test: Vec<usize> = groups[start..end]
                .iter()
                .flat_map(|(_, rows)| rows.iter().copied())
                .collect();
            test.sort_unstable();
            let train: Vec<usize> = all.iter().copied().filter(|r| !test.contains(r)).collect();
            let ceiling = match ceiling {
                CeilingPolicy::All => all.clone(),
                CeilingPolicy::Train => train.clone(),
            };
            Fold { train, test, ceiling }
        })
        .collect();
    Ok(folds)
}

/// Leave-one-out partition: one fold per distinct value of `rdm_descriptor`.
///
/// Folds follow first-appearance order and the ceiling set is always the
/// whole collection.
///
/// # Errors
///
/// Returns [`RdmError::DegenerateSample`] when the descriptor has fewer than
/// two distinct values.
pub fn sets_leave_one_out_rdm(rdms: &Rdms, rdm_descriptor: &str) -> Result<Vec<Fold>> {
    let groups = rdms.groups_by(rdm_descriptor)?;
    if groups.len() < 2 {
        return Err(RdmError::too_few(groups.len(), 2));
    }
    let all: Vec<usize> = (0..rdms.n_rdm()).collect();
    Ok(groups
        .iter()
        .map(|(_, rows)| Fold {
            train: all.iter().copied().filter(|r| !rows.contains(r)).collect(),
            test: rows.clone(),
            ceiling: all.clone(),
        })
        .collect())
}
