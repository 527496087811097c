//! Statistical building blocks for RDM inference.
//!
//! This module provides the resampling infrastructure shared by the
//! estimators in [`crate::analysis`]:
//! - Rank transforms with average ranks for ties
//! - Bootstrap resampling over RDMs and patterns
//! - K-fold and leave-one-out partitions over RDMs
//! - NaN-aware aggregation across repetitions

mod bootstrap;
mod folds;
mod rank;
mod summary;

pub use bootstrap::{
    bootstrap_sample, bootstrap_sample_pattern, bootstrap_sample_rdm, counter_rng_seed,
    resample_indices,
};
pub use folds::{fold_bounds, sets_k_fold_rdm, sets_leave_one_out_rdm, CeilingPolicy, Fold};
pub use rank::{mean, rank_average, std_population};
pub use summary::{aggregate_repetitions, RepetitionSummary};
