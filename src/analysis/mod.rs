//! Inference over RDM collections.
//!
//! 1. **Comparison** ([`compare`]): similarity between RDMs under a method
//! 2. **Pooling** ([`pool_rdm`]): consensus RDM for a method's geometry
//! 3. **Noise ceiling** ([`cv_noise_ceiling`], [`boot_noise_ceiling`]): bounds on
//!    achievable model performance
//! 4. **Pairwise tests** ([`pair_tests`]): bootstrap p-values for differences
//!    between models

mod compare;
mod noise_ceiling;
mod pair_tests;
mod pooling;

pub use compare::{compare, mean_similarity};
pub use noise_ceiling::{boot_noise_ceiling, cv_noise_ceiling, BootstrapScheme};
pub use pair_tests::{pair_tests, pair_tests_matrix};
pub use pooling::{pool_rdm, pool_rdm_named, PooledRdm};
