//! Pooling a collection of RDMs into a single consensus RDM.
//!
//! The pooled RDM is the point with maximal expected similarity to the
//! collection under the chosen method's geometry:
//!
//! | Method | Row transform before averaging |
//! |--------|-------------------------------|
//! | `euclid` | none |
//! | `cosine` | divide by row mean |
//! | `corr` | z-score; pooled vector shifted so its minimum is 0 |
//! | `spearman` | average-rank transform |
//! | `tau-b`, `tau-a` | average-rank transform (approximation) |

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RdmError, Result};
use crate::rdm::Rdms;
use crate::statistics::{mean, rank_average, std_population};
use crate::types::{ComparisonMethod, RdmVector};

/// A pooled RDM and whether pooling was exact for its method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PooledRdm {
    /// The pooled collection (a single RDM, rdm descriptors cleared).
    pub rdm: Rdms,
    /// Method the RDM was pooled for.
    pub method: ComparisonMethod,
    /// True when pooling only approximates the optimum (Kendall tau methods).
    pub approximate: bool,
}

/// Pool every RDM of `rdms` into one under `method`.
///
/// Kendall tau methods have no closed-form pooled RDM; they are pooled by
/// averaging ranks like `spearman` and the result is marked `approximate`.
///
/// # Errors
///
/// Returns [`RdmError::DegenerateSample`] when a row has zero mean
/// (`cosine`) or zero standard deviation (`corr`), or when the pooled vector
/// contains non-finite values.
pub fn pool_rdm(rdms: &Rdms, method: ComparisonMethod) -> Result<PooledRdm> {
    let pooled = pool_rdm_quiet(rdms, method)?;
    if pooled.approximate {
        warn!(method = %method, "noise ceiling for tau based on averaged ranks");
    }
    Ok(pooled)
}

/// [`pool_rdm`] without the approximation warning, for repetition loops
/// that report the approximation once on their own result.
pub(crate) fn pool_rdm_quiet(rdms: &Rdms, method: ComparisonMethod) -> Result<PooledRdm> {
    let mut sum = RdmVector::zeros(rdms.n_pairs());
    for row in rdms.vectors().row_iter() {
        sum += transform_row(&row.transpose(), method)?;
    }
    let mut pooled = sum / rdms.n_rdm() as f64;

    if method == ComparisonMethod::Corr {
        let min = pooled.min();
        pooled.add_scalar_mut(-min);
    }
    if pooled.iter().any(|v| !v.is_finite()) {
        return Err(RdmError::non_finite(format!("{} pooling", method)));
    }

    Ok(PooledRdm {
        rdm: Rdms::pooled_from(rdms, pooled),
        method,
        approximate: method.is_rank_approximation(),
    })
}

/// Pool by method name.
///
/// # Errors
///
/// Returns [`RdmError::UnsupportedMetric`] for an unknown method name, plus
/// everything [`pool_rdm`] returns.
pub fn pool_rdm_named(rdms: &Rdms, method: &str) -> Result<PooledRdm> {
    pool_rdm(rdms, method.parse()?)
}

fn transform_row(row: &RdmVector, method: ComparisonMethod) -> Result<RdmVector> {
    match method {
        ComparisonMethod::Euclid => Ok(row.clone()),
        ComparisonMethod::Cosine => {
            let mu = row.mean();
            if negligible(mu, row) {
                return Err(RdmError::zero_variance("cosine pooling (zero row mean)"));
            }
            Ok(row / mu)
        }
        ComparisonMethod::Corr => {
            let values = row.as_slice();
            let mu = mean(values);
            let sd = std_population(values);
            if negligible(sd, row) {
                return Err(RdmError::zero_variance("corr pooling (zero row std)"));
            }
            Ok(row.map(|v| (v - mu) / sd))
        }
        ComparisonMethod::Spearman | ComparisonMethod::TauB | ComparisonMethod::TauA => {
            Ok(RdmVector::from_vec(rank_average(row.as_slice())))
        }
    }
}

/// Zero up to rounding relative to the row's largest magnitude.
fn negligible(x: f64, row: &RdmVector) -> bool {
    x.abs() <= f64::EPSILON * row.amax()
}
