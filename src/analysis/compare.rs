//! Similarity between RDMs under each comparison method.
//!
//! Every method returns a similarity where larger means more alike. For
//! `euclid` this is the negative root-mean-square difference, so its range
//! is (-inf, 0]; every other method lies in [-1, 1].

use nalgebra::DMatrix;

use crate::error::{RdmError, Result};
use crate::rdm::Rdms;
use crate::statistics::rank_average;
use crate::types::{ComparisonMethod, RdmVector};

/// Compare every RDM of `rdm1` with every RDM of `rdm2`.
///
/// Returns an `rdm1.n_rdm() x rdm2.n_rdm()` matrix of similarities.
///
/// # Errors
///
/// - [`RdmError::Validation`] when the RDMs have different numbers of pairs.
/// - [`RdmError::DegenerateSample`] when a vector has zero norm or variance,
///   or a comparison produced a non-finite value.
pub fn compare(rdm1: &Rdms, rdm2: &Rdms, method: ComparisonMethod) -> Result<DMatrix<f64>> {
    if rdm1.n_pairs() != rdm2.n_pairs() {
        return Err(RdmError::Validation(format!(
            "cannot compare RDMs with {} and {} dissimilarities",
            rdm1.n_pairs(),
            rdm2.n_pairs()
        )));
    }
    // Rank transforms are computed once per RDM rather than once per pair.
    let prepare = |rdms: &Rdms| -> Vec<RdmVector> {
        (0..rdms.n_rdm())
            .map(|i| {
                let v = rdms.vector(i);
                match method {
                    ComparisonMethod::Spearman => RdmVector::from_vec(rank_average(v.as_slice())),
                    _ => v,
                }
            })
            .collect()
    };
    let left = prepare(rdm1);
    let right = prepare(rdm2);

    let mut out = DMatrix::zeros(left.len(), right.len());
    for (i, a) in left.iter().enumerate() {
        for (j, b) in right.iter().enumerate() {
            let value = match method {
                ComparisonMethod::Euclid => neg_rms_difference(a, b),
                ComparisonMethod::Cosine => cosine(a, b)?,
                ComparisonMethod::Corr | ComparisonMethod::Spearman => correlation(a, b)?,
                ComparisonMethod::TauB => tau_b(a.as_slice(), b.as_slice())?,
                ComparisonMethod::TauA => tau_a(a.as_slice(), b.as_slice())?,
            };
            if !value.is_finite() {
                return Err(RdmError::non_finite(format!("{} comparison", method)));
            }
            out[(i, j)] = value;
        }
    }
    Ok(out)
}

/// Mean similarity of a single RDM with every RDM of a collection.
///
/// # Errors
///
/// See [`compare`].
pub fn mean_similarity(reference: &Rdms, others: &Rdms, method: ComparisonMethod) -> Result<f64> {
    let sims = compare(reference, others, method)?;
    Ok(sims.mean())
}

fn neg_rms_difference(a: &RdmVector, b: &RdmVector) -> f64 {
    -((a - b).norm_squared() / a.len() as f64).sqrt()
}

fn cosine(a: &RdmVector, b: &RdmVector) -> Result<f64> {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return Err(RdmError::zero_variance("cosine comparison"));
    }
    Ok(a.dot(b) / denom)
}

fn correlation(a: &RdmVector, b: &RdmVector) -> Result<f64> {
    let a = a.add_scalar(-a.mean());
    let b = b.add_scalar(-b.mean());
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return Err(RdmError::zero_variance("correlation comparison"));
    }
    Ok(a.dot(&b) / denom)
}

/// Concordance counts over all pairs: (S = concordant - discordant,
/// pairs tied in x, pairs tied in y, total pairs).
fn concordance(x: &[f64], y: &[f64]) -> (f64, f64, f64, f64) {
    let n = x.len();
    let mut s = 0.0;
    let mut ties_x = 0.0;
    let mut ties_y = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 {
                ties_x += 1.0;
            }
            if dy == 0.0 {
                ties_y += 1.0;
            }
            s += signum(dx) * signum(dy);
        }
    }
    let total = (n * n.saturating_sub(1) / 2) as f64;
    (s, ties_x, ties_y, total)
}

fn signum(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn tau_b(x: &[f64], y: &[f64]) -> Result<f64> {
    let (s, ties_x, ties_y, total) = concordance(x, y);
    let denom = ((total - ties_x) * (total - ties_y)).sqrt();
    if denom == 0.0 {
        return Err(RdmError::zero_variance("tau-b comparison"));
    }
    Ok(s / denom)
}

fn tau_a(x: &[f64], y: &[f64]) -> Result<f64> {
    let (s, _, _, total) = concordance(x, y);
    if total == 0.0 {
        return Err(RdmError::too_few(x.len(), 2));
    }
    Ok(s / total)
}
