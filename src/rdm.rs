//! Container for collections of representational dissimilarity matrices.
//!
//! Each RDM is stored as the upper triangle of its symmetric P x P matrix
//! (row-major, diagonal excluded), so a collection of N RDMs over P patterns
//! is an N x C(P,2) matrix.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{RdmError, Result};
use crate::types::{DescriptorValue, RdmMatrix, RdmVector};

/// Name of the descriptor that records each RDM's (or pattern's) source index.
pub const INDEX_DESCRIPTOR: &str = "index";

/// Collection-level descriptors.
pub type Descriptors = BTreeMap<String, DescriptorValue>;

/// Per-RDM or per-pattern descriptor arrays.
pub type DescriptorArrays = BTreeMap<String, Vec<DescriptorValue>>;

/// A collection of RDMs over a shared set of patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rdms {
    dissimilarities: RdmMatrix,
    dissimilarity_measure: String,
    descriptors: Descriptors,
    rdm_descriptors: DescriptorArrays,
    pattern_descriptors: DescriptorArrays,
    n_cond: usize,
}

impl Rdms {
    /// Build a collection from stacked dissimilarity vectors.
    ///
    /// Adds an `index` rdm descriptor and an `index` pattern descriptor when
    /// the caller did not supply one.
    ///
    /// # Errors
    ///
    /// Returns [`RdmError::Validation`] when there are no RDMs, when the
    /// number of columns is not C(P,2) for some P >= 2, or when a descriptor
    /// array has the wrong length.
    pub fn new(
        dissimilarities: RdmMatrix,
        dissimilarity_measure: impl Into<String>,
        descriptors: Descriptors,
        mut rdm_descriptors: DescriptorArrays,
        mut pattern_descriptors: DescriptorArrays,
    ) -> Result<Self> {
        let n_rdm = dissimilarities.nrows();
        if n_rdm == 0 {
            return Err(RdmError::Validation("an RDM collection needs at least one RDM".into()));
        }
        let n_cond = n_cond_from_pairs(dissimilarities.ncols()).ok_or_else(|| {
            RdmError::Validation(format!(
                "{} dissimilarities per RDM is not the upper triangle of a square matrix",
                dissimilarities.ncols()
            ))
        })?;

        rdm_descriptors
            .entry(INDEX_DESCRIPTOR.to_string())
            .or_insert_with(|| (0..n_rdm).map(DescriptorValue::from).collect());
        pattern_descriptors
            .entry(INDEX_DESCRIPTOR.to_string())
            .or_insert_with(|| (0..n_cond).map(DescriptorValue::from).collect());

        check_lengths("rdm", &rdm_descriptors, n_rdm)?;
        check_lengths("pattern", &pattern_descriptors, n_cond)?;

        Ok(Self {
            dissimilarities,
            dissimilarity_measure: dissimilarity_measure.into(),
            descriptors,
            rdm_descriptors,
            pattern_descriptors,
            n_cond,
        })
    }

    /// Build a collection with no descriptors from row-major data.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Rdms::new`], plus a data length that is not
    /// `n_rdm * n_pairs`.
    pub fn from_rows(rows: &[Vec<f64>], dissimilarity_measure: impl Into<String>) -> Result<Self> {
        let n_pairs = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != n_pairs) {
            return Err(RdmError::Validation("all RDM vectors must have the same length".into()));
        }
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(
            DMatrix::from_row_slice(rows.len(), n_pairs, &data),
            dissimilarity_measure,
            Descriptors::new(),
            DescriptorArrays::new(),
            DescriptorArrays::new(),
        )
    }

    /// Assemble a pooled collection: one row, no rdm descriptors.
    pub(crate) fn pooled_from(source: &Rdms, vector: RdmVector) -> Self {
        Self {
            dissimilarities: DMatrix::from_row_slice(1, vector.len(), vector.as_slice()),
            dissimilarity_measure: source.dissimilarity_measure.clone(),
            descriptors: source.descriptors.clone(),
            rdm_descriptors: DescriptorArrays::new(),
            pattern_descriptors: source.pattern_descriptors.clone(),
            n_cond: source.n_cond,
        }
    }

    /// Number of RDMs in the collection.
    pub fn n_rdm(&self) -> usize {
        self.dissimilarities.nrows()
    }

    /// Number of patterns (conditions) each RDM is defined over.
    pub fn n_cond(&self) -> usize {
        self.n_cond
    }

    /// Number of dissimilarities per RDM.
    pub fn n_pairs(&self) -> usize {
        self.dissimilarities.ncols()
    }

    /// Stacked dissimilarity vectors (rows = RDMs, columns = pairs).
    pub fn vectors(&self) -> &RdmMatrix {
        &self.dissimilarities
    }

    /// The dissimilarity vector of a single RDM.
    pub fn vector(&self, i: usize) -> RdmVector {
        self.dissimilarities.row(i).transpose()
    }

    /// Full symmetric P x P matrix of RDM `i`.
    pub fn matrix(&self, i: usize) -> DMatrix<f64> {
        let p = self.n_cond;
        let mut m = DMatrix::zeros(p, p);
        let mut k = 0;
        for a in 0..p {
            for b in (a + 1)..p {
                let d = self.dissimilarities[(i, k)];
                m[(a, b)] = d;
                m[(b, a)] = d;
                k += 1;
            }
        }
        m
    }

    /// Label of the dissimilarity measure the RDMs were computed with.
    pub fn dissimilarity_measure(&self) -> &str {
        &self.dissimilarity_measure
    }

    /// Collection-level descriptors.
    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    /// Per-RDM descriptors.
    pub fn rdm_descriptors(&self) -> &DescriptorArrays {
        &self.rdm_descriptors
    }

    /// Per-pattern descriptors.
    pub fn pattern_descriptors(&self) -> &DescriptorArrays {
        &self.pattern_descriptors
    }

    /// Restrict the collection to the given RDM rows (repeats allowed).
    ///
    /// # Errors
    ///
    /// Returns [`RdmError::Validation`] for an empty selection or an index
    /// out of range.
    pub fn subset(&self, indices: &[usize]) -> Result<Rdms> {
        if indices.is_empty() {
            return Err(RdmError::Validation("cannot subset to zero RDMs".into()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rdm()) {
            return Err(RdmError::Validation(format!(
                "RDM index {} out of range for {} RDMs",
                bad,
                self.n_rdm()
            )));
        }
        let rdm_descriptors = self
            .rdm_descriptors
            .iter()
            .map(|(k, v)| (k.clone(), indices.iter().map(|&i| v[i].clone()).collect()))
            .collect();
        Ok(Rdms {
            dissimilarities: self.dissimilarities.select_rows(indices.iter()),
            dissimilarity_measure: self.dissimilarity_measure.clone(),
            descriptors: self.descriptors.clone(),
            rdm_descriptors,
            pattern_descriptors: self.pattern_descriptors.clone(),
            n_cond: self.n_cond,
        })
    }

    /// Restrict every RDM to the given patterns (repeats allowed).
    ///
    /// A pattern selected twice has dissimilarity 0 to its own copy.
    ///
    /// # Errors
    ///
    /// Returns [`RdmError::Validation`] for fewer than two selected patterns
    /// or an index out of range.
    pub fn subset_pattern(&self, indices: &[usize]) -> Result<Rdms> {
        if indices.len() < 2 {
            return Err(RdmError::Validation("an RDM needs at least two patterns".into()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_cond) {
            return Err(RdmError::Validation(format!(
                "pattern index {} out of range for {} patterns",
                bad, self.n_cond
            )));
        }
        let p = indices.len();
        let n_pairs = p * (p - 1) / 2;
        let mut out = DMatrix::zeros(self.n_rdm(), n_pairs);
        for row in 0..self.n_rdm() {
            let mut k = 0;
            for a in 0..p {
                for b in (a + 1)..p {
                    out[(row, k)] = self.pair_value(row, indices[a], indices[b]);
                    k += 1;
                }
            }
        }
        let pattern_descriptors = self
            .pattern_descriptors
            .iter()
            .map(|(k, v)| (k.clone(), indices.iter().map(|&i| v[i].clone()).collect()))
            .collect();
        Ok(Rdms {
            dissimilarities: out,
            dissimilarity_measure: self.dissimilarity_measure.clone(),
            descriptors: self.descriptors.clone(),
            rdm_descriptors: self.rdm_descriptors.clone(),
            pattern_descriptors,
            n_cond: p,
        })
    }

    /// Distinct values of an rdm descriptor in order of first appearance,
    /// together with the rows that carry each value.
    ///
    /// # Errors
    ///
    /// Returns [`RdmError::Validation`] if the descriptor does not exist.
    pub fn groups_by(&self, descriptor: &str) -> Result<Vec<(DescriptorValue, Vec<usize>)>> {
        let values = self.rdm_descriptors.get(descriptor).ok_or_else(|| {
            RdmError::Validation(format!("unknown rdm descriptor {:?}", descriptor))
        })?;
        let mut groups: Vec<(DescriptorValue, Vec<usize>)> = Vec::new();
        for (row, value) in values.iter().enumerate() {
            match groups.iter_mut().find(|(v, _)| v == value) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((value.clone(), vec![row])),
            }
        }
        Ok(groups)
    }

    fn pair_value(&self, row: usize, a: usize, b: usize) -> f64 {
        if a == b {
            return 0.0;
        }
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        // Offset of row i in the row-major upper triangle, plus column offset.
        let k = i * self.n_cond - i * (i + 1) / 2 + (j - i - 1);
        self.dissimilarities[(row, k)]
    }
}

/// Solve C(P,2) = n_pairs for P.
fn n_cond_from_pairs(n_pairs: usize) -> Option<usize> {
    let p = ((1.0 + (1.0 + 8.0 * n_pairs as f64).sqrt()) / 2.0).round() as usize;
    (p >= 2 && p * (p - 1) / 2 == n_pairs).then_some(p)
}

fn check_lengths(kind: &str, arrays: &DescriptorArrays, expected: usize) -> Result<()> {
    for (key, values) in arrays {
        if values.len() != expected {
            return Err(RdmError::Validation(format!(
                "{} descriptor {:?} has {} entries, expected {}",
                kind,
                key,
                values.len(),
                expected
            )));
        }
    }
    Ok(())
}
