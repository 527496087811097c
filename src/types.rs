//! Type aliases and common types.

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::RdmError;

/// Stacked dissimilarity vectors, one row per RDM.
pub type RdmMatrix = DMatrix<f64>;

/// A single dissimilarity vector (upper triangle of one RDM).
pub type RdmVector = DVector<f64>;

/// Comparison metric used for pooling, comparing and noise ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonMethod {
    /// Euclidean geometry: plain averaging.
    Euclid,
    /// Cosine similarity (scale invariant).
    Cosine,
    /// Pearson correlation (scale and offset invariant).
    Corr,
    /// Spearman rank correlation.
    Spearman,
    /// Kendall tau-b (also accepted as `kendall`).
    TauB,
    /// Kendall tau-a.
    TauA,
}

impl ComparisonMethod {
    /// Canonical name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMethod::Euclid => "euclid",
            ComparisonMethod::Cosine => "cosine",
            ComparisonMethod::Corr => "corr",
            ComparisonMethod::Spearman => "spearman",
            ComparisonMethod::TauB => "tau-b",
            ComparisonMethod::TauA => "tau-a",
        }
    }

    /// Whether pooling under this method is only approximated by rank averaging.
    pub fn is_rank_approximation(&self) -> bool {
        matches!(self, ComparisonMethod::TauB | ComparisonMethod::TauA)
    }
}

impl Default for ComparisonMethod {
    fn default() -> Self {
        Self::Cosine
    }
}

impl fmt::Display for ComparisonMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMethod {
    type Err = RdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euclid" => Ok(Self::Euclid),
            "cosine" => Ok(Self::Cosine),
            "corr" => Ok(Self::Corr),
            "spearman" => Ok(Self::Spearman),
            "kendall" | "tau-b" => Ok(Self::TauB),
            "tau-a" => Ok(Self::TauA),
            other => Err(RdmError::UnsupportedMetric(other.to_string())),
        }
    }
}

/// Scalar value stored in a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorValue {
    /// Integer label (session number, subject id, index).
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Free-form label.
    Text(String),
}

impl From<i64> for DescriptorValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for DescriptorValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for DescriptorValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for DescriptorValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DescriptorValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for DescriptorValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl fmt::Display for DescriptorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorValue::Int(v) => write!(f, "{}", v),
            DescriptorValue::Float(v) => write!(f, "{}", v),
            DescriptorValue::Text(v) => f.write_str(v),
        }
    }
}
