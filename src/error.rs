//! Error types for RDM inference.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RdmError>;

/// Errors raised by pooling, resampling and significance testing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RdmError {
    /// Mismatched collection lengths or malformed containers.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The model argument is not a usable model or collection of models.
    #[error("invalid model argument: {0}")]
    InvalidModel(String),

    /// Unknown comparison method name.
    #[error("unsupported comparison method: {0:?}")]
    UnsupportedMetric(String),

    /// A resample, fold or comparison produced a numerically degenerate sample.
    #[error("degenerate sample: {0}")]
    DegenerateSample(Degeneracy),
}

/// The specific numerical degeneracy behind a [`RdmError::DegenerateSample`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Degeneracy {
    /// Division by a zero mean, norm or standard deviation.
    ZeroVariance {
        /// Where the zero divisor occurred.
        context: String,
    },
    /// Every repetition ties for a model pair.
    AllTied {
        /// Index of the first model.
        first: usize,
        /// Index of the second model.
        second: usize,
    },
    /// A value that should be finite came out NaN or infinite.
    NonFinite {
        /// Where the value was produced.
        context: String,
    },
    /// Not enough samples, folds or distinct elements.
    TooFewSamples {
        /// How many were available.
        found: usize,
        /// How many are needed.
        required: usize,
    },
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degeneracy::ZeroVariance { context } => write!(f, "zero variance in {}", context),
            Degeneracy::NonFinite { context } => write!(f, "non-finite value in {}", context),
            Degeneracy::AllTied { first, second } => {
                write!(f, "models {} and {} tie on every repetition", first, second)
            }
            Degeneracy::TooFewSamples { found, required } => {
                write!(f, "found {} samples, at least {} required", found, required)
            }
        }
    }
}

impl RdmError {
    pub(crate) fn zero_variance(context: impl Into<String>) -> Self {
        RdmError::DegenerateSample(Degeneracy::ZeroVariance { context: context.into() })
    }

    pub(crate) fn non_finite(context: impl Into<String>) -> Self {
        RdmError::DegenerateSample(Degeneracy::NonFinite { context: context.into() })
    }

    pub(crate) fn too_few(found: usize, required: usize) -> Self {
        RdmError::DegenerateSample(Degeneracy::TooFewSamples { found, required })
    }

    /// Returns the degeneracy if this error came from a degenerate sample.
    pub fn degeneracy(&self) -> Option<&Degeneracy> {
        match self {
            RdmError::DegenerateSample(d) => Some(d),
            _ => None,
        }
    }
}
