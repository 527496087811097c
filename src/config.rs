//! Configuration for RDM inference.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::BootstrapScheme;
use crate::rdm::INDEX_DESCRIPTOR;
use crate::statistics::CeilingPolicy;
use crate::types::ComparisonMethod;

/// Configuration options for [`RdmInference`](crate::RdmInference).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Comparison method (default: cosine).
    pub method: ComparisonMethod,

    /// Number of folds over RDM groups for cross-validation (default: 5).
    pub k_rdm: usize,

    /// Shuffle groups before splitting into folds (default: true).
    pub random_folds: bool,

    /// Which RDMs form the ceiling set of each fold (default: all).
    pub ceiling: CeilingPolicy,

    /// Bootstrap repetitions (default: 1,000).
    pub n_bootstrap: usize,

    /// What the bootstrap noise ceiling resamples (default: RDMs only).
    pub bootstrap_scheme: BootstrapScheme,

    /// RDM descriptor defining resampling and fold groups (default: `index`).
    pub rdm_descriptor: String,

    /// Optional deterministic seed for folds and bootstrap draws.
    pub seed: Option<u64>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            method: ComparisonMethod::Cosine,
            k_rdm: 5,
            random_folds: true,
            ceiling: CeilingPolicy::All,
            n_bootstrap: 1_000,
            bootstrap_scheme: BootstrapScheme::Rdms,
            rdm_descriptor: INDEX_DESCRIPTOR.to_string(),
            seed: None,
        }
    }
}

impl InferenceConfig {
    /// Merge configuration from environment variables.
    ///
    /// Reads `RDM_METHOD`, `RDM_K_FOLDS`, `RDM_BOOTSTRAP_N`, `RDM_SEED` and
    /// `RDM_RANDOM_FOLDS`. Unset or unparsable variables leave the current
    /// value in place.
    pub fn from_env(mut self) -> Self {
        if let Some(method) = parse_method_env("RDM_METHOD") {
            self.method = method;
        }
        if let Some(k) = parse_usize_env("RDM_K_FOLDS") {
            self.k_rdm = k;
        }
        if let Some(n) = parse_usize_env("RDM_BOOTSTRAP_N") {
            self.n_bootstrap = n;
        }
        if let Some(seed) = parse_u64_env("RDM_SEED") {
            self.seed = Some(seed);
        }
        if let Some(random) = parse_bool_env("RDM_RANDOM_FOLDS") {
            self.random_folds = random;
        }
        self
    }
}

fn parse_method_env(key: &str) -> Option<ComparisonMethod> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(method) => Some(method),
        Err(err) => {
            warn!(key, value = %raw, error = %err, "ignoring comparison method from environment");
            None
        }
    }
}

fn parse_usize_env(key: &str) -> Option<usize> {
    env::var(key).ok()?.parse().ok()
}

fn parse_u64_env(key: &str) -> Option<u64> {
    env::var(key).ok()?.parse().ok()
}

fn parse_bool_env(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
