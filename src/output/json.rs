//! JSON serialization for inference results.

use serde::Serialize;

use crate::result::{ModelEvaluation, NoiseCeiling, PairTestResult};

/// Serialize any result to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails. NaN scores are written as
/// `null`.
pub fn to_json<T: Serialize + ?Sized>(result: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Serialize any result to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty<T: Serialize + ?Sized>(result: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Parse a noise ceiling back from JSON.
///
/// # Errors
///
/// Returns an error for malformed input.
pub fn noise_ceiling_from_json(json: &str) -> Result<NoiseCeiling, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse a pairwise test result back from JSON.
///
/// NaN p-values are written as `null` and cannot be read back; only results
/// without tied pairs round-trip.
///
/// # Errors
///
/// Returns an error for malformed input.
pub fn pair_tests_from_json(json: &str) -> Result<PairTestResult, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse a model evaluation back from JSON.
///
/// NaN scores from degenerate repetitions are written as `null` and cannot
/// be read back; only evaluations without excluded repetitions round-trip.
///
/// # Errors
///
/// Returns an error for malformed input.
pub fn evaluation_from_json(json: &str) -> Result<ModelEvaluation, serde_json::Error> {
    serde_json::from_str(json)
}
