//! Rendering of results as JSON or colored terminal text.

pub mod json;
pub mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_evaluation, format_noise_ceiling, format_pair_tests};
