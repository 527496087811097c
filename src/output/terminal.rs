//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::result::{ModelEvaluation, NoiseCeiling, PairTestResult};

/// Format a noise ceiling for human-readable terminal output.
pub fn format_noise_ceiling(ceiling: &NoiseCeiling) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("noise ceiling\n");
    output.push_str(&sep);
    output.push_str("\n\n");

    output.push_str(&format!("  Method: {}", ceiling.method));
    if ceiling.approximate {
        output.push_str(&format!(" {}", "(rank-average approximation)".yellow()));
    }
    output.push('\n');
    output.push_str(&format!(
        "  Repetitions: {} valid, {} excluded\n",
        ceiling.valid_repetitions,
        format_excluded(ceiling.excluded.len())
    ));
    if !ceiling.excluded_folds.is_empty() {
        output.push_str(&format!(
            "  Held-out folds dropped: {}\n",
            format_excluded(ceiling.excluded_folds.len())
        ));
    }
    if let Some(seed) = ceiling.seed {
        output.push_str(&format!("  Seed: {}\n", seed));
    }
    output.push('\n');

    output.push_str(&format!("    Lower bound: {:>8.4}\n", ceiling.lower));
    output.push_str(&format!("    Upper bound: {:>8.4}\n", ceiling.upper));

    if ceiling.ordering_anomaly {
        output.push('\n');
        output.push_str(&format!(
            "  {}\n",
            "\u{26A0} Lower bound exceeds upper bound".yellow().bold()
        ));
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');
    output
}

/// Format mean model scores for terminal output.
pub fn format_evaluation(evaluation: &ModelEvaluation) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);
    output.push_str(&format!("model evaluation ({})\n", evaluation.method));
    output.push_str(&sep);
    output.push('\n');
    for (name, score) in evaluation.model_names.iter().zip(evaluation.mean_scores()) {
        output.push_str(&format!("  {:<24} {:>8.4}\n", name, score));
    }
    if !evaluation.excluded.is_empty() {
        output.push_str(&format!(
            "  {} degenerate repetitions\n",
            format_excluded(evaluation.excluded.len())
        ));
    }
    output
}

/// Format a pairwise p-value matrix; entries below `alpha` are highlighted.
pub fn format_pair_tests(result: &PairTestResult, names: &[String], alpha: f64) -> String {
    let n = result.n_models();
    let label = |i: usize| names.get(i).cloned().unwrap_or_else(|| format!("m{}", i));

    let mut output = String::new();
    output.push_str(&format!(
        "pairwise tests ({} repetitions, alpha {})\n",
        result.n_repetitions, alpha
    ));
    output.push_str(&format!("{:>12}", ""));
    for j in 0..n {
        output.push_str(&format!(" {:>8}", truncate(&label(j), 8)));
    }
    output.push('\n');

    for i in 0..n {
        output.push_str(&format!("{:>12}", truncate(&label(i), 12)));
        for j in 0..n {
            let p = result.proportions[(i, j)];
            let cell = format!(" {:>8}", format_p(p));
            if i == j {
                output.push_str(&cell.dimmed().to_string());
            } else if p.is_nan() {
                output.push_str(&cell.yellow().to_string());
            } else if result.is_significant(i, j, alpha) {
                output.push_str(&cell.green().bold().to_string());
            } else {
                output.push_str(&cell);
            }
        }
        output.push('\n');
    }

    if !result.tied_pairs.is_empty() {
        output.push_str(&format!(
            "Note: {} pair(s) tied on every repetition.\n",
            result.tied_pairs.len()
        ));
    }
    output
}

fn format_p(p: f64) -> String {
    if p.is_nan() {
        "tied".to_string()
    } else {
        format!("{:.3}", p)
    }
}

fn format_excluded(count: usize) -> String {
    if count == 0 {
        "0".green().to_string()
    } else {
        count.to_string().yellow().to_string()
    }
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}
