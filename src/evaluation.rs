//! Model evaluation drivers.
//!
//! Each driver normalizes its model argument with
//! [`input_check_model`](crate::model::input_check_model) before touching the
//! data, so malformed input fails before any resampling starts. Degenerate
//! repetitions leave NaN in the evaluation tensor and are listed on the
//! result; [`pair_tests`](crate::analysis::pair_tests) skips them.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::analysis::mean_similarity;
use crate::error::{Degeneracy, RdmError, Result};
use crate::model::{input_check_model, Fitter, ModelInput, NormalizedModels};
use crate::rdm::Rdms;
use crate::result::{ExcludedRepetition, ModelEvaluation};
use crate::statistics::{bootstrap_sample_rdm, counter_rng_seed, Fold};
use crate::types::{ComparisonMethod, RdmVector};

/// Evaluate models with fixed parameters on the whole dataset.
///
/// Each model's prediction is compared with every data RDM and the
/// similarities are averaged.
///
/// # Errors
///
/// Normalizer errors, prediction errors and comparison errors are returned
/// as is; there is no repetition to exclude.
pub fn eval_fixed(
    models: ModelInput<'_>,
    data: &Rdms,
    theta: Option<Vec<Option<Vec<f64>>>>,
    method: ComparisonMethod,
) -> Result<ModelEvaluation> {
    let mut normalized = input_check_model(models, theta, None, 1)?;
    let predictions = predict_all(&normalized, data)?;
    for (k, prediction) in predictions.iter().enumerate() {
        normalized.evaluations.as_mut_slice()[k] = mean_similarity(prediction, data, method)?;
    }
    Ok(finish(normalized, method, Vec::new(), None))
}

/// Evaluate models with fixed parameters on `n_boot` bootstrap resamples of
/// the RDMs.
///
/// Resampling draws groups of `rdm_descriptor` with replacement. Repetition
/// `r` uses an rng seeded from `(seed, r)`, so results do not depend on the
/// `parallel` feature.
///
/// # Errors
///
/// - Normalizer and prediction errors, before any resampling.
/// - [`RdmError::Validation`] for `n_boot == 0` or an unknown descriptor.
pub fn eval_bootstrap_rdm(
    models: ModelInput<'_>,
    data: &Rdms,
    theta: Option<Vec<Option<Vec<f64>>>>,
    method: ComparisonMethod,
    n_boot: usize,
    rdm_descriptor: &str,
    seed: u64,
) -> Result<ModelEvaluation> {
    let mut normalized = input_check_model(models, theta, None, n_boot)?;
    if n_boot == 0 {
        return Err(RdmError::Validation("bootstrap needs at least one repetition".into()));
    }
    data.groups_by(rdm_descriptor)?;
    let predictions = predict_all(&normalized, data)?;

    let repetition = |r: usize| -> Result<(Vec<f64>, Option<Degeneracy>)> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, r as u64));
        let (sample, _) = bootstrap_sample_rdm(data, rdm_descriptor, &mut rng)?;
        score_row(&predictions, &sample, method)
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Result<(Vec<f64>, Option<Degeneracy>)>> =
        crate::thread_pool::install(|| (0..n_boot).into_par_iter().map(repetition).collect());

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Result<(Vec<f64>, Option<Degeneracy>)>> = (0..n_boot).map(repetition).collect();

    let excluded = fill_rows(&mut normalized, rows)?;
    Ok(finish(normalized, method, excluded, Some(seed)))
}

/// Cross-validated evaluation.
///
/// For every fold each model is fitted to the train RDMs with its fitter,
/// starting from its initial parameters, and the fitted prediction is
/// compared with the test RDMs.
///
/// # Errors
///
/// - Normalizer errors, and [`RdmError::Validation`] for an empty fold list.
/// - Fitting or prediction errors that are not degeneracies.
pub fn crossval(
    models: ModelInput<'_>,
    data: &Rdms,
    folds: &[Fold],
    theta: Option<Vec<Option<Vec<f64>>>>,
    fitter: Option<Vec<Option<Fitter>>>,
    method: ComparisonMethod,
) -> Result<ModelEvaluation> {
    let mut normalized = input_check_model(models, theta, fitter, folds.len())?;
    if folds.is_empty() {
        return Err(RdmError::Validation("cross-validation needs at least one fold".into()));
    }

    let rows = folds
        .iter()
        .map(|fold| fold_scores(&normalized, data, fold, method))
        .collect::<Vec<_>>();
    let excluded = fill_rows(&mut normalized, rows)?;
    Ok(finish(normalized, method, excluded, None))
}

fn fold_scores(
    normalized: &NormalizedModels<'_>,
    data: &Rdms,
    fold: &Fold,
    method: ComparisonMethod,
) -> Result<(Vec<f64>, Option<Degeneracy>)> {
    if fold.train.is_empty() || fold.test.is_empty() {
        return Err(RdmError::too_few(0, 1));
    }
    let train = data.subset(&fold.train)?;
    let test = data.subset(&fold.test)?;

    let mut scores = Vec::with_capacity(normalized.len());
    let mut reason = None;
    for (k, &model) in normalized.models.iter().enumerate() {
        let fitted = normalized.fitter(k).fit(model, &train, method, normalized.theta(k));
        let outcome = fitted
            .and_then(|theta| model.predict((!theta.is_empty()).then_some(theta.as_slice())))
            .and_then(|prediction| as_rdms(&prediction, data))
            .and_then(|prediction| mean_similarity(&prediction, &test, method));
        scores.push(degenerate_as_nan(outcome, &mut reason)?);
    }
    Ok((scores, reason))
}

fn score_row(
    predictions: &[Rdms],
    sample: &Rdms,
    method: ComparisonMethod,
) -> Result<(Vec<f64>, Option<Degeneracy>)> {
    let mut reason = None;
    let scores = predictions
        .iter()
        .map(|p| degenerate_as_nan(mean_similarity(p, sample, method), &mut reason))
        .collect::<Result<Vec<_>>>()?;
    Ok((scores, reason))
}

fn degenerate_as_nan(outcome: Result<f64>, reason: &mut Option<Degeneracy>) -> Result<f64> {
    match outcome {
        Ok(v) => Ok(v),
        Err(RdmError::DegenerateSample(d)) => {
            reason.get_or_insert(d);
            Ok(f64::NAN)
        }
        Err(e) => Err(e),
    }
}

/// Write per-repetition rows into the tensor, NaN for degenerate ones.
fn fill_rows(
    normalized: &mut NormalizedModels<'_>,
    rows: Vec<Result<(Vec<f64>, Option<Degeneracy>)>>,
) -> Result<Vec<ExcludedRepetition>> {
    let m = normalized.len();
    let mut excluded = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        let (scores, reason) = match row {
            Ok(row) => row,
            Err(RdmError::DegenerateSample(reason)) => (vec![f64::NAN; m], Some(reason)),
            Err(e) => return Err(e),
        };
        normalized.evaluations.as_mut_slice()[index * m..(index + 1) * m].copy_from_slice(&scores);
        if let Some(reason) = reason {
            excluded.push(ExcludedRepetition { index, reason });
        }
    }
    Ok(excluded)
}

fn predict_all(normalized: &NormalizedModels<'_>, data: &Rdms) -> Result<Vec<Rdms>> {
    normalized
        .models
        .iter()
        .enumerate()
        .map(|(k, model)| as_rdms(&model.predict(normalized.theta(k))?, data))
        .collect()
}

fn as_rdms(prediction: &RdmVector, data: &Rdms) -> Result<Rdms> {
    if prediction.len() != data.n_pairs() {
        return Err(RdmError::InvalidModel(format!(
            "model predicts {} dissimilarities, data has {}",
            prediction.len(),
            data.n_pairs()
        )));
    }
    Rdms::from_rows(&[prediction.as_slice().to_vec()], data.dissimilarity_measure())
}

fn finish(
    normalized: NormalizedModels<'_>,
    method: ComparisonMethod,
    excluded: Vec<ExcludedRepetition>,
    seed: Option<u64>,
) -> ModelEvaluation {
    let model_names = normalized.models.iter().map(|m| m.name().to_string()).collect();
    if !excluded.is_empty() {
        warn!(
            excluded = excluded.len(),
            first = %excluded[0].reason,
            "degenerate repetitions left as NaN in model evaluation"
        );
    }
    debug!(
        method = %method,
        shape = ?normalized.evaluations.shape(),
        "models evaluated"
    );
    ModelEvaluation {
        evaluations: normalized.evaluations,
        model_names,
        method,
        excluded,
        seed,
    }
}
