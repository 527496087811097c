//! Model collaborator interface and input normalization.
//!
//! Models are external: anything that can predict an RDM vector from a
//! parameter vector and name a default fitting procedure implements
//! [`Model`]. [`input_check_model`] turns a single model or a collection of
//! models into parallel arrays of models, initial parameters and fitters, so
//! the evaluation drivers never branch on the input shape again.

use std::fmt;
use std::sync::Arc;

use crate::error::{RdmError, Result};
use crate::rdm::Rdms;
use crate::result::EvaluationTensor;
use crate::types::{ComparisonMethod, RdmVector};

/// Signature of a fitting procedure: `(model, data, method, theta0) -> theta`.
pub type FitFn =
    dyn Fn(&dyn Model, &Rdms, ComparisonMethod, Option<&[f64]>) -> Result<Vec<f64>> + Send + Sync;

/// A named, shareable fitting procedure.
#[derive(Clone)]
pub struct Fitter {
    name: String,
    func: Arc<FitFn>,
}

impl Fitter {
    /// Wrap a fitting function.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&dyn Model, &Rdms, ComparisonMethod, Option<&[f64]>) -> Result<Vec<f64>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Name of the fitting procedure.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fit `model` to `data`, starting from `theta0`.
    ///
    /// # Errors
    ///
    /// Whatever the fitting procedure reports.
    pub fn fit(
        &self,
        model: &dyn Model,
        data: &Rdms,
        method: ComparisonMethod,
        theta0: Option<&[f64]>,
    ) -> Result<Vec<f64>> {
        (self.func)(model, data, method, theta0)
    }
}

impl fmt::Debug for Fitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fitter").field("name", &self.name).finish()
    }
}

/// A model of the data's dissimilarity structure.
pub trait Model: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Fitting procedure used when the caller does not supply one.
    fn default_fitter(&self) -> Fitter;

    /// Predicted dissimilarity vector for parameters `theta`.
    ///
    /// # Errors
    ///
    /// Implementation specific, typically a parameter count mismatch.
    fn predict(&self, theta: Option<&[f64]>) -> Result<RdmVector>;
}

/// Fitter for models without parameters: returns `theta0` unchanged.
///
/// With `theta0` unset it returns an empty vector, which the cross-validation
/// driver hands back to [`Model::predict`] as `None`.
pub fn fit_mock() -> Fitter {
    Fitter::new("fit_mock", |_model, _data, _method, theta0| {
        Ok(theta0.map(<[f64]>::to_vec).unwrap_or_default())
    })
}

/// A model that always predicts the same RDM.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedModel {
    name: String,
    rdm: RdmVector,
}

impl FixedModel {
    /// Model predicting `rdm`.
    pub fn new(name: impl Into<String>, rdm: RdmVector) -> Self {
        Self {
            name: name.into(),
            rdm,
        }
    }

    /// Model predicting RDM `i` of a collection.
    pub fn from_rdms(name: impl Into<String>, rdms: &Rdms, i: usize) -> Self {
        Self::new(name, rdms.vector(i))
    }
}

impl Model for FixedModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_fitter(&self) -> Fitter {
        fit_mock()
    }

    fn predict(&self, _theta: Option<&[f64]>) -> Result<RdmVector> {
        Ok(self.rdm.clone())
    }
}

/// One model or an ordered collection of models.
#[derive(Clone)]
pub enum ModelInput<'a> {
    /// A single model.
    Single(&'a dyn Model),
    /// Several models, evaluated side by side.
    Collection(Vec<&'a dyn Model>),
}

impl<'a> From<&'a dyn Model> for ModelInput<'a> {
    fn from(model: &'a dyn Model) -> Self {
        ModelInput::Single(model)
    }
}

impl<'a> From<Vec<&'a dyn Model>> for ModelInput<'a> {
    fn from(models: Vec<&'a dyn Model>) -> Self {
        ModelInput::Collection(models)
    }
}

/// Parallel arrays produced by [`input_check_model`].
#[derive(Clone)]
pub struct NormalizedModels<'a> {
    /// Zeroed evaluation container, filled in by the caller.
    pub evaluations: EvaluationTensor,
    /// Models in input order.
    pub models: Vec<&'a dyn Model>,
    /// Initial parameters per model (`None` = unset).
    pub theta: Vec<Option<Vec<f64>>>,
    /// Fitter per model. For a single model this may stay `None`, meaning
    /// the model's default fitter is used at call time.
    pub fitters: Vec<Option<Fitter>>,
    /// Whether the input was a single model rather than a collection.
    pub single: bool,
}

impl<'a> NormalizedModels<'a> {
    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether there are no models (never true for validated input).
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Fitter for model `k`, falling back to the model's default.
    pub fn fitter(&self, k: usize) -> Fitter {
        self.fitters[k]
            .clone()
            .unwrap_or_else(|| self.models[k].default_fitter())
    }

    /// Initial parameters for model `k`.
    pub fn theta(&self, k: usize) -> Option<&[f64]> {
        self.theta[k].as_deref()
    }
}

impl fmt::Debug for NormalizedModels<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.models.iter().map(|m| m.name()).collect();
        f.debug_struct("NormalizedModels")
            .field("evaluations", &self.evaluations.shape())
            .field("models", &names)
            .field("theta", &self.theta)
            .field("fitters", &self.fitters)
            .field("single", &self.single)
            .finish()
    }
}

/// Validate and normalize model input.
///
/// For a single model the evaluation container has shape `(n,)` and the
/// parameters and fitter pass through (each at most one entry). For `m`
/// models it has shape `(n, m)` when `n > 1` and `(m,)` otherwise; missing
/// parameters become unset placeholders and missing fitters become each
/// model's default fitter.
///
/// # Errors
///
/// - [`RdmError::InvalidModel`] for an empty collection.
/// - [`RdmError::Validation`] when the number of parameter vectors or
///   fitters does not match the number of models.
pub fn input_check_model<'a>(
    model: ModelInput<'a>,
    theta: Option<Vec<Option<Vec<f64>>>>,
    fitter: Option<Vec<Option<Fitter>>>,
    n: usize,
) -> Result<NormalizedModels<'a>> {
    match model {
        ModelInput::Single(model) => {
            let theta = theta.unwrap_or_else(|| vec![None]);
            if theta.len() != 1 {
                return Err(RdmError::Validation(format!(
                    "a single model takes one parameter vector, got {}",
                    theta.len()
                )));
            }
            let fitters = fitter.unwrap_or_else(|| vec![None]);
            if fitters.len() != 1 {
                return Err(RdmError::Validation(format!(
                    "a single model takes one fitter, got {}",
                    fitters.len()
                )));
            }
            Ok(NormalizedModels {
                evaluations: EvaluationTensor::zeros(&[n]),
                models: vec![model],
                theta,
                fitters,
                single: true,
            })
        }
        ModelInput::Collection(models) => {
            let m = models.len();
            if m == 0 {
                return Err(RdmError::InvalidModel(
                    "expected a model or a non-empty collection of models".into(),
                ));
            }
            let evaluations = if n > 1 {
                EvaluationTensor::zeros(&[n, m])
            } else {
                EvaluationTensor::zeros(&[m])
            };

            let theta = match theta {
                Some(theta) if theta.len() != m => {
                    return Err(RdmError::Validation(format!(
                        "there should be equally many models as parameters ({} models, {} parameter vectors)",
                        m,
                        theta.len()
                    )));
                }
                Some(theta) => theta,
                None => vec![None; m],
            };

            let fitters = match fitter {
                Some(fitters) if fitters.len() != m => {
                    return Err(RdmError::Validation(format!(
                        "if fitters are passed there should be as many as models ({} models, {} fitters)",
                        m,
                        fitters.len()
                    )));
                }
                Some(fitters) => fitters,
                None => vec![None; m],
            };
            let fitters = fitters
                .into_iter()
                .zip(&models)
                .map(|(f, model)| Some(f.unwrap_or_else(|| model.default_fitter())))
                .collect();

            Ok(NormalizedModels {
                evaluations,
                models,
                theta,
                fitters,
                single: false,
            })
        }
    }
}
