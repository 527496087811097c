//! Main `RdmInference` entry point and builder.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

use crate::analysis::{self, BootstrapScheme, PooledRdm};
use crate::config::InferenceConfig;
use crate::error::Result;
use crate::evaluation;
use crate::model::{Fitter, ModelInput};
use crate::rdm::Rdms;
use crate::result::{ModelEvaluation, NoiseCeiling, PairTestResult};
use crate::statistics::{sets_k_fold_rdm, CeilingPolicy, Fold};
use crate::types::ComparisonMethod;

/// Main entry point for inference over RDM collections.
///
/// Use the builder pattern to configure and run the estimators.
///
/// # Example
///
/// ```
/// use rdm_inference::{ComparisonMethod, RdmInference, Rdms};
///
/// let rdms = Rdms::from_rows(
///     &[
///         vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
///         vec![1.2, 2.1, 2.9, 4.3, 5.2, 5.8],
///         vec![0.8, 2.2, 3.3, 3.9, 4.7, 6.1],
///         vec![1.1, 1.8, 3.1, 4.2, 5.1, 6.2],
///     ],
///     "Euclidean",
/// )
/// .unwrap();
///
/// let ceiling = RdmInference::new()
///     .method(ComparisonMethod::Corr)
///     .k_rdm(2)
///     .seed(7)
///     .cv_noise_ceiling(&rdms)
///     .unwrap();
/// assert!(ceiling.upper <= 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RdmInference {
    config: InferenceConfig,
}

impl RdmInference {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self {
            config: InferenceConfig::default(),
        }
    }

    /// Create with fast configuration for testing.
    ///
    /// Settings:
    /// - 100 bootstrap repetitions (vs 1,000 default)
    /// - 3 folds (vs 5 default)
    pub fn quick() -> Self {
        Self {
            config: InferenceConfig {
                n_bootstrap: 100,
                k_rdm: 3,
                ..InferenceConfig::default()
            },
        }
    }

    /// Create from an explicit configuration.
    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Merge overrides from `RDM_*` environment variables.
    pub fn from_env(mut self) -> Self {
        self.config = self.config.from_env();
        self
    }

    /// Set the comparison method.
    pub fn method(mut self, method: ComparisonMethod) -> Self {
        self.config.method = method;
        self
    }

    /// Set the number of folds over RDM groups.
    pub fn k_rdm(mut self, k: usize) -> Self {
        self.config.k_rdm = k;
        self
    }

    /// Shuffle groups before splitting into folds.
    pub fn random_folds(mut self, random: bool) -> Self {
        self.config.random_folds = random;
        self
    }

    /// Set which RDMs form each fold's ceiling set.
    pub fn ceiling(mut self, policy: CeilingPolicy) -> Self {
        self.config.ceiling = policy;
        self
    }

    /// Set the number of bootstrap repetitions.
    pub fn n_bootstrap(mut self, n: usize) -> Self {
        self.config.n_bootstrap = n;
        self
    }

    /// Set what the bootstrap noise ceiling resamples.
    pub fn bootstrap_scheme(mut self, scheme: BootstrapScheme) -> Self {
        self.config.bootstrap_scheme = scheme;
        self
    }

    /// Set the RDM descriptor defining groups.
    pub fn rdm_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.config.rdm_descriptor = descriptor.into();
        self
    }

    /// Set a deterministic seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Pool a collection under the configured method.
    ///
    /// # Errors
    ///
    /// See [`analysis::pool_rdm`].
    pub fn pool(&self, rdms: &Rdms) -> Result<PooledRdm> {
        analysis::pool_rdm(rdms, self.config.method)
    }

    /// K-fold partition under the configured fold settings.
    ///
    /// # Errors
    ///
    /// See [`sets_k_fold_rdm`].
    pub fn folds(&self, rdms: &Rdms) -> Result<Vec<Fold>> {
        self.folds_seeded(rdms, self.resolve_seed())
    }

    /// Cross-validated noise ceiling over configured k-fold partitions.
    ///
    /// The seed is recorded when folds are shuffled.
    ///
    /// # Errors
    ///
    /// See [`analysis::cv_noise_ceiling`] and [`sets_k_fold_rdm`].
    pub fn cv_noise_ceiling(&self, rdms: &Rdms) -> Result<NoiseCeiling> {
        let seed = self.resolve_seed();
        let folds = self.folds_seeded(rdms, seed)?;
        let mut ceiling = analysis::cv_noise_ceiling(rdms, &folds, self.config.method)?;
        if self.config.random_folds {
            ceiling.seed = Some(seed);
        }
        Ok(ceiling)
    }

    /// Bootstrap noise ceiling.
    ///
    /// # Errors
    ///
    /// See [`analysis::boot_noise_ceiling`].
    pub fn boot_noise_ceiling(&self, rdms: &Rdms) -> Result<NoiseCeiling> {
        analysis::boot_noise_ceiling(
            rdms,
            self.config.method,
            self.config.n_bootstrap,
            &self.config.rdm_descriptor,
            self.config.bootstrap_scheme,
            self.resolve_seed(),
        )
    }

    /// Evaluate fixed models on the whole dataset.
    ///
    /// # Errors
    ///
    /// See [`evaluation::eval_fixed`].
    pub fn eval_fixed(
        &self,
        models: ModelInput<'_>,
        data: &Rdms,
        theta: Option<Vec<Option<Vec<f64>>>>,
    ) -> Result<ModelEvaluation> {
        evaluation::eval_fixed(models, data, theta, self.config.method)
    }

    /// Evaluate fixed models on bootstrap resamples of the RDMs.
    ///
    /// # Errors
    ///
    /// See [`evaluation::eval_bootstrap_rdm`].
    pub fn eval_bootstrap(
        &self,
        models: ModelInput<'_>,
        data: &Rdms,
        theta: Option<Vec<Option<Vec<f64>>>>,
    ) -> Result<ModelEvaluation> {
        evaluation::eval_bootstrap_rdm(
            models,
            data,
            theta,
            self.config.method,
            self.config.n_bootstrap,
            &self.config.rdm_descriptor,
            self.resolve_seed(),
        )
    }

    /// Cross-validated model evaluation over configured k-fold partitions.
    ///
    /// # Errors
    ///
    /// See [`evaluation::crossval`] and [`sets_k_fold_rdm`].
    pub fn crossval(
        &self,
        models: ModelInput<'_>,
        data: &Rdms,
        theta: Option<Vec<Option<Vec<f64>>>>,
        fitter: Option<Vec<Option<Fitter>>>,
    ) -> Result<ModelEvaluation> {
        let seed = self.resolve_seed();
        let folds = self.folds_seeded(data, seed)?;
        let mut result = evaluation::crossval(models, data, &folds, theta, fitter, self.config.method)?;
        if self.config.random_folds {
            result.seed = Some(seed);
        }
        Ok(result)
    }

    /// Pairwise bootstrap tests between the models of an evaluation.
    ///
    /// # Errors
    ///
    /// See [`analysis::pair_tests`].
    pub fn pair_tests(&self, evaluation: &ModelEvaluation) -> Result<PairTestResult> {
        analysis::pair_tests(&evaluation.evaluations)
    }

    fn folds_seeded(&self, rdms: &Rdms, seed: u64) -> Result<Vec<Fold>> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        sets_k_fold_rdm(
            rdms,
            self.config.k_rdm,
            self.config.random_folds,
            &self.config.rdm_descriptor,
            self.config.ceiling,
            &mut rng,
        )
    }

    fn resolve_seed(&self) -> u64 {
        match self.config.seed {
            Some(seed) => seed,
            None => {
                let seed: u64 = rand::rng().random();
                debug!(seed, "no seed configured; drew one");
                seed
            }
        }
    }
}
