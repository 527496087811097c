//! Model input normalization and evaluation drivers end to end.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rdm_inference::output::{json, terminal};
use rdm_inference::{
    crossval, eval_bootstrap_rdm, eval_fixed, fit_mock, input_check_model, pair_tests,
    sets_leave_one_out_rdm, ComparisonMethod, FixedModel, Fitter, Model, ModelInput, RdmError,
    RdmInference, RdmVector, Rdms,
};

fn data(seed: u64) -> (Rdms, Vec<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let truth: Vec<f64> = (0..15).map(|i| 1.0 + i as f64 * 0.3).collect();
    let rows: Vec<Vec<f64>> = (0..10)
        .map(|_| truth.iter().map(|t| t + rng.random_range(0.0..1.5)).collect())
        .collect();
    (Rdms::from_rows(&rows, "Euclidean").unwrap(), truth)
}

// ============================================================================
// Normalizer
// ============================================================================

#[test]
fn single_model_gets_vector_of_zeros() {
    let model = FixedModel::new("m", RdmVector::from_vec(vec![1.0, 2.0, 3.0]));
    let normalized = input_check_model(ModelInput::Single(&model), None, None, 5).unwrap();
    assert_eq!(normalized.evaluations.shape(), &[5]);
    assert!(normalized.evaluations.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn three_models_get_placeholders_and_default_fitters() {
    let models: Vec<FixedModel> = (0..3)
        .map(|i| FixedModel::new(format!("m{}", i), RdmVector::from_vec(vec![1.0, 2.0, 3.0])))
        .collect();
    let refs: Vec<&dyn Model> = models.iter().map(|m| m as &dyn Model).collect();
    let normalized = input_check_model(ModelInput::Collection(refs), None, None, 1).unwrap();
    assert_eq!(normalized.evaluations.shape(), &[3]);
    assert_eq!(normalized.theta.len(), 3);
    assert!(normalized.theta.iter().all(Option::is_none));
    for k in 0..3 {
        assert_eq!(normalized.fitter(k).name(), models[k].default_fitter().name());
    }
}

#[test]
fn two_models_three_fitters_is_rejected() {
    let a = FixedModel::new("a", RdmVector::from_vec(vec![1.0, 2.0, 3.0]));
    let b = FixedModel::new("b", RdmVector::from_vec(vec![3.0, 2.0, 1.0]));
    let refs: Vec<&dyn Model> = vec![&a, &b];
    let fitters = Some(vec![Some(fit_mock()), Some(fit_mock()), Some(fit_mock())]);
    let err = input_check_model(ModelInput::Collection(refs), None, fitters, 1).unwrap_err();
    assert!(matches!(err, RdmError::Validation(_)));
}

// ============================================================================
// Drivers
// ============================================================================

#[test]
fn true_model_beats_shuffled_model() {
    let (rdms, truth) = data(1);
    let truth_model = FixedModel::new("truth", RdmVector::from_vec(truth.clone()));
    let mut shuffled = truth;
    shuffled.reverse();
    let shuffled_model = FixedModel::new("reversed", RdmVector::from_vec(shuffled));
    let models: Vec<&dyn Model> = vec![&truth_model, &shuffled_model];

    let fixed = eval_fixed(models.clone().into(), &rdms, None, ComparisonMethod::Corr).unwrap();
    let scores = fixed.evaluations.as_slice();
    assert!(scores[0] > scores[1]);

    let boot = eval_bootstrap_rdm(
        models.clone().into(),
        &rdms,
        None,
        ComparisonMethod::Corr,
        50,
        "index",
        17,
    )
    .unwrap();
    assert_eq!(boot.evaluations.shape(), &[50, 2]);
    let tests = pair_tests(&boot.evaluations).unwrap();
    assert!(tests.is_significant(0, 1, 0.05));

    let folds = sets_leave_one_out_rdm(&rdms, "index").unwrap();
    let cv = crossval(models.into(), &rdms, &folds, None, None, ComparisonMethod::Corr).unwrap();
    assert_eq!(cv.evaluations.shape(), &[10, 2]);
    let means = cv.mean_scores();
    assert!(means[0] > means[1]);
}

#[test]
fn fitted_model_uses_train_data() {
    // Fitter returns the mean train RDM; the model predicts its parameters.
    struct Free;
    impl Model for Free {
        fn name(&self) -> &str {
            "free"
        }
        fn default_fitter(&self) -> Fitter {
            Fitter::new("mean_rdm", |_, data: &Rdms, _, _| {
                let mean = data.vectors().row_mean();
                Ok(mean.iter().copied().collect())
            })
        }
        fn predict(&self, theta: Option<&[f64]>) -> rdm_inference::Result<RdmVector> {
            theta
                .map(|t| RdmVector::from_vec(t.to_vec()))
                .ok_or_else(|| RdmError::InvalidModel("free model needs parameters".into()))
        }
    }

    let (rdms, _) = data(2);
    let free = Free;
    let cv = RdmInference::quick()
        .method(ComparisonMethod::Cosine)
        .seed(3)
        .crossval(ModelInput::Single(&free), &rdms, None, None)
        .unwrap();
    assert_eq!(cv.evaluations.shape(), &[3]);
    assert!(cv.evaluations.as_slice().iter().all(|&v| v > 0.9));
    assert_eq!(cv.seed, Some(3));

    // Without parameters the model cannot predict.
    let err = eval_fixed(ModelInput::Single(&free), &rdms, None, ComparisonMethod::Cosine).unwrap_err();
    assert!(matches!(err, RdmError::InvalidModel(_)));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn results_render_to_json_and_terminal() {
    let (rdms, truth) = data(4);
    let truth_model = FixedModel::new("truth", RdmVector::from_vec(truth));
    let inference = RdmInference::quick().method(ComparisonMethod::Spearman).n_bootstrap(20).seed(5);

    let ceiling = inference.boot_noise_ceiling(&rdms).unwrap();
    let parsed = json::noise_ceiling_from_json(&json::to_json(&ceiling).unwrap()).unwrap();
    assert_eq!(parsed, ceiling);
    assert!(terminal::format_noise_ceiling(&ceiling).contains("Upper bound"));

    let models: Vec<&dyn Model> = vec![&truth_model];
    let evaluation = inference.eval_bootstrap(models.into(), &rdms, None).unwrap();
    let rendered = terminal::format_evaluation(&evaluation);
    assert!(rendered.contains("truth"));
    let text = json::to_json_pretty(&evaluation).unwrap();
    assert!(text.contains("\"model_names\""));
}
