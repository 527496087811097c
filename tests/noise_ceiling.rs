//! End-to-end noise ceiling tests on simulated subject RDMs.
//!
//! Data are 11 subjects x 5 patterns (10 dissimilarities each): a shared
//! structure plus independent noise per subject.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rdm_inference::{
    boot_noise_ceiling, cv_noise_ceiling, sets_k_fold_rdm, BootstrapScheme, CeilingPolicy,
    ComparisonMethod, DescriptorArrays, DescriptorValue, RdmError, RdmInference, RdmMatrix, Rdms,
};

const ALL_METHODS: [ComparisonMethod; 6] = [
    ComparisonMethod::Euclid,
    ComparisonMethod::Cosine,
    ComparisonMethod::Corr,
    ComparisonMethod::Spearman,
    ComparisonMethod::TauB,
    ComparisonMethod::TauA,
];

fn subjects(n: usize, seed: u64) -> Rdms {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let truth: Vec<f64> = (0..10).map(|_| rng.random_range(0.5..3.0)).collect();
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| truth.iter().map(|t| t + rng.random_range(0.0..1.0)).collect())
        .collect();
    Rdms::from_rows(&rows, "Euclidean").unwrap()
}

fn in_range(method: ComparisonMethod, value: f64) -> bool {
    match method {
        ComparisonMethod::Euclid => value.is_finite() && value <= 0.0,
        _ => value.is_finite() && (-1.0 - 1e-12..=1.0 + 1e-12).contains(&value),
    }
}

// ============================================================================
// Cross-validated ceiling
// ============================================================================

#[test]
fn cv_ceiling_eleven_subjects_three_folds() {
    let rdms = subjects(11, 2024);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let folds = sets_k_fold_rdm(&rdms, 3, false, "index", CeilingPolicy::All, &mut rng).unwrap();

    let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
    assert_eq!(sizes, vec![4, 4, 3]);
    assert_eq!(folds[0].test, vec![0, 1, 2, 3]);
    assert!(folds.iter().all(|f| f.ceiling.len() == 11));

    let ceiling = cv_noise_ceiling(&rdms, &folds, ComparisonMethod::Cosine).unwrap();
    assert!(ceiling.lower.is_finite());
    assert!(ceiling.upper.is_finite());
    assert!(ceiling.lower <= ceiling.upper || ceiling.ordering_anomaly);
    assert_eq!(ceiling.valid_repetitions, 3);
    assert!(ceiling.excluded.is_empty());
}

#[test]
fn cv_ceiling_every_method_in_range() {
    let rdms = subjects(11, 7);
    for method in ALL_METHODS {
        let ceiling = RdmInference::new()
            .method(method)
            .k_rdm(3)
            .random_folds(false)
            .cv_noise_ceiling(&rdms)
            .unwrap();
        assert!(in_range(method, ceiling.lower), "{} lower {}", method, ceiling.lower);
        assert!(in_range(method, ceiling.upper), "{} upper {}", method, ceiling.upper);
        assert_eq!(ceiling.approximate, method.is_rank_approximation());
    }
}

#[test]
fn cv_ceiling_groups_by_subject() {
    // Two sessions per subject; folds keep sessions together.
    let base = subjects(8, 3);
    let subject: Vec<DescriptorValue> = (0..8).map(|i| DescriptorValue::from(i / 2)).collect();
    let mut rdm_descriptors = DescriptorArrays::new();
    rdm_descriptors.insert("subject".into(), subject);
    let rdms = Rdms::new(
        RdmMatrix::clone(base.vectors()),
        "Euclidean",
        Default::default(),
        rdm_descriptors,
        Default::default(),
    )
    .unwrap();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
    let folds = sets_k_fold_rdm(&rdms, 2, true, "subject", CeilingPolicy::All, &mut rng).unwrap();
    for fold in &folds {
        assert_eq!(fold.test.len(), 4);
        for pair in fold.test.chunks(2) {
            assert_eq!(pair[0] / 2, pair[1] / 2);
        }
    }
    let ceiling = cv_noise_ceiling(&rdms, &folds, ComparisonMethod::Corr).unwrap();
    assert!(in_range(ComparisonMethod::Corr, ceiling.lower));
}

#[test]
fn too_few_groups_for_folds() {
    let rdms = subjects(2, 1);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let result = sets_k_fold_rdm(&rdms, 3, false, "index", CeilingPolicy::All, &mut rng);
    assert!(matches!(result, Err(RdmError::DegenerateSample(_))));
}

// ============================================================================
// Bootstrap ceiling
// ============================================================================

#[test]
fn boot_ceiling_same_seed_is_identical() {
    let rdms = subjects(11, 11);
    let run = |seed| {
        boot_noise_ceiling(&rdms, ComparisonMethod::Corr, 40, "index", BootstrapScheme::Rdms, seed)
            .unwrap()
    };
    let first = run(99);
    let second = run(99);
    assert_eq!(first, second);
    assert_eq!(first.seed, Some(99));
}

#[test]
fn boot_ceiling_different_seeds_differ_but_stay_in_range() {
    let rdms = subjects(11, 12);
    let a = boot_noise_ceiling(&rdms, ComparisonMethod::Cosine, 40, "index", BootstrapScheme::Rdms, 1)
        .unwrap();
    let b = boot_noise_ceiling(&rdms, ComparisonMethod::Cosine, 40, "index", BootstrapScheme::Rdms, 2)
        .unwrap();
    assert_ne!(a.bounds(), b.bounds());
    for nc in [&a, &b] {
        assert!(in_range(ComparisonMethod::Cosine, nc.lower));
        assert!(in_range(ComparisonMethod::Cosine, nc.upper));
    }
}

#[test]
fn boot_and_loo_cv_ceilings_in_range() {
    let rdms = subjects(11, 13);
    let inference = RdmInference::quick().method(ComparisonMethod::Spearman).seed(4).n_bootstrap(60);
    let cv = inference.clone().k_rdm(11).random_folds(false).cv_noise_ceiling(&rdms).unwrap();
    let boot = inference.boot_noise_ceiling(&rdms).unwrap();
    assert_eq!(cv.valid_repetitions, 11);
    for value in [cv.lower, cv.upper, boot.lower, boot.upper] {
        assert!(in_range(ComparisonMethod::Spearman, value));
    }
}

#[test]
fn boot_ceiling_with_pattern_resampling() {
    let rdms = subjects(9, 14);
    let nc = RdmInference::quick()
        .method(ComparisonMethod::Corr)
        .bootstrap_scheme(BootstrapScheme::RdmsAndPatterns)
        .n_bootstrap(30)
        .seed(8)
        .boot_noise_ceiling(&rdms)
        .unwrap();
    assert_eq!(nc.valid_repetitions + nc.excluded.len(), 30);
    assert!(in_range(ComparisonMethod::Corr, nc.lower));
}
