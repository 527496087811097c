use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rdm_inference::{pool_rdm, BootstrapScheme, ComparisonMethod, RdmInference, Rdms};

fn subjects(n: usize, n_cond: usize) -> Rdms {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let n_pairs = n_cond * (n_cond - 1) / 2;
    let truth: Vec<f64> = (0..n_pairs).map(|_| rng.random_range(0.5..3.0)).collect();
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| truth.iter().map(|t| t + rng.random_range(0.0..1.0)).collect())
        .collect();
    Rdms::from_rows(&rows, "Euclidean").expect("valid RDMs")
}

fn bench_noise_ceiling(c: &mut Criterion) {
    let rdms = subjects(20, 30);
    let mut group = c.benchmark_group("noise_ceiling");
    group.sample_size(20);

    group.bench_function("pool_corr", |b| {
        b.iter(|| black_box(pool_rdm(&rdms, ComparisonMethod::Corr).map(|p| p.approximate)))
    });

    group.bench_function("cv_spearman_k5", |b| {
        let inference = RdmInference::new().method(ComparisonMethod::Spearman).seed(1);
        b.iter(|| black_box(inference.cv_noise_ceiling(&rdms).map(|nc| nc.lower)))
    });

    group.bench_function("boot_cosine_100", |b| {
        let inference = RdmInference::new()
            .method(ComparisonMethod::Cosine)
            .n_bootstrap(100)
            .bootstrap_scheme(BootstrapScheme::Rdms)
            .seed(1);
        b.iter(|| black_box(inference.boot_noise_ceiling(&rdms).map(|nc| nc.upper)))
    });
    group.finish();
}

criterion_group!(benches, bench_noise_ceiling);
criterion_main!(benches);
