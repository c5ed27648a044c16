use abc_core::{dataset_from_column, AbcError, Dataset, ErrorInfo, RngHandle};
use criterion::{criterion_group, criterion_main, Criterion};
use rand_distr::{Distribution, Normal};

use abc_smc::{run, IndependentPrior, PriorDistribution, SmcConfig};

fn simulator(point: &[f64], rng: &mut RngHandle) -> Result<Dataset, AbcError> {
    let noise = Normal::new(point[0], 1.0)
        .map_err(|err| AbcError::Simulation(ErrorInfo::new("noise", err.to_string())))?;
    let values: Vec<f64> = (0..50).map(|_| noise.sample(rng)).collect();
    Ok(dataset_from_column(&values))
}

fn bench_stage(c: &mut Criterion) {
    let prior =
        IndependentPrior::new([("mu", PriorDistribution::Normal { mu: 0.0, sigma: 5.0 })]).unwrap();
    let observed = dataset_from_column(&[1.5; 50]);
    let mut config = SmcConfig {
        chains: 100,
        samples: 100,
        tolerance_floor: 0.2,
        ..SmcConfig::default()
    };
    config.output.run_directory = None;
    config.checkpoint.interval = 0;

    c.bench_function("smc_abc_run", |b| {
        b.iter(|| {
            let _ = run(&config, &prior, &simulator, &observed).unwrap();
        })
    });

    config.workers = 4;
    c.bench_function("smc_abc_run_four_workers", |b| {
        b.iter(|| {
            let _ = run(&config, &prior, &simulator, &observed).unwrap();
        })
    });
}

criterion_group!(benches, bench_stage);
criterion_main!(benches);
