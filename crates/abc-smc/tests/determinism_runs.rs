use abc_core::{dataset_from_column, AbcError, Dataset, ErrorInfo, RngHandle};
use abc_smc::{run, IndependentPrior, PriorDistribution, SmcConfig};
use rand_distr::{Distribution, Normal};

fn observed() -> Dataset {
    dataset_from_column(&[0.8, 1.1, 1.4, 0.9, 1.3, 1.0, 0.7, 1.2, 1.1, 0.5])
}

fn simulator(point: &[f64], rng: &mut RngHandle) -> Result<Dataset, AbcError> {
    let noise = Normal::new(point[0], 0.5)
        .map_err(|err| AbcError::Simulation(ErrorInfo::new("noise", err.to_string())))?;
    let values: Vec<f64> = (0..10).map(|_| noise.sample(rng)).collect();
    Ok(dataset_from_column(&values))
}

fn prior() -> IndependentPrior {
    IndependentPrior::new([("theta", PriorDistribution::Uniform { lower: -5.0, upper: 5.0 })])
        .unwrap()
}

fn base_config() -> SmcConfig {
    SmcConfig {
        chains: 64,
        samples: 128,
        tolerance_floor: 0.2,
        ..SmcConfig::default()
    }
}

#[test]
fn same_seed_reproduces_the_trace() {
    let prior = prior();
    let first = run(&base_config(), &prior, &simulator, &observed()).unwrap();
    let second = run(&base_config(), &prior, &simulator, &observed()).unwrap();
    assert_eq!(first.trace, second.trace);
    assert_eq!(first.trace_hash, second.trace_hash);
    assert_eq!(first.epsilons, second.epsilons);
}

#[test]
fn worker_count_does_not_change_results() {
    let prior = prior();
    let serial = run(&base_config(), &prior, &simulator, &observed()).unwrap();
    let config = SmcConfig {
        workers: 4,
        ..base_config()
    };
    let parallel = run(&config, &prior, &simulator, &observed()).unwrap();
    assert_eq!(serial.trace_hash, parallel.trace_hash);
    assert_eq!(serial.metrics, parallel.metrics);
}

#[test]
fn different_seeds_diverge() {
    let prior = prior();
    let first = run(&base_config(), &prior, &simulator, &observed()).unwrap();
    let mut config = base_config();
    config.seed_policy.master_seed = 7;
    let second = run(&config, &prior, &simulator, &observed()).unwrap();
    assert_ne!(first.trace_hash, second.trace_hash);
}
