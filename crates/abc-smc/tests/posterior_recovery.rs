use abc_core::{dataset_from_column, AbcError, Dataset, ErrorInfo, RngHandle};
use abc_smc::{
    run, IndependentPrior, Phase, PriorDistribution, SmcAbcSampler, SmcConfig, StageZeroPolicy,
};
use rand_distr::{Distribution, Normal, Poisson};

const OBSERVATIONS: usize = 100;

fn observed_with_mean_two() -> Dataset {
    // offsets cycle through -2..=2 and cancel exactly
    let values: Vec<f64> = (0..OBSERVATIONS)
        .map(|i| 2.0 + 0.5 * ((i % 5) as f64 - 2.0))
        .collect();
    dataset_from_column(&values)
}

fn gaussian_mean(point: &[f64], rng: &mut RngHandle) -> Result<Dataset, AbcError> {
    let noise = Normal::new(point[0], 1.0)
        .map_err(|err| AbcError::Simulation(ErrorInfo::new("noise", err.to_string())))?;
    let values: Vec<f64> = (0..OBSERVATIONS).map(|_| noise.sample(rng)).collect();
    Ok(dataset_from_column(&values))
}

fn poisson_counts(point: &[f64], rng: &mut RngHandle) -> Result<Dataset, AbcError> {
    let counts = Poisson::new(point[0])
        .map_err(|err| AbcError::Simulation(ErrorInfo::new("rate", err.to_string())))?;
    let values: Vec<f64> = (0..30).map(|_| counts.sample(rng)).collect();
    Ok(dataset_from_column(&values))
}

fn gaussian_config() -> SmcConfig {
    SmcConfig {
        chains: 200,
        samples: 1000,
        tolerance_floor: 0.05,
        ..SmcConfig::default()
    }
}

fn gaussian_prior() -> IndependentPrior {
    IndependentPrior::new([("mu", PriorDistribution::Normal { mu: 0.0, sigma: 5.0 })]).unwrap()
}

#[test]
fn gaussian_mean_is_recovered_across_seeds() {
    let prior = gaussian_prior();
    for seed in [1_u64, 2, 3, 4, 5, 6] {
        let mut config = gaussian_config();
        config.seed_policy.master_seed = seed;
        let summary = run(&config, &prior, &gaussian_mean, &observed_with_mean_two()).unwrap();

        assert_eq!(summary.trace.len(), 1000);
        let mean = summary.posterior_means["mu"];
        assert!((mean - 2.0).abs() < 0.1, "seed {seed}: posterior mean {mean}");
        assert!(summary.epsilons.windows(2).all(|pair| pair[1] <= pair[0]));
        assert!(*summary.epsilons.last().unwrap() <= 0.05);
        assert_eq!(summary.stages, summary.epsilons.len());

        let last = summary.metrics.last().unwrap();
        assert_eq!(last.stage, None);
        assert_eq!(last.epsilon, 0.05);
        assert!(
            summary.trace.draws.iter().all(|draw| draw.distance < last.epsilon),
            "seed {seed}: a draw lies outside the final tolerance"
        );
        assert!(summary.trace_path.is_none());
    }
}

#[test]
fn resampled_generations_hold_only_fresh_acceptances() {
    let prior = gaussian_prior();
    let observed = observed_with_mean_two();
    let mut sampler = SmcAbcSampler::new(gaussian_config(), &prior, &gaussian_mean, &observed)
        .unwrap();
    assert_eq!(sampler.advance().unwrap(), Phase::Stage(0));
    loop {
        match sampler.advance().unwrap() {
            Phase::Stage(next) => {
                let ran = next - 1;
                let tolerance = sampler.metrics().last().unwrap().epsilon;
                let population = sampler.population().unwrap();
                assert!(population.records().iter().all(|r| r.accepted_in(ran)));
                assert!(population.distances().iter().all(|&d| d < tolerance));
            }
            Phase::Final => break,
            other => panic!("unexpected phase {other:?}"),
        }
    }
}

#[test]
fn mutation_pass_at_stage_zero_also_converges() {
    let prior = gaussian_prior();
    let config = SmcConfig {
        stage_zero: StageZeroPolicy::MutationPass,
        ..gaussian_config()
    };
    let summary = run(&config, &prior, &gaussian_mean, &observed_with_mean_two()).unwrap();
    assert!(summary.metrics[0].proposed > 0);
    let mean = summary.posterior_means["mu"];
    assert!((mean - 2.0).abs() < 0.1, "posterior mean {mean}");
}

#[test]
fn tuned_runs_stay_within_step_bounds() {
    let prior = gaussian_prior();
    let mut config = gaussian_config();
    config.tuning.enabled = true;
    config.tuning.max_steps = 40;
    let summary = run(&config, &prior, &gaussian_mean, &observed_with_mean_two()).unwrap();
    assert!(summary
        .metrics
        .iter()
        .all(|m| m.n_steps >= 1 && m.n_steps <= 40 && m.scaling > 0.0));
    let mean = summary.posterior_means["mu"];
    assert!((mean - 2.0).abs() < 0.1, "posterior mean {mean}");
}

#[test]
fn discrete_rate_stays_on_integers() {
    let prior = IndependentPrior::new([(
        "k",
        PriorDistribution::DiscreteUniform { lower: 1, upper: 20 },
    )])
    .unwrap();
    let observed = dataset_from_column(&[7.0; 30]);
    let config = SmcConfig {
        chains: 200,
        samples: 400,
        tolerance_floor: 0.5,
        ..SmcConfig::default()
    };
    let summary = run(&config, &prior, &poisson_counts, &observed).unwrap();
    assert!(summary.trace.draws.iter().all(|draw| draw.distance < 0.5));
    let draws = summary.trace.column("k").unwrap();
    assert!(draws.iter().all(|k| k.fract() == 0.0 && (1.0..=20.0).contains(k)));
    let mean = summary.posterior_means["k"];
    assert!((mean - 7.0).abs() < 1.0, "posterior mean {mean}");
}
