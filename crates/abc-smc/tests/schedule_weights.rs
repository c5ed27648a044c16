use abc_core::AbcError;
use abc_smc::config::TuningConfig;
use abc_smc::population::{ChainRecord, Population};
use abc_smc::schedule::{
    interquartile_range, normalize_log_weights, population_weights, tune_scaling, tune_steps,
    ToleranceScheduler,
};
use abc_smc::{Damping, SchedulePolicy, SmcConfig};
use proptest::prelude::*;

fn adaptive(damping: Damping) -> SmcConfig {
    SmcConfig {
        schedule: SchedulePolicy::Adaptive { damping },
        tolerance_floor: 0.1,
        ..SmcConfig::default()
    }
}

#[test]
fn interquartile_range_uses_plotting_positions() {
    let values: Vec<f64> = (1..=10).map(f64::from).collect();
    assert!((interquartile_range(&values) - 5.1).abs() < 1e-12);
    assert_eq!(interquartile_range(&[3.0]), 0.0);
}

#[test]
fn adaptive_epsilon_is_scaled_iqr_at_stage_zero() {
    let config = SmcConfig {
        iqr_scale: 2.0,
        ..adaptive(Damping::default())
    };
    let scheduler = ToleranceScheduler::new(&config);
    let distances: Vec<f64> = (1..=10).map(f64::from).collect();
    let eps = scheduler.next_epsilon(0, &distances, f64::INFINITY).unwrap();
    assert!((eps - 10.2).abs() < 1e-12);
}

#[test]
fn stage_power_damping_cools_later_stages() {
    let scheduler = ToleranceScheduler::new(&adaptive(Damping::default()));
    let distances: Vec<f64> = (1..=10).map(f64::from).collect();
    let eps = scheduler.next_epsilon(16, &distances, f64::INFINITY).unwrap();
    assert!((eps - 5.1 / 2.0).abs() < 1e-12);

    let undamped = ToleranceScheduler::new(&adaptive(Damping::None));
    let eps = undamped.next_epsilon(16, &distances, f64::INFINITY).unwrap();
    assert!((eps - 5.1).abs() < 1e-12);
}

#[test]
fn epsilon_never_increases() {
    let scheduler = ToleranceScheduler::new(&adaptive(Damping::None));
    let eps = scheduler.next_epsilon(3, &[0.0, 10.0, 20.0, 30.0], 1.5).unwrap();
    assert_eq!(eps, 1.5);
}

#[test]
fn non_finite_distances_are_ignored() {
    let scheduler = ToleranceScheduler::new(&adaptive(Damping::None));
    let mut distances: Vec<f64> = (1..=10).map(f64::from).collect();
    distances.push(f64::INFINITY);
    distances.push(f64::NAN);
    let eps = scheduler.next_epsilon(0, &distances, f64::INFINITY).unwrap();
    assert!((eps - 5.1).abs() < 1e-12);

    let err = scheduler
        .next_epsilon(0, &[f64::INFINITY, f64::INFINITY], f64::INFINITY)
        .unwrap_err();
    assert!(matches!(err, AbcError::EmptyPopulation(_)));
}

#[test]
fn fixed_schedule_is_indexed_by_stage_and_exhausts() {
    let config = SmcConfig {
        schedule: SchedulePolicy::Fixed {
            epsilons: vec![4.0, 2.0, 1.0],
        },
        tolerance_floor: 0.5,
        ..SmcConfig::default()
    };
    let scheduler = ToleranceScheduler::new(&config);
    assert_eq!(scheduler.next_epsilon(1, &[], 4.0).unwrap(), 2.0);
    let err = scheduler.next_epsilon(3, &[], 1.0).unwrap_err();
    assert!(matches!(err, AbcError::ScheduleExhausted(_)));
    assert!(scheduler.is_converged(0.5));
    assert!(!scheduler.is_converged(0.51));
}

#[test]
fn softmax_is_stable_for_large_log_weights() {
    let weights = normalize_log_weights(&[1000.0, 1000.0, f64::NEG_INFINITY]).unwrap();
    assert!((weights[0] - 0.5).abs() < 1e-12);
    assert!((weights[1] - 0.5).abs() < 1e-12);
    assert_eq!(weights[2], 0.0);
}

#[test]
fn all_non_finite_log_weights_empty_the_population() {
    let err = normalize_log_weights(&[f64::NEG_INFINITY, f64::NAN]).unwrap_err();
    assert!(matches!(err, AbcError::EmptyPopulation(_)));
    assert_eq!(err.info().code, "no-weights");
}

fn record(log_weight: f64, accepted_stage: Option<usize>) -> ChainRecord {
    ChainRecord {
        position: vec![1.0],
        statistic: vec![1.0],
        distance: 0.3,
        log_weight,
        evaluated: true,
        accepted_stage,
    }
}

#[test]
fn unevaluated_chains_get_no_weight() {
    let fresh = record(-2.0, Some(0));
    let population = Population::from_records(
        vec![fresh.clone(), ChainRecord::unevaluated(vec![2.0]), fresh],
        vec![false],
    )
    .unwrap();
    let weights = population_weights(&population, 0).unwrap();
    assert_eq!(weights, vec![0.5, 0.0, 0.5]);

    let empty =
        Population::from_records(vec![ChainRecord::unevaluated(vec![0.0]); 3], vec![false])
            .unwrap();
    assert!(matches!(
        population_weights(&empty, 0),
        Err(AbcError::EmptyPopulation(_))
    ));
}

#[test]
fn records_kept_from_earlier_stages_get_no_weight() {
    // a large stale log-weight must not outrank fresh acceptances
    let population = Population::from_records(
        vec![record(-3.0, Some(4)), record(9.0, Some(2)), record(-3.0, Some(4))],
        vec![false],
    )
    .unwrap();
    let weights = population_weights(&population, 4).unwrap();
    assert_eq!(weights, vec![0.5, 0.0, 0.5]);
    assert_eq!(population.stage_distances(4).len(), 2);

    let err = population_weights(&population, 5).unwrap_err();
    assert!(matches!(err, AbcError::EmptyPopulation(_)));
    assert_eq!(err.info().context.get("stage").map(String::as_str), Some("5"));
}

#[test]
fn stored_records_must_match_the_dimension() {
    let records = vec![record(0.0, Some(0)), ChainRecord::unevaluated(vec![])];
    let err = Population::from_records(records, vec![false]).unwrap_err();
    assert!(matches!(err, AbcError::Configuration(_)));
    assert_eq!(err.info().code, "record-dimension");
}

#[test]
fn tuning_follows_acceptance_rate() {
    assert!((tune_scaling(1.0) - 1.0).abs() < 1e-12);
    assert!((tune_scaling(0.0) - 1.0 / 81.0).abs() < 1e-12);

    let tuning = TuningConfig {
        enabled: true,
        ..TuningConfig::default()
    };
    // 1 + ceil(ln 0.01 / ln 0.5) = 1 + 7
    assert_eq!(tune_steps(0.5, 5, &tuning), 8);
    assert_eq!(tune_steps(1.0, 5, &tuning), 1);
    let capped = TuningConfig {
        max_steps: 20,
        ..tuning
    };
    assert_eq!(tune_steps(1e-6, 5, &capped), 20);
}

proptest! {
    #[test]
    fn normalized_weights_sum_to_one(raw in proptest::collection::vec(-500.0f64..500.0, 1..50)) {
        let weights = normalize_log_weights(&raw).unwrap();
        let total: f64 = weights.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
    }

    #[test]
    fn adaptive_schedule_is_non_increasing(
        batches in proptest::collection::vec(proptest::collection::vec(0.0f64..100.0, 4..30), 1..8)
    ) {
        let scheduler = ToleranceScheduler::new(&adaptive(Damping::default()));
        let mut previous = f64::INFINITY;
        for (stage, distances) in batches.iter().enumerate() {
            let eps = scheduler.next_epsilon(stage, distances, previous).unwrap();
            prop_assert!(eps <= previous);
            previous = eps;
        }
    }
}
