use abc_core::{AbcError, ErrorInfo};
use log::debug;

use crate::config::{Damping, SchedulePolicy, SmcConfig, TuningConfig};
use crate::population::Population;

/// Produces the tolerance of each stage and the importance weights of a population.
#[derive(Debug, Clone)]
pub struct ToleranceScheduler {
    policy: SchedulePolicy,
    iqr_scale: f64,
    floor: f64,
}

impl ToleranceScheduler {
    /// Creates a scheduler from the run configuration.
    pub fn new(config: &SmcConfig) -> Self {
        Self {
            policy: config.schedule.clone(),
            iqr_scale: config.iqr_scale,
            floor: config.tolerance_floor,
        }
    }

    /// Tolerance floor below which sampling stops.
    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// True once `epsilon` allows the final stage to run.
    pub fn is_converged(&self, epsilon: f64) -> bool {
        epsilon <= self.floor
    }

    /// Tolerance computed at the end of `stage` from the distances of the
    /// chains accepted in that stage.
    ///
    /// The result never exceeds `previous`, so the schedule is non-increasing.
    pub fn next_epsilon(
        &self,
        stage: usize,
        distances: &[f64],
        previous: f64,
    ) -> Result<f64, AbcError> {
        let candidate = match &self.policy {
            SchedulePolicy::Fixed { epsilons } => *epsilons.get(stage).ok_or_else(|| {
                AbcError::ScheduleExhausted(
                    ErrorInfo::new(
                        "schedule-exhausted",
                        "fixed epsilon schedule is shorter than the stages executed",
                    )
                    .with_context("stage", stage.to_string())
                    .with_context("length", epsilons.len().to_string())
                    .with_hint("end the schedule at or below tolerance_floor"),
                )
            })?,
            SchedulePolicy::Adaptive { damping } => {
                let finite: Vec<f64> = distances.iter().copied().filter(|d| d.is_finite()).collect();
                if finite.is_empty() {
                    return Err(AbcError::EmptyPopulation(
                        ErrorInfo::new("no-distances", "no chain has a finite distance")
                            .with_context("stage", stage.to_string()),
                    ));
                }
                let base = interquartile_range(&finite).abs() * self.iqr_scale;
                match damping {
                    Damping::StagePower { exponent } if stage > 0 => {
                        base * (stage as f64).powf(-exponent)
                    }
                    _ => base,
                }
            }
        };
        if candidate > previous {
            debug!("stage {stage}: epsilon {candidate:.6} clamped to previous {previous:.6}");
            return Ok(previous);
        }
        Ok(candidate)
    }
}

/// Interquartile range using the `(0.4, 0.4)` plotting positions.
pub fn interquartile_range(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25)
}

fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    const ALPHA: f64 = 0.4;
    const BETA: f64 = 0.4;
    let n = sorted.len();
    match n {
        0 => return f64::NAN,
        1 => return sorted[0],
        _ => {}
    }
    let m = ALPHA + p * (1.0 - ALPHA - BETA);
    let aleph = n as f64 * p + m;
    let k = aleph.clamp(1.0, (n - 1) as f64).floor();
    let gamma = (aleph - k).clamp(0.0, 1.0);
    let k = k as usize;
    (1.0 - gamma) * sorted[k - 1] + gamma * sorted[k]
}

/// Stabilised softmax of log-weights: `exp(w - max(w))`, normalised to sum to one.
///
/// Non-finite entries get zero weight. Fails when no entry is finite.
pub fn normalize_log_weights(log_weights: &[f64]) -> Result<Vec<f64>, AbcError> {
    let max = log_weights
        .iter()
        .copied()
        .filter(|w| w.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(AbcError::EmptyPopulation(
            ErrorInfo::new("no-weights", "no chain carries a finite log-weight")
                .with_context("chains", log_weights.len().to_string())
                .with_hint("the tolerance may be too tight or the simulator mismatched"),
        ));
    }
    let unnormalized: Vec<f64> = log_weights
        .iter()
        .map(|&w| if w.is_finite() { (w - max).exp() } else { 0.0 })
        .collect();
    let total: f64 = unnormalized.iter().sum();
    Ok(unnormalized.into_iter().map(|w| w / total).collect())
}

/// Importance weights of a population after `stage`.
///
/// Only records accepted under the tolerance of `stage` carry weight; slots
/// that kept an older record get zero. Fails when no slot was accepted.
pub fn population_weights(population: &Population, stage: usize) -> Result<Vec<f64>, AbcError> {
    let log_weights: Vec<f64> = population
        .records()
        .iter()
        .map(|record| {
            if record.accepted_in(stage) {
                record.log_weight
            } else {
                f64::NEG_INFINITY
            }
        })
        .collect();
    normalize_log_weights(&log_weights).map_err(|err| match err {
        AbcError::EmptyPopulation(info) => {
            AbcError::EmptyPopulation(info.with_context("stage", stage.to_string()))
        }
        other => other,
    })
}

/// Proposal scaling from an acceptance rate (Muto & Beck 2008).
pub fn tune_scaling(acceptance_rate: f64) -> f64 {
    let a = 1.0 / 9.0;
    let b = 8.0 / 9.0;
    (a + b * acceptance_rate.clamp(0.0, 1.0)).powi(2)
}

/// Attempt budget giving probability `p_acc_rate` of a chain never accepting.
pub fn tune_steps(acceptance_rate: f64, current_steps: usize, tuning: &TuningConfig) -> usize {
    let rate = if acceptance_rate <= 0.0 {
        1.0 / current_steps.max(1) as f64
    } else {
        acceptance_rate
    };
    if rate >= 1.0 {
        return 1;
    }
    let steps = 1.0 + (tuning.p_acc_rate.ln() / (1.0 - rate).ln()).ceil();
    if !steps.is_finite() {
        return tuning.max_steps;
    }
    (steps as usize).clamp(1, tuning.max_steps)
}
