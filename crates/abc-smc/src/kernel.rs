use abc_core::{AbcError, ErrorInfo, Prior, RngHandle, Simulator};
use nalgebra::DVector;

use crate::population::ChainRecord;
use crate::proposal::MvNormalProposal;
use crate::summary::{summarize, DistanceMetric, SummaryStatistic};

/// Simulate-and-compare half of the model: prior support check, simulator, reduction, distance.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    /// Prior of the model.
    pub prior: &'a dyn Prior,
    /// Forward simulator of the model.
    pub simulator: &'a dyn Simulator,
    /// Reducers building the statistic vector.
    pub summary_stats: &'a [SummaryStatistic],
    /// Distance between statistic vectors.
    pub distance: &'a DistanceMetric,
    /// Observed statistic vector.
    pub observed: &'a [f64],
}

impl Evaluator<'_> {
    /// Simulates at `point` and returns `(statistic, distance)`.
    pub fn simulate_distance(
        &self,
        point: &[f64],
        rng: &mut RngHandle,
    ) -> Result<(Vec<f64>, f64), AbcError> {
        let data = self.simulator.simulate(point, rng)?;
        let statistic = summarize(self.summary_stats, &data);
        if statistic.len() != self.observed.len() {
            return Err(AbcError::Simulation(
                ErrorInfo::new(
                    "statistic-shape",
                    "simulated statistic length differs from the observed one",
                )
                .with_context("simulated", statistic.len().to_string())
                .with_context("observed", self.observed.len().to_string()),
            ));
        }
        let distance = self.distance.distance(&statistic, self.observed);
        Ok((statistic, distance))
    }

    /// Simulates a prior draw once without moving it; the record counts as
    /// accepted in `stage`.
    ///
    /// Draws outside the prior support stay unevaluated and are never simulated.
    pub fn evaluate_position(
        &self,
        position: Vec<f64>,
        stage: usize,
        rng: &mut RngHandle,
    ) -> Result<ChainRecord, AbcError> {
        if !self.prior.log_prior(&position).is_finite() {
            return Ok(ChainRecord::unevaluated(position));
        }
        let (statistic, distance) = self.simulate_distance(&position, rng)?;
        Ok(ChainRecord {
            position,
            statistic,
            distance,
            log_weight: 0.0,
            evaluated: true,
            accepted_stage: Some(stage),
        })
    }
}

/// Read-only inputs shared by every chain's mutation within a stage.
#[derive(Clone, Copy)]
pub struct MutationContext<'a> {
    /// Simulate-and-compare collaborators.
    pub evaluator: Evaluator<'a>,
    /// Unscaled proposal used to draw perturbations.
    pub proposal: &'a MvNormalProposal,
    /// Proposal with covariance multiplied by `scaling²`, used for densities.
    pub scaled_proposal: &'a MvNormalProposal,
    /// Step-size factor applied to perturbations.
    pub scaling: f64,
    /// Acceptance tolerance.
    pub epsilon: f64,
    /// Stage stamped on accepted records.
    pub stage: usize,
    /// Attempt budget per chain.
    pub n_steps: usize,
    /// Discrete mask per dimension.
    pub discrete: &'a [bool],
}

/// Result of advancing one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// New slot content: the accepted candidate or the unchanged input.
    pub record: ChainRecord,
    /// Attempts made.
    pub proposed: usize,
    /// Whether an attempt was accepted.
    pub accepted: bool,
    /// Simulator calls made; prior rejections skip the simulator.
    pub simulations: usize,
}

/// Applies a perturbation, rounding discrete coordinates.
///
/// With every coordinate discrete the sum is carried out in integers.
pub fn perturb(position: &[f64], delta: &DVector<f64>, discrete: &[bool]) -> Vec<f64> {
    let all_discrete = !discrete.is_empty() && discrete.iter().all(|&d| d);
    if all_discrete {
        return position
            .iter()
            .zip(delta.iter())
            .map(|(q, d)| (q.round() as i64 + d.round() as i64) as f64)
            .collect();
    }
    position
        .iter()
        .zip(delta.iter())
        .zip(discrete)
        .map(|((q, d), &is_discrete)| if is_discrete { q + d.round() } else { q + d })
        .collect()
}

/// Advances one chain with the ABC rejection kernel.
///
/// The first candidate whose distance falls below epsilon wins. When the
/// budget runs out the input record is returned unchanged, keeping the
/// stage it was last accepted in.
pub fn mutate_chain(
    ctx: &MutationContext<'_>,
    current: &ChainRecord,
    rng: &mut RngHandle,
) -> Result<MutationOutcome, AbcError> {
    if ctx.n_steps == 0 {
        return Err(AbcError::config("n-steps-zero", "n_steps must be at least 1"));
    }
    let mut proposed = 0usize;
    let mut simulations = 0usize;
    for _ in 0..ctx.n_steps {
        proposed += 1;
        let delta = ctx.proposal.sample_one(rng) * ctx.scaling;
        let candidate = perturb(&current.position, &delta, ctx.discrete);
        let log_prior = ctx.evaluator.prior.log_prior(&candidate);
        if !log_prior.is_finite() {
            continue;
        }
        simulations += 1;
        let (statistic, distance) = ctx.evaluator.simulate_distance(&candidate, rng)?;
        if distance < ctx.epsilon {
            let applied: Vec<f64> = candidate
                .iter()
                .zip(&current.position)
                .map(|(new, old)| new - old)
                .collect();
            let log_weight = log_prior - ctx.scaled_proposal.log_pdf(&applied);
            return Ok(MutationOutcome {
                record: ChainRecord {
                    position: candidate,
                    statistic,
                    distance,
                    log_weight,
                    evaluated: true,
                    accepted_stage: Some(ctx.stage),
                },
                proposed,
                accepted: true,
                simulations,
            });
        }
    }
    Ok(MutationOutcome {
        record: current.clone(),
        proposed,
        accepted: false,
        simulations,
    })
}
