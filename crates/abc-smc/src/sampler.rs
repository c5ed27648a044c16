use std::fs;
use std::path::{Path, PathBuf};

use abc_core::{AbcError, Dataset, ErrorInfo, Prior, RngHandle, Simulator, TracePoint, TraceSink};
use indexmap::IndexMap;
use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::checkpoint::{
    checkpoint_path, enforce_retention, existing_checkpoints, StageSnapshot, SNAPSHOT_SCHEMA,
};
use crate::config::{SmcConfig, StageZeroPolicy};
use crate::covariance::{effective_sample_size, weighted_covariance};
use crate::determinism;
use crate::kernel::{mutate_chain, Evaluator, MutationContext, MutationOutcome};
use crate::manifest::RunManifest;
use crate::metrics::{RunDiagnostics, StageMetrics, StageRecorder};
use crate::population::{ChainRecord, Population};
use crate::proposal::MvNormalProposal;
use crate::resample::{systematic_resample, uniform_ancestors};
use crate::schedule::{population_weights, tune_scaling, tune_steps, ToleranceScheduler};
use crate::summary::summarize;
use crate::trace::{MemoryTrace, Trace};

/// Position of a sampler in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No population drawn yet.
    Init,
    /// The given stage runs on the next advance.
    Stage(usize),
    /// The tolerance floor is reached; the next advance emits the posterior.
    Final,
    /// The posterior has been emitted.
    Done,
}

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Posterior draws of the final stage.
    pub trace: Trace,
    /// Tolerance computed at the end of each non-final stage.
    pub epsilons: Vec<f64>,
    /// Number of non-final stages executed.
    pub stages: usize,
    /// Per-stage metrics, final stage last.
    pub metrics: Vec<StageMetrics>,
    /// Aggregate acceptance figures.
    pub diagnostics: RunDiagnostics,
    /// Posterior mean per variable.
    pub posterior_means: IndexMap<String, f64>,
    /// Canonical hash of the trace.
    pub trace_hash: String,
    /// Trace CSV, if emitted.
    pub trace_path: Option<PathBuf>,
    /// Stage metrics CSV, if emitted.
    pub metrics_path: Option<PathBuf>,
    /// Manifest path, if emitted.
    pub manifest_path: Option<PathBuf>,
    /// Snapshot files retained at the end of the run.
    pub checkpoints: Vec<PathBuf>,
}

/// Population-based SMC-ABC sampler driven one phase at a time.
///
/// Each [`advance`](SmcAbcSampler::advance) performs exactly one transition
/// `Init → Stage(0) → … → Stage(k) → Final → Done`. Chains of a stage are
/// mutated on a dedicated rayon pool; each chain draws from its own seed
/// substream so results do not depend on the worker count.
pub struct SmcAbcSampler<'m> {
    config: SmcConfig,
    master_seed: u64,
    prior: &'m dyn Prior,
    simulator: &'m dyn Simulator,
    varnames: Vec<String>,
    discrete: Vec<bool>,
    observed: Vec<f64>,
    scheduler: ToleranceScheduler,
    pool: rayon::ThreadPool,
    phase: Phase,
    population: Option<Population>,
    weights: Option<Vec<f64>>,
    proposal: Option<MvNormalProposal>,
    epsilon: f64,
    epsilon_history: Vec<f64>,
    scaling: f64,
    n_steps: usize,
    recorder: StageRecorder,
    checkpoints: Vec<PathBuf>,
    trace: Option<Trace>,
}

impl<'m> SmcAbcSampler<'m> {
    /// Validates the configuration and reduces the observed data.
    pub fn new(
        config: SmcConfig,
        prior: &'m dyn Prior,
        simulator: &'m dyn Simulator,
        observed: &Dataset,
    ) -> Result<Self, AbcError> {
        config.validate()?;
        let observed_statistic = summarize(&config.summary_stats, observed);
        Self::assemble(config, prior, simulator, observed_statistic)
    }

    /// Rebuilds a sampler positioned at the stage recorded in `snapshot`.
    pub fn from_snapshot(
        snapshot: StageSnapshot,
        prior: &'m dyn Prior,
        simulator: &'m dyn Simulator,
    ) -> Result<Self, AbcError> {
        snapshot.config.validate()?;
        let mut sampler = Self::assemble(
            snapshot.config,
            prior,
            simulator,
            snapshot.observed_statistic,
        )?;
        if sampler.varnames != snapshot.varnames || sampler.discrete != snapshot.discrete {
            return Err(AbcError::Configuration(
                ErrorInfo::new("snapshot-model", "snapshot variables differ from the prior")
                    .with_context("snapshot", snapshot.varnames.join(","))
                    .with_context("prior", sampler.varnames.join(",")),
            ));
        }
        sampler.master_seed = snapshot.master_seed;
        sampler.population = Some(Population::from_records(snapshot.records, snapshot.discrete)?);
        sampler.proposal = Some(MvNormalProposal::new(snapshot.covariance)?);
        sampler.epsilon = snapshot.epsilon;
        sampler.epsilon_history = snapshot.epsilon_history;
        sampler.scaling = snapshot.scaling;
        sampler.n_steps = snapshot.n_steps;
        sampler.recorder = StageRecorder::from_samples(snapshot.metrics);
        sampler.phase = Phase::Stage(snapshot.stage);
        if let Some(run_dir) = &sampler.config.output.run_directory {
            let root = run_dir.join(&sampler.config.output.checkpoint_dir);
            sampler.checkpoints = existing_checkpoints(&root, snapshot.stage)?;
        }
        info!(
            "resuming at stage {} with epsilon {:.6}",
            snapshot.stage, sampler.epsilon
        );
        Ok(sampler)
    }

    fn assemble(
        config: SmcConfig,
        prior: &'m dyn Prior,
        simulator: &'m dyn Simulator,
        observed: Vec<f64>,
    ) -> Result<Self, AbcError> {
        if prior.dimension() == 0 {
            return Err(AbcError::config("prior-empty", "a model needs at least one variable"));
        }
        if observed.is_empty() || observed.iter().any(|value| !value.is_finite()) {
            return Err(AbcError::Configuration(
                ErrorInfo::new("observed-statistic", "observed statistic must be finite")
                    .with_context("statistic", format!("{observed:?}")),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|err| AbcError::Configuration(ErrorInfo::new("thread-pool", err.to_string())))?;
        let varnames = prior.variables().iter().map(|var| var.name.clone()).collect();
        let discrete = prior.discrete_mask();
        info!(
            "SMC-ABC with {} chains, {} samples, {} workers, distance {}",
            config.chains,
            config.samples,
            config.workers,
            config.distance_metric.label()
        );
        Ok(Self {
            master_seed: config.master_seed(),
            scheduler: ToleranceScheduler::new(&config),
            scaling: config.scaling,
            n_steps: config.n_steps,
            config,
            prior,
            simulator,
            varnames,
            discrete,
            observed,
            pool,
            phase: Phase::Init,
            population: None,
            weights: None,
            proposal: None,
            epsilon: f64::INFINITY,
            epsilon_history: Vec::new(),
            recorder: StageRecorder::new(),
            checkpoints: Vec::new(),
            trace: None,
        })
    }

    /// Starts from the given points instead of prior draws.
    pub fn with_start_points(mut self, points: Vec<Vec<f64>>) -> Result<Self, AbcError> {
        if self.phase != Phase::Init {
            return Err(AbcError::config(
                "start-after-init",
                "start points can only be set before the first stage",
            ));
        }
        self.population = Some(Population::from_points(
            points,
            self.discrete.clone(),
            self.config.chains,
        )?);
        Ok(self)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Tolerance the next stage mutates under.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Tolerances computed so far.
    pub fn epsilon_history(&self) -> &[f64] {
        &self.epsilon_history
    }

    /// Current population, absent before initialisation and after the final stage.
    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    /// Metrics recorded so far.
    pub fn metrics(&self) -> &[StageMetrics] {
        self.recorder.samples()
    }

    /// Reduced observed data.
    pub fn observed_statistic(&self) -> &[f64] {
        &self.observed
    }

    /// Configuration driving the run.
    pub fn config(&self) -> &SmcConfig {
        &self.config
    }

    /// Performs one lifecycle transition and returns the new phase.
    pub fn advance(&mut self) -> Result<Phase, AbcError> {
        let next = match self.phase {
            Phase::Init => self.initialize()?,
            Phase::Stage(stage) => self.run_stage(stage)?,
            Phase::Final => {
                let mut sink = MemoryTrace::new(self.varnames.clone());
                self.final_stage(&mut sink)?;
                self.trace = Some(sink.finalize()?);
                Phase::Done
            }
            Phase::Done => return Err(finished_error()),
        };
        self.phase = next;
        Ok(next)
    }

    /// State at the start of the pending stage, ready to be stored.
    pub fn snapshot(&self) -> Result<StageSnapshot, AbcError> {
        match self.phase {
            Phase::Stage(stage) if self.proposal.is_some() => self.build_snapshot(stage),
            phase => Err(AbcError::Configuration(
                ErrorInfo::new("snapshot-phase", "snapshots exist only between resampled stages")
                    .with_context("phase", format!("{phase:?}")),
            )),
        }
    }

    /// Runs all remaining phases, feeding the posterior draws into `sink`.
    ///
    /// No artefacts other than stage snapshots are written.
    pub fn run_with_sink<S: TraceSink>(mut self, mut sink: S) -> Result<S::Output, AbcError> {
        loop {
            match self.phase {
                Phase::Final => break,
                Phase::Done => return Err(finished_error()),
                _ => {
                    self.advance()?;
                }
            }
        }
        self.final_stage(&mut sink)?;
        self.phase = Phase::Done;
        sink.finalize()
    }

    /// Runs all remaining phases and writes the run artefacts.
    pub fn run_to_completion(mut self) -> Result<RunSummary, AbcError> {
        while self.phase != Phase::Done {
            self.advance()?;
        }
        let trace = self.trace.take().ok_or_else(finished_error)?;
        self.finish(trace)
    }

    fn initialize(&mut self) -> Result<Phase, AbcError> {
        let population = match self.population.take() {
            Some(population) => population,
            None => {
                let mut rng = RngHandle::from_seed(determinism::init_seed(self.master_seed));
                let points = self.prior.sample_prior(self.config.chains, &mut rng);
                Population::from_points(points, self.discrete.clone(), self.config.chains)?
            }
        };
        debug!("initial population of {} chains", population.len());
        self.population = Some(population);
        self.epsilon = f64::INFINITY;
        Ok(Phase::Stage(0))
    }

    fn run_stage(&mut self, stage: usize) -> Result<Phase, AbcError> {
        let mut population = self.take_population()?;
        let evaluate_only =
            stage == 0 && self.config.stage_zero == StageZeroPolicy::PriorEvaluation;
        let (proposed, accepted) = if evaluate_only {
            self.evaluate_population(&mut population)?;
            (0, 0)
        } else {
            if self.proposal.is_none() {
                let uniform = vec![1.0; population.len()];
                let covariance = weighted_covariance(&population.positions(), &uniform)?;
                self.proposal = Some(MvNormalProposal::new(covariance)?);
            }
            self.mutate_population(&mut population, stage)?
        };
        if !evaluate_only && accepted == 0 {
            warn!(
                "stage {stage}: no chain accepted a candidate under epsilon {:.6}",
                self.epsilon
            );
        }

        let weights = population_weights(&population, stage)?;
        let accepted_distances = population.stage_distances(stage);
        let next = self
            .scheduler
            .next_epsilon(stage, &accepted_distances, self.epsilon)?;
        let acceptance_rate = rate(accepted, proposed);
        let ess = effective_sample_size(&weights);
        self.recorder.push(StageMetrics {
            stage: Some(stage),
            epsilon: self.epsilon,
            proposed,
            accepted,
            acceptance_rate,
            effective_sample_size: ess,
            scaling: self.scaling,
            n_steps: self.n_steps,
            mean_distance: mean_finite(&accepted_distances),
        });
        self.epsilon_history.push(next);
        info!("stage {stage}: epsilon {next:.6}, acceptance {acceptance_rate:.3}, ess {ess:.1}");

        if self.scheduler.is_converged(next) {
            info!("tolerance floor reached after {} stages", stage + 1);
            self.epsilon = next;
            self.weights = Some(weights);
            self.population = Some(population);
            return Ok(Phase::Final);
        }
        if stage + 1 >= self.config.max_stages {
            return Err(AbcError::ScheduleExhausted(
                ErrorInfo::new("max-stages", "stage cap reached before the tolerance floor")
                    .with_context("stages", (stage + 1).to_string())
                    .with_context("epsilon", next.to_string())
                    .with_hint("raise max_stages or tolerance_floor"),
            ));
        }

        let mut rng = RngHandle::from_seed(determinism::resample_seed(self.master_seed, stage));
        let ancestors = systematic_resample(&weights, &mut rng)?;
        let population = population.reindex(&ancestors);
        let uniform = vec![1.0; population.len()];
        let covariance = weighted_covariance(&population.positions(), &uniform)?;
        self.proposal = Some(MvNormalProposal::new(covariance)?);

        let tuning = &self.config.tuning;
        if tuning.enabled && proposed > 0 && (stage + 1) % tuning.tune_interval == 0 {
            self.scaling = tune_scaling(acceptance_rate);
            self.n_steps = tune_steps(acceptance_rate, self.n_steps, tuning);
            debug!(
                "stage {stage}: tuned scaling {:.4}, n_steps {}",
                self.scaling, self.n_steps
            );
        }

        self.epsilon = next;
        self.population = Some(population);

        let interval = self.config.checkpoint.interval;
        if interval > 0 && (stage + 1) % interval == 0 {
            if let Some(run_dir) = &self.config.output.run_directory {
                let path = checkpoint_path(&run_dir.join(&self.config.output.checkpoint_dir), stage + 1);
                self.build_snapshot(stage + 1)?.store(&path)?;
                debug!("wrote snapshot {}", path.display());
                self.checkpoints.retain(|kept| kept != &path);
                self.checkpoints.push(path);
                enforce_retention(&mut self.checkpoints, self.config.checkpoint.max_to_keep)?;
            }
        }
        Ok(Phase::Stage(stage + 1))
    }

    /// Emits `samples` posterior draws, each with a distance below the floor.
    ///
    /// A draw that does not move in the final pass keeps its ancestor when the
    /// ancestor is already within the floor, and is otherwise refilled from the
    /// records that are.
    fn final_stage<S: TraceSink>(&mut self, sink: &mut S) -> Result<(), AbcError> {
        let population = self.take_population()?;
        let weights = self.weights.take().ok_or_else(|| {
            AbcError::EmptyPopulation(ErrorInfo::new(
                "final-weights",
                "final stage reached without importance weights",
            ))
        })?;
        let final_stage = self.epsilon_history.len();
        let mut rng = RngHandle::from_seed(determinism::resample_seed(self.master_seed, final_stage));
        let ancestors = systematic_resample(&weights, &mut rng)?;
        let population = population.reindex(&ancestors);
        let uniform = vec![1.0; population.len()];
        let proposal = MvNormalProposal::new(weighted_covariance(&population.positions(), &uniform)?)?;
        let scaled = proposal.scaled(self.scaling)?;

        let mut draw_rng = RngHandle::from_seed(determinism::final_draw_seed(self.master_seed));
        let draws = uniform_ancestors(population.len(), self.config.samples, &mut draw_rng);
        let floor = self.scheduler.floor();
        let ctx = MutationContext {
            evaluator: self.evaluator(),
            proposal: &proposal,
            scaled_proposal: &scaled,
            scaling: self.scaling,
            epsilon: floor,
            stage: final_stage,
            n_steps: self.n_steps,
            discrete: &self.discrete,
        };
        let seed = self.master_seed;
        let outcomes = self.par_chains(draws.len(), |draw| {
            let mut rng = RngHandle::from_seed(determinism::final_chain_seed(seed, draw));
            mutate_chain(&ctx, population.record(draws[draw]), &mut rng)
        })?;

        let within_floor = |record: &ChainRecord| record.evaluated && record.distance < floor;
        let mut pool: Vec<(usize, ChainRecord)> = population
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| within_floor(*record))
            .map(|(chain, record)| (chain, record.clone()))
            .collect();
        pool.extend(
            draws
                .iter()
                .zip(&outcomes)
                .filter(|(_, outcome)| outcome.accepted)
                .map(|(&chain, outcome)| (chain, outcome.record.clone())),
        );
        if pool.is_empty() {
            return Err(AbcError::EmptyPopulation(
                ErrorInfo::new("final-empty", "no record lies within the tolerance floor")
                    .with_context("floor", floor.to_string())
                    .with_hint("raise n_steps or tolerance_floor"),
            ));
        }

        let mut refill = RngHandle::from_seed(determinism::final_refill_seed(self.master_seed));
        let mut proposed = 0usize;
        let mut accepted = 0usize;
        let mut refilled = 0usize;
        let mut distances = Vec::with_capacity(outcomes.len());
        for (&ancestor, outcome) in draws.iter().zip(outcomes) {
            proposed += outcome.proposed;
            let moved = outcome.accepted;
            let (chain, record) = if moved || within_floor(&outcome.record) {
                (ancestor, outcome.record)
            } else {
                refilled += 1;
                let (source, record) = &pool[refill.gen_range(0..pool.len())];
                (*source, record.clone())
            };
            if moved {
                accepted += 1;
            }
            distances.push(record.distance);
            sink.record(
                chain,
                TracePoint {
                    point: record.position,
                    distance: record.distance,
                    log_weight: record.log_weight,
                    accepted: moved,
                },
            )?;
        }
        let acceptance_rate = rate(accepted, proposed);
        self.recorder.push(StageMetrics {
            stage: None,
            epsilon: floor,
            proposed,
            accepted,
            acceptance_rate,
            effective_sample_size: effective_sample_size(&weights),
            scaling: self.scaling,
            n_steps: self.n_steps,
            mean_distance: mean_finite(&distances),
        });
        debug!("final stage: {refilled} draws refilled from {} records within the floor", pool.len());
        info!(
            "final stage: {} draws at epsilon {floor:.6}, acceptance {acceptance_rate:.3}",
            draws.len()
        );
        Ok(())
    }

    fn evaluate_population(&self, population: &mut Population) -> Result<(), AbcError> {
        let evaluator = self.evaluator();
        let seed = self.master_seed;
        let current = &*population;
        let records = self.par_chains(current.len(), |chain| {
            let mut rng = RngHandle::from_seed(determinism::chain_seed(seed, 0, chain));
            evaluator.evaluate_position(current.record(chain).position.clone(), 0, &mut rng)
        })?;
        for (chain, record) in records.into_iter().enumerate() {
            population.replace(chain, record);
        }
        Ok(())
    }

    fn mutate_population(
        &self,
        population: &mut Population,
        stage: usize,
    ) -> Result<(usize, usize), AbcError> {
        let proposal = self.proposal.as_ref().ok_or_else(|| {
            AbcError::InvalidCovariance(ErrorInfo::new(
                "proposal-missing",
                "no proposal covariance before mutation",
            ))
        })?;
        let scaled = proposal.scaled(self.scaling)?;
        let ctx = MutationContext {
            evaluator: self.evaluator(),
            proposal,
            scaled_proposal: &scaled,
            scaling: self.scaling,
            epsilon: self.epsilon,
            stage,
            n_steps: self.n_steps,
            discrete: &self.discrete,
        };
        let seed = self.master_seed;
        let current = &*population;
        let outcomes: Vec<MutationOutcome> = self.par_chains(current.len(), |chain| {
            let mut rng = RngHandle::from_seed(determinism::chain_seed(seed, stage, chain));
            mutate_chain(&ctx, current.record(chain), &mut rng)
        })?;

        let mut proposed = 0usize;
        let mut accepted = 0usize;
        for (chain, outcome) in outcomes.into_iter().enumerate() {
            proposed += outcome.proposed;
            if outcome.accepted {
                accepted += 1;
            }
            population.replace(chain, outcome.record);
        }
        Ok((proposed, accepted))
    }

    fn par_chains<T, F>(&self, count: usize, job: F) -> Result<Vec<T>, AbcError>
    where
        T: Send,
        F: Fn(usize) -> Result<T, AbcError> + Send + Sync,
    {
        // indexed collect keeps chain order regardless of scheduling
        self.pool
            .install(|| (0..count).into_par_iter().map(|chain| job(chain)).collect())
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator {
            prior: self.prior,
            simulator: self.simulator,
            summary_stats: &self.config.summary_stats,
            distance: &self.config.distance_metric,
            observed: &self.observed,
        }
    }

    fn take_population(&mut self) -> Result<Population, AbcError> {
        self.population.take().ok_or_else(|| {
            AbcError::EmptyPopulation(ErrorInfo::new(
                "population-missing",
                "no population is available in this phase",
            ))
        })
    }

    fn build_snapshot(&self, stage: usize) -> Result<StageSnapshot, AbcError> {
        let population = self.population.as_ref().ok_or_else(|| {
            AbcError::EmptyPopulation(ErrorInfo::new(
                "population-missing",
                "no population is available in this phase",
            ))
        })?;
        let proposal = self.proposal.as_ref().ok_or_else(|| {
            AbcError::InvalidCovariance(ErrorInfo::new(
                "proposal-missing",
                "no proposal covariance to store",
            ))
        })?;
        Ok(StageSnapshot {
            schema_version: SNAPSHOT_SCHEMA,
            stage,
            config: self.config.clone(),
            master_seed: self.master_seed,
            epsilon: self.epsilon,
            epsilon_history: self.epsilon_history.clone(),
            scaling: self.scaling,
            n_steps: self.n_steps,
            covariance: proposal.covariance().clone(),
            varnames: self.varnames.clone(),
            discrete: self.discrete.clone(),
            observed_statistic: self.observed.clone(),
            records: population.records().to_vec(),
            metrics: self.recorder.samples().to_vec(),
        })
    }

    fn finish(&self, trace: Trace) -> Result<RunSummary, AbcError> {
        let trace_hash = trace.canonical_hash()?;
        let posterior_means = trace.means();
        let diagnostics = self.recorder.diagnostics();
        let output = &self.config.output;

        let (trace_path, metrics_path, manifest_path) = match &output.run_directory {
            Some(run_dir) => {
                fs::create_dir_all(run_dir)
                    .map_err(|err| AbcError::io("run-dir-create", err, run_dir))?;
                let trace_path = run_dir.join(&output.trace_file);
                trace.write_csv(&trace_path)?;
                let metrics_path = run_dir.join(&output.metrics_file);
                self.recorder
                    .write_csv(&metrics_path)
                    .map_err(|err| AbcError::io("metrics-write", err, &metrics_path))?;
                let manifest_path = run_dir.join(&output.manifest_file);
                let manifest = RunManifest {
                    config: self.config.clone(),
                    provenance: RunManifest::provenance(&self.config)?,
                    seed_label: self.config.seed_policy.label.clone(),
                    trace_hash: trace_hash.clone(),
                    epsilons: self.epsilon_history.clone(),
                    posterior_means: posterior_means.clone(),
                    trace_file: Some(output.trace_file.clone()),
                    metrics_file: Some(output.metrics_file.clone()),
                    checkpoints: relative_paths(&self.checkpoints, run_dir),
                };
                manifest.write(&manifest_path)?;
                (Some(trace_path), Some(metrics_path), Some(manifest_path))
            }
            None => (None, None, None),
        };

        Ok(RunSummary {
            trace,
            epsilons: self.epsilon_history.clone(),
            stages: diagnostics.stages,
            metrics: self.recorder.samples().to_vec(),
            diagnostics,
            posterior_means,
            trace_hash,
            trace_path,
            metrics_path,
            manifest_path,
            checkpoints: self.checkpoints.clone(),
        })
    }
}

/// Runs the sampler from scratch with the provided configuration.
pub fn run(
    config: &SmcConfig,
    prior: &dyn Prior,
    simulator: &dyn Simulator,
    observed: &Dataset,
) -> Result<RunSummary, AbcError> {
    SmcAbcSampler::new(config.clone(), prior, simulator, observed)?.run_to_completion()
}

/// Resumes a run from a stage snapshot file.
pub fn resume(
    path: &Path,
    prior: &dyn Prior,
    simulator: &dyn Simulator,
) -> Result<RunSummary, AbcError> {
    let snapshot = StageSnapshot::load(path)?;
    SmcAbcSampler::from_snapshot(snapshot, prior, simulator)?.run_to_completion()
}

fn finished_error() -> AbcError {
    AbcError::config("sampler-finished", "the sampler has already emitted its posterior")
}

fn rate(accepted: usize, proposed: usize) -> f64 {
    if proposed == 0 {
        0.0
    } else {
        accepted as f64 / proposed as f64
    }
}

fn mean_finite(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        f64::NAN
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    }
}

fn relative_paths(paths: &[PathBuf], root: &Path) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok().map(|rel| rel.to_path_buf()))
        .collect()
}
