use std::fs;
use std::path::{Path, PathBuf};

use abc_core::{AbcError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::summary::{DistanceMetric, SummaryStatistic};

/// YAML-configurable parameters governing an SMC-ABC run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmcConfig {
    /// Number of posterior draws emitted by the final stage.
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Number of chains kept in the population.
    #[serde(default = "default_chains")]
    pub chains: usize,
    /// Attempt budget of the mutation kernel per chain and stage.
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,
    /// Step-size factor applied to proposal perturbations.
    #[serde(default = "default_scaling")]
    pub scaling: f64,
    /// Sampling stops once the tolerance reaches this floor.
    #[serde(default = "default_tolerance_floor")]
    pub tolerance_floor: f64,
    /// Factor applied to the interquartile range in adaptive mode.
    #[serde(default = "default_iqr_scale")]
    pub iqr_scale: f64,
    /// Reducers applied to simulated and observed data.
    #[serde(default = "default_summary_stats")]
    pub summary_stats: Vec<SummaryStatistic>,
    /// Distance between reduced statistic vectors.
    #[serde(default)]
    pub distance_metric: DistanceMetric,
    /// Proposal family used by the mutation kernel.
    #[serde(default)]
    pub proposal_kind: ProposalKind,
    /// Tolerance schedule policy.
    #[serde(default)]
    pub schedule: SchedulePolicy,
    /// Handling of the initial stage.
    #[serde(default)]
    pub stage_zero: StageZeroPolicy,
    /// Adaptive step-size and step-count tuning.
    #[serde(default)]
    pub tuning: TuningConfig,
    /// Safety cap on the number of non-final stages.
    #[serde(default = "default_max_stages")]
    pub max_stages: usize,
    /// Worker threads used to mutate chains.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Require `chains` to split evenly across `workers`.
    #[serde(default)]
    pub strict_partition: bool,
    /// Master seed and substream policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Stage snapshot behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Output directory configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_samples() -> usize {
    1000
}

fn default_chains() -> usize {
    200
}

fn default_n_steps() -> usize {
    5
}

fn default_scaling() -> f64 {
    1.0
}

fn default_tolerance_floor() -> f64 {
    0.5
}

fn default_iqr_scale() -> f64 {
    1.0
}

fn default_summary_stats() -> Vec<SummaryStatistic> {
    vec![SummaryStatistic::Mean]
}

fn default_max_stages() -> usize {
    100
}

fn default_workers() -> usize {
    1
}

impl Default for SmcConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            chains: default_chains(),
            n_steps: default_n_steps(),
            scaling: default_scaling(),
            tolerance_floor: default_tolerance_floor(),
            iqr_scale: default_iqr_scale(),
            summary_stats: default_summary_stats(),
            distance_metric: DistanceMetric::default(),
            proposal_kind: ProposalKind::default(),
            schedule: SchedulePolicy::default(),
            stage_zero: StageZeroPolicy::default(),
            tuning: TuningConfig::default(),
            max_stages: default_max_stages(),
            workers: default_workers(),
            strict_partition: false,
            seed_policy: SeedPolicy::default(),
            checkpoint: CheckpointConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl SmcConfig {
    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, AbcError> {
        let contents =
            fs::read_to_string(path).map_err(|err| AbcError::io("config-read", err, path))?;
        serde_yaml::from_str(&contents).map_err(|err| AbcError::io("config-parse", err, path))
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, AbcError> {
        serde_yaml::from_str(contents)
            .map_err(|err| AbcError::Serde(ErrorInfo::new("config-parse", err.to_string())))
    }

    /// Master seed used by the run.
    pub fn master_seed(&self) -> u64 {
        self.seed_policy.master_seed
    }

    /// Rejects configurations the sampler cannot run. Called before any simulation.
    pub fn validate(&self) -> Result<(), AbcError> {
        if self.n_steps == 0 {
            return Err(AbcError::Configuration(
                ErrorInfo::new("n-steps-zero", "n_steps must be at least 1")
                    .with_hint("an attempt budget of 0 never proposes a move"),
            ));
        }
        if self.chains < 2 {
            return Err(AbcError::Configuration(
                ErrorInfo::new("chains-too-few", "at least two chains are required")
                    .with_context("chains", self.chains.to_string()),
            ));
        }
        if self.samples == 0 {
            return Err(AbcError::config("samples-zero", "samples must be positive"));
        }
        if !(self.scaling.is_finite() && self.scaling > 0.0) {
            return Err(AbcError::Configuration(
                ErrorInfo::new("scaling-invalid", "scaling must be finite and positive")
                    .with_context("scaling", self.scaling.to_string()),
            ));
        }
        if !(self.tolerance_floor.is_finite() && self.tolerance_floor >= 0.0) {
            return Err(AbcError::Configuration(
                ErrorInfo::new("floor-invalid", "tolerance_floor must be finite and >= 0")
                    .with_context("tolerance_floor", self.tolerance_floor.to_string()),
            ));
        }
        if !(self.iqr_scale.is_finite() && self.iqr_scale > 0.0) {
            return Err(AbcError::Configuration(
                ErrorInfo::new("iqr-scale-invalid", "iqr_scale must be finite and positive")
                    .with_context("iqr_scale", self.iqr_scale.to_string()),
            ));
        }
        if self.summary_stats.is_empty() {
            return Err(AbcError::config(
                "summary-stats-empty",
                "at least one summary statistic is required",
            ));
        }
        if self.max_stages == 0 {
            return Err(AbcError::config("max-stages-zero", "max_stages must be positive"));
        }
        if self.workers == 0 {
            return Err(AbcError::config("workers-zero", "workers must be positive"));
        }
        if self.strict_partition && self.chains % self.workers != 0 {
            return Err(AbcError::Configuration(
                ErrorInfo::new(
                    "chains-not-divisible",
                    "chains must be divisible by workers under strict partitioning",
                )
                .with_context("chains", self.chains.to_string())
                .with_context("workers", self.workers.to_string()),
            ));
        }
        if self.tuning.enabled {
            if self.tuning.tune_interval == 0 {
                return Err(AbcError::config(
                    "tune-interval-zero",
                    "tune_interval must be positive when tuning is enabled",
                ));
            }
            if !(self.tuning.p_acc_rate > 0.0 && self.tuning.p_acc_rate < 1.0) {
                return Err(AbcError::Configuration(
                    ErrorInfo::new("p-acc-rate-invalid", "p_acc_rate must lie in (0, 1)")
                        .with_context("p_acc_rate", self.tuning.p_acc_rate.to_string()),
                ));
            }
            if self.tuning.max_steps == 0 {
                return Err(AbcError::config("max-steps-zero", "max_steps must be positive"));
            }
        }
        if let SchedulePolicy::Fixed { epsilons } = &self.schedule {
            if epsilons.is_empty() {
                return Err(AbcError::config(
                    "schedule-empty",
                    "fixed schedule needs at least one epsilon",
                ));
            }
            for (stage, pair) in epsilons.windows(2).enumerate() {
                if pair[1] > pair[0] {
                    return Err(AbcError::Configuration(
                        ErrorInfo::new("schedule-increasing", "fixed epsilons must not increase")
                            .with_context("stage", (stage + 1).to_string()),
                    ));
                }
            }
            if epsilons.iter().any(|eps| eps.is_nan() || *eps < 0.0) {
                return Err(AbcError::config(
                    "schedule-invalid",
                    "fixed epsilons must be non-negative numbers",
                ));
            }
        }
        Ok(())
    }
}

/// Proposal family for the mutation kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalKind {
    /// Cholesky-based multivariate normal perturbations.
    #[default]
    MultivariateNormal,
}

/// How the tolerance of each stage is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SchedulePolicy {
    /// Epsilon derived from the interquartile range of the stage distances.
    Adaptive {
        /// Cooling applied on top of the scaled interquartile range.
        #[serde(default)]
        damping: Damping,
    },
    /// Caller-supplied, non-increasing epsilons indexed by stage.
    Fixed {
        /// Ordered tolerances; the run fails if they end above the floor.
        epsilons: Vec<f64>,
    },
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        SchedulePolicy::Adaptive {
            damping: Damping::default(),
        }
    }
}

/// Cooling rule applied to adaptive epsilons for stages after the first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Damping {
    /// Plain scaled interquartile range.
    None,
    /// Multiply by `stage^-exponent`.
    StagePower {
        /// Exponent of the cooling factor.
        #[serde(default = "default_damping_exponent")]
        exponent: f64,
    },
}

fn default_damping_exponent() -> f64 {
    0.25
}

impl Default for Damping {
    fn default() -> Self {
        Damping::StagePower {
            exponent: default_damping_exponent(),
        }
    }
}

/// Treatment of the first stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageZeroPolicy {
    /// Simulate every prior draw once without mutation.
    #[default]
    PriorEvaluation,
    /// Run one mutation pass with an unbounded tolerance.
    MutationPass,
}

/// Adaptive tuning of the proposal scaling and attempt budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Enables tuning from the previous stage's acceptance rate.
    #[serde(default)]
    pub enabled: bool,
    /// Stages between re-tuning.
    #[serde(default = "default_tune_interval")]
    pub tune_interval: usize,
    /// Target probability of a chain never accepting within its budget.
    #[serde(default = "default_p_acc_rate")]
    pub p_acc_rate: f64,
    /// Upper bound on the tuned attempt budget.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_tune_interval() -> usize {
    1
}

fn default_p_acc_rate() -> f64 {
    0.01
}

fn default_max_steps() -> usize {
    5000
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tune_interval: default_tune_interval(),
            p_acc_rate: default_p_acc_rate(),
            max_steps: default_max_steps(),
        }
    }
}

/// Checkpointing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Interval in stages between snapshot writes (0 disables snapshots).
    #[serde(default)]
    pub interval: usize,
    /// Maximum number of snapshots to retain.
    #[serde(default = "default_checkpoint_retention")]
    pub max_to_keep: usize,
}

fn default_checkpoint_retention() -> usize {
    4
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            max_to_keep: default_checkpoint_retention(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded in manifests.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Output directory layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run artefacts. Created if it does not exist.
    #[serde(default)]
    pub run_directory: Option<PathBuf>,
    /// Posterior trace filename relative to `run_directory`.
    #[serde(default = "default_trace_filename")]
    pub trace_file: PathBuf,
    /// Stage metrics filename relative to `run_directory`.
    #[serde(default = "default_metrics_filename")]
    pub metrics_file: PathBuf,
    /// Manifest filename relative to `run_directory`.
    #[serde(default = "default_manifest_filename")]
    pub manifest_file: PathBuf,
    /// Subdirectory used for stage snapshots.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
}

fn default_trace_filename() -> PathBuf {
    PathBuf::from("trace.csv")
}

fn default_metrics_filename() -> PathBuf {
    PathBuf::from("stages.csv")
}

fn default_manifest_filename() -> PathBuf {
    PathBuf::from("manifest.json")
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("checkpoints")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            run_directory: None,
            trace_file: default_trace_filename(),
            metrics_file: default_metrics_filename(),
            manifest_file: default_manifest_filename(),
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}
