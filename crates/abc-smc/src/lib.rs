#![deny(missing_docs)]
#![doc = include_str!("../docs/smc-abc-api.md")]

//! Sequential Monte Carlo approximate Bayesian computation for simulator models.

/// Stage snapshot payloads and retention helpers.
pub mod checkpoint;
/// YAML configuration schema and defaults.
pub mod config;
/// Weighted covariance estimation.
pub mod covariance;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Canonical JSON hashing.
pub mod hash;
/// ABC rejection kernel.
pub mod kernel;
/// Run manifest serialization helpers.
pub mod manifest;
/// Per-stage metrics collection.
pub mod metrics;
/// Chain record arena.
pub mod population;
/// Independent scalar priors.
pub mod priors;
/// Multivariate normal proposal.
pub mod proposal;
/// Systematic and uniform resampling.
pub mod resample;
/// Stage orchestration and public `run`/`resume` entry points.
pub mod sampler;
/// Tolerance schedule, importance weights and tuning rules.
pub mod schedule;
/// Summary statistics and distance metrics.
pub mod summary;
/// Posterior trace sinks.
pub mod trace;

pub use checkpoint::StageSnapshot;
pub use config::{
    CheckpointConfig, Damping, OutputConfig, ProposalKind, SchedulePolicy, SeedPolicy,
    SmcConfig, StageZeroPolicy, TuningConfig,
};
pub use metrics::{RunDiagnostics, StageMetrics};
pub use population::{ChainRecord, Population};
pub use priors::{IndependentPrior, PriorDistribution};
pub use proposal::MvNormalProposal;
pub use sampler::{resume, run, Phase, RunSummary, SmcAbcSampler};
pub use summary::{CustomDistance, CustomReducer, DistanceMetric, SummaryStatistic};
pub use trace::{MemoryTrace, Trace};
