use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Diagnostics captured once per stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageMetrics {
    /// Stage index; the final stage is recorded as `None`.
    pub stage: Option<usize>,
    /// Tolerance the stage's chains were mutated under.
    #[serde(with = "abc_core::float")]
    pub epsilon: f64,
    /// Attempts made across all chains.
    pub proposed: usize,
    /// Chains that accepted a candidate.
    pub accepted: usize,
    /// `accepted / proposed`, or zero without proposals.
    #[serde(with = "abc_core::float")]
    pub acceptance_rate: f64,
    /// Effective sample size of the normalised weights.
    #[serde(with = "abc_core::float")]
    pub effective_sample_size: f64,
    /// Proposal scaling in effect.
    pub scaling: f64,
    /// Attempt budget in effect.
    pub n_steps: usize,
    /// Mean finite distance of the population after mutation.
    #[serde(with = "abc_core::float")]
    pub mean_distance: f64,
}

/// Aggregate view over all stages of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDiagnostics {
    /// Number of non-final stages executed.
    pub stages: usize,
    /// Attempts across all stages.
    pub total_proposed: usize,
    /// Acceptances across all stages.
    pub total_accepted: usize,
    /// Overall acceptance rate.
    pub acceptance_rate: f64,
}

/// Collects per-stage metrics for export.
#[derive(Debug, Default, Clone)]
pub struct StageRecorder {
    samples: Vec<StageMetrics>,
}

impl StageRecorder {
    /// Creates a new recorder instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the recorder with metrics restored from a snapshot.
    pub fn from_samples(samples: Vec<StageMetrics>) -> Self {
        Self { samples }
    }

    /// Records one stage.
    pub fn push(&mut self, sample: StageMetrics) {
        self.samples.push(sample);
    }

    /// Returns an immutable view over the recorded stages.
    pub fn samples(&self) -> &[StageMetrics] {
        &self.samples
    }

    /// Acceptance rate of the most recent stage.
    pub fn last_acceptance_rate(&self) -> Option<f64> {
        self.samples.last().map(|s| s.acceptance_rate)
    }

    /// Summarises the recorded stages.
    pub fn diagnostics(&self) -> RunDiagnostics {
        let total_proposed: usize = self.samples.iter().map(|s| s.proposed).sum();
        let total_accepted: usize = self.samples.iter().map(|s| s.accepted).sum();
        RunDiagnostics {
            stages: self.samples.iter().filter(|s| s.stage.is_some()).count(),
            total_proposed,
            total_accepted,
            acceptance_rate: if total_proposed == 0 {
                0.0
            } else {
                total_accepted as f64 / total_proposed as f64
            },
        }
    }

    /// Writes the recorded metrics to a CSV file.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        writeln!(
            file,
            "stage,epsilon,proposed,accepted,acceptance_rate,ess,scaling,n_steps,mean_distance"
        )?;
        for sample in &self.samples {
            let stage = sample
                .stage
                .map(|s| s.to_string())
                .unwrap_or_else(|| "final".to_string());
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{}",
                stage,
                sample.epsilon,
                sample.proposed,
                sample.accepted,
                sample.acceptance_rate,
                sample.effective_sample_size,
                sample.scaling,
                sample.n_steps,
                sample.mean_distance
            )?;
        }
        Ok(())
    }
}
