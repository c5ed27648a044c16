use std::fs;
use std::path::{Path, PathBuf};

use abc_core::{AbcError, ErrorInfo, SchemaVersion};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::config::SmcConfig;
use crate::metrics::StageMetrics;
use crate::population::ChainRecord;

/// Schema written into every snapshot.
pub const SNAPSHOT_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Everything needed to continue a run at the start of `stage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Schema of this payload.
    pub schema_version: SchemaVersion,
    /// Next stage to execute.
    pub stage: usize,
    /// Configuration snapshot associated with the run.
    pub config: SmcConfig,
    /// Master seed used to derive chain substreams.
    pub master_seed: u64,
    /// Tolerance the next stage mutates under.
    #[serde(with = "abc_core::float")]
    pub epsilon: f64,
    /// Tolerances used by the stages executed so far.
    pub epsilon_history: Vec<f64>,
    /// Proposal scaling for the next stage.
    pub scaling: f64,
    /// Attempt budget for the next stage.
    pub n_steps: usize,
    /// Covariance the next proposal is built from.
    pub covariance: DMatrix<f64>,
    /// Variable names in coordinate order.
    pub varnames: Vec<String>,
    /// Discrete mask per coordinate.
    pub discrete: Vec<bool>,
    /// Observed statistic vector.
    pub observed_statistic: Vec<f64>,
    /// Resampled chain records.
    pub records: Vec<ChainRecord>,
    /// Stage metrics recorded so far.
    pub metrics: Vec<StageMetrics>,
}

impl StageSnapshot {
    /// Restores the payload from disk.
    pub fn load(path: &Path) -> Result<Self, AbcError> {
        let contents =
            fs::read_to_string(path).map_err(|err| AbcError::io("checkpoint-read", err, path))?;
        let snapshot: StageSnapshot = serde_json::from_str(&contents)
            .map_err(|err| AbcError::io("checkpoint-parse", err, path))?;
        if !SNAPSHOT_SCHEMA.is_compatible_with(&snapshot.schema_version) {
            return Err(AbcError::Serde(
                ErrorInfo::new("checkpoint-schema", "snapshot schema is not supported")
                    .with_context("path", path.display().to_string())
                    .with_context(
                        "schema",
                        format!(
                            "{}.{}.{}",
                            snapshot.schema_version.major,
                            snapshot.schema_version.minor,
                            snapshot.schema_version.patch
                        ),
                    ),
            ));
        }
        if snapshot.records.len() != snapshot.config.chains {
            return Err(AbcError::Serde(
                ErrorInfo::new("checkpoint-chains", "snapshot population size differs from chains")
                    .with_context("path", path.display().to_string()),
            ));
        }
        Ok(snapshot)
    }

    /// Writes the payload to disk.
    pub fn store(&self, path: &Path) -> Result<(), AbcError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| AbcError::io("checkpoint-mkdir", err, parent))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| AbcError::io("checkpoint-serialize", err, path))?;
        fs::write(path, json).map_err(|err| AbcError::io("checkpoint-write", err, path))
    }
}

/// Determines the snapshot file path using a deterministic numbering scheme.
pub fn checkpoint_path(root: &Path, stage: usize) -> PathBuf {
    root.join(format!("stage_{stage:05}.json"))
}

/// Stage number encoded in a snapshot file name.
pub fn checkpoint_stage(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("stage_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Snapshots already under `root` for stages up to `up_to`, oldest first.
pub fn existing_checkpoints(root: &Path, up_to: usize) -> Result<Vec<PathBuf>, AbcError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(root).map_err(|err| AbcError::io("checkpoint-list", err, root))?;
    let mut found = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| AbcError::io("checkpoint-list", err, root))?
            .path();
        if let Some(stage) = checkpoint_stage(&path) {
            if stage <= up_to {
                found.push((stage, path));
            }
        }
    }
    found.sort_by_key(|(stage, _)| *stage);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// Deletes the oldest snapshots until at most `max_to_keep` remain.
pub fn enforce_retention(paths: &mut Vec<PathBuf>, max_to_keep: usize) -> Result<(), AbcError> {
    while paths.len() > max_to_keep {
        let path = paths.remove(0);
        fs::remove_file(&path).map_err(|err| AbcError::io("checkpoint-remove", err, &path))?;
    }
    Ok(())
}
