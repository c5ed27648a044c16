use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use abc_core::{AbcError, RunProvenance};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::SmcConfig;
use crate::hash::stable_hash_string;

/// Structured manifest describing a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Configuration used for the run.
    pub config: SmcConfig,
    /// Seed, config hash, timestamp and tool versions.
    pub provenance: RunProvenance,
    /// Optional seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// Canonical hash of the emitted trace.
    pub trace_hash: String,
    /// Tolerance of each executed stage.
    pub epsilons: Vec<f64>,
    /// Posterior means per variable.
    pub posterior_means: IndexMap<String, f64>,
    /// Trace file (relative to run directory).
    pub trace_file: Option<PathBuf>,
    /// Stage metrics file (relative to run directory).
    pub metrics_file: Option<PathBuf>,
    /// Snapshot files retained at the end of the run.
    pub checkpoints: Vec<PathBuf>,
}

impl RunManifest {
    /// Provenance block for a run started now.
    pub fn provenance(config: &SmcConfig) -> Result<RunProvenance, AbcError> {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert(
            env!("CARGO_PKG_NAME").to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        Ok(RunProvenance {
            config_hash: stable_hash_string(config)?,
            seed: config.master_seed(),
            created_at: chrono::Utc::now().to_rfc3339(),
            tool_versions,
        })
    }

    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), AbcError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AbcError::io("manifest-mkdir", err, parent))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| AbcError::io("manifest-serialize", err, path))?;
        fs::write(path, json).map_err(|err| AbcError::io("manifest-write", err, path))
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, AbcError> {
        let contents =
            fs::read_to_string(path).map_err(|err| AbcError::io("manifest-read", err, path))?;
        serde_json::from_str(&contents).map_err(|err| AbcError::io("manifest-parse", err, path))
    }
}
