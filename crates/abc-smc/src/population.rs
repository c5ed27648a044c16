use abc_core::{AbcError, ErrorInfo};
use serde::{Deserialize, Serialize};

/// Last good state of one chain slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecord {
    /// Last accepted parameter vector.
    pub position: Vec<f64>,
    /// Summary statistic of the last accepted simulation.
    pub statistic: Vec<f64>,
    /// Distance of `statistic` to the observed statistic.
    #[serde(with = "abc_core::float")]
    pub distance: f64,
    /// Auxiliary log-weight (prior minus proposal log-density on acceptance).
    #[serde(with = "abc_core::float")]
    pub log_weight: f64,
    /// Whether this slot has ever held a simulated, finite-prior position.
    pub evaluated: bool,
    /// Stage in which `position` met that stage's tolerance.
    #[serde(default)]
    pub accepted_stage: Option<usize>,
}

impl ChainRecord {
    /// Record for a fresh prior draw that has not been simulated yet.
    pub fn unevaluated(position: Vec<f64>) -> Self {
        Self {
            position,
            statistic: Vec::new(),
            distance: f64::INFINITY,
            log_weight: 0.0,
            evaluated: false,
            accepted_stage: None,
        }
    }

    /// True when the record was accepted under the tolerance of `stage`.
    pub fn accepted_in(&self, stage: usize) -> bool {
        self.evaluated && self.accepted_stage == Some(stage)
    }
}

/// Fixed-size arena of chain records indexed `0..chains`.
///
/// Slots are replaced wholesale by index; the length never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    records: Vec<ChainRecord>,
    discrete: Vec<bool>,
}

impl Population {
    /// Builds a population from start points, validating their count and dimension.
    pub fn from_points(
        points: Vec<Vec<f64>>,
        discrete: Vec<bool>,
        chains: usize,
    ) -> Result<Self, AbcError> {
        if points.len() != chains {
            return Err(AbcError::Configuration(
                ErrorInfo::new("start-count", "start point count must equal chains")
                    .with_context("points", points.len().to_string())
                    .with_context("chains", chains.to_string()),
            ));
        }
        if let Some(bad) = points.iter().position(|p| p.len() != discrete.len()) {
            return Err(AbcError::Configuration(
                ErrorInfo::new("start-dimension", "start point has the wrong dimension")
                    .with_context("chain", bad.to_string())
                    .with_context("expected", discrete.len().to_string()),
            ));
        }
        Ok(Self {
            records: points.into_iter().map(ChainRecord::unevaluated).collect(),
            discrete,
        })
    }

    /// Rebuilds a population from stored records, validating their dimension.
    pub fn from_records(records: Vec<ChainRecord>, discrete: Vec<bool>) -> Result<Self, AbcError> {
        if let Some(bad) = records
            .iter()
            .position(|record| record.position.len() != discrete.len())
        {
            return Err(AbcError::Configuration(
                ErrorInfo::new("record-dimension", "stored record has the wrong dimension")
                    .with_context("chain", bad.to_string())
                    .with_context("found", records[bad].position.len().to_string())
                    .with_context("expected", discrete.len().to_string()),
            ));
        }
        Ok(Self { records, discrete })
    }

    /// Number of chain slots.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True for a population without slots.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parameter dimension.
    pub fn dimension(&self) -> usize {
        self.discrete.len()
    }

    /// Discrete mask per dimension.
    pub fn discrete_mask(&self) -> &[bool] {
        &self.discrete
    }

    /// Read-only view of all slots.
    pub fn records(&self) -> &[ChainRecord] {
        &self.records
    }

    /// Read-only view of one slot.
    pub fn record(&self, chain: usize) -> &ChainRecord {
        &self.records[chain]
    }

    /// Replaces one slot.
    pub fn replace(&mut self, chain: usize, record: ChainRecord) {
        self.records[chain] = record;
    }

    /// Current positions, cloned in slot order.
    pub fn positions(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(|r| r.position.clone()).collect()
    }

    /// Distances in slot order.
    pub fn distances(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.distance).collect()
    }

    /// Distances of the records accepted under the tolerance of `stage`.
    pub fn stage_distances(&self, stage: usize) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| r.accepted_in(stage))
            .map(|r| r.distance)
            .collect()
    }

    /// Log-weights in slot order.
    pub fn log_weights(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.log_weight).collect()
    }

    /// New generation whose slot `i` is a copy of ancestor `ancestors[i]`.
    pub fn reindex(&self, ancestors: &[usize]) -> Self {
        Self {
            records: ancestors.iter().map(|&a| self.records[a].clone()).collect(),
            discrete: self.discrete.clone(),
        }
    }
}
