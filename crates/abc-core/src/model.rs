//! Collaborator contracts consumed by the sampler.
//!
//! The sampler never needs to know how priors are declared, how data are
//! simulated, or where draws end up. It only talks to these traits.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::errors::AbcError;
use crate::rng::RngHandle;

/// Simulated or observed data: one row per observation, one column per feature.
pub type Dataset = DMatrix<f64>;

/// Builds a single-column dataset from a flat slice of observations.
pub fn dataset_from_column(values: &[f64]) -> Dataset {
    DMatrix::from_column_slice(values.len(), 1, values)
}

/// Descriptor of one scalar free variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Variable name used in traces.
    pub name: String,
    /// Whether the variable takes integer values only.
    pub discrete: bool,
}

impl VariableSpec {
    /// Creates a continuous variable descriptor.
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discrete: false,
        }
    }

    /// Creates a discrete variable descriptor.
    pub fn discrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discrete: true,
        }
    }
}

/// Prior side of the model context: ordered free variables with their prior.
pub trait Prior: Send + Sync {
    /// Ordered free variables; a point has one coordinate per variable.
    fn variables(&self) -> &[VariableSpec];

    /// Draws `n` independent points from the prior.
    fn sample_prior(&self, n: usize, rng: &mut RngHandle) -> Vec<Vec<f64>>;

    /// Joint prior log-density; non-finite outside the support.
    fn log_prior(&self, point: &[f64]) -> f64;

    /// Number of coordinates in a point.
    fn dimension(&self) -> usize {
        self.variables().len()
    }

    /// Per-coordinate discrete mask.
    fn discrete_mask(&self) -> Vec<bool> {
        self.variables().iter().map(|var| var.discrete).collect()
    }
}

/// Forward simulator producing a synthetic dataset from parameters.
///
/// Implementations may be stochastic; they must draw only from the provided
/// handle so that runs stay reproducible.
pub trait Simulator: Send + Sync {
    /// Simulates a dataset at `point`.
    fn simulate(&self, point: &[f64], rng: &mut RngHandle) -> Result<Dataset, AbcError>;
}

impl<F> Simulator for F
where
    F: Fn(&[f64], &mut RngHandle) -> Result<Dataset, AbcError> + Send + Sync,
{
    fn simulate(&self, point: &[f64], rng: &mut RngHandle) -> Result<Dataset, AbcError> {
        self(point, rng)
    }
}

/// One posterior draw handed to a [`TraceSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    /// Parameter values, ordered like [`Prior::variables`].
    pub point: Vec<f64>,
    /// Distance between the simulated and observed summary statistics.
    #[serde(with = "crate::float")]
    pub distance: f64,
    /// Auxiliary log-weight carried by the draw.
    #[serde(with = "crate::float")]
    pub log_weight: f64,
    /// Whether the draw moved in the final mutation pass; draws carried
    /// over from an ancestor already within tolerance report `false`.
    pub accepted: bool,
}

/// Append-only recorder for posterior draws.
pub trait TraceSink {
    /// Merged output produced by [`TraceSink::finalize`].
    type Output;

    /// Records one draw for the given chain.
    fn record(&mut self, chain: usize, draw: TracePoint) -> Result<(), AbcError>;

    /// Merges all chains into a combined result set.
    fn finalize(self) -> Result<Self::Output, AbcError>;
}
