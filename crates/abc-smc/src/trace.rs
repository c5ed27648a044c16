use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use abc_core::{AbcError, ErrorInfo, TracePoint, TraceSink};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::hash::stable_hash_string;

/// In-memory trace sink collecting draws per chain.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrace {
    varnames: Vec<String>,
    chains: BTreeMap<usize, Vec<TracePoint>>,
}

impl MemoryTrace {
    /// Creates an empty sink for the given variable names.
    pub fn new(varnames: Vec<String>) -> Self {
        Self {
            varnames,
            chains: BTreeMap::new(),
        }
    }

    /// Number of draws recorded so far.
    pub fn len(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }

    /// True before the first draw is recorded.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl TraceSink for MemoryTrace {
    type Output = Trace;

    fn record(&mut self, chain: usize, draw: TracePoint) -> Result<(), AbcError> {
        if draw.point.len() != self.varnames.len() {
            return Err(AbcError::Configuration(
                ErrorInfo::new("trace-dimension", "draw dimension differs from variable count")
                    .with_context("chain", chain.to_string())
                    .with_context("expected", self.varnames.len().to_string())
                    .with_context("actual", draw.point.len().to_string()),
            ));
        }
        self.chains.entry(chain).or_default().push(draw);
        Ok(())
    }

    fn finalize(self) -> Result<Trace, AbcError> {
        let mut chain_ids = Vec::new();
        let mut draws = Vec::new();
        for (chain, points) in self.chains {
            for point in points {
                chain_ids.push(chain);
                draws.push(point);
            }
        }
        Ok(Trace {
            varnames: self.varnames,
            chains: chain_ids,
            draws,
        })
    }
}

/// Merged posterior sample, ordered by chain then by recording order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Variable names, one per coordinate.
    pub varnames: Vec<String>,
    /// Chain id of each draw.
    pub chains: Vec<usize>,
    /// Draws in merged order.
    pub draws: Vec<TracePoint>,
}

impl Trace {
    /// Number of draws.
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// True for a trace without draws.
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// All values of one variable.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.varnames.iter().position(|v| v == name)?;
        Some(self.draws.iter().map(|d| d.point[index]).collect())
    }

    /// Posterior mean of one variable.
    pub fn mean(&self, name: &str) -> Option<f64> {
        let values = self.column(name)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Posterior means of every variable, in declaration order.
    pub fn means(&self) -> IndexMap<String, f64> {
        self.varnames
            .iter()
            .filter_map(|name| self.mean(name).map(|m| (name.clone(), m)))
            .collect()
    }

    /// Fraction of draws accepted in the final mutation pass.
    pub fn acceptance_fraction(&self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        self.draws.iter().filter(|d| d.accepted).count() as f64 / self.draws.len() as f64
    }

    /// SHA-256 of the canonical JSON encoding.
    pub fn canonical_hash(&self) -> Result<String, AbcError> {
        stable_hash_string(self)
    }

    /// Writes the trace as CSV: `chain,<vars...>,distance,log_weight,accepted`.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), AbcError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AbcError::io("trace-mkdir", err, parent))?;
        }
        let write = || -> std::io::Result<()> {
            let mut file = File::create(path)?;
            writeln!(file, "chain,{},distance,log_weight,accepted", self.varnames.join(","))?;
            for (chain, draw) in self.chains.iter().zip(&self.draws) {
                let values: Vec<String> = draw.point.iter().map(|v| v.to_string()).collect();
                writeln!(
                    file,
                    "{},{},{},{},{}",
                    chain,
                    values.join(","),
                    draw.distance,
                    draw.log_weight,
                    draw.accepted
                )?;
            }
            Ok(())
        };
        write().map_err(|err| AbcError::io("trace-write", err, path))
    }
}
