use std::f64::consts::PI;

use abc_core::{AbcError, ErrorInfo, Prior, RngHandle, VariableSpec};
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};

/// Scalar prior distribution for one free variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PriorDistribution {
    /// Normal with mean `mu` and standard deviation `sigma`.
    Normal {
        /// Mean.
        mu: f64,
        /// Standard deviation.
        sigma: f64,
    },
    /// Half-normal on `[0, ∞)` with scale `sigma`.
    HalfNormal {
        /// Scale.
        sigma: f64,
    },
    /// Continuous uniform on `[lower, upper]`.
    Uniform {
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },
    /// Integer uniform on `lower..=upper`.
    DiscreteUniform {
        /// Smallest value.
        lower: i64,
        /// Largest value.
        upper: i64,
    },
    /// Poisson with the given rate.
    Poisson {
        /// Expected count.
        rate: f64,
    },
}

impl PriorDistribution {
    /// Whether draws are integers.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            PriorDistribution::DiscreteUniform { .. } | PriorDistribution::Poisson { .. }
        )
    }

    fn validate(&self) -> Result<(), AbcError> {
        let ok = match *self {
            PriorDistribution::Normal { mu, sigma } => mu.is_finite() && sigma > 0.0,
            PriorDistribution::HalfNormal { sigma } => sigma > 0.0,
            PriorDistribution::Uniform { lower, upper } => {
                lower.is_finite() && upper.is_finite() && lower < upper
            }
            PriorDistribution::DiscreteUniform { lower, upper } => lower <= upper,
            PriorDistribution::Poisson { rate } => rate.is_finite() && rate > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(AbcError::Configuration(
                ErrorInfo::new("prior-parameters", "invalid prior parameters")
                    .with_context("prior", format!("{self:?}")),
            ))
        }
    }

    /// Draws one value.
    pub fn sample(&self, rng: &mut RngHandle) -> f64 {
        match *self {
            PriorDistribution::Normal { mu, sigma } => match Normal::new(mu, sigma) {
                Ok(dist) => dist.sample(rng),
                Err(_) => f64::NAN,
            },
            PriorDistribution::HalfNormal { sigma } => match Normal::new(0.0, sigma) {
                Ok(dist) => dist.sample(rng).abs(),
                Err(_) => f64::NAN,
            },
            PriorDistribution::Uniform { lower, upper } => rng.gen_range(lower..upper),
            PriorDistribution::DiscreteUniform { lower, upper } => {
                rng.gen_range(lower..=upper) as f64
            }
            PriorDistribution::Poisson { rate } => match Poisson::new(rate) {
                Ok(dist) => dist.sample(rng),
                Err(_) => f64::NAN,
            },
        }
    }

    /// Log-density (or log-mass); `-∞` outside the support.
    pub fn log_density(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return f64::NEG_INFINITY;
        }
        match *self {
            PriorDistribution::Normal { mu, sigma } => {
                let z = (x - mu) / sigma;
                -0.5 * z * z - sigma.ln() - 0.5 * (2.0 * PI).ln()
            }
            PriorDistribution::HalfNormal { sigma } => {
                if x < 0.0 {
                    return f64::NEG_INFINITY;
                }
                let z = x / sigma;
                -0.5 * z * z - sigma.ln() + 0.5 * (2.0 / PI).ln()
            }
            PriorDistribution::Uniform { lower, upper } => {
                if x < lower || x > upper {
                    f64::NEG_INFINITY
                } else {
                    -(upper - lower).ln()
                }
            }
            PriorDistribution::DiscreteUniform { lower, upper } => {
                if x.fract() != 0.0 || x < lower as f64 || x > upper as f64 {
                    f64::NEG_INFINITY
                } else {
                    -((upper - lower + 1) as f64).ln()
                }
            }
            PriorDistribution::Poisson { rate } => {
                if x.fract() != 0.0 || x < 0.0 {
                    return f64::NEG_INFINITY;
                }
                x * rate.ln() - rate - ln_factorial(x as u64)
            }
        }
    }
}

fn ln_factorial(k: u64) -> f64 {
    (2..=k).map(|i| (i as f64).ln()).sum()
}

/// Product of independent scalar priors, one per free variable.
#[derive(Debug, Clone)]
pub struct IndependentPrior {
    variables: Vec<VariableSpec>,
    distributions: Vec<PriorDistribution>,
}

impl IndependentPrior {
    /// Builds the prior from `(name, distribution)` pairs.
    pub fn new<S: Into<String>>(
        entries: impl IntoIterator<Item = (S, PriorDistribution)>,
    ) -> Result<Self, AbcError> {
        let mut variables = Vec::new();
        let mut distributions = Vec::new();
        for (name, dist) in entries {
            dist.validate()?;
            variables.push(VariableSpec {
                name: name.into(),
                discrete: dist.is_discrete(),
            });
            distributions.push(dist);
        }
        if variables.is_empty() {
            return Err(AbcError::config("prior-empty", "a model needs at least one variable"));
        }
        Ok(Self {
            variables,
            distributions,
        })
    }

    /// Per-variable distributions in coordinate order.
    pub fn distributions(&self) -> &[PriorDistribution] {
        &self.distributions
    }
}

impl Prior for IndependentPrior {
    fn variables(&self) -> &[VariableSpec] {
        &self.variables
    }

    fn sample_prior(&self, n: usize, rng: &mut RngHandle) -> Vec<Vec<f64>> {
        (0..n)
            .map(|_| self.distributions.iter().map(|d| d.sample(rng)).collect())
            .collect()
    }

    fn log_prior(&self, point: &[f64]) -> f64 {
        if point.len() != self.distributions.len() {
            return f64::NEG_INFINITY;
        }
        self.distributions
            .iter()
            .zip(point)
            .map(|(dist, &x)| dist.log_density(x))
            .sum()
    }
}
