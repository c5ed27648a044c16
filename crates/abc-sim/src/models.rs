use abc_core::{
    dataset_from_column, derive_substream_seed, AbcError, Dataset, ErrorInfo, RngHandle, Simulator,
};
use abc_smc::{IndependentPrior, PriorDistribution};
use clap::ValueEnum;
use rand_distr::{Distribution, Normal, Poisson};

const OBSERVED_STREAM: u64 = 0x0B5E_47ED;

/// Built-in demonstration models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoModel {
    /// Unknown mean of unit-variance normal observations, prior Normal(0, 5).
    GaussianMean,
    /// Unknown rate of Poisson counts, prior Uniform(0, 30).
    PoissonRate,
}

impl DemoModel {
    pub fn label(&self) -> &'static str {
        match self {
            DemoModel::GaussianMean => "gaussian-mean",
            DemoModel::PoissonRate => "poisson-rate",
        }
    }

    pub fn default_true_value(&self) -> f64 {
        match self {
            DemoModel::GaussianMean => 2.0,
            DemoModel::PoissonRate => 4.0,
        }
    }

    pub fn prior(&self) -> Result<IndependentPrior, AbcError> {
        match self {
            DemoModel::GaussianMean => {
                IndependentPrior::new([("mu", PriorDistribution::Normal { mu: 0.0, sigma: 5.0 })])
            }
            DemoModel::PoissonRate => IndependentPrior::new([(
                "rate",
                PriorDistribution::Uniform {
                    lower: 0.0,
                    upper: 30.0,
                },
            )]),
        }
    }

    pub fn simulator(&self, observations: usize) -> DemoSimulator {
        DemoSimulator {
            model: *self,
            observations,
        }
    }

    /// Synthetic observations at `true_value`, drawn from a substream of `master_seed`.
    pub fn observe(
        &self,
        true_value: f64,
        observations: usize,
        master_seed: u64,
    ) -> Result<Dataset, AbcError> {
        let mut rng = RngHandle::from_seed(derive_substream_seed(master_seed, OBSERVED_STREAM));
        self.simulator(observations).simulate(&[true_value], &mut rng)
    }
}

/// Forward simulator of a [`DemoModel`] with a fixed number of observations.
#[derive(Debug, Clone, Copy)]
pub struct DemoSimulator {
    model: DemoModel,
    observations: usize,
}

impl Simulator for DemoSimulator {
    fn simulate(&self, point: &[f64], rng: &mut RngHandle) -> Result<Dataset, AbcError> {
        let param = point.first().copied().unwrap_or(f64::NAN);
        let values: Vec<f64> = match self.model {
            DemoModel::GaussianMean => {
                let noise = Normal::new(param, 1.0).map_err(|err| sim_error(err, param))?;
                (0..self.observations).map(|_| noise.sample(rng)).collect()
            }
            DemoModel::PoissonRate => {
                let counts = Poisson::new(param).map_err(|err| sim_error(err, param))?;
                (0..self.observations).map(|_| counts.sample(rng)).collect()
            }
        };
        Ok(dataset_from_column(&values))
    }
}

fn sim_error(err: impl ToString, param: f64) -> AbcError {
    AbcError::Simulation(
        ErrorInfo::new("demo-parameter", err.to_string()).with_context("parameter", param.to_string()),
    )
}
