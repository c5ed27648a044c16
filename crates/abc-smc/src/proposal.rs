use std::f64::consts::PI;

use abc_core::{AbcError, ErrorInfo, RngHandle};
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use rand::Rng;
use rand_distr::StandardNormal;

/// Multivariate normal perturbation generator built from a covariance matrix.
///
/// Draws are `L z` where `L` is the lower Cholesky factor and `z` is standard
/// normal, so a seeded handle reproduces the same perturbations.
#[derive(Debug, Clone)]
pub struct MvNormalProposal {
    covariance: DMatrix<f64>,
    cholesky: Cholesky<f64, Dyn>,
}

impl MvNormalProposal {
    /// Builds the proposal, failing when the covariance is not square or not positive definite.
    pub fn new(covariance: DMatrix<f64>) -> Result<Self, AbcError> {
        if !covariance.is_square() {
            return Err(AbcError::InvalidCovariance(
                ErrorInfo::new("covariance-not-square", "covariance matrix must be square")
                    .with_context("rows", covariance.nrows().to_string())
                    .with_context("cols", covariance.ncols().to_string()),
            ));
        }
        if covariance.nrows() == 0 {
            return Err(AbcError::InvalidCovariance(ErrorInfo::new(
                "covariance-empty",
                "covariance matrix has no dimensions",
            )));
        }
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(AbcError::InvalidCovariance(ErrorInfo::new(
                "covariance-non-finite",
                "covariance matrix contains NaN or infinite entries",
            )));
        }
        let cholesky = Cholesky::new(covariance.clone()).ok_or_else(|| {
            AbcError::InvalidCovariance(
                ErrorInfo::new("covariance-not-spd", "cholesky decomposition failed")
                    .with_context("dimension", covariance.nrows().to_string())
                    .with_hint("the population may have collapsed onto a subspace"),
            )
        })?;
        Ok(Self {
            covariance,
            cholesky,
        })
    }

    /// Number of coordinates in a perturbation.
    pub fn dimension(&self) -> usize {
        self.covariance.nrows()
    }

    /// Covariance the proposal was built from.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Draws a single perturbation.
    pub fn sample_one(&self, rng: &mut RngHandle) -> DVector<f64> {
        let dim = self.dimension();
        let z = DVector::from_iterator(dim, (0..dim).map(|_| rng.sample::<f64, _>(StandardNormal)));
        self.cholesky.l() * z
    }

    /// Draws `n` perturbations.
    pub fn sample(&self, n: usize, rng: &mut RngHandle) -> Vec<DVector<f64>> {
        let l = self.cholesky.l();
        let dim = self.dimension();
        (0..n)
            .map(|_| {
                let z = DVector::from_iterator(
                    dim,
                    (0..dim).map(|_| rng.sample::<f64, _>(StandardNormal)),
                );
                &l * z
            })
            .collect()
    }

    /// Log-density of `value` under this proposal's zero-mean normal.
    pub fn log_pdf(&self, value: &[f64]) -> f64 {
        let dim = self.dimension();
        if value.len() != dim {
            return f64::NAN;
        }
        let x = DVector::from_column_slice(value);
        let l = self.cholesky.l();
        let y = match l.solve_lower_triangular(&x) {
            Some(y) => y,
            None => return f64::NAN,
        };
        let log_det: f64 = l.diagonal().iter().map(|d| d.ln()).sum::<f64>() * 2.0;
        -0.5 * (dim as f64 * (2.0 * PI).ln() + log_det + y.dot(&y))
    }

    /// Log-density of `value` under a zero-mean normal with `scaled_covariance`.
    pub fn log_density(scaled_covariance: &DMatrix<f64>, value: &[f64]) -> Result<f64, AbcError> {
        Ok(Self::new(scaled_covariance.clone())?.log_pdf(value))
    }

    /// Proposal whose perturbations are multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, AbcError> {
        Self::new(&self.covariance * (factor * factor))
    }
}
