use abc_core::{AbcError, ErrorInfo};
use nalgebra::{DMatrix, DVector};

/// Kish effective sample size `(Σw)² / Σw²` of a weight vector.
pub fn effective_sample_size(weights: &[f64]) -> f64 {
    let sum: f64 = weights.iter().sum();
    let sum_sq: f64 = weights.iter().map(|w| w * w).sum();
    if sum_sq <= 0.0 {
        0.0
    } else {
        sum * sum / sum_sq
    }
}

/// Unbiased weighted covariance of `points` (rows) under analytic weights.
///
/// Fails with `DegenerateCovariance` when the weights carry fewer effective
/// samples than there are dimensions, or when any entry is NaN/Inf.
pub fn weighted_covariance(points: &[Vec<f64>], weights: &[f64]) -> Result<DMatrix<f64>, AbcError> {
    if points.len() != weights.len() {
        return Err(AbcError::Configuration(
            ErrorInfo::new("weights-length", "one weight per point is required")
                .with_context("points", points.len().to_string())
                .with_context("weights", weights.len().to_string()),
        ));
    }
    let Some(first) = points.first() else {
        return Err(AbcError::DegenerateCovariance(ErrorInfo::new(
            "covariance-no-samples",
            "cannot estimate a covariance from an empty population",
        )));
    };
    let dim = first.len();
    if points.iter().any(|p| p.len() != dim) {
        return Err(AbcError::Configuration(ErrorInfo::new(
            "point-dimension",
            "all points must share the same dimension",
        )));
    }

    let ess = effective_sample_size(weights);
    if ess < dim as f64 || ess < 2.0 {
        return Err(AbcError::DegenerateCovariance(
            ErrorInfo::new(
                "covariance-too-few-samples",
                "fewer effective samples than dimensions",
            )
            .with_context("effective_samples", format!("{ess:.3}"))
            .with_context("dimension", dim.to_string())
            .with_hint("increase the number of chains"),
        ));
    }

    let v1: f64 = weights.iter().sum();
    let v2: f64 = weights.iter().map(|w| w * w).sum();
    let mut mean = DVector::<f64>::zeros(dim);
    for (point, &w) in points.iter().zip(weights) {
        mean += DVector::from_column_slice(point) * w;
    }
    mean /= v1;

    let mut cov = DMatrix::<f64>::zeros(dim, dim);
    for (point, &w) in points.iter().zip(weights) {
        let centred = DVector::from_column_slice(point) - &mean;
        cov += (&centred * centred.transpose()) * w;
    }
    let fact = v1 - v2 / v1;
    cov /= fact;

    if cov.iter().any(|v| !v.is_finite()) {
        return Err(AbcError::DegenerateCovariance(
            ErrorInfo::new("covariance-non-finite", "sample covariance contains NaN or Inf")
                .with_context("dimension", dim.to_string())
                .with_hint("the number of chains is likely too small"),
        ));
    }
    Ok(cov)
}
