use std::f64::consts::PI;

use abc_core::{AbcError, RngHandle};
use abc_smc::MvNormalProposal;
use nalgebra::DMatrix;

#[test]
fn non_positive_definite_covariance_is_rejected() {
    let cov = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
    let err = MvNormalProposal::new(cov).unwrap_err();
    assert!(matches!(err, AbcError::InvalidCovariance(_)));
    assert_eq!(err.info().code, "covariance-not-spd");
}

#[test]
fn non_square_and_non_finite_covariances_are_rejected() {
    let err = MvNormalProposal::new(DMatrix::zeros(2, 3)).unwrap_err();
    assert_eq!(err.info().code, "covariance-not-square");
    let err = MvNormalProposal::new(DMatrix::from_element(1, 1, f64::NAN)).unwrap_err();
    assert_eq!(err.info().code, "covariance-non-finite");
}

#[test]
fn log_pdf_matches_univariate_normal() {
    let proposal = MvNormalProposal::new(DMatrix::from_element(1, 1, 4.0)).unwrap();
    let expected = -0.5 * (2.0 * PI * 4.0).ln() - 0.5 * 1.0 / 4.0;
    assert!((proposal.log_pdf(&[1.0]) - expected).abs() < 1e-12);
}

#[test]
fn scaled_proposal_multiplies_covariance_by_square() {
    let proposal = MvNormalProposal::new(DMatrix::identity(2, 2)).unwrap();
    let scaled = proposal.scaled(0.5).unwrap();
    assert!((scaled.covariance()[(0, 0)] - 0.25).abs() < 1e-12);
    let direct = MvNormalProposal::log_density(scaled.covariance(), &[0.1, -0.2]).unwrap();
    assert!((direct - scaled.log_pdf(&[0.1, -0.2])).abs() < 1e-12);
}

#[test]
fn draws_follow_the_covariance() {
    let cov = DMatrix::from_row_slice(2, 2, &[2.0, 0.6, 0.6, 1.0]);
    let proposal = MvNormalProposal::new(cov).unwrap();
    let mut rng = RngHandle::from_seed(99);
    let draws = proposal.sample(20_000, &mut rng);
    let n = draws.len() as f64;
    let var0 = draws.iter().map(|d| d[0] * d[0]).sum::<f64>() / n;
    let cov01 = draws.iter().map(|d| d[0] * d[1]).sum::<f64>() / n;
    assert!((var0 - 2.0).abs() < 0.1, "var0 {var0}");
    assert!((cov01 - 0.6).abs() < 0.06, "cov01 {cov01}");
}

#[test]
fn seeded_draws_repeat() {
    let proposal = MvNormalProposal::new(DMatrix::identity(3, 3)).unwrap();
    let mut a = RngHandle::from_seed(5);
    let mut b = RngHandle::from_seed(5);
    assert_eq!(proposal.sample_one(&mut a), proposal.sample_one(&mut b));
}
