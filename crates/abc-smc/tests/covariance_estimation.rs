use abc_core::AbcError;
use abc_smc::covariance::{effective_sample_size, weighted_covariance};

#[test]
fn uniform_weights_match_sample_covariance() {
    let points = vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 3.0], vec![6.0, 7.0]];
    let weights = vec![1.0; 4];
    let cov = weighted_covariance(&points, &weights).unwrap();
    // mean (3, 4); deviations (-2,-2), (-1,0), (0,-1), (3,3)
    assert!((cov[(0, 0)] - 14.0 / 3.0).abs() < 1e-12);
    assert!((cov[(1, 1)] - 14.0 / 3.0).abs() < 1e-12);
    assert!((cov[(0, 1)] - 13.0 / 3.0).abs() < 1e-12);
    assert_eq!(cov[(0, 1)], cov[(1, 0)]);
}

#[test]
fn weights_scale_free() {
    let points = vec![vec![0.0], vec![1.0], vec![4.0]];
    let a = weighted_covariance(&points, &[1.0, 2.0, 1.0]).unwrap();
    let b = weighted_covariance(&points, &[0.25, 0.5, 0.25]).unwrap();
    assert!((a[(0, 0)] - b[(0, 0)]).abs() < 1e-12);
}

#[test]
fn too_few_chains_for_dimension_is_degenerate() {
    let points = vec![vec![0.1, 0.2, 0.3, 0.4, 0.5], vec![1.0, 0.9, 0.8, 0.7, 0.6]];
    let err = weighted_covariance(&points, &[0.5, 0.5]).unwrap_err();
    assert!(matches!(err, AbcError::DegenerateCovariance(_)));
    assert_eq!(err.info().code, "covariance-too-few-samples");
}

#[test]
fn concentrated_weights_are_degenerate() {
    let points = vec![vec![0.0], vec![1.0], vec![2.0]];
    let err = weighted_covariance(&points, &[1.0, 0.0, 0.0]).unwrap_err();
    assert!(matches!(err, AbcError::DegenerateCovariance(_)));
}

#[test]
fn mismatched_weights_are_a_configuration_error() {
    let err = weighted_covariance(&[vec![0.0], vec![1.0]], &[1.0]).unwrap_err();
    assert!(matches!(err, AbcError::Configuration(_)));
}

#[test]
fn effective_sample_size_of_uniform_weights_is_count() {
    assert!((effective_sample_size(&[0.1; 10]) - 10.0).abs() < 1e-9);
    assert!((effective_sample_size(&[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-12);
    assert_eq!(effective_sample_size(&[]), 0.0);
}
