use abc_core::{Prior, RngHandle};
use abc_smc::{IndependentPrior, PriorDistribution};

#[test]
fn discrete_distributions_mark_their_variables() {
    let prior = IndependentPrior::new([
        ("mu", PriorDistribution::Normal { mu: 0.0, sigma: 1.0 }),
        ("k", PriorDistribution::DiscreteUniform { lower: 0, upper: 5 }),
        ("n", PriorDistribution::Poisson { rate: 3.0 }),
    ])
    .unwrap();
    assert_eq!(prior.discrete_mask(), vec![false, true, true]);
    assert_eq!(prior.dimension(), 3);
}

#[test]
fn draws_respect_supports() {
    let prior = IndependentPrior::new([
        ("u", PriorDistribution::Uniform { lower: -1.0, upper: 2.0 }),
        ("h", PriorDistribution::HalfNormal { sigma: 2.0 }),
        ("k", PriorDistribution::DiscreteUniform { lower: 3, upper: 6 }),
        ("n", PriorDistribution::Poisson { rate: 2.5 }),
    ])
    .unwrap();
    let mut rng = RngHandle::from_seed(17);
    for point in prior.sample_prior(500, &mut rng) {
        assert!((-1.0..2.0).contains(&point[0]));
        assert!(point[1] >= 0.0);
        assert!((3.0..=6.0).contains(&point[2]) && point[2].fract() == 0.0);
        assert!(point[3] >= 0.0 && point[3].fract() == 0.0);
        assert!(prior.log_prior(&point).is_finite());
    }
}

#[test]
fn log_densities_match_closed_forms() {
    let normal = PriorDistribution::Normal { mu: 1.0, sigma: 2.0 };
    let expected = -0.5 * 0.25 - 2.0f64.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln();
    assert!((normal.log_density(2.0) - expected).abs() < 1e-12);

    let poisson = PriorDistribution::Poisson { rate: 2.0 };
    let expected = 3.0 * 2.0f64.ln() - 2.0 - 6.0f64.ln();
    assert!((poisson.log_density(3.0) - expected).abs() < 1e-12);
    assert_eq!(poisson.log_density(2.5), f64::NEG_INFINITY);

    let uniform = PriorDistribution::Uniform { lower: 0.0, upper: 4.0 };
    assert!((uniform.log_density(1.0) + 4.0f64.ln()).abs() < 1e-12);
    assert_eq!(uniform.log_density(5.0), f64::NEG_INFINITY);
    assert_eq!(
        PriorDistribution::HalfNormal { sigma: 1.0 }.log_density(-0.1),
        f64::NEG_INFINITY
    );
}

#[test]
fn invalid_parameters_and_empty_priors_are_rejected() {
    assert!(IndependentPrior::new([("s", PriorDistribution::Normal { mu: 0.0, sigma: 0.0 })]).is_err());
    assert!(IndependentPrior::new([("u", PriorDistribution::Uniform { lower: 1.0, upper: 1.0 })]).is_err());
    assert!(IndependentPrior::new(Vec::<(String, PriorDistribution)>::new()).is_err());
}

#[test]
fn distributions_parse_from_yaml() {
    let dist: PriorDistribution = serde_yaml::from_str("type: half-normal\nsigma: 3.0").unwrap();
    assert_eq!(dist, PriorDistribution::HalfNormal { sigma: 3.0 });
}
