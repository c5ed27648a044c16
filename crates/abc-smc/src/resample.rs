use abc_core::{AbcError, ErrorInfo, RngHandle};
use rand::Rng;

/// Systematic resampling with an explicit offset `u ∈ [0, 1)`.
///
/// Slot `i` receives the first ancestor whose cumulative weight exceeds
/// `(i + u) / n`. Weights need not be normalised but must have a positive,
/// finite total.
pub fn systematic_indices(weights: &[f64], offset: f64) -> Result<Vec<usize>, AbcError> {
    let n = weights.len();
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if n == 0 || !(total.is_finite() && total > 0.0) {
        return Err(AbcError::EmptyPopulation(
            ErrorInfo::new("resample-no-mass", "weights carry no probability mass")
                .with_context("chains", n.to_string()),
        ));
    }
    let last_positive = weights
        .iter()
        .rposition(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(n - 1);

    let mass = |index: usize| {
        let w = weights[index];
        if w.is_finite() && w > 0.0 {
            w / total
        } else {
            0.0
        }
    };

    let mut ancestors = Vec::with_capacity(n);
    let mut cumulative = mass(0);
    // index of the next weight to fold into `cumulative`
    let mut cursor = 1usize;
    for i in 0..n {
        let target = (i as f64 + offset) / n as f64;
        while cumulative <= target && cursor < n {
            cumulative += mass(cursor);
            cursor += 1;
        }
        let index = if cumulative > target {
            cursor - 1
        } else {
            last_positive
        };
        ancestors.push(index);
    }
    Ok(ancestors)
}

/// Systematic resampling drawing its single offset from `rng`.
pub fn systematic_resample(weights: &[f64], rng: &mut RngHandle) -> Result<Vec<usize>, AbcError> {
    let offset = rng.uniform();
    systematic_indices(weights, offset)
}

/// Independent uniform ancestor draws over `slots`, `count` times.
pub fn uniform_ancestors(slots: usize, count: usize, rng: &mut RngHandle) -> Vec<usize> {
    if slots == 0 {
        return Vec::new();
    }
    (0..count).map(|_| rng.gen_range(0..slots)).collect()
}
