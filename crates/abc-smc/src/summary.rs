use std::fmt;
use std::sync::Arc;

use abc_core::Dataset;
use serde::{Deserialize, Serialize};

/// Reduction applied to one data column.
pub type ReducerFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Distance between two statistic vectors of equal length.
pub type DistanceFn = Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>;

/// Named user-supplied column reduction.
#[derive(Clone)]
pub struct CustomReducer {
    /// Label used in logs and equality.
    pub name: String,
    func: ReducerFn,
}

impl CustomReducer {
    /// Wraps a closure under a name.
    pub fn new(name: impl Into<String>, func: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for CustomReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomReducer").field("name", &self.name).finish_non_exhaustive()
    }
}

impl PartialEq for CustomReducer {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Named user-supplied distance.
#[derive(Clone)]
pub struct CustomDistance {
    /// Label used in logs and equality.
    pub name: String,
    func: DistanceFn,
}

impl CustomDistance {
    /// Wraps a closure under a name.
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for CustomDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomDistance").field("name", &self.name).finish_non_exhaustive()
    }
}

impl PartialEq for CustomDistance {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Column reduction used to build summary statistic vectors.
///
/// `Custom` reducers hold closures and cannot be written to snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStatistic {
    /// Arithmetic mean.
    Mean,
    /// Population standard deviation.
    Std,
    /// Population variance.
    Var,
    /// User-supplied reduction.
    #[serde(skip)]
    Custom(CustomReducer),
}

impl SummaryStatistic {
    /// Reduces one column of data.
    pub fn reduce(&self, column: &[f64]) -> f64 {
        match self {
            SummaryStatistic::Mean => mean(column),
            SummaryStatistic::Std => variance(column).sqrt(),
            SummaryStatistic::Var => variance(column),
            SummaryStatistic::Custom(custom) => (custom.func)(column),
        }
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        match self {
            SummaryStatistic::Mean => "mean",
            SummaryStatistic::Std => "std",
            SummaryStatistic::Var => "var",
            SummaryStatistic::Custom(custom) => &custom.name,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    let mu = mean(values);
    if mu.is_nan() {
        return f64::NAN;
    }
    values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64
}

/// Builds the statistic vector: statistic-major, one entry per data column.
pub fn summarize(stats: &[SummaryStatistic], data: &Dataset) -> Vec<f64> {
    let mut vector = Vec::with_capacity(stats.len() * data.ncols());
    for stat in stats {
        for column in data.column_iter() {
            let values: Vec<f64> = column.iter().copied().collect();
            vector.push(stat.reduce(&values));
        }
    }
    vector
}

/// Distance between simulated and observed statistic vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// Sum of absolute differences.
    #[default]
    #[serde(alias = "absolute difference")]
    AbsoluteDifference,
    /// Sum of squared differences.
    #[serde(alias = "sum_of_squared_distance")]
    SumOfSquaredDistance,
    /// Mean of absolute differences.
    #[serde(alias = "mean_absolute_error")]
    MeanAbsoluteError,
    /// Mean of squared differences.
    #[serde(alias = "mean_squared_error")]
    MeanSquaredError,
    /// Euclidean norm of the difference.
    Euclidean,
    /// User-supplied distance.
    #[serde(skip)]
    Custom(CustomDistance),
}

impl DistanceMetric {
    /// Evaluates the distance. Callers guarantee equal lengths.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let abs_sum = || a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f64>();
        let sq_sum = || a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>();
        let len = a.len().max(1) as f64;
        match self {
            DistanceMetric::AbsoluteDifference => abs_sum(),
            DistanceMetric::SumOfSquaredDistance => sq_sum(),
            DistanceMetric::MeanAbsoluteError => abs_sum() / len,
            DistanceMetric::MeanSquaredError => sq_sum() / len,
            DistanceMetric::Euclidean => sq_sum().sqrt(),
            DistanceMetric::Custom(custom) => (custom.func)(a, b),
        }
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        match self {
            DistanceMetric::AbsoluteDifference => "absolute-difference",
            DistanceMetric::SumOfSquaredDistance => "sum-of-squared-distance",
            DistanceMetric::MeanAbsoluteError => "mean-absolute-error",
            DistanceMetric::MeanSquaredError => "mean-squared-error",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Custom(custom) => &custom.name,
        }
    }
}
