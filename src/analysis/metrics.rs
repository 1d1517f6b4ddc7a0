// ---------------------------------------------------------------------------
// Accuracy metrics
// ---------------------------------------------------------------------------
//
// Pure functions over two equal-length scalar sequences. Callers guarantee
// non-empty inputs; the empty-selection case is handled before any metric
// runs (see `analysis::eval`).

/// Mean absolute error.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    sum / actual.len() as f64
}

/// Root mean squared error.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    (sum / actual.len() as f64).sqrt()
}

/// Coefficient of determination, `1 − SS_res/SS_tot`.
///
/// Undefined (`None`) when the actual values are constant: SS_tot is zero
/// and the ratio has no meaning. Callers render this as "undefined"
/// rather than letting a NaN reach a chart title.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    debug_assert_eq!(actual.len(), predicted.len());
    let mean_actual = mean(actual);
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Some(1.0 - ss_res / ss_tot)
}

/// `actual − predicted`, element-wise, same ordering.
pub fn residuals(actual: &[f64], predicted: &[f64]) -> Vec<f64> {
    debug_assert_eq!(actual.len(), predicted.len());
    actual.iter().zip(predicted).map(|(a, p)| a - p).collect()
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// ---------------------------------------------------------------------------
// Residual summary statistics
// ---------------------------------------------------------------------------

/// Location, spread, and shape of a residual sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualStats {
    pub mean: f64,
    /// Sample standard deviation (n−1 denominator); zero for a single
    /// observation.
    pub std_dev: f64,
    pub median: f64,
    /// Third standardized moment. `None` when the sample has no spread.
    pub skewness: Option<f64>,
}

impl ResidualStats {
    pub fn from_residuals(residuals: &[f64]) -> Self {
        let n = residuals.len() as f64;
        let mean = mean(residuals);

        let ss: f64 = residuals.iter().map(|r| (r - mean).powi(2)).sum();
        let std_dev = if residuals.len() > 1 {
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        let m2 = ss / n;
        let skewness = if m2 > 0.0 {
            let m3: f64 = residuals.iter().map(|r| (r - mean).powi(3)).sum::<f64>() / n;
            Some(m3 / m2.powf(1.5))
        } else {
            None
        };

        ResidualStats {
            mean,
            std_dev,
            median: median(residuals),
            skewness,
        }
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
