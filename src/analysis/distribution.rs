// ---------------------------------------------------------------------------
// Residual distribution: density histogram + smoothed overlay
// ---------------------------------------------------------------------------

/// One histogram bar in density units (bar areas sum to 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityBin {
    pub center: f64,
    pub density: f64,
}

/// Density histogram of a residual sequence plus a Gaussian-kernel
/// smoothed curve sampled across the same range.
#[derive(Debug, Clone)]
pub struct DensityHistogram {
    pub bin_width: f64,
    pub bins: Vec<DensityBin>,
    /// (x, density) samples of the smoothed overlay.
    pub curve: Vec<[f64; 2]>,
}

const CURVE_SAMPLES: usize = 200;

/// Build the histogram with `n_bins` equal-width bins over [min, max].
///
/// A zero-spread sample collapses to one bar at the common value with no
/// overlay, so a constant-residual selection still renders.
pub fn density_histogram(values: &[f64], n_bins: usize) -> DensityHistogram {
    let n_bins = n_bins.max(1);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    if values.is_empty() || !span.is_finite() || span == 0.0 {
        let center = if values.is_empty() { 0.0 } else { min };
        return DensityHistogram {
            bin_width: 1.0,
            bins: vec![DensityBin {
                center,
                density: if values.is_empty() { 0.0 } else { 1.0 },
            }],
            curve: Vec::new(),
        };
    }

    let bin_width = span / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for &v in values {
        let mut bin = ((v - min) / bin_width) as usize;
        if bin >= n_bins {
            bin = n_bins - 1; // v == max lands in the last bin
        }
        counts[bin] += 1;
    }

    let total = values.len() as f64;
    let bins = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| DensityBin {
            center: min + (i as f64 + 0.5) * bin_width,
            density: c as f64 / (total * bin_width),
        })
        .collect();

    let bandwidth = silverman_bandwidth(values);
    let curve = if bandwidth > 0.0 {
        (0..CURVE_SAMPLES)
            .map(|i| {
                // Extend one bandwidth past each end so the tails taper.
                let x = (min - bandwidth)
                    + (span + 2.0 * bandwidth) * i as f64 / (CURVE_SAMPLES - 1) as f64;
                [x, gaussian_kde(values, bandwidth, x)]
            })
            .collect()
    } else {
        Vec::new()
    };

    DensityHistogram {
        bin_width,
        bins,
        curve,
    }
}

/// Silverman's rule of thumb: `0.9 · σ · n^(−1/5)`.
fn silverman_bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    0.9 * var.sqrt() * n.powf(-0.2)
}

fn gaussian_kde(values: &[f64], bandwidth: f64, x: f64) -> f64 {
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth * values.len() as f64);
    values
        .iter()
        .map(|&v| {
            let z = (x - v) / bandwidth;
            (-0.5 * z * z).exp()
        })
        .sum::<f64>()
        * norm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_areas_sum_to_one() {
        let values = [-3.0, -1.0, -0.5, 0.0, 0.2, 0.8, 1.5, 2.0, 4.0];
        let hist = density_histogram(&values, 4);
        let area: f64 = hist.bins.iter().map(|b| b.density * hist.bin_width).sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn max_value_falls_in_last_bin() {
        let hist = density_histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(hist.bins.len(), 4);
        let area: f64 = hist.bins.iter().map(|b| b.density * hist.bin_width).sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_sample_collapses_to_single_bar() {
        let hist = density_histogram(&[2.0, 2.0, 2.0], 50);
        assert_eq!(hist.bins.len(), 1);
        assert_eq!(hist.bins[0].center, 2.0);
        assert!(hist.curve.is_empty());
    }

    #[test]
    fn overlay_peaks_near_the_data_mass() {
        let values = [0.0, 0.1, -0.1, 0.05, -0.05, 5.0];
        let hist = density_histogram(&values, 10);
        let at = |x: f64| {
            hist.curve
                .iter()
                .min_by(|a, b| (a[0] - x).abs().total_cmp(&(b[0] - x).abs()))
                .map(|p| p[1])
                .unwrap()
        };
        assert!(at(0.0) > at(3.0));
    }
}
