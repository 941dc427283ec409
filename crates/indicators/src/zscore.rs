use crate::safe_ratio;
use crate::sma::rolling_mean;
use crate::std_dev::rolling_std;

/// Rolling z-score: distance of each value from its trailing mean, in sample
/// standard deviations. NaN where the window's deviation is zero.
pub fn zscore(values: &[f64], window: usize) -> Vec<f64> {
    let mean = rolling_mean(values, window);
    let std = rolling_std(values, window);
    values
        .iter()
        .zip(mean.iter().zip(std.iter()))
        .map(|(v, (m, s))| safe_ratio(v - m, *s))
        .collect()
}

/// Z-score against the root-mean-square distance from the rolling basis.
///
/// `dev[i] = sqrt(mean((src[j] - basis[j])^2))` over the trailing window,
/// where each term uses the basis at its own position, so the first defined
/// value appears at index `2 * window - 2`.
pub fn deviation_zscore(values: &[f64], window: usize) -> Vec<f64> {
    let basis = rolling_mean(values, window);
    let squared: Vec<f64> = values
        .iter()
        .zip(&basis)
        .map(|(v, b)| (v - b).abs().powi(2))
        .collect();
    let dev = rolling_mean(&squared, window);
    values
        .iter()
        .zip(basis.iter().zip(dev.iter()))
        .map(|(v, (b, d))| safe_ratio(v - b, d.sqrt()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zscore_constant_is_undefined() {
        let out = zscore(&[50.0; 50], 15);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_zscore_linear_trend() {
        // For 1..=3 the last value sits one sample std above the mean.
        let out = zscore(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(out[0].is_nan() && out[1].is_nan());
        assert!((out[2] - 1.0).abs() < 1e-12);
        assert!((out[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_deviation_zscore_warm_up() {
        let values: Vec<f64> = (0..10).map(|i| (i as f64).sin() + 10.0).collect();
        let out = deviation_zscore(&values, 3);
        assert!(out[..4].iter().all(|v| v.is_nan()));
        assert!(out[4..].iter().all(|v| v.is_finite()));
    }
}
