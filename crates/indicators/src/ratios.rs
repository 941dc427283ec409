//! Rolling risk-adjusted return ratios over daily returns.
//!
//! Neither ratio subtracts a risk-free rate or annualizes.

use crate::fill::forward_fill;
use crate::safe_ratio;
use crate::sma::rolling_mean;
use crate::std_dev::rolling_std;

/// `mean(returns, W) / std(returns, W)`.
pub fn sharpe_ratio(returns: &[f64], window: usize) -> Vec<f64> {
    let mean = rolling_mean(returns, window);
    let std = rolling_std(returns, window);
    mean.iter().zip(&std).map(|(m, s)| safe_ratio(*m, *s)).collect()
}

/// Rolling std of the negative returns only, aligned back onto the full index.
///
/// Negative returns are pulled out of the series first, so each window spans
/// the last `window` losing days rather than the last `window` days. Positions
/// that are not losing days are NaN.
pub fn downside_deviation(returns: &[f64], window: usize) -> Vec<f64> {
    let (positions, negatives): (Vec<usize>, Vec<f64>) = returns
        .iter()
        .enumerate()
        .filter(|(_, r)| **r < 0.0)
        .map(|(i, r)| (i, *r))
        .unzip();

    let mut aligned = vec![f64::NAN; returns.len()];
    for (pos, std) in positions.into_iter().zip(rolling_std(&negatives, window)) {
        aligned[pos] = std;
    }
    aligned
}

/// `mean(returns, W) / downside_deviation(returns, W)`, forward-filled.
pub fn sortino_ratio(returns: &[f64], window: usize) -> Vec<f64> {
    let mean = rolling_mean(returns, window);
    let downside = downside_deviation(returns, window);
    let raw: Vec<f64> = mean
        .iter()
        .zip(&downside)
        .map(|(m, d)| safe_ratio(*m, *d))
        .collect();
    forward_fill(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::returns::daily_returns;

    #[test]
    fn test_sharpe_constant_prices_undefined() {
        let returns = daily_returns(&[50.0; 50]);
        let out = sharpe_ratio(&returns, 27);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_sharpe_warm_up_includes_first_return() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let out = sharpe_ratio(&daily_returns(&closes), 27);
        assert!(out[..27].iter().all(|v| v.is_nan()));
        assert!(out[27].is_finite());
    }

    #[test]
    fn test_sharpe_value() {
        // returns 0.01, 0.03: mean 0.02, sample std sqrt(0.0002)
        let out = sharpe_ratio(&[f64::NAN, 0.01, 0.03], 2);
        assert!((out[2] - 0.02 / 0.0002f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_downside_windows_skip_positive_days() {
        let returns = [f64::NAN, -0.01, 0.02, -0.03, 0.05, -0.02];
        let out = downside_deviation(&returns, 2);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan()); // first negative, window not full
        assert!(out[2].is_nan()); // positive day
        assert!((out[3] - rolling_std(&[-0.01, -0.03], 2)[1]).abs() < 1e-15);
        assert!(out[4].is_nan());
        assert!((out[5] - rolling_std(&[-0.03, -0.02], 2)[1]).abs() < 1e-15);
    }

    #[test]
    fn test_sortino_forward_fills_positive_days() {
        let returns = [f64::NAN, -0.01, 0.02, -0.03, 0.05, -0.02, 0.01];
        let out = sortino_ratio(&returns, 2);
        assert!(out[..3].iter().all(|v| v.is_nan()));
        let at_3 = ((0.02 - 0.03) / 2.0) / rolling_std(&[-0.01, -0.03], 2)[1];
        assert!((out[3] - at_3).abs() < 1e-12);
        assert_eq!(out[4], out[3]);
        assert_ne!(out[5], out[3]);
        assert_eq!(out[6], out[5]);
    }

    #[test]
    fn test_sortino_without_losses_stays_undefined() {
        let out = sortino_ratio(&daily_returns(&[50.0; 50]), 27);
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
