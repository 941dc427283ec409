//! Price-change columns: daily returns, rate of change, cumulative growth.

/// Percentage change from one observation to the next, NaN at index 0.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    pct_change(closes, 1)
}

/// Rate of Change over `lag` observations, in percent.
pub fn rate_of_change(closes: &[f64], lag: usize) -> Vec<f64> {
    pct_change(closes, lag).into_iter().map(|v| v * 100.0).collect()
}

fn pct_change(values: &[f64], lag: usize) -> Vec<f64> {
    assert!(lag > 0, "lag must be > 0");
    values
        .iter()
        .enumerate()
        .map(|(i, current)| {
            if i < lag {
                f64::NAN
            } else {
                let base = values[i - lag];
                (current - base) / base
            }
        })
        .collect()
}

/// Growth of one unit invested at the first observation: `cumprod(1 + r)`.
///
/// NaN returns are skipped by the running product but still report NaN
/// at their own position.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            if r.is_nan() {
                f64::NAN
            } else {
                growth *= 1.0 + r;
                growth
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_returns_concrete() {
        let out = daily_returns(&[100.0, 102.0, 101.0, 103.0, 104.0]);
        let expected = [0.02, -0.0098039, 0.0198020, 0.0097087];
        assert!(out[0].is_nan());
        for (got, want) in out[1..].iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} vs {want}");
        }
    }

    #[test]
    fn test_roc_uses_lag() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rate_of_change(&closes, 16);
        assert!(out[..16].iter().all(|v| v.is_nan()));
        assert!((out[16] - 16.0).abs() < 1e-12);
        assert!((out[19] - (16.0 / 103.0) * 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_constant_series_is_zero() {
        let out = rate_of_change(&[50.0; 50], 16);
        assert!(out[16..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_cumulative_skips_nan() {
        let out = cumulative_returns(&[f64::NAN, 0.1, f64::NAN, -0.5]);
        assert!(out[0].is_nan());
        assert!((out[1] - 1.1).abs() < 1e-12);
        assert!(out[2].is_nan());
        assert!((out[3] - 0.55).abs() < 1e-12);
    }
}
