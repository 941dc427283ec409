use serde::{Deserialize, Serialize};

/// Multipliers applied to each term of the composite AVG indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWeights {
    pub roc: f64,
    pub zscore: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub macd: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            roc: 10.0,
            zscore: 70.0,
            sharpe: 50.0,
            sortino: 100.0,
            macd: 1.0,
        }
    }
}

/// Savitzky–Golay parameters used to smooth AVG and AVG_6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Odd number of samples in the fitting window.
    pub window_length: usize,
    pub polyorder: usize,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            window_length: 41,
            polyorder: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// Every tunable of the indicator pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// ROC lag in observations.
    pub roc_lag: usize,
    pub zscore_window: usize,
    /// Window shared by the Sharpe and Sortino ratios.
    pub ratio_window: usize,
    pub macd: MacdParams,
    /// SMA period producing AVG_6 from AVG.
    pub avg_smoothing: usize,
    pub weights: IndicatorWeights,
    /// `None` leaves AVG and AVG_6 unsmoothed.
    pub smoothing: Option<SmoothingParams>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            roc_lag: 16,
            zscore_window: 15,
            ratio_window: 27,
            macd: MacdParams::default(),
            avg_smoothing: 6,
            weights: IndicatorWeights::default(),
            smoothing: Some(SmoothingParams::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            roc_lag = 20

            [weights]
            macd = 5.0

            [smoothing]
            window_length = 21
            "#,
        )
        .unwrap();
        assert_eq!(config.roc_lag, 20);
        assert_eq!(config.zscore_window, 15);
        assert_eq!(config.weights.macd, 5.0);
        assert_eq!(config.weights.sortino, 100.0);
        assert_eq!(
            config.smoothing,
            Some(SmoothingParams {
                window_length: 21,
                polyorder: 6
            })
        );
    }

    #[test]
    fn test_default_windows() {
        let config = PipelineConfig::default();
        assert_eq!(config.macd, MacdParams { fast: 12, slow: 26, signal: 9 });
        assert_eq!(config.ratio_window, 27);
        assert_eq!(config.avg_smoothing, 6);
    }
}
