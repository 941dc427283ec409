pub mod composite;
pub mod fill;
pub mod macd;
pub mod pipeline;
pub mod ratios;
pub mod returns;
pub mod savgol;
pub mod seasonality;
pub mod sma;
pub mod std_dev;
pub mod zscore;

pub use pipeline::{compute_indicators, validate_config};

/// Errors raised before any indicator output is produced.
///
/// Warm-up gaps and zero standard deviations are not errors; they surface
/// as NaN in the output columns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

impl IndicatorError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        IndicatorError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Trait for streaming (incremental) indicators.
/// Feed one value at a time; the indicator maintains internal state.
pub trait Indicator: Send + Sync {
    /// Process the next value and return the indicator output (if ready).
    ///
    /// A NaN input poisons every window that contains it.
    fn next(&mut self, value: f64) -> Option<f64>;

    /// Reset the indicator to its initial state.
    fn reset(&mut self);

    /// The minimum number of data points needed before the indicator produces output.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;
}

/// Run a streaming indicator over a whole column, writing NaN where it has no output.
pub fn run_indicator<I: Indicator + ?Sized>(indicator: &mut I, values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|v| indicator.next(*v).unwrap_or(f64::NAN))
        .collect()
}

/// Element-wise division where a zero or NaN denominator yields NaN.
pub(crate) fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || denominator.is_nan() {
        f64::NAN
    } else {
        numerator / denominator
    }
}
