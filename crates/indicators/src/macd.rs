use crate::sma::Sma;
use crate::Indicator;
use cycles_core::MacdParams;

/// MACD (Moving Average Convergence Divergence) built from simple averages.
///
/// Composed of three SMAs:
/// - Fast SMA (default 12)
/// - Slow SMA (default 26)
/// - Signal SMA (default 9) over the fast/slow difference
///
/// Returns the signal line, which is the value the dashboards plot as "MACD".
/// Use `next_output()` for both lines.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_sma: Sma,
    slow_sma: Sma,
    signal_sma: Sma,
    macd_line: Option<f64>,
    signal_line: Option<f64>,
}

/// MACD output with both components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    /// Fast SMA minus slow SMA.
    pub line: f64,
    /// SMA of `line`.
    pub signal: f64,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        assert!(fast_period < slow_period, "Fast period must be less than slow period");
        Self {
            fast_sma: Sma::new(fast_period),
            slow_sma: Sma::new(slow_period),
            signal_sma: Sma::new(signal_period),
            macd_line: None,
            signal_line: None,
        }
    }

    pub fn from_params(params: &MacdParams) -> Self {
        Self::new(params.fast, params.slow, params.signal)
    }

    /// Returns both lines if ready.
    pub fn output(&self) -> Option<MacdOutput> {
        match (self.macd_line, self.signal_line) {
            (Some(line), Some(signal)) => Some(MacdOutput { line, signal }),
            _ => None,
        }
    }

    /// Process next value and return full output if ready.
    pub fn next_output(&mut self, value: f64) -> Option<MacdOutput> {
        let fast = self.fast_sma.next(value);
        let slow = self.slow_sma.next(value);

        self.macd_line = match (fast, slow) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        };
        // An undefined line still occupies a slot in the signal window.
        self.signal_line = self.signal_sma.next(self.macd_line.unwrap_or(f64::NAN));

        self.output()
    }
}

impl Indicator for Macd {
    fn next(&mut self, value: f64) -> Option<f64> {
        self.next_output(value);
        self.signal_line
    }

    fn reset(&mut self) {
        self.fast_sma.reset();
        self.slow_sma.reset();
        self.signal_sma.reset();
        self.macd_line = None;
        self.signal_line = None;
    }

    fn period(&self) -> usize {
        self.slow_sma.period() + self.signal_sma.period() - 1
    }

    fn is_ready(&self) -> bool {
        self.signal_line.is_some()
    }
}

/// The smoothed MACD column, NaN until `slow + signal - 1` observations are seen.
pub fn macd(closes: &[f64], params: &MacdParams) -> Vec<f64> {
    crate::run_indicator(&mut Macd::from_params(params), closes)
}
