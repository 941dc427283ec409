use crate::{run_indicator, Indicator};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) over a trailing window.
#[derive(Debug, Clone)]
pub struct Sma {
    len: usize,
    buffer: VecDeque<f64>,
    /// NaN values currently inside the window.
    nan_count: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "SMA period must be > 0");
        Self {
            len: period,
            buffer: VecDeque::with_capacity(period + 1),
            nan_count: 0,
        }
    }

    /// Get the current SMA value without feeding new data.
    ///
    /// A window of identical values returns that value unchanged.
    pub fn value(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        let first = self.buffer[0];
        if self.buffer.iter().all(|v| *v == first) {
            return Some(first);
        }
        Some(self.buffer.iter().sum::<f64>() / self.len as f64)
    }
}

impl Indicator for Sma {
    fn next(&mut self, value: f64) -> Option<f64> {
        if value.is_nan() {
            self.nan_count += 1;
        }
        self.buffer.push_back(value);

        if self.buffer.len() > self.len {
            if let Some(removed) = self.buffer.pop_front() {
                if removed.is_nan() {
                    self.nan_count -= 1;
                }
            }
        }

        self.value()
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.nan_count = 0;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.buffer.len() == self.len && self.nan_count == 0
    }
}

/// Trailing rolling mean of `values`, NaN during warm-up.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    run_indicator(&mut Sma::new(window), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_basic() {
        let mut sma = Sma::new(3);
        assert_eq!(sma.next(1.0), None);
        assert_eq!(sma.next(2.0), None);
        assert_eq!(sma.next(3.0), Some(2.0));
        assert_eq!(sma.next(4.0), Some(3.0));
        assert_eq!(sma.next(5.0), Some(4.0));
    }

    #[test]
    fn test_sma_reset() {
        let mut sma = Sma::new(2);
        sma.next(10.0);
        sma.next(20.0);
        sma.reset();
        assert!(!sma.is_ready());
        assert_eq!(sma.next(5.0), None);
        assert_eq!(sma.next(15.0), Some(10.0));
    }

    #[test]
    fn test_nan_poisons_window_until_it_leaves() {
        let out = rolling_mean(&[1.0, f64::NAN, 3.0, 5.0, 7.0], 2);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3], 4.0);
        assert_eq!(out[4], 6.0);
    }

    #[test]
    fn test_constant_window_is_exact() {
        for c in [0.1, 0.3, 1.1, 3.7, 101.3, 4123.37] {
            for period in [6, 12, 26] {
                let out = rolling_mean(&vec![c; 40], period);
                assert!(out[period - 1..].iter().all(|v| *v == c), "{c} over {period}");
            }
        }
    }

    #[test]
    fn test_window_longer_than_series_is_all_nan() {
        let out = rolling_mean(&[1.0, 2.0, 3.0], 5);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
