use crate::{run_indicator, Indicator};
use std::collections::VecDeque;

/// Rolling sample standard deviation (ddof = 1).
///
/// A window whose values are all equal reports exactly zero, so ratios
/// against it come out undefined rather than as rounding noise.
#[derive(Debug, Clone)]
pub struct RollingStd {
    len: usize,
    buffer: VecDeque<f64>,
    nan_count: usize,
}

impl RollingStd {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "RollingStd period must be > 0");
        Self {
            len: period,
            buffer: VecDeque::with_capacity(period + 1),
            nan_count: 0,
        }
    }

    pub fn value(&self) -> Option<f64> {
        // One observation has no sample variance.
        if !self.is_ready() || self.len < 2 {
            return None;
        }
        let first = self.buffer[0];
        if self.buffer.iter().all(|v| *v == first) {
            return Some(0.0);
        }
        let n = self.len as f64;
        let mean = self.buffer.iter().sum::<f64>() / n;
        let sum_sq: f64 = self
            .buffer
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum();
        Some((sum_sq / (n - 1.0)).sqrt())
    }
}

impl Indicator for RollingStd {
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

/// Trailing rolling sample standard deviation, NaN during warm-up.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    run_indicator(&mut RollingStd::new(window), values)
}
