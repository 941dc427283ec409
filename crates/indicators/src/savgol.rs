//! Savitzky–Golay smoothing.
//!
//! Each output point is the value, at that point, of a least-squares
//! polynomial fitted over a sliding window. Points closer than half a window
//! to either end are evaluated on the polynomial fitted to the first or last
//! full window ("interp" edge mode), so the output has the input's length.

use crate::IndicatorError;
use cycles_core::SmoothingParams;

#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window_length: usize,
    polyorder: usize,
    /// Rows of `(AᵀA)⁻¹Aᵀ`: maps a window to its polynomial coefficients.
    projection: Vec<Vec<f64>>,
}

impl SavitzkyGolay {
    /// Rejects an even window or a polynomial order that is not below the window.
    pub fn new(window_length: usize, polyorder: usize) -> Result<Self, IndicatorError> {
        if window_length % 2 == 0 {
            return Err(IndicatorError::invalid(
                "window_length",
                format!("must be odd, got {}", window_length),
            ));
        }
        if polyorder >= window_length {
            return Err(IndicatorError::invalid(
                "polyorder",
                format!(
                    "must be less than window_length ({}), got {}",
                    window_length, polyorder
                ),
            ));
        }

        let half = window_length / 2;
        let scale = half.max(1) as f64;
        let terms = polyorder + 1;

        // Vandermonde matrix on positions rescaled to [-1, 1] to keep AᵀA well conditioned.
        let design: Vec<Vec<f64>> = (0..window_length)
            .map(|k| {
                let x = (k as f64 - half as f64) / scale;
                (0..terms).map(|j| x.powi(j as i32)).collect()
            })
            .collect();

        let mut normal = vec![vec![0.0; terms]; terms];
        for i in 0..terms {
            for j in 0..terms {
                normal[i][j] = design.iter().map(|row| row[i] * row[j]).sum::<f64>();
            }
        }
        let inverse = invert(normal).ok_or_else(|| {
            IndicatorError::invalid("polyorder", "normal equations are singular")
        })?;

        let projection = (0..terms)
            .map(|j| {
                (0..window_length)
                    .map(|k| (0..terms).map(|l| inverse[j][l] * design[k][l]).sum::<f64>())
                    .collect()
            })
            .collect();

        Ok(Self {
            window_length,
            polyorder,
            projection,
        })
    }

    pub fn from_params(params: &SmoothingParams) -> Result<Self, IndicatorError> {
        Self::new(params.window_length, params.polyorder)
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn polyorder(&self) -> usize {
        self.polyorder
    }

    /// Convolution weights that evaluate the fitted polynomial at window offset `position`.
    pub fn coefficients_at(&self, position: usize) -> Vec<f64> {
        let half = self.window_length / 2;
        let t = (position as f64 - half as f64) / half.max(1) as f64;
        (0..self.window_length)
            .map(|k| {
                self.projection
                    .iter()
                    .enumerate()
                    .map(|(j, row)| t.powi(j as i32) * row[k])
                    .sum::<f64>()
            })
            .collect()
    }

    /// Fails when the series is shorter than one window.
    pub fn apply(&self, data: &[f64]) -> Result<Vec<f64>, IndicatorError> {
        let n = data.len();
        let w = self.window_length;
        if n < w {
            return Err(IndicatorError::invalid(
                "window_length",
                format!("must not exceed the series length ({}), got {}", n, w),
            ));
        }
        let half = w / 2;
        let center = self.coefficients_at(half);
        let dot = |coeffs: &[f64], window: &[f64]| -> f64 {
            coeffs.iter().zip(window).map(|(c, v)| c * v).sum()
        };

        let mut out = vec![0.0; n];
        for i in half..(n - half) {
            out[i] = dot(&center, &data[i - half..=i + half]);
        }
        let head = &data[..w];
        let tail = &data[n - w..];
        for position in 0..half {
            out[position] = dot(&self.coefficients_at(position), head);
            let from_end = w - 1 - position;
            out[n - 1 - position] = dot(&self.coefficients_at(from_end), tail);
        }
        Ok(out)
    }
}

/// Gauss–Jordan inversion with partial pivoting. `None` for a singular matrix.
fn invert(mut matrix: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut inverse = vec![vec![0.0; n]; n];
    for (i, row) in inverse.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n).max_by(|a, b| {
            matrix[*a][col]
                .abs()
                .total_cmp(&matrix[*b][col].abs())
        })?;
        matrix.swap(col, pivot_row);
        inverse.swap(col, pivot_row);

        let pivot = matrix[col][col];
        if pivot.abs() < 1e-12 {
            return None;
        }
        for j in 0..n {
            matrix[col][j] /= pivot;
            inverse[col][j] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = matrix[row][col];
                for j in 0..n {
                    matrix[row][j] -= factor * matrix[col][j];
                    inverse[row][j] -= factor * inverse[col][j];
                }
            }
        }
    }
    Some(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_five_point_quadratic_coefficients() {
        let filter = SavitzkyGolay::new(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|c| c / 35.0);
        for (got, want) in filter.coefficients_at(2).iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
    }

    #[test]
    fn test_reproduces_polynomial_including_edges() {
        let data: Vec<f64> = (0..30)
            .map(|i| {
                let t = i as f64;
                0.02 * t.powi(3) - 0.5 * t * t + 3.0 * t - 7.0
            })
            .collect();
        let smoothed = SavitzkyGolay::new(9, 3).unwrap().apply(&data).unwrap();
        for (got, want) in smoothed.iter().zip(&data) {
            assert!((got - want).abs() < 1e-8, "{got} vs {want}");
        }
    }

    #[test]
    fn test_order_zero_is_centered_mean() {
        let data = [1.0, 2.0, 6.0, 4.0, 5.0, 9.0, 7.0];
        let out = SavitzkyGolay::new(3, 0).unwrap().apply(&data).unwrap();
        assert!((out[1] - 3.0).abs() < 1e-12);
        assert!((out[3] - 5.0).abs() < 1e-12);
        // Edges take the mean of the first/last full window.
        assert!((out[0] - 3.0).abs() < 1e-12);
        assert!((out[6] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_even_window() {
        assert!(matches!(
            SavitzkyGolay::new(40, 6),
            Err(IndicatorError::InvalidParameter { ref name, .. }) if name == "window_length"
        ));
    }

    #[test]
    fn test_rejects_polyorder_not_below_window() {
        for (window, order) in [(5, 5), (5, 7), (1, 1)] {
            assert!(matches!(
                SavitzkyGolay::new(window, order),
                Err(IndicatorError::InvalidParameter { ref name, .. }) if name == "polyorder"
            ));
        }
    }

    #[test]
    fn test_rejects_window_longer_than_series() {
        let filter = SavitzkyGolay::new(7, 2).unwrap();
        assert!(filter.apply(&[1.0; 6]).is_err());
        assert_eq!(filter.apply(&[1.0; 7]).unwrap().len(), 7);
    }

    #[test]
    fn test_nan_spreads_to_windows_touching_it() {
        let mut data = vec![1.0; 11];
        data[0] = f64::NAN;
        let out = SavitzkyGolay::new(5, 2).unwrap().apply(&data).unwrap();
        assert!(out[..3].iter().all(|v| v.is_nan()));
        assert!(out[3..].iter().all(|v| (v - 1.0).abs() < 1e-12));
    }
}
