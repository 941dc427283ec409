use crate::IndicatorError;
use cycles_core::IndicatorWeights;

/// Fixed divisor of the composite. It does not track the number of terms or
/// the weight total.
pub const COMPOSITE_DIVISOR: f64 = 5.0;

/// Borrowed inputs of the composite AVG column.
#[derive(Debug, Clone, Copy)]
pub struct CompositeInputs<'a> {
    pub roc: &'a [f64],
    pub zscore: &'a [f64],
    pub sharpe: &'a [f64],
    pub sortino: &'a [f64],
    pub macd: &'a [f64],
}

/// `(ROC·w_roc + Z·w_z + Sharpe·2·w_sharpe + Sortino·w_sortino + MACD·w_macd) / 5`.
///
/// Any NaN term makes the position NaN.
pub fn composite_average(
    inputs: CompositeInputs<'_>,
    weights: &IndicatorWeights,
) -> Result<Vec<f64>, IndicatorError> {
    let expected = inputs.roc.len();
    for column in [inputs.zscore, inputs.sharpe, inputs.sortino, inputs.macd] {
        if column.len() != expected {
            return Err(IndicatorError::LengthMismatch {
                expected,
                actual: column.len(),
            });
        }
    }

    Ok((0..expected)
        .map(|i| {
            (inputs.roc[i] * weights.roc
                + inputs.zscore[i] * weights.zscore
                + inputs.sharpe[i] * 2.0 * weights.sharpe
                + inputs.sortino[i] * weights.sortino
                + inputs.macd[i] * weights.macd)
                / COMPOSITE_DIVISOR
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sum_over_five() {
        let weights = IndicatorWeights {
            roc: 1.0,
            zscore: 2.0,
            sharpe: 3.0,
            sortino: 4.0,
            macd: 5.0,
        };
        let out = composite_average(
            CompositeInputs {
                roc: &[1.0, f64::NAN],
                zscore: &[1.0, 1.0],
                sharpe: &[1.0, 1.0],
                sortino: &[1.0, 1.0],
                macd: &[1.0, 1.0],
            },
            &weights,
        )
        .unwrap();
        // 1 + 2 + 6 + 4 + 5 = 18
        assert!((out[0] - 18.0 / 5.0).abs() < 1e-12);
        assert!(out[1].is_nan());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = composite_average(
            CompositeInputs {
                roc: &[1.0, 2.0],
                zscore: &[1.0],
                sharpe: &[1.0, 2.0],
                sortino: &[1.0, 2.0],
                macd: &[1.0, 2.0],
            },
            &IndicatorWeights::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            IndicatorError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
