//! The full indicator pipeline: one price series in, every column out.

use crate::composite::{composite_average, CompositeInputs};
use crate::macd::macd;
use crate::ratios::{sharpe_ratio, sortino_ratio};
use crate::returns::{daily_returns, rate_of_change};
use crate::savgol::SavitzkyGolay;
use crate::sma::rolling_mean;
use crate::zscore::zscore;
use crate::IndicatorError;
use cycles_core::{IndicatorKind, IndicatorSeries, IndicatorSet, PipelineConfig, PriceSeries};
use std::collections::BTreeMap;

/// Check every parameter against itself and against a series of `series_len`
/// observations. Nothing is computed when this fails.
pub fn validate_config(
    config: &PipelineConfig,
    series_len: usize,
) -> Result<Option<SavitzkyGolay>, IndicatorError> {
    let positive = [
        ("roc_lag", config.roc_lag),
        ("zscore_window", config.zscore_window),
        ("ratio_window", config.ratio_window),
        ("macd.fast", config.macd.fast),
        ("macd.slow", config.macd.slow),
        ("macd.signal", config.macd.signal),
        ("avg_smoothing", config.avg_smoothing),
    ];
    for (name, value) in positive {
        if value == 0 {
            return Err(IndicatorError::invalid(name, "must be > 0"));
        }
    }
    if config.macd.fast >= config.macd.slow {
        return Err(IndicatorError::invalid(
            "macd.fast",
            format!("must be less than macd.slow ({})", config.macd.slow),
        ));
    }

    match &config.smoothing {
        Some(params) => {
            let filter = SavitzkyGolay::from_params(params)?;
            if params.window_length > series_len {
                return Err(IndicatorError::invalid(
                    "window_length",
                    format!(
                        "must not exceed the series length ({}), got {}",
                        series_len, params.window_length
                    ),
                ));
            }
            Ok(Some(filter))
        }
        None => Ok(None),
    }
}

/// Compute every indicator column for `series`.
///
/// Pure and deterministic: the same input and config always give
/// bit-identical output.
pub fn compute_indicators(
    series: &PriceSeries,
    config: &PipelineConfig,
) -> Result<IndicatorSet, IndicatorError> {
    let smoother = validate_config(config, series.len())?;
    let closes = series.closes();

    let returns = daily_returns(&closes);
    let roc = rate_of_change(&closes, config.roc_lag);
    let z = zscore(&closes, config.zscore_window);
    let sharpe = sharpe_ratio(&returns, config.ratio_window);
    let sortino = sortino_ratio(&returns, config.ratio_window);
    let macd_col = macd(&closes, &config.macd);

    let mut avg = composite_average(
        CompositeInputs {
            roc: &roc,
            zscore: &z,
            sharpe: &sharpe,
            sortino: &sortino,
            macd: &macd_col,
        },
        &config.weights,
    )?;
    let mut avg_6 = rolling_mean(&avg, config.avg_smoothing);

    if let Some(filter) = &smoother {
        avg = filter.apply(&avg)?;
        avg_6 = filter.apply(&avg_6)?;
    }

    let columns = [
        (IndicatorKind::DailyReturn, returns),
        (IndicatorKind::Roc, roc),
        (IndicatorKind::ZScore, z),
        (IndicatorKind::SharpeRatio, sharpe),
        (IndicatorKind::SortinoRatio, sortino),
        (IndicatorKind::Macd, macd_col),
        (IndicatorKind::Avg, avg),
        (IndicatorKind::Avg6, avg_6),
    ];
    let series_map: BTreeMap<IndicatorKind, IndicatorSeries> = columns
        .into_iter()
        .map(|(kind, values)| (kind, IndicatorSeries::new(kind, values)))
        .collect();

    tracing::debug!(
        ticker = %series.ticker,
        points = closes.len(),
        smoothing = ?smoother.as_ref().map(|f| (f.window_length(), f.polyorder())),
        defined_avg = series_map[&IndicatorKind::Avg]
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .count(),
        "Computed indicators"
    );

    Ok(IndicatorSet {
        ticker: series.ticker.clone(),
        timestamps: series.timestamps(),
        close: closes,
        series: series_map,
    })
}
