//! Calendar-month statistics: monthly compound returns and the year × month grid.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use cycles_core::{MonthlyReturn, SeasonalityTable};
use std::collections::BTreeMap;

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}

/// Compound return of each calendar month: `product(1 + r) - 1`.
///
/// `returns` is aligned with `timestamps`. NaN returns are skipped, so a
/// month whose only return is undefined compounds to zero. Months with no
/// observations at all are absent from the output.
pub fn monthly_returns(timestamps: &[DateTime<Utc>], returns: &[f64]) -> Vec<MonthlyReturn> {
    let mut months: Vec<MonthlyReturn> = Vec::new();
    let mut current: Option<(NaiveDate, f64)> = None;

    for (ts, r) in timestamps.iter().zip(returns) {
        let end = month_end(ts.date_naive());
        let growth = if r.is_nan() { 1.0 } else { 1.0 + r };
        current = match current {
            Some((month, product)) if month == end => Some((month, product * growth)),
            Some((month, product)) => {
                months.push(MonthlyReturn {
                    month_end: month,
                    value: product - 1.0,
                });
                Some((end, growth))
            }
            None => Some((end, growth)),
        };
    }
    if let Some((month, product)) = current {
        months.push(MonthlyReturn {
            month_end: month,
            value: product - 1.0,
        });
    }
    months
}

/// Pivot monthly returns into a year × month grid and average each calendar month.
pub fn seasonality_table(ticker: &str, monthly: &[MonthlyReturn]) -> SeasonalityTable {
    let mut cells: BTreeMap<i32, [Vec<f64>; 12]> = BTreeMap::new();
    let mut by_month: [Vec<f64>; 12] = Default::default();

    for m in monthly.iter().filter(|m| !m.value.is_nan()) {
        let idx = (m.month() - 1) as usize;
        cells.entry(m.year()).or_default()[idx].push(m.value);
        by_month[idx].push(m.value);
    }

    let mean = |values: &[f64]| -> Option<f64> {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    let years: Vec<i32> = cells.keys().copied().collect();
    let rows = cells
        .values()
        .map(|row| std::array::from_fn(|i| mean(&row[i])))
        .collect();
    let monthly_average_pct = std::array::from_fn(|i| mean(&by_month[i]).map(|v| v * 100.0));

    SeasonalityTable {
        ticker: ticker.to_string(),
        years,
        rows,
        monthly_average_pct,
    }
}
