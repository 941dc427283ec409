//! Text, CSV and JSON renderings of pipeline output.

use chrono::NaiveDate;
use cycles_core::{
    display_name, IndicatorKind, IndicatorSet, MonthlyReturn, PriceSeries, SeasonalityTable,
    MONTH_LABELS,
};
use cycles_indicators::returns::{cumulative_returns, daily_returns};
use cycles_indicators::seasonality::{monthly_returns, seasonality_table};
use cycles_indicators::zscore::deviation_zscore;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

fn cell(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.*}", precision, value)
    }
}

fn csv_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let sep = "=".repeat(60);
    writeln!(f, "\n{sep}")?;
    writeln!(f, "  {title}")?;
    writeln!(f, "{sep}")
}

/// Most recent `rows` observations with every indicator column.
pub struct IndicatorTable<'a> {
    set: &'a IndicatorSet,
    plot: IndicatorKind,
    rows: usize,
}

impl<'a> IndicatorTable<'a> {
    pub fn new(set: &'a IndicatorSet, plot: IndicatorKind, rows: usize) -> Self {
        Self { set, plot, rows }
    }
}

impl fmt::Display for IndicatorTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = self.set;
        banner(f, &format!("{} CYCLES", display_name(&set.ticker)))?;
        if let (Some(first), Some(last)) = (set.timestamps.first(), set.timestamps.last()) {
            writeln!(
                f,
                "  Period:          {} → {}",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            )?;
        }
        writeln!(f, "  Observations:    {}", set.len())?;

        // AVG is shown with its 6-period companion, like the main chart.
        let highlighted: &[IndicatorKind] = if self.plot == IndicatorKind::Avg {
            &[IndicatorKind::Avg, IndicatorKind::Avg6]
        } else {
            std::slice::from_ref(&self.plot)
        };
        for kind in highlighted {
            let latest = set
                .get(*kind)
                .and_then(|s| s.last_defined())
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "undefined".to_string());
            writeln!(f, "  Latest {:<9} {}", format!("{}:", kind), latest)?;
        }
        writeln!(f, "{}\n", "=".repeat(60))?;

        write!(f, "{:<12}{:>12}", "Date", "Close")?;
        for kind in IndicatorKind::ALL {
            write!(f, "{:>15}", kind.label())?;
        }
        writeln!(f)?;

        let start = set.len().saturating_sub(self.rows);
        for i in start..set.len() {
            write!(
                f,
                "{:<12}{:>12}",
                set.timestamps[i].format("%Y-%m-%d"),
                cell(set.close[i], 2)
            )?;
            for kind in IndicatorKind::ALL {
                let value = set.get(kind).map(|s| s.values[i]).unwrap_or(f64::NAN);
                write!(f, "{:>15}", cell(value, 4))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Every row as `date,close,<indicator columns>`; undefined values are empty cells.
pub fn write_indicator_csv<W: std::io::Write>(set: &IndicatorSet, sink: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    let mut header = vec!["date".to_string(), "close".to_string()];
    header.extend(IndicatorKind::ALL.iter().map(|k| k.label().to_string()));
    writer.write_record(&header)?;

    for i in 0..set.len() {
        let mut record = vec![
            set.timestamps[i].format("%Y-%m-%d").to_string(),
            csv_cell(set.close[i]),
        ];
        for kind in IndicatorKind::ALL {
            record.push(csv_cell(set.get(kind).map(|s| s.values[i]).unwrap_or(f64::NAN)));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Cumulative growth, monthly returns, and their calendar breakdown for one ticker.
///
/// `Display` renders the heatmap in percent with two decimals, followed by
/// the monthly averages.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonalityReport {
    pub title: String,
    /// Growth of one unit over the whole period, minus one.
    pub cumulative_return: Option<f64>,
    pub monthly: Vec<MonthlyReturn>,
    pub table: SeasonalityTable,
}

impl SeasonalityReport {
    pub fn build(title: &str, series: &PriceSeries) -> Self {
        let timestamps = series.timestamps();
        let returns = daily_returns(&series.closes());
        let cumulative_return = cumulative_returns(&returns)
            .into_iter()
            .rev()
            .find(|v| !v.is_nan())
            .map(|growth| growth - 1.0);
        let monthly = monthly_returns(&timestamps, &returns);
        let table = seasonality_table(&series.ticker, &monthly);

        tracing::debug!(
            ticker = %series.ticker,
            months = monthly.len(),
            years = table.years.len(),
            "Built seasonality report"
        );

        Self {
            title: title.to_string(),
            cumulative_return,
            monthly,
            table,
        }
    }

    /// Heatmap as CSV: `year,Jan,...,Dec` with returns as fractions.
    pub fn write_heatmap_csv<W: std::io::Write>(&self, sink: W) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_writer(sink);
        let mut header = vec!["year".to_string()];
        header.extend(MONTH_LABELS.iter().map(|m| m.to_string()));
        writer.write_record(&header)?;
        for (year, row) in self.table.years.iter().zip(&self.table.rows) {
            let mut record = vec![year.to_string()];
            record.extend(row.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for SeasonalityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, &format!("{} SEASONALITY", self.title))?;
        let cumulative = self
            .cumulative_return
            .map(|v| format!("{:.2}%", v * 100.0))
            .unwrap_or_else(|| "undefined".to_string());
        writeln!(f, "  Cumulative Return: {}", cumulative)?;
        writeln!(f, "  Months:            {}", self.monthly.len())?;
        writeln!(f, "{}\n", "=".repeat(60))?;

        writeln!(f, "Monthly returns (%)")?;
        write!(f, "{:<6}", "Year")?;
        for label in MONTH_LABELS {
            write!(f, "{:>8}", label)?;
        }
        writeln!(f)?;
        for (year, row) in self.table.years.iter().zip(&self.table.rows) {
            write!(f, "{:<6}", year)?;
            for value in row {
                write!(f, "{:>8}", cell(value.map(|v| v * 100.0).unwrap_or(f64::NAN), 2))?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\nAverage monthly performance (%)")?;
        for (label, avg) in MONTH_LABELS.iter().zip(&self.table.monthly_average_pct) {
            writeln!(f, "  {:<4}{:>8}", label, cell(avg.unwrap_or(f64::NAN), 2))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ZScoreRow {
    pub date: NaiveDate,
    pub primary: f64,
    /// NaN when the reference has no observation on `date`.
    pub reference: f64,
}

/// Deviation z-scores of a primary series and a reference series, on the
/// primary's trading days.
#[derive(Debug, Clone, Serialize)]
pub struct ZScoreReport {
    pub primary: String,
    pub reference: String,
    pub window: usize,
    pub rows: Vec<ZScoreRow>,
}

impl ZScoreReport {
    pub fn build(primary: &PriceSeries, reference: &PriceSeries, window: usize) -> Self {
        let reference_by_day: HashMap<NaiveDate, f64> = reference
            .timestamps()
            .iter()
            .map(|ts| ts.date_naive())
            .zip(deviation_zscore(&reference.closes(), window))
            .collect();

        let rows: Vec<ZScoreRow> = primary
            .timestamps()
            .iter()
            .zip(deviation_zscore(&primary.closes(), window))
            .map(|(ts, z)| {
                let date = ts.date_naive();
                ZScoreRow {
                    date,
                    primary: z,
                    reference: reference_by_day.get(&date).copied().unwrap_or(f64::NAN),
                }
            })
            .collect();

        tracing::debug!(
            primary = %primary.ticker,
            reference = %reference.ticker,
            window,
            rows = rows.len(),
            "Built z-score report"
        );

        Self {
            primary: primary.ticker.clone(),
            reference: reference.ticker.clone(),
            window,
            rows,
        }
    }

    /// The last `rows` rows as a text table.
    pub fn table(&self, rows: usize) -> ZScoreTable<'_> {
        ZScoreTable { report: self, rows }
    }

    pub fn write_csv<W: std::io::Write>(&self, sink: W) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_writer(sink);
        writer.write_record(["date", self.primary.as_str(), self.reference.as_str()])?;
        for row in &self.rows {
            writer.write_record([
                row.date.format("%Y-%m-%d").to_string(),
                csv_cell(row.primary),
                csv_cell(row.reference),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

pub struct ZScoreTable<'a> {
    report: &'a ZScoreReport,
    rows: usize,
}

impl fmt::Display for ZScoreTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let primary = display_name(&report.primary);
        let reference = display_name(&report.reference);
        banner(f, &format!("{} vs {} Z SCORE ({})", primary, reference, report.window))?;
        writeln!(f, "{}\n", "=".repeat(60))?;

        writeln!(f, "{:<12}{:>12}{:>12}", "Date", primary, reference)?;
        let start = report.rows.len().saturating_sub(self.rows);
        for row in &report.rows[start..] {
            writeln!(
                f,
                "{:<12}{:>12}{:>12}",
                row.date.format("%Y-%m-%d"),
                cell(row.primary, 4),
                cell(row.reference, 4)
            )?;
        }
        Ok(())
    }
}
