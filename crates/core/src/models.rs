use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Tickers
// ---------------------------------------------------------------------------

/// A ticker the dashboards know how to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownTicker {
    pub symbol: &'static str,
    /// Name shown in report titles.
    pub display_name: &'static str,
    pub description: &'static str,
}

pub const KNOWN_TICKERS: &[KnownTicker] = &[
    KnownTicker {
        symbol: "^GSPC",
        display_name: "S&P500",
        description: "S&P 500 index",
    },
    KnownTicker {
        symbol: "^IXIC",
        display_name: "NASDAQ",
        description: "NASDAQ Composite index",
    },
    KnownTicker {
        symbol: "ETH-USD",
        display_name: "ETH-USD",
        description: "Ether in US dollars",
    },
    KnownTicker {
        symbol: "BTC-USD",
        display_name: "BTC-USD",
        description: "Bitcoin in US dollars",
    },
    KnownTicker {
        symbol: "^VIX",
        display_name: "VIX",
        description: "CBOE volatility index",
    },
];

/// Human-readable name for a ticker symbol; unknown symbols are returned as-is.
pub fn display_name(symbol: &str) -> &str {
    KNOWN_TICKERS
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
        .map(|t| t.display_name)
        .unwrap_or(symbol)
}

// ---------------------------------------------------------------------------
// Price data
// ---------------------------------------------------------------------------

/// Which price column a source should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    #[default]
    Close,
    /// Close adjusted for splits and dividends.
    AdjClose,
}

/// Half-open calendar range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `[year-01-01, end_year-01-01)`.
    pub fn from_years(start_year: i32, end_year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(start_year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(end_year, 1, 1)?,
        })
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        day >= self.start && day < self.end
    }

    pub fn start_datetime(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    pub fn end_datetime(&self) -> DateTime<Utc> {
        self.end.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// A single daily observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    /// NaN when the source had no value for this day.
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Ordered closing prices for one ticker. Timestamps are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts by timestamp; for duplicate timestamps the last observation wins.
    pub fn new(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        let before = points.len();
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => deduped.push(point),
            }
        }
        let ticker = ticker.into();
        if deduped.len() != before {
            tracing::warn!(
                ticker = %ticker,
                dropped = before - deduped.len(),
                "Dropped duplicate timestamps"
            );
        }
        Self {
            ticker,
            points: deduped,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keep only the observations inside `range`.
    pub fn restrict(mut self, range: &DateRange) -> Self {
        self.points.retain(|p| range.contains(p.timestamp));
        self
    }
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// The columns produced by the indicator pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    DailyReturn,
    Roc,
    ZScore,
    SharpeRatio,
    SortinoRatio,
    Macd,
    Avg,
    Avg6,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 8] = [
        IndicatorKind::DailyReturn,
        IndicatorKind::Roc,
        IndicatorKind::ZScore,
        IndicatorKind::SharpeRatio,
        IndicatorKind::SortinoRatio,
        IndicatorKind::Macd,
        IndicatorKind::Avg,
        IndicatorKind::Avg6,
    ];

    /// Column label used in tables and CSV headers.
    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::DailyReturn => "Daily Return",
            IndicatorKind::Roc => "ROC",
            IndicatorKind::ZScore => "Z Score",
            IndicatorKind::SharpeRatio => "Sharpe Ratio",
            IndicatorKind::SortinoRatio => "Sortino Ratio",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Avg => "AVG",
            IndicatorKind::Avg6 => "AVG_6",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "dailyreturn" | "return" => Ok(IndicatorKind::DailyReturn),
            "roc" => Ok(IndicatorKind::Roc),
            "zscore" | "z" => Ok(IndicatorKind::ZScore),
            "sharpe" | "sharperatio" => Ok(IndicatorKind::SharpeRatio),
            "sortino" | "sortinoratio" => Ok(IndicatorKind::SortinoRatio),
            "macd" => Ok(IndicatorKind::Macd),
            "avg" => Ok(IndicatorKind::Avg),
            "avg6" => Ok(IndicatorKind::Avg6),
            _ => Err(format!("unknown indicator '{}'", s)),
        }
    }
}

/// A named column aligned with its source price series. NaN marks undefined positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub values: Vec<f64>,
}

impl IndicatorSeries {
    pub fn new(kind: IndicatorKind, values: Vec<f64>) -> Self {
        Self { kind, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent defined value.
    pub fn last_defined(&self) -> Option<f64> {
        self.values.iter().rev().copied().find(|v| !v.is_nan())
    }
}

/// Every indicator column computed for one price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub ticker: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub close: Vec<f64>,
    pub series: BTreeMap<IndicatorKind, IndicatorSeries>,
}

impl IndicatorSet {
    pub fn get(&self, kind: IndicatorKind) -> Option<&IndicatorSeries> {
        self.series.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Seasonality
// ---------------------------------------------------------------------------

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Compound return of one calendar month, keyed by the month's last calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub month_end: NaiveDate,
    pub value: f64,
}

impl MonthlyReturn {
    pub fn year(&self) -> i32 {
        self.month_end.year()
    }

    /// 1-based calendar month.
    pub fn month(&self) -> u32 {
        self.month_end.month()
    }
}

/// Year × month grid of monthly returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityTable {
    pub ticker: String,
    /// Ascending years, one per row.
    pub years: Vec<i32>,
    /// `rows[i][m]` is the return of month `m + 1` in `years[i]`.
    pub rows: Vec<[Option<f64>; 12]>,
    /// Mean monthly return per calendar month across all years, in percent.
    pub monthly_average_pct: [Option<f64>; 12],
}

impl SeasonalityTable {
    pub fn cell(&self, year: i32, month: u32) -> Option<f64> {
        if !(1..=12).contains(&month) {
            return None;
        }
        let row = self.years.iter().position(|y| *y == year)?;
        self.rows[row][(month - 1) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let series = PriceSeries::new(
            "^GSPC",
            vec![
                PricePoint::new(ts(2024, 1, 3), 3.0),
                PricePoint::new(ts(2024, 1, 2), 2.0),
                PricePoint::new(ts(2024, 1, 3), 4.0),
            ],
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_date_range_is_half_open() {
        let range = DateRange::from_years(2023, 2024).unwrap();
        assert!(range.contains(ts(2023, 1, 1)));
        assert!(range.contains(ts(2023, 12, 31)));
        assert!(!range.contains(ts(2024, 1, 1)));
    }

    #[test]
    fn test_display_name_aliases() {
        assert_eq!(display_name("^GSPC"), "S&P500");
        assert_eq!(display_name("^IXIC"), "NASDAQ");
        assert_eq!(display_name("AAPL"), "AAPL");
    }

    #[test]
    fn test_indicator_kind_parsing() {
        assert_eq!("Z Score".parse::<IndicatorKind>(), Ok(IndicatorKind::ZScore));
        assert_eq!("sortino".parse::<IndicatorKind>(), Ok(IndicatorKind::SortinoRatio));
        assert_eq!("AVG_6".parse::<IndicatorKind>(), Ok(IndicatorKind::Avg6));
        assert!("rsi".parse::<IndicatorKind>().is_err());
    }

    #[test]
    fn test_last_defined_skips_trailing_nan() {
        let s = IndicatorSeries::new(IndicatorKind::Roc, vec![f64::NAN, 1.5, f64::NAN]);
        assert_eq!(s.last_defined(), Some(1.5));
    }
}
