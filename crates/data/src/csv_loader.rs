use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use cycles_core::{DataError, PriceField, PricePoint, PriceSeries};
use std::io::Read;
use std::path::Path;

/// Load a daily price series from a CSV file. The ticker is the file stem.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `date` (or `timestamp`, `datetime`, `time`), `close`, and optionally
/// `adj close` for [`PriceField::AdjClose`].
pub fn load_prices_from_csv(path: &Path, field: PriceField) -> Result<PriceSeries, DataError> {
    let ticker = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let file = std::fs::File::open(path)?;
    load_prices_from_reader(&ticker, file, field)
}

/// Like [`load_prices_from_csv`], reading from any byte source.
pub fn load_prices_from_reader<R: Read>(
    ticker: &str,
    source: R,
    field: PriceField,
) -> Result<PriceSeries, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let ts_col = find_column(&headers, &["date", "timestamp", "datetime", "time"])
        .ok_or_else(|| DataError::ParseError("No date column found".into()))?;
    let price_col = match field {
        PriceField::Close => find_column(&headers, &["close", "c"])
            .ok_or_else(|| DataError::ParseError("No close column found".into()))?,
        PriceField::AdjClose => find_column(&headers, &["adj close", "adj_close", "adjclose"])
            .ok_or_else(|| DataError::ParseError("No adj close column found".into()))?,
    };

    let mut points = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| DataError::ParseError(format!("CSV record error: {}", e)))?;
        let raw_ts = record
            .get(ts_col)
            .ok_or_else(|| DataError::ParseError("Row is missing the date column".into()))?;
        let raw_price = record.get(price_col).unwrap_or("");

        points.push(PricePoint::new(parse_timestamp(raw_ts)?, parse_price(raw_price)?));
    }

    Ok(PriceSeries::new(ticker, points))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    for (i, header) in headers.iter().enumerate() {
        let h = header.trim().to_lowercase();
        for name in names {
            if h == *name {
                return Some(i);
            }
        }
    }
    None
}

/// Empty cells and the usual placeholders become NaN rather than errors.
fn parse_price(s: &str) -> Result<f64, DataError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    s.parse::<f64>()
        .map_err(|e| DataError::ParseError(format!("Failed to parse price '{}': {}", s, e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DataError> {
    let s = s.trim();

    // Try RFC 3339 / ISO 8601 with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Common formats (without timezone, assume UTC)
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    // Date-only formats, as daily feeds usually write them
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }
    }

    // Try Unix timestamp (seconds)
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!(
        "Unable to parse timestamp: '{}'",
        s
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAHOO_EXPORT: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2023-01-04,3840.36,3873.16,3815.77,3852.97,3852.97,4414080000
2023-01-03,3853.29,3878.46,3794.33,3824.14,3824.14,3959140000
2023-01-05,3839.74,3839.74,3802.42,3808.10,3800.00,3893450000
";

    #[test]
    fn test_reads_and_sorts_closes() {
        let series =
            load_prices_from_reader("^GSPC", YAHOO_EXPORT.as_bytes(), PriceField::Close).unwrap();
        assert_eq!(series.ticker, "^GSPC");
        assert_eq!(series.closes(), vec![3824.14, 3852.97, 3808.10]);
        assert_eq!(
            series.points()[0].timestamp.date_naive(),
            NaiveDate::from_ymd_opt(2023, 1, 3).unwrap()
        );
    }

    #[test]
    fn test_adjusted_close_column() {
        let series =
            load_prices_from_reader("^GSPC", YAHOO_EXPORT.as_bytes(), PriceField::AdjClose)
                .unwrap();
        assert_eq!(series.closes()[2], 3800.00);
    }

    #[test]
    fn test_missing_close_becomes_nan() {
        let data = "date,close\n2023-01-03,10\n2023-01-04,\n2023-01-05,null\n";
        let series = load_prices_from_reader("X", data.as_bytes(), PriceField::Close).unwrap();
        let closes = series.closes();
        assert_eq!(closes[0], 10.0);
        assert!(closes[1].is_nan() && closes[2].is_nan());
    }

    #[test]
    fn test_missing_columns_rejected() {
        let data = "date,open\n2023-01-03,10\n";
        assert!(matches!(
            load_prices_from_reader("X", data.as_bytes(), PriceField::Close),
            Err(DataError::ParseError(_))
        ));
        assert!(matches!(
            load_prices_from_reader("X", data.as_bytes(), PriceField::AdjClose),
            Err(DataError::ParseError(_))
        ));
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 7).unwrap();
        for raw in ["2023-03-07", "03/07/2023", "2023-03-07 15:30:00", "2023-03-07T00:00:00Z"] {
            assert_eq!(parse_timestamp(raw).unwrap().date_naive(), expected, "{raw}");
        }
        assert!(parse_timestamp("yesterday").is_err());
    }
}
