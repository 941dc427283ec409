//! Yahoo Finance chart API client.

use async_trait::async_trait;
use chrono::DateTime;
use cycles_core::{DataError, DateRange, PriceField, PricePoint, PriceSeries, PriceSource};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; cycles/0.1)";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Daily bars from the Yahoo Finance v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooPriceSource {
    base_url: String,
    client: reqwest::Client,
}

impl Default for YahooPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooPriceSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    async fn fetch(
        &self,
        ticker: &str,
        range: DateRange,
        field: PriceField,
    ) -> Result<PriceSeries, DataError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        tracing::info!(ticker = %ticker, range = %range, "Requesting Yahoo chart data");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("period1", range.start_datetime().timestamp().to_string()),
                ("period2", range.end_datetime().timestamp().to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()
            .await
            .map_err(|e| DataError::ApiError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DataError::ApiError(e.to_string()))?;

        // Yahoo reports unknown symbols as a 404 with a regular chart error payload.
        let parsed: ChartResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                DataError::ParseError(format!("Unexpected chart payload: {}", e))
            } else {
                DataError::ApiError(format!("HTTP {}", status))
            }
        })?;

        let series = parse_chart(ticker, parsed, field)?.restrict(&range);
        if series.is_empty() {
            return Err(DataError::Empty {
                ticker: ticker.to_string(),
                range,
            });
        }
        tracing::info!(ticker = %ticker, points = series.len(), "Received Yahoo chart data");
        Ok(series)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

fn parse_chart(
    ticker: &str,
    response: ChartResponse,
    field: PriceField,
) -> Result<PriceSeries, DataError> {
    if let Some(err) = response.chart.error {
        return match err.code.as_str() {
            "Not Found" => Err(DataError::NotFound(format!("{}: {}", ticker, err.description))),
            _ => Err(DataError::ApiError(format!("{}: {}", err.code, err.description))),
        };
    }

    let result = response
        .chart
        .result
        .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
        .ok_or_else(|| DataError::NotFound(format!("No chart result for {}", ticker)))?;

    let prices: Vec<Option<f64>> = match field {
        PriceField::Close => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
        PriceField::AdjClose => result
            .indicators
            .adjclose
            .into_iter()
            .next()
            .map(|a| a.adjclose)
            .unwrap_or_default(),
    };

    if !result.timestamp.is_empty() && prices.len() != result.timestamp.len() {
        return Err(DataError::ParseError(format!(
            "{} timestamps but {} prices",
            result.timestamp.len(),
            prices.len()
        )));
    }

    let points = result
        .timestamp
        .iter()
        .zip(prices)
        .map(|(ts, price)| {
            let timestamp = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| DataError::ParseError(format!("Invalid timestamp {}", ts)))?;
            Ok(PricePoint::new(timestamp, price.unwrap_or(f64::NAN)))
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    Ok(PriceSeries::new(ticker, points))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "chart": {
        "result": [{
          "meta": {"symbol": "^GSPC"},
          "timestamp": [1672756200, 1672842600, 1672929000],
          "indicators": {
            "quote": [{"close": [3824.14, null, 3808.10], "open": [1, 2, 3]}],
            "adjclose": [{"adjclose": [3824.14, 3852.97, 3800.0]}]
          }
        }],
        "error": null
      }
    }"#;

    fn sample() -> ChartResponse {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_close_with_null() {
        let series = parse_chart("^GSPC", sample(), PriceField::Close).unwrap();
        let closes = series.closes();
        assert_eq!(closes.len(), 3);
        assert_eq!(closes[0], 3824.14);
        assert!(closes[1].is_nan());
    }

    #[test]
    fn test_parse_adjclose() {
        let series = parse_chart("^GSPC", sample(), PriceField::AdjClose).unwrap();
        assert_eq!(series.closes(), vec![3824.14, 3852.97, 3800.0]);
    }

    #[test]
    fn test_unknown_symbol_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let parsed: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            parse_chart("NOPE", parsed, PriceField::Close),
            Err(DataError::NotFound(_))
        ));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let body = r#"{"chart":{"result":[{"timestamp":[1,2],"indicators":{"quote":[{"close":[1.0]}]}}],"error":null}}"#;
        let parsed: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            parse_chart("X", parsed, PriceField::Close),
            Err(DataError::ParseError(_))
        ));
    }
}
