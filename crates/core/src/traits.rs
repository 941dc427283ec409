use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Price Source Trait
// ---------------------------------------------------------------------------

/// Errors that can occur while obtaining price data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("No price data for {ticker} in {range}")]
    Empty { ticker: String, range: DateRange },
}

/// Supplies daily price history for a ticker.
///
/// Implementations do not retry and do not repair data; short or empty
/// series at calendar edges are returned as-is.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Load observations with timestamps inside `range`.
    async fn fetch(
        &self,
        ticker: &str,
        range: DateRange,
        field: PriceField,
    ) -> Result<PriceSeries, DataError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
