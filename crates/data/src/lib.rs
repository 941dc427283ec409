pub mod cache;
pub mod csv_loader;
pub mod yahoo;

pub use cache::CachedPriceSource;
pub use yahoo::YahooPriceSource;

use async_trait::async_trait;
use cycles_core::{DataError, DateRange, PriceField, PriceSeries, PriceSource};

/// A CSV-file-based price source: one `<ticker>.csv` per symbol.
pub struct CsvPriceSource {
    pub directory: std::path::PathBuf,
}

impl CsvPriceSource {
    pub fn new(directory: impl Into<std::path::PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn file_for(&self, ticker: &str) -> std::path::PathBuf {
        self.directory.join(format!("{}.csv", ticker))
    }

    /// Tickers with a CSV file in the directory, sorted.
    pub fn available_tickers(&self) -> Result<Vec<String>, DataError> {
        let mut tickers = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "csv").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().to_string());
                }
            }
        }
        tickers.sort();
        Ok(tickers)
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn fetch(
        &self,
        ticker: &str,
        range: DateRange,
        field: PriceField,
    ) -> Result<PriceSeries, DataError> {
        let file_path = self.file_for(ticker);
        if !file_path.exists() {
            return Err(DataError::NotFound(format!(
                "CSV file not found: {}",
                file_path.display()
            )));
        }
        let series = csv_loader::load_prices_from_csv(&file_path, field)?;
        let mut filtered = series.restrict(&range);
        filtered.ticker = ticker.to_string();
        tracing::info!(
            ticker = %ticker,
            file = %file_path.display(),
            points = filtered.len(),
            "Loaded prices from CSV"
        );
        if filtered.is_empty() {
            return Err(DataError::Empty {
                ticker: ticker.to_string(),
                range,
            });
        }
        Ok(filtered)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
