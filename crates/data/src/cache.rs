use async_trait::async_trait;
use cycles_core::{DataError, DateRange, PriceField, PriceSeries, PriceSource};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    ticker: String,
    range: DateRange,
    field: PriceField,
}

struct CacheEntry {
    fetched_at: Instant,
    series: PriceSeries,
}

/// Memoizes another source by `(ticker, start, end, field)` for a fixed time-to-live.
///
/// Failed fetches are not cached. Expired entries are dropped whenever a new
/// series is stored.
pub struct CachedPriceSource<S> {
    inner: S,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl<S: PriceSource> CachedPriceSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries
            .write()
            .await
            .retain(|_, entry| entry.fetched_at.elapsed() < ttl);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for CachedPriceSource<S> {
    async fn fetch(
        &self,
        ticker: &str,
        range: DateRange,
        field: PriceField,
    ) -> Result<PriceSeries, DataError> {
        let key = CacheKey {
            ticker: ticker.to_string(),
            range,
            field,
        };

        if let Some(entry) = self.entries.read().await.get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                tracing::debug!(ticker = %ticker, range = %range, "Price cache hit");
                return Ok(entry.series.clone());
            }
        }

        let series = self.inner.fetch(ticker, range, field).await?;
        self.purge_expired().await;
        self.entries.write().await.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                series: series.clone(),
            },
        );
        Ok(series)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
