use async_trait::async_trait;
use chrono::NaiveDate;

use super::market_data_model::{HistoricalPoint, Quote, SearchResult};
use crate::errors::Result;

/// Port to the external market-data client.
///
/// FX rates ride on the same quote call through synthetic `"{from}{to}=X"`
/// symbols. Implementations live outside this crate; callers are expected to
/// catch per-symbol failures and degrade rather than abort batches.
#[async_trait]
pub trait MarketDataProviderTrait: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote>;
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
    async fn historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalPoint>>;
}
