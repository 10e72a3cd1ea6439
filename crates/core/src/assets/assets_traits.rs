use async_trait::async_trait;

use super::assets_model::{Asset, AssetMarketSnapshot, NewAsset, PriceRefreshStatus};
use crate::errors::Result;
use crate::market_data::SearchResult;

/// Contract for asset persistence. `symbol` is the key; `isin` is unique
/// when present.
#[async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    fn get_by_symbol(&self, symbol: &str) -> Result<Asset>;
    fn find_by_symbol(&self, symbol: &str) -> Result<Option<Asset>>;
    fn find_by_isin(&self, isin: &str) -> Result<Option<Asset>>;
    fn list(&self) -> Result<Vec<Asset>>;
    fn list_by_symbols(&self, symbols: &[String]) -> Result<Vec<Asset>>;
    /// Inserts or updates the identity fields of an asset. FX snapshot
    /// columns are only ever written through `update_market_data`.
    async fn upsert(&self, new_asset: NewAsset) -> Result<Asset>;
    async fn update_market_data(
        &self,
        symbol: &str,
        snapshot: AssetMarketSnapshot,
    ) -> Result<Asset>;
    async fn delete(&self, symbol: &str) -> Result<()>;
}

/// Contract for asset service operations.
#[async_trait]
pub trait AssetServiceTrait: Send + Sync {
    fn get_by_symbol(&self, symbol: &str) -> Result<Asset>;
    fn list_by_symbols(&self, symbols: &[String]) -> Result<Vec<Asset>>;
    async fn refresh_prices(&self, symbols: &[String]) -> Result<Vec<PriceRefreshStatus>>;
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
    /// Resolves an ISIN to a market symbol: an existing asset carrying the
    /// ISIN short-circuits, otherwise the provider search is consulted.
    async fn resolve_isin(&self, isin: &str) -> Result<Option<String>>;
    /// Reassigns all transactions from a placeholder asset row to the
    /// resolved one and retires the placeholder. Returns rows moved.
    async fn migrate_asset(&self, from_symbol: &str, to_symbol: &str) -> Result<u32>;
}
