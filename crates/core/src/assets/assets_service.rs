use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::assets_model::{Asset, AssetMarketSnapshot, NewAsset, PriceRefreshStatus};
use super::assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
use crate::constants::{CURRENCY_EUR, CURRENCY_USD};
use crate::errors::Result;
use crate::fx::{normalize_quote_unit, CurrencyConverter};
use crate::market_data::{MarketDataProviderTrait, SearchResult};
use crate::transactions::TransactionRepositoryTrait;

/// Asset registry operations: batch price refresh, provider search, ISIN
/// resolution, and placeholder migration.
pub struct AssetService {
    repository: Arc<dyn AssetRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    provider: Arc<dyn MarketDataProviderTrait>,
    converter: Arc<CurrencyConverter>,
}

impl AssetService {
    pub fn new(
        repository: Arc<dyn AssetRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        provider: Arc<dyn MarketDataProviderTrait>,
        converter: Arc<CurrencyConverter>,
    ) -> Self {
        Self {
            repository,
            transaction_repository,
            provider,
            converter,
        }
    }

    async fn refresh_one(&self, symbol: &str) -> PriceRefreshStatus {
        let quote = match self.provider.quote(symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!("Price refresh failed for {}: {}", symbol, e);
                return PriceRefreshStatus {
                    symbol: symbol.to_string(),
                    updated: false,
                    price: None,
                    message: Some(e.to_string()),
                };
            }
        };

        // Snapshot FX for the quote currency; pence quotes convert as GBP.
        let (_, fx_currency) = normalize_quote_unit(Decimal::ONE, &quote.currency);
        let to_usd = self.converter.rate(&fx_currency, CURRENCY_USD).await;
        let to_eur = self.converter.rate(&fx_currency, CURRENCY_EUR).await;

        let snapshot = AssetMarketSnapshot {
            current_price: Some(quote.price),
            quote_currency: Some(quote.currency.clone()),
            exchange_rate_to_usd: Some(to_usd),
            exchange_rate_to_eur: Some(to_eur),
        };
        match self.repository.update_market_data(symbol, snapshot).await {
            Ok(_) => PriceRefreshStatus {
                symbol: symbol.to_string(),
                updated: true,
                price: Some(quote.price),
                message: None,
            },
            Err(e) => {
                warn!("Storing refreshed price for {} failed: {}", symbol, e);
                PriceRefreshStatus {
                    symbol: symbol.to_string(),
                    updated: false,
                    price: Some(quote.price),
                    message: Some(e.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl AssetServiceTrait for AssetService {
    fn get_by_symbol(&self, symbol: &str) -> Result<Asset> {
        self.repository.get_by_symbol(symbol)
    }

    fn list_by_symbols(&self, symbols: &[String]) -> Result<Vec<Asset>> {
        self.repository.list_by_symbols(symbols)
    }

    async fn refresh_prices(&self, symbols: &[String]) -> Result<Vec<PriceRefreshStatus>> {
        let mut unique: Vec<String> = Vec::new();
        for symbol in symbols {
            if !unique.contains(symbol) {
                unique.push(symbol.clone());
            }
        }
        debug!("Refreshing prices for {} symbols", unique.len());
        let statuses = join_all(unique.iter().map(|symbol| self.refresh_one(symbol))).await;
        Ok(statuses)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.provider.search(query).await
    }

    async fn resolve_isin(&self, isin: &str) -> Result<Option<String>> {
        if let Some(existing) = self.repository.find_by_isin(isin)? {
            // A symbol equal to the ISIN is a parked placeholder from an
            // earlier failed lookup; try the provider again for those.
            if existing.symbol != isin {
                return Ok(Some(existing.symbol));
            }
        }
        match self.provider.search(isin).await {
            Ok(results) => Ok(results.into_iter().next().map(|r| r.symbol)),
            Err(e) => {
                warn!("ISIN lookup failed for {}: {}", isin, e);
                Ok(None)
            }
        }
    }

    async fn migrate_asset(&self, from_symbol: &str, to_symbol: &str) -> Result<u32> {
        if from_symbol == to_symbol {
            return Ok(0);
        }
        let placeholder = match self.repository.find_by_symbol(from_symbol)? {
            Some(asset) => asset,
            None => return Ok(0),
        };

        // Register the target first so reassigned rows point at a real asset,
        // but without the ISIN: the placeholder still holds it and the ISIN
        // must never exist on two rows at once.
        if self.repository.find_by_symbol(to_symbol)?.is_none() {
            self.repository
                .upsert(NewAsset {
                    symbol: to_symbol.to_string(),
                    name: placeholder.name.clone(),
                    quote_currency: placeholder.quote_currency.clone(),
                    asset_class: placeholder.asset_class,
                    isin: None,
                    current_price: placeholder.current_price,
                })
                .await?;
        }

        let moved = self
            .transaction_repository
            .reassign_asset(from_symbol, to_symbol)
            .await?;
        self.repository.delete(from_symbol).await?;

        if let Some(isin) = placeholder.isin {
            let target = self.repository.get_by_symbol(to_symbol)?;
            if target.isin.is_none() {
                self.repository
                    .upsert(NewAsset {
                        symbol: target.symbol.clone(),
                        name: target.name.clone(),
                        quote_currency: target.quote_currency.clone(),
                        asset_class: target.asset_class,
                        isin: Some(isin),
                        current_price: target.current_price,
                    })
                    .await?;
            }
        }

        debug!(
            "Migrated {} transactions from {} to {}",
            moved, from_symbol, to_symbol
        );
        Ok(moved)
    }
}
