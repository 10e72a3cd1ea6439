use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use log::warn;
use rust_decimal::Decimal;

use super::history::{build_history, HistoryPoint, PriceSeries};
use super::performance::{aggregate, PerformanceReport};
use super::portfolio_model::Portfolio;
use super::rebalancing::{compute_stats, recommend, RebalancingReport, RiskProfile};
use super::summary::{
    compute_breakdown, compute_holdings, compute_summary, AssetBreakdownRow, FoldPolicy, Holding,
    PortfolioSummary,
};
use crate::assets::{Asset, AssetRepositoryTrait};
use crate::constants::CURRENCY_USD;
use crate::errors::Result;
use crate::fx::CurrencyConverter;
use crate::market_data::MarketDataProviderTrait;
use crate::transactions::{Transaction, TransactionRepositoryTrait};

/// Read-side operations over a portfolio's ledger.
#[async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    async fn summary(&self, portfolio: &Portfolio) -> Result<PortfolioSummary>;
    async fn breakdown(
        &self,
        portfolio: &Portfolio,
        include_closed: bool,
    ) -> Result<Vec<AssetBreakdownRow>>;
    fn holdings(&self, portfolio_id: &str) -> Result<HashMap<String, Holding>>;
    async fn history(&self, portfolio: &Portfolio) -> Result<Vec<HistoryPoint>>;
    async fn performance(&self, portfolio: &Portfolio) -> Result<PerformanceReport>;
    async fn rebalancing_report(
        &self,
        portfolio: &Portfolio,
        profile: RiskProfile,
    ) -> Result<RebalancingReport>;
}

/// Front door for the derived views: fetches the ledger and asset metadata
/// through the ports, prefetches the FX pivot rate, and hands everything to
/// the pure calculators. All degradation (missing prices, failed series
/// fetches) happens here per symbol; the calculators stay total.
pub struct PortfolioService {
    transactions: Arc<dyn TransactionRepositoryTrait>,
    assets: Arc<dyn AssetRepositoryTrait>,
    provider: Arc<dyn MarketDataProviderTrait>,
    converter: Arc<CurrencyConverter>,
    policy: FoldPolicy,
}

impl PortfolioService {
    pub fn new(
        transactions: Arc<dyn TransactionRepositoryTrait>,
        assets: Arc<dyn AssetRepositoryTrait>,
        provider: Arc<dyn MarketDataProviderTrait>,
        converter: Arc<CurrencyConverter>,
    ) -> Self {
        Self {
            transactions,
            assets,
            provider,
            converter,
            policy: FoldPolicy::default(),
        }
    }

    /// Same service with a non-default fold policy.
    pub fn with_policy(mut self, policy: FoldPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn usd_to_base(&self, base_currency: &str) -> Decimal {
        if base_currency == CURRENCY_USD {
            Decimal::ONE
        } else {
            self.converter.rate(CURRENCY_USD, base_currency).await
        }
    }

    fn asset_lookup(&self, transactions: &[Transaction]) -> Result<HashMap<String, Asset>> {
        let symbols = distinct_symbols(transactions);
        let assets = self.assets.list_by_symbols(&symbols)?;
        Ok(assets
            .into_iter()
            .map(|asset| (asset.symbol.clone(), asset))
            .collect())
    }

    /// Fetches daily close series for every symbol, isolating failures: a
    /// symbol whose fetch fails gets an empty series and is valued by
    /// carry-forward (or zero) instead of aborting the build.
    async fn fetch_price_series(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> PriceSeries {
        let fetches = symbols.iter().map(|symbol| async move {
            match self.provider.historical(symbol, start, end).await {
                Ok(points) => (symbol.clone(), points),
                Err(e) => {
                    warn!("Historical prices unavailable for {}: {}", symbol, e);
                    (symbol.clone(), Vec::new())
                }
            }
        });
        join_all(fetches)
            .await
            .into_iter()
            .map(|(symbol, points)| {
                let series: BTreeMap<NaiveDate, Decimal> = points
                    .into_iter()
                    .map(|point| (point.date, point.close))
                    .collect();
                (symbol, series)
            })
            .collect()
    }
}

#[async_trait]
impl PortfolioServiceTrait for PortfolioService {
    async fn summary(&self, portfolio: &Portfolio) -> Result<PortfolioSummary> {
        let transactions = self.transactions.list_by_portfolio(&portfolio.id)?;
        let assets = self.asset_lookup(&transactions)?;
        let usd_to_base = self.usd_to_base(&portfolio.base_currency).await;
        Ok(compute_summary(
            &transactions,
            &portfolio.base_currency,
            &assets,
            usd_to_base,
            self.policy,
        ))
    }

    async fn breakdown(
        &self,
        portfolio: &Portfolio,
        include_closed: bool,
    ) -> Result<Vec<AssetBreakdownRow>> {
        let transactions = self.transactions.list_by_portfolio(&portfolio.id)?;
        let assets = self.asset_lookup(&transactions)?;
        let usd_to_base = self.usd_to_base(&portfolio.base_currency).await;
        Ok(compute_breakdown(
            &transactions,
            &portfolio.base_currency,
            &assets,
            usd_to_base,
            include_closed,
        ))
    }

    fn holdings(&self, portfolio_id: &str) -> Result<HashMap<String, Holding>> {
        let transactions = self.transactions.list_by_portfolio(portfolio_id)?;
        Ok(compute_holdings(&transactions))
    }

    async fn history(&self, portfolio: &Portfolio) -> Result<Vec<HistoryPoint>> {
        let transactions = self.transactions.list_by_portfolio(&portfolio.id)?;
        let start = match transactions.iter().map(|t| t.date.date_naive()).min() {
            Some(start) => start,
            None => return Ok(Vec::new()),
        };
        let today = Utc::now().date_naive();

        let symbols = distinct_symbols(&transactions);
        let price_series = self.fetch_price_series(&symbols, start, today).await;
        let assets = self.asset_lookup(&transactions)?;
        let usd_to_base = self.usd_to_base(&portfolio.base_currency).await;

        Ok(build_history(
            &transactions,
            &price_series,
            &assets,
            &portfolio.base_currency,
            usd_to_base,
            today,
            self.policy,
        ))
    }

    async fn performance(&self, portfolio: &Portfolio) -> Result<PerformanceReport> {
        let history = self.history(portfolio).await?;
        Ok(aggregate(&history))
    }

    async fn rebalancing_report(
        &self,
        portfolio: &Portfolio,
        profile: RiskProfile,
    ) -> Result<RebalancingReport> {
        let transactions = self.transactions.list_by_portfolio(&portfolio.id)?;
        let assets = self.asset_lookup(&transactions)?;
        let usd_to_base = self.usd_to_base(&portfolio.base_currency).await;
        let breakdown = compute_breakdown(
            &transactions,
            &portfolio.base_currency,
            &assets,
            usd_to_base,
            false,
        );
        let stats = compute_stats(&breakdown, &assets);
        Ok(recommend(stats, profile))
    }
}

fn distinct_symbols(transactions: &[Transaction]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for transaction in transactions {
        if let Some(symbol) = transaction.asset_symbol.as_deref() {
            if !symbol.trim().is_empty() && !symbols.iter().any(|s| s == symbol) {
                symbols.push(symbol.to_string());
            }
        }
    }
    symbols
}
