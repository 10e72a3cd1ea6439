use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::adjustments::{implied_usd_rate, parse_adjustments, parse_summary_symbol};
use super::etoro::{self, AssetSeed};
use super::imports_model::ImportSummary;
use super::trade_republic::{self, BlockKind, StatementBlock};
use super::workbook::Workbook;
use crate::assets::{
    AssetClass, AssetMarketSnapshot, AssetRepositoryTrait, AssetServiceTrait, NewAsset,
};
use crate::constants::{CURRENCY_EUR, CURRENCY_USD};
use crate::errors::Result;
use crate::transactions::{NewTransaction, TransactionRepositoryTrait, TransactionType};

/// Contract for broker statement imports.
#[async_trait]
pub trait ImportServiceTrait: Send + Sync {
    /// Replaces a portfolio's ledger with the contents of an eToro XLSX
    /// account statement. Re-importing the same file is idempotent.
    async fn import_etoro_workbook(
        &self,
        portfolio_id: &str,
        data: &[u8],
    ) -> Result<ImportSummary>;
    /// Appends the entries of a Trade Republic PDF statement to a
    /// portfolio's ledger.
    async fn import_trade_republic_pdf(
        &self,
        portfolio_id: &str,
        data: &[u8],
    ) -> Result<ImportSummary>;
    /// Statement import from already-extracted text.
    async fn import_trade_republic_text(
        &self,
        portfolio_id: &str,
        text: &str,
    ) -> Result<ImportSummary>;
    /// Applies a portfolio-summary adjustments file to stored asset
    /// prices and FX snapshots.
    async fn apply_price_adjustments(&self, json: &str) -> Result<ImportSummary>;
}

/// Turns broker statements into canonical ledger rows and keeps the asset
/// registry in step with what the statements reference.
pub struct ImportService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    asset_service: Arc<dyn AssetServiceTrait>,
}

impl ImportService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        asset_service: Arc<dyn AssetServiceTrait>,
    ) -> Self {
        Self {
            transaction_repository,
            asset_repository,
            asset_service,
        }
    }

    /// Validates parsed rows and persists the survivors, counting the
    /// rejects as skipped.
    async fn persist_rows(
        &self,
        rows: Vec<NewTransaction>,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let mut valid = Vec::with_capacity(rows.len());
        for row in rows {
            match row.validate() {
                Ok(()) => valid.push(row),
                Err(e) => {
                    warn!("Skipping statement row: {}", e);
                    summary.skipped += 1;
                }
            }
        }
        summary.created = self.transaction_repository.create_many(valid).await? as u32;
        Ok(())
    }

    /// Registers the assets an eToro statement references. New symbols get
    /// a fresh row; known symbols adopt a statement-stated quote currency
    /// and an ISIN learned from the dividends sheet.
    async fn register_etoro_assets(&self, seeds: &[AssetSeed]) -> Result<()> {
        for seed in seeds {
            let new_asset = match self.asset_repository.find_by_symbol(&seed.symbol)? {
                None => NewAsset {
                    symbol: seed.symbol.clone(),
                    name: seed.name.clone().or_else(|| Some(seed.symbol.clone())),
                    quote_currency: seed
                        .quote_currency
                        .clone()
                        .unwrap_or_else(|| CURRENCY_USD.to_string()),
                    asset_class: AssetClass::default(),
                    isin: self.claimable_isin(seed.isin.as_deref())?,
                    current_price: None,
                },
                Some(existing) => {
                    let quote_currency = seed
                        .quote_currency
                        .clone()
                        .unwrap_or_else(|| existing.quote_currency.clone());
                    let isin = match existing.isin.clone() {
                        Some(isin) => Some(isin),
                        None => self.claimable_isin(seed.isin.as_deref())?,
                    };
                    if quote_currency == existing.quote_currency && isin == existing.isin {
                        continue;
                    }
                    NewAsset {
                        symbol: existing.symbol.clone(),
                        name: existing.name.clone(),
                        quote_currency,
                        asset_class: existing.asset_class,
                        isin,
                        current_price: existing.current_price,
                    }
                }
            };
            self.asset_repository.upsert(new_asset).await?;
        }
        Ok(())
    }

    /// An ISIN may only be attached when no other asset row holds it.
    fn claimable_isin(&self, isin: Option<&str>) -> Result<Option<String>> {
        match isin {
            Some(isin) if self.asset_repository.find_by_isin(isin)?.is_none() => {
                Ok(Some(isin.to_string()))
            }
            _ => Ok(None),
        }
    }

    /// Resolves an ISIN to the asset row statement entries should
    /// reference, creating or migrating rows as needed. When no market
    /// listing can be found the ISIN itself is parked as the symbol; a
    /// later import retries the lookup and migrates the ledger over.
    async fn ensure_statement_asset(&self, isin: &str, name: Option<&str>) -> Result<String> {
        let resolved = self
            .asset_service
            .resolve_isin(isin)
            .await?
            .unwrap_or_else(|| isin.to_string());

        if let Some(existing) = self.asset_repository.find_by_isin(isin)? {
            if existing.symbol != resolved {
                let moved = self
                    .asset_service
                    .migrate_asset(&existing.symbol, &resolved)
                    .await?;
                debug!(
                    "Migrated {} rows from {} to {}",
                    moved, existing.symbol, resolved
                );
            }
        }

        match self.asset_repository.find_by_symbol(&resolved)? {
            None => {
                self.asset_repository
                    .upsert(NewAsset {
                        symbol: resolved.clone(),
                        name: name
                            .map(str::to_string)
                            .or_else(|| Some(resolved.clone())),
                        quote_currency: CURRENCY_EUR.to_string(),
                        asset_class: AssetClass::default(),
                        isin: Some(isin.to_string()),
                        current_price: None,
                    })
                    .await?;
            }
            Some(asset) if asset.isin.is_none() => {
                self.asset_repository
                    .upsert(NewAsset {
                        symbol: asset.symbol.clone(),
                        name: asset.name.clone(),
                        quote_currency: asset.quote_currency.clone(),
                        asset_class: asset.asset_class,
                        isin: Some(isin.to_string()),
                        current_price: asset.current_price,
                    })
                    .await?;
            }
            Some(_) => {}
        }
        Ok(resolved)
    }

    /// Emits the ledger rows for one statement block. Returns false when
    /// the block carries nothing importable.
    async fn statement_rows(
        &self,
        portfolio_id: &str,
        block: &StatementBlock,
        rows: &mut Vec<NewTransaction>,
    ) -> Result<bool> {
        let (Some(date), Some(amount)) = (block.date, block.raw_amount) else {
            return Ok(false);
        };
        let date = date.and_time(NaiveTime::MIN).and_utc();

        match block.kind {
            BlockKind::SavingsPlan | BlockKind::BuyTrade => {
                let (Some(isin), Some(quantity)) = (block.isin.as_deref(), block.quantity)
                else {
                    return Ok(false);
                };
                // Manual buy trades carry the flat one-euro order fee;
                // savings plan executions are free.
                let fee = if block.kind == BlockKind::BuyTrade {
                    Decimal::ONE
                } else {
                    Decimal::ZERO
                };
                let cost = amount - fee;
                if quantity <= Decimal::ZERO || cost <= Decimal::ZERO {
                    return Ok(false);
                }
                let symbol = self
                    .ensure_statement_asset(isin, block.asset_name.as_deref())
                    .await?;
                rows.push(NewTransaction {
                    portfolio_id: portfolio_id.to_string(),
                    transaction_type: TransactionType::Buy.as_str().to_string(),
                    date,
                    amount: cost,
                    currency: CURRENCY_EUR.to_string(),
                    asset_symbol: Some(symbol),
                    quantity: Some(quantity),
                    price_per_unit: Some(cost / quantity),
                    fee: Some(fee),
                    exchange_rate: Some(Decimal::ONE),
                    original_amount: Some(cost),
                    original_currency: Some(CURRENCY_EUR.to_string()),
                    isin: Some(isin.to_string()),
                    ..Default::default()
                });
                // The statement books the funding leg implicitly; mirror
                // it so the cash column stays balanced.
                rows.push(NewTransaction {
                    portfolio_id: portfolio_id.to_string(),
                    transaction_type: TransactionType::Deposit.as_str().to_string(),
                    date,
                    amount,
                    currency: CURRENCY_EUR.to_string(),
                    ..Default::default()
                });
            }
            BlockKind::SellTrade => {
                let (Some(isin), Some(quantity)) = (block.isin.as_deref(), block.quantity)
                else {
                    return Ok(false);
                };
                if quantity <= Decimal::ZERO {
                    return Ok(false);
                }
                let symbol = self
                    .ensure_statement_asset(isin, block.asset_name.as_deref())
                    .await?;
                rows.push(NewTransaction {
                    portfolio_id: portfolio_id.to_string(),
                    transaction_type: TransactionType::Sell.as_str().to_string(),
                    date,
                    amount,
                    currency: CURRENCY_EUR.to_string(),
                    asset_symbol: Some(symbol),
                    quantity: Some(quantity),
                    price_per_unit: Some(amount / quantity),
                    exchange_rate: Some(Decimal::ONE),
                    isin: Some(isin.to_string()),
                    ..Default::default()
                });
            }
            BlockKind::GiftReward | BlockKind::Saveback => {
                rows.push(NewTransaction {
                    portfolio_id: portfolio_id.to_string(),
                    transaction_type: TransactionType::Gift.as_str().to_string(),
                    date,
                    amount,
                    currency: CURRENCY_EUR.to_string(),
                    ..Default::default()
                });
            }
            BlockKind::Dividend => {
                let Some(isin) = block.isin.as_deref() else {
                    return Ok(false);
                };
                let symbol = self
                    .ensure_statement_asset(isin, block.asset_name.as_deref())
                    .await?;
                rows.push(NewTransaction {
                    portfolio_id: portfolio_id.to_string(),
                    transaction_type: TransactionType::Dividend.as_str().to_string(),
                    date,
                    amount,
                    currency: CURRENCY_EUR.to_string(),
                    asset_symbol: Some(symbol),
                    isin: Some(isin.to_string()),
                    ..Default::default()
                });
            }
            BlockKind::Interest => {
                rows.push(NewTransaction {
                    portfolio_id: portfolio_id.to_string(),
                    transaction_type: TransactionType::Interest.as_str().to_string(),
                    date,
                    amount,
                    currency: CURRENCY_EUR.to_string(),
                    ..Default::default()
                });
            }
            // Transfers move cash between accounts, not through the
            // ledger; unknown blocks have nothing to book.
            BlockKind::IncomingTransfer | BlockKind::OutgoingTransfer | BlockKind::Unknown => {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ImportServiceTrait for ImportService {
    async fn import_etoro_workbook(
        &self,
        portfolio_id: &str,
        data: &[u8],
    ) -> Result<ImportSummary> {
        let workbook = Workbook::from_bytes(data)?;
        let parsed = etoro::parse_workbook(&workbook, portfolio_id)?;
        let mut summary = ImportSummary {
            skipped: parsed.skipped,
            ..Default::default()
        };

        // Full resync: the statement is the source of truth for this
        // portfolio, so the previous ledger is replaced wholesale.
        let removed = self
            .transaction_repository
            .delete_by_portfolio(portfolio_id)
            .await?;
        if removed > 0 {
            debug!(
                "Cleared {} rows from portfolio {} before resync",
                removed, portfolio_id
            );
        }

        self.register_etoro_assets(&parsed.assets).await?;
        self.persist_rows(parsed.transactions, &mut summary).await?;
        debug!(
            "eToro import created {} rows in portfolio {} ({} skipped)",
            summary.created, portfolio_id, summary.skipped
        );
        Ok(summary)
    }

    async fn import_trade_republic_pdf(
        &self,
        portfolio_id: &str,
        data: &[u8],
    ) -> Result<ImportSummary> {
        let text = trade_republic::extract_statement_text(data)?;
        self.import_trade_republic_text(portfolio_id, &text).await
    }

    async fn import_trade_republic_text(
        &self,
        portfolio_id: &str,
        text: &str,
    ) -> Result<ImportSummary> {
        let blocks = trade_republic::tokenize_blocks(text);
        let mut summary = ImportSummary::default();
        let mut rows = Vec::new();
        for block in &blocks {
            if !self.statement_rows(portfolio_id, block, &mut rows).await? {
                summary.skipped += 1;
            }
        }
        self.persist_rows(rows, &mut summary).await?;
        debug!(
            "Statement import created {} rows in portfolio {} ({} of {} blocks skipped)",
            summary.created,
            portfolio_id,
            summary.skipped,
            blocks.len()
        );
        Ok(summary)
    }

    async fn apply_price_adjustments(&self, json: &str) -> Result<ImportSummary> {
        let file = parse_adjustments(json)?;
        let mut summary = ImportSummary::default();
        for entry in &file.portfolio_summary {
            let Some(symbol) = parse_summary_symbol(&entry.asset_name) else {
                warn!("No symbol recognizable in '{}'", entry.asset_name);
                summary.skipped += 1;
                continue;
            };
            let Some(asset) = self.asset_repository.find_by_symbol(&symbol)? else {
                warn!("Adjustments reference unknown asset {}", symbol);
                summary.not_found += 1;
                continue;
            };
            let snapshot = AssetMarketSnapshot {
                current_price: Some(entry.current_price),
                quote_currency: None,
                exchange_rate_to_usd: implied_usd_rate(entry),
                exchange_rate_to_eur: None,
            };
            self.asset_repository
                .update_market_data(&asset.symbol, snapshot)
                .await?;
            summary.created += 1;
        }
        debug!(
            "Adjustments updated {} assets ({} unknown, {} unparsable)",
            summary.created, summary.not_found, summary.skipped
        );
        Ok(summary)
    }
}
