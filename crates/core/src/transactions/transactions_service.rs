use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::transactions_model::{
    NewTransaction, Transaction, TransactionPage, TransactionUpdate,
};
use super::transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
use crate::assets::{AssetRepositoryTrait, NewAsset};
use crate::errors::Result;

/// Service for ledger CRUD. Creating a transaction that references an
/// unknown symbol registers a minimal asset row first, so the ledger never
/// points at a missing asset.
pub struct TransactionService {
    repository: Arc<dyn TransactionRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
}

impl TransactionService {
    pub fn new(
        repository: Arc<dyn TransactionRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            asset_repository,
        }
    }

    async fn ensure_asset(&self, new_transaction: &NewTransaction) -> Result<()> {
        let symbol = match new_transaction.asset_symbol.as_deref() {
            Some(symbol) if !symbol.trim().is_empty() => symbol,
            _ => return Ok(()),
        };
        if self.asset_repository.find_by_symbol(symbol)?.is_some() {
            return Ok(());
        }
        let quote_currency = new_transaction
            .asset_currency
            .clone()
            .unwrap_or_else(|| new_transaction.currency.clone());
        debug!("Registering asset {} on first reference", symbol);
        self.asset_repository
            .upsert(NewAsset {
                symbol: symbol.to_string(),
                name: Some(symbol.to_string()),
                quote_currency,
                isin: new_transaction.isin.clone(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    fn get(&self, transaction_id: &str) -> Result<Transaction> {
        self.repository.get(transaction_id)
    }

    fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Transaction>> {
        self.repository.list_by_portfolio(portfolio_id)
    }

    fn list_page(&self, portfolio_id: &str, page: i64, page_size: i64) -> Result<TransactionPage> {
        self.repository.list_page(portfolio_id, page, page_size)
    }

    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        new_transaction.validate()?;
        self.ensure_asset(&new_transaction).await?;
        self.repository.create(new_transaction).await
    }

    async fn update(&self, update: TransactionUpdate) -> Result<Transaction> {
        update.validate()?;
        self.repository.update(update).await
    }

    async fn delete(&self, transaction_id: &str) -> Result<Transaction> {
        self.repository.delete(transaction_id).await
    }

    async fn delete_by_portfolio(&self, portfolio_id: &str) -> Result<usize> {
        let removed = self.repository.delete_by_portfolio(portfolio_id).await?;
        debug!("Deleted {} transactions for portfolio {}", removed, portfolio_id);
        Ok(removed)
    }
}
