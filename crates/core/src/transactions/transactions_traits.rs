use async_trait::async_trait;

use super::transactions_model::{
    NewTransaction, Transaction, TransactionPage, TransactionUpdate,
};
use crate::errors::Result;

/// Contract for transaction persistence.
///
/// `list_by_portfolio` must return rows ordered ascending by date with ties
/// broken by insertion order; the accounting fold depends on that ordering.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get(&self, transaction_id: &str) -> Result<Transaction>;
    fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Transaction>>;
    fn list_page(&self, portfolio_id: &str, page: i64, page_size: i64) -> Result<TransactionPage>;
    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction>;
    async fn create_many(&self, new_transactions: Vec<NewTransaction>) -> Result<usize>;
    async fn update(&self, update: TransactionUpdate) -> Result<Transaction>;
    async fn delete(&self, transaction_id: &str) -> Result<Transaction>;
    async fn delete_by_portfolio(&self, portfolio_id: &str) -> Result<usize>;
    /// Moves every transaction referencing `from_symbol` onto `to_symbol`.
    /// Returns the number of rows touched.
    async fn reassign_asset(&self, from_symbol: &str, to_symbol: &str) -> Result<u32>;
}

/// Contract for transaction service operations.
#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    fn get(&self, transaction_id: &str) -> Result<Transaction>;
    fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Transaction>>;
    fn list_page(&self, portfolio_id: &str, page: i64, page_size: i64) -> Result<TransactionPage>;
    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction>;
    async fn update(&self, update: TransactionUpdate) -> Result<Transaction>;
    async fn delete(&self, transaction_id: &str) -> Result<Transaction>;
    async fn delete_by_portfolio(&self, portfolio_id: &str) -> Result<usize>;
}
