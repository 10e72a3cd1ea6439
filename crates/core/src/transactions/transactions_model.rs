use chrono::{DateTime, Utc};
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::transactions_constants::*;
use crate::errors::{Result, ValidationError};

/// An immutable economic event belonging to exactly one portfolio.
///
/// `amount` is the settlement amount in the portfolio base currency. The
/// `exchange_rate`/`original_amount`/`original_currency` triple records the
/// provenance of a foreign-currency cash movement; when present,
/// `amount = original_amount * exchange_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub portfolio_id: String,
    pub transaction_type: String,
    pub date: DateTime<Utc>,
    pub amount: Decimal,
    /// Base currency code, stored per row for legacy tolerance.
    pub currency: String,
    /// None for pure cash movements (deposits, withdrawals, interest).
    pub asset_symbol: Option<String>,
    pub quantity: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub original_amount: Option<Decimal>,
    pub original_currency: Option<String>,
    pub isin: Option<String>,
    pub asset_currency: Option<String>,
    /// Dividend tax retained at source, in `currency`. Informational; the
    /// fold books the net `amount`.
    pub withholding_tax: Option<Decimal>,
    /// Withholding rate in percent.
    pub tax_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Quantity, defaulting to zero when absent.
    pub fn qty(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ZERO)
    }

    /// Fee, defaulting to zero when absent.
    pub fn fee_amount(&self) -> Decimal {
        self.fee.unwrap_or(Decimal::ZERO)
    }

    /// Parses the stored type string into the enum.
    pub fn kind(&self) -> std::result::Result<TransactionType, String> {
        self.transaction_type.parse()
    }
}

/// Canonical ledger event types. Stored as strings (see
/// `transactions_constants`); this enum is the typed view the fold uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Deposit,
    Withdrawal,
    Dividend,
    Interest,
    Gift,
    Saveback,
    Roundup,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => TRANSACTION_TYPE_BUY,
            TransactionType::Sell => TRANSACTION_TYPE_SELL,
            TransactionType::Deposit => TRANSACTION_TYPE_DEPOSIT,
            TransactionType::Withdrawal => TRANSACTION_TYPE_WITHDRAWAL,
            TransactionType::Dividend => TRANSACTION_TYPE_DIVIDEND,
            TransactionType::Interest => TRANSACTION_TYPE_INTEREST,
            TransactionType::Gift => TRANSACTION_TYPE_GIFT,
            TransactionType::Saveback => TRANSACTION_TYPE_SAVEBACK,
            TransactionType::Roundup => TRANSACTION_TYPE_ROUNDUP,
        }
    }

    /// Whether this type adds asset quantity.
    pub fn is_acquisition(&self) -> bool {
        ACQUISITION_TRANSACTION_TYPES.contains(&self.as_str())
    }

    /// Whether this type counts toward contributed capital.
    pub fn is_contribution(&self) -> bool {
        CONTRIBUTION_TRANSACTION_TYPES.contains(&self.as_str())
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            TRANSACTION_TYPE_BUY => Ok(TransactionType::Buy),
            TRANSACTION_TYPE_SELL => Ok(TransactionType::Sell),
            TRANSACTION_TYPE_DEPOSIT => Ok(TransactionType::Deposit),
            TRANSACTION_TYPE_WITHDRAWAL => Ok(TransactionType::Withdrawal),
            TRANSACTION_TYPE_DIVIDEND => Ok(TransactionType::Dividend),
            TRANSACTION_TYPE_INTEREST => Ok(TransactionType::Interest),
            TRANSACTION_TYPE_GIFT => Ok(TransactionType::Gift),
            TRANSACTION_TYPE_SAVEBACK => Ok(TransactionType::Saveback),
            TRANSACTION_TYPE_ROUNDUP => Ok(TransactionType::Roundup),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// Payload for creating a transaction. The repository assigns `id` (uuid v4)
/// and `created_at` unless an id is provided by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: Option<String>,
    pub portfolio_id: String,
    pub transaction_type: String,
    pub date: DateTime<Utc>,
    pub amount: Decimal,
    pub currency: String,
    pub asset_symbol: Option<String>,
    pub quantity: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub original_amount: Option<Decimal>,
    pub original_currency: Option<String>,
    pub isin: Option<String>,
    pub asset_currency: Option<String>,
    pub withholding_tax: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.portfolio_id.trim().is_empty() {
            return Err(ValidationError::MissingField("portfolioId".to_string()).into());
        }
        let kind: TransactionType = self
            .transaction_type
            .parse()
            .map_err(ValidationError::InvalidInput)?;
        validate_currency_code(&self.currency)?;
        if ASSET_REQUIRED_TRANSACTION_TYPES.contains(&kind.as_str())
            && self
                .asset_symbol
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
        {
            return Err(ValidationError::MissingField(format!(
                "assetSymbol is required for {} transactions",
                kind
            ))
            .into());
        }
        if self.quantity.is_some_and(|q| q < Decimal::ZERO) {
            return Err(
                ValidationError::InvalidInput("quantity must not be negative".to_string()).into(),
            );
        }
        if self.fee.is_some_and(|f| f < Decimal::ZERO) {
            return Err(
                ValidationError::InvalidInput("fee must not be negative".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Materializes the persisted row, assigning id and creation time.
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            portfolio_id: self.portfolio_id,
            transaction_type: self.transaction_type,
            date: self.date,
            amount: self.amount,
            currency: self.currency,
            asset_symbol: self.asset_symbol,
            quantity: self.quantity,
            price_per_unit: self.price_per_unit,
            fee: self.fee,
            exchange_rate: self.exchange_rate,
            original_amount: self.original_amount,
            original_currency: self.original_currency,
            isin: self.isin,
            asset_currency: self.asset_currency,
            withholding_tax: self.withholding_tax,
            tax_rate: self.tax_rate,
            created_at: Utc::now(),
        }
    }
}

/// Full-replace update payload; every field overwrites the stored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub transaction_type: String,
    pub date: DateTime<Utc>,
    pub amount: Decimal,
    pub currency: String,
    pub asset_symbol: Option<String>,
    pub quantity: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub original_amount: Option<Decimal>,
    pub original_currency: Option<String>,
    pub isin: Option<String>,
    pub asset_currency: Option<String>,
    pub withholding_tax: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
}

impl TransactionUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()).into());
        }
        let _: TransactionType = self
            .transaction_type
            .parse()
            .map_err(ValidationError::InvalidInput)?;
        validate_currency_code(&self.currency)?;
        Ok(())
    }
}

/// One page of a descending-date transaction listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

fn validate_currency_code(code: &str) -> Result<()> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCurrencyCode(code.to_string()).into())
    }
}

/// Parses a broker-formatted decimal, tolerating currency symbols, thousands
/// separators and comma decimal marks. Unparseable input logs and yields
/// zero so a single bad cell never aborts an import.
pub fn parse_decimal_tolerant(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "--" {
        return Decimal::ZERO;
    }

    let mut cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | ','))
        .collect();

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            // The later separator is the decimal mark, the other groups thousands.
            if comma > dot {
                cleaned = cleaned.replace('.', "").replace(',', ".");
            } else {
                cleaned = cleaned.replace(',', "");
            }
        }
        (None, Some(_)) => {
            if cleaned.matches(',').count() == 1 {
                cleaned = cleaned.replace(',', ".");
            } else {
                cleaned = cleaned.replace(',', "");
            }
        }
        (Some(_), None) => {
            // Several dots can only be thousands grouping.
            if cleaned.matches('.').count() > 1 {
                cleaned = cleaned.replace('.', "");
            }
        }
        (None, None) => {}
    }

    match Decimal::from_str(&cleaned) {
        Ok(value) => value,
        Err(_) => match Decimal::from_scientific(&cleaned) {
            Ok(value) => value,
            Err(_) => {
                error!("Failed to parse decimal value '{}', using 0", raw);
                Decimal::ZERO
            }
        },
    }
}
