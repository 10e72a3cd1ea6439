//! Asset domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::PENCE_QUOTE_CURRENCIES;
use crate::errors::{Result, ValidationError};

/// Coarse asset classification driving the rebalancing buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    #[default]
    Equity,
    Stock,
    Etf,
    FixedIncome,
    Bond,
    Cash,
    Crypto,
    Other,
}

impl AssetClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "EQUITY",
            AssetClass::Stock => "STOCK",
            AssetClass::Etf => "ETF",
            AssetClass::FixedIncome => "FIXED_INCOME",
            AssetClass::Bond => "BOND",
            AssetClass::Cash => "CASH",
            AssetClass::Crypto => "CRYPTO",
            AssetClass::Other => "OTHER",
        }
    }

    /// Parses a stored class string, defaulting unknown values to `Equity`
    /// to match the ledger's default bucket.
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "EQUITY" => AssetClass::Equity,
            "STOCK" => AssetClass::Stock,
            "ETF" => AssetClass::Etf,
            "FIXED_INCOME" => AssetClass::FixedIncome,
            "BOND" => AssetClass::Bond,
            "CASH" => AssetClass::Cash,
            "CRYPTO" => AssetClass::Crypto,
            "OTHER" => AssetClass::Other,
            _ => AssetClass::Equity,
        }
    }
}

/// Global reference entity keyed by market symbol (not per portfolio).
///
/// `exchange_rate_to_usd`/`_to_eur` are the last fetched FX snapshot for the
/// quote currency; valuation prefers the snapshot matching the portfolio
/// base currency and pivots through USD otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    pub name: Option<String>,
    /// Currency the market price is expressed in. May be GBX/GBp (pence),
    /// which valuation rescales by 1/100.
    pub quote_currency: String,
    pub asset_class: AssetClass,
    /// External identifier; unique when present, distinct from `symbol`.
    pub isin: Option<String>,
    pub current_price: Option<Decimal>,
    pub exchange_rate_to_usd: Option<Decimal>,
    pub exchange_rate_to_eur: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    pub fn is_pence_quoted(&self) -> bool {
        PENCE_QUOTE_CURRENCIES.contains(&self.quote_currency.as_str())
    }
}

/// Payload for registering or upserting an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub symbol: String,
    pub name: Option<String>,
    pub quote_currency: String,
    #[serde(default)]
    pub asset_class: AssetClass,
    pub isin: Option<String>,
    pub current_price: Option<Decimal>,
}

impl NewAsset {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        if self.quote_currency.trim().is_empty() {
            return Err(ValidationError::MissingField("quoteCurrency".to_string()).into());
        }
        Ok(())
    }
}

/// Fresh market snapshot written back by the price refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssetMarketSnapshot {
    pub current_price: Option<Decimal>,
    pub quote_currency: Option<String>,
    pub exchange_rate_to_usd: Option<Decimal>,
    pub exchange_rate_to_eur: Option<Decimal>,
}

/// Per-symbol outcome of a batch price refresh. A failed symbol never aborts
/// the batch; it is reported here with its price left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRefreshStatus {
    pub symbol: String,
    pub updated: bool,
    pub price: Option<Decimal>,
    pub message: Option<String>,
}
