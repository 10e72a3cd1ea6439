use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::QUANTITY_THRESHOLD;

/// Whether a quantity is large enough to count as an open position.
pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 5));
    quantity.abs() >= threshold
}

/// Knobs for the ledger fold. Broker quirks stay in the normalizers; the
/// fold itself is parameterized only by policies that change its semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldPolicy {
    /// When a BUY would drive cash negative, book the shortfall as extra
    /// contributed capital (an unfiled deposit) and clamp cash at zero.
    /// Off by default; the cash-conservation property only holds when off.
    pub infer_implicit_deposits: bool,
}

/// Derived per-asset running state. Never persisted, always a projection of
/// the transaction fold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub quantity: Decimal,
    /// Remaining cost basis of the held quantity, in base currency.
    pub cost_basis: Decimal,
}

impl Holding {
    /// Weighted-average cost per unit, zero for an empty position.
    pub fn average_cost(&self) -> Decimal {
        if is_quantity_significant(&self.quantity) {
            self.cost_basis / self.quantity
        } else {
            Decimal::ZERO
        }
    }
}

/// Portfolio-level result of folding the full ledger and valuing the open
/// positions in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub cash_balance: Decimal,
    pub assets_value: Decimal,
    /// `cash_balance + assets_value`.
    pub current_value: Decimal,
    /// Net contributed capital (deposits, gifts, rewards minus withdrawals).
    /// Trading gains never move this figure.
    pub total_invested: Decimal,
    pub total_gain: Decimal,
    /// Zero when nothing was invested, never a division by zero.
    pub total_gain_percent: Decimal,
    pub realized_gains: Decimal,
    pub total_dividends: Decimal,
    pub total_fees: Decimal,
    /// Contributed capital attributed to EUR-denominated sources.
    pub total_invested_eur: Decimal,
    /// Contributed capital attributed to USD-denominated sources.
    pub total_invested_usd: Decimal,
    pub currency: String,
}

/// One asset row of the per-asset breakdown view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBreakdownRow {
    pub symbol: String,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    /// Remaining cost basis of the held quantity.
    pub total_cost: Decimal,
    /// Market value of the held quantity in base currency.
    pub current_value: Decimal,
    pub unrealized_gain: Decimal,
    pub realized_gain: Decimal,
    pub dividends: Decimal,
    /// Share of the portfolio's valued assets, in percent.
    pub allocation_percent: Decimal,
    pub first_purchase_date: Option<DateTime<Utc>>,
}
