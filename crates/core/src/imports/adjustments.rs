//! Portfolio-summary adjustments file parser.
//!
//! The adjustments JSON carries externally maintained per-asset rows with
//! a current price and a net value in USD. Entries update stored asset
//! prices; the net value lets the importer back-solve the USD rate the
//! summary applied. The file's `positions` arrays are not consumed.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::imports_errors::ImportError;
use crate::transactions::parse_decimal_tolerant;

static DASH_SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z0-9.]+)\s-").expect("Invalid regex pattern"));
static PAREN_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Z0-9.]+)\)$").expect("Invalid regex pattern"));

#[derive(Debug, Deserialize)]
pub struct AdjustmentsFile {
    pub portfolio_summary: Vec<AdjustmentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentEntry {
    #[serde(default)]
    pub asset_name: String,
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub net_value: Decimal,
    #[serde(default)]
    pub total_investment_units: UnitsField,
}

/// Units column, which the summary writes either as a number or as a
/// `"<0.01"`-style dust marker string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum UnitsField {
    Number(Decimal),
    Text(String),
    #[default]
    Missing,
}

impl UnitsField {
    pub fn numeric(&self) -> Decimal {
        match self {
            UnitsField::Number(value) => *value,
            UnitsField::Text(text) if !text.contains('<') => parse_decimal_tolerant(text),
            _ => Decimal::ZERO,
        }
    }
}

pub fn parse_adjustments(json: &str) -> Result<AdjustmentsFile, ImportError> {
    serde_json::from_str(json).map_err(|e| ImportError::Adjustments(e.to_string()))
}

/// Extracts the ticker from a summary row label. Labels come as
/// `SYM - Name`, `Name (SYM)` or a bare ticker; anything else is
/// unresolvable.
pub fn parse_summary_symbol(asset_name: &str) -> Option<String> {
    let name = asset_name.trim();
    if let Some(caps) = DASH_SYMBOL_RE.captures(name) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = PAREN_TAIL_RE.captures(name) {
        return Some(caps[1].to_string());
    }
    (!name.is_empty() && !name.contains(' ') && name.len() < 10).then(|| name.to_string())
}

/// Back-solves the USD rate the summary applied: net value over position
/// value in the quote currency. Dust positions and non-positive results
/// yield nothing.
pub fn implied_usd_rate(entry: &AdjustmentEntry) -> Option<Decimal> {
    let units = entry.total_investment_units.numeric();
    if units <= Decimal::ZERO || entry.current_price <= Decimal::ZERO {
        return None;
    }
    let value = units.checked_mul(entry.current_price)?;
    let rate = entry.net_value.checked_div(value)?;
    (rate > Decimal::ZERO).then_some(rate)
}
