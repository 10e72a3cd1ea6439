use rust_decimal::Decimal;
use std::time::Instant;

use crate::constants::{CURRENCY_GBP, PENCE_QUOTE_CURRENCIES};

/// Synthetic provider symbol for an FX pair, e.g. `EURUSD=X`.
pub fn pair_symbol(from: &str, to: &str) -> String {
    format!("{}{}=X", from, to)
}

/// Cache key for a pair lookup, e.g. `EURUSD`.
pub fn pair_key(from: &str, to: &str) -> String {
    format!("{}{}", from, to)
}

/// A cached spot rate with its fetch time for TTL checks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CachedRate {
    pub rate: Decimal,
    pub fetched_at: Instant,
}

/// Rescales a pence-quoted (GBX/GBp) price to pounds and reports the
/// currency the result is expressed in. Prices in any other currency pass
/// through untouched.
pub fn normalize_quote_unit(price: Decimal, quote_currency: &str) -> (Decimal, String) {
    if PENCE_QUOTE_CURRENCIES.contains(&quote_currency) {
        (price / Decimal::ONE_HUNDRED, CURRENCY_GBP.to_string())
    } else {
        (price, quote_currency.to_string())
    }
}
