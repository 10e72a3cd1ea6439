use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use log::warn;
use rust_decimal::Decimal;

use super::history_model::HistoryPoint;
use crate::assets::Asset;
use crate::portfolio::summary::{
    convert_price_to_base, is_quantity_significant, FoldPolicy, Holding, LedgerFold,
};
use crate::transactions::Transaction;

/// Daily close prices per symbol, keyed by calendar date.
pub type PriceSeries = HashMap<String, BTreeMap<NaiveDate, Decimal>>;

/// Replays the ledger one calendar day at a time from the first transaction
/// to `today` inclusive, valuing the open positions at each day's close.
///
/// Prices are carried forward across quoteless days (weekends, holidays) and
/// never interpolated; a symbol with no price yet contributes zero. The
/// final point values holdings at the live `current_price` when available.
/// Conversion to the base currency uses each asset's current FX snapshot for
/// every day of the series, a known approximation for long histories.
pub fn build_history(
    transactions: &[Transaction],
    price_series: &PriceSeries,
    assets: &HashMap<String, Asset>,
    base_currency: &str,
    usd_to_base: Decimal,
    today: NaiveDate,
    policy: FoldPolicy,
) -> Vec<HistoryPoint> {
    let start = match transactions.iter().map(|t| t.date.date_naive()).min() {
        Some(start) => start,
        None => return Vec::new(),
    };

    // Price-to-base factors are linear, so resolve one multiplier per symbol
    // up front; FX degradations then log once instead of once per day.
    let factors = conversion_factors(transactions, assets, base_currency, usd_to_base);

    let mut fold = LedgerFold::new(base_currency, policy);
    let mut points = Vec::new();
    let mut index = 0;
    let mut day = start;
    while day <= today {
        while index < transactions.len() && transactions[index].date.date_naive() <= day {
            fold.apply(&transactions[index]);
            index += 1;
        }

        let value = fold.cash + holdings_value_on(&fold.holdings, price_series, &factors, day);
        points.push(HistoryPoint {
            date: day,
            invested: fold.explicit_invested,
            value,
        });
        day += Duration::days(1);
    }

    // Re-value the final point with live prices where we have them.
    if let Some(last) = points.last_mut() {
        last.value = fold.cash
            + live_holdings_value(&fold.holdings, assets, price_series, &factors, today);
    }

    points
}

fn conversion_factors(
    transactions: &[Transaction],
    assets: &HashMap<String, Asset>,
    base_currency: &str,
    usd_to_base: Decimal,
) -> HashMap<String, Decimal> {
    let mut factors = HashMap::new();
    for transaction in transactions {
        let symbol = match transaction.asset_symbol.as_deref() {
            Some(symbol) if !symbol.trim().is_empty() => symbol,
            _ => continue,
        };
        if factors.contains_key(symbol) {
            continue;
        }
        let factor = match assets.get(symbol) {
            Some(asset) => convert_price_to_base(Decimal::ONE, asset, base_currency, usd_to_base),
            None => {
                warn!("No asset metadata for {}; valuing history at rate 1", symbol);
                Decimal::ONE
            }
        };
        factors.insert(symbol.to_string(), factor);
    }
    factors
}

fn holdings_value_on(
    holdings: &HashMap<String, Holding>,
    price_series: &PriceSeries,
    factors: &HashMap<String, Decimal>,
    day: NaiveDate,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for (symbol, holding) in holdings {
        if !is_quantity_significant(&holding.quantity) {
            continue;
        }
        // Latest close at or before this day; none yet means the asset
        // contributes nothing.
        let price = price_series
            .get(symbol)
            .and_then(|series| series.range(..=day).next_back())
            .map(|(_, price)| *price);
        if let Some(price) = price {
            let factor = factors.get(symbol).copied().unwrap_or(Decimal::ONE);
            total += holding.quantity * price * factor;
        }
    }
    total
}

fn live_holdings_value(
    holdings: &HashMap<String, Holding>,
    assets: &HashMap<String, Asset>,
    price_series: &PriceSeries,
    factors: &HashMap<String, Decimal>,
    today: NaiveDate,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for (symbol, holding) in holdings {
        if !is_quantity_significant(&holding.quantity) {
            continue;
        }
        let live = assets.get(symbol).and_then(|asset| asset.current_price);
        let price = match live {
            Some(price) => Some(price),
            None => price_series
                .get(symbol)
                .and_then(|series| series.range(..=today).next_back())
                .map(|(_, price)| *price),
        };
        if let Some(price) = price {
            let factor = factors.get(symbol).copied().unwrap_or(Decimal::ONE);
            total += holding.quantity * price * factor;
        }
    }
    total
}
