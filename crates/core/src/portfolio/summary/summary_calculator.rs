use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;

use super::summary_model::{
    is_quantity_significant, AssetBreakdownRow, FoldPolicy, Holding, PortfolioSummary,
};
use crate::assets::Asset;
use crate::constants::{CURRENCY_EUR, CURRENCY_USD};
use crate::fx::normalize_quote_unit;
use crate::transactions::{Transaction, TransactionType};

/// Running state of the accounting fold.
///
/// Applies transactions in ascending date order and tracks cash, per-asset
/// holdings, realized gains, income and contributed capital. The fold never
/// fails on an individual row: unknown types and missing optional fields are
/// logged and skipped, so one bad import row cannot poison the whole ledger.
#[derive(Debug, Clone)]
pub struct LedgerFold {
    base_currency: String,
    policy: FoldPolicy,
    pub cash: Decimal,
    pub holdings: HashMap<String, Holding>,
    pub realized_gains: Decimal,
    pub total_dividends: Decimal,
    pub total_fees: Decimal,
    /// Net contributed capital; trading P&L never moves this.
    pub explicit_invested: Decimal,
    pub invested_eur: Decimal,
    pub invested_usd: Decimal,
}

impl LedgerFold {
    pub fn new(base_currency: &str, policy: FoldPolicy) -> Self {
        Self {
            base_currency: base_currency.to_string(),
            policy,
            cash: Decimal::ZERO,
            holdings: HashMap::new(),
            realized_gains: Decimal::ZERO,
            total_dividends: Decimal::ZERO,
            total_fees: Decimal::ZERO,
            explicit_invested: Decimal::ZERO,
            invested_eur: Decimal::ZERO,
            invested_usd: Decimal::ZERO,
        }
    }

    /// Applies one transaction to the running state.
    pub fn apply(&mut self, transaction: &Transaction) {
        let kind = match transaction.kind() {
            Ok(kind) => kind,
            Err(message) => {
                warn!("{}. Skipping transaction {}.", message, transaction.id);
                return;
            }
        };

        match kind {
            TransactionType::Deposit | TransactionType::Gift => {
                self.handle_contribution(transaction, Decimal::ONE)
            }
            TransactionType::Withdrawal => {
                self.handle_contribution(transaction, Decimal::NEGATIVE_ONE)
            }
            TransactionType::Buy => self.handle_buy(transaction),
            TransactionType::Sell => self.handle_sell(transaction),
            TransactionType::Dividend => {
                self.cash += transaction.amount;
                self.total_dividends += transaction.amount;
            }
            TransactionType::Interest => self.cash += transaction.amount,
            TransactionType::Saveback | TransactionType::Roundup => {
                self.handle_reward(transaction)
            }
        }

        self.total_fees += transaction.fee_amount();
    }

    /// DEPOSIT/GIFT (+1) and WITHDRAWAL (-1). Moves cash and contributed
    /// capital together; positive contributions also attribute a source
    /// currency bucket.
    fn handle_contribution(&mut self, transaction: &Transaction, sign: Decimal) {
        self.cash += sign * transaction.amount;
        self.explicit_invested += sign * transaction.amount;
        if sign > Decimal::ZERO {
            self.attribute_contribution(transaction);
        }
    }

    fn handle_buy(&mut self, transaction: &Transaction) {
        let total_cost = transaction.amount + transaction.fee_amount();
        self.cash -= total_cost;
        if self.policy.infer_implicit_deposits && self.cash < Decimal::ZERO {
            // The purchase outran the recorded deposits; treat the shortfall
            // as capital contributed off the books.
            let shortfall = -self.cash;
            self.explicit_invested += shortfall;
            self.cash = Decimal::ZERO;
        }

        let symbol = match asset_symbol_of(transaction) {
            Some(symbol) => symbol,
            None => {
                warn!(
                    "BUY transaction {} has no asset symbol; cash effect only",
                    transaction.id
                );
                return;
            }
        };
        let holding = self.holdings.entry(symbol.to_string()).or_default();
        holding.quantity += transaction.qty();
        holding.cost_basis += total_cost;
    }

    fn handle_sell(&mut self, transaction: &Transaction) {
        let proceeds = transaction.amount - transaction.fee_amount();
        self.cash += proceeds;

        let symbol = match asset_symbol_of(transaction) {
            Some(symbol) => symbol,
            None => {
                warn!(
                    "SELL transaction {} has no asset symbol; cash effect only",
                    transaction.id
                );
                return;
            }
        };
        let holding = self.holdings.entry(symbol.to_string()).or_default();
        let sold_basis = holding.average_cost() * transaction.qty();
        self.realized_gains += proceeds - sold_basis;
        holding.quantity = (holding.quantity - transaction.qty()).max(Decimal::ZERO);
        holding.cost_basis = (holding.cost_basis - sold_basis).max(Decimal::ZERO);
    }

    /// SAVEBACK/ROUNDUP: an external reward credited straight into the
    /// asset. No cash movement; counts as contributed capital.
    fn handle_reward(&mut self, transaction: &Transaction) {
        self.explicit_invested += transaction.amount;
        self.attribute_contribution(transaction);

        let symbol = match asset_symbol_of(transaction) {
            Some(symbol) => symbol,
            None => {
                warn!(
                    "{} transaction {} has no asset symbol; skipping holdings effect",
                    transaction.transaction_type, transaction.id
                );
                return;
            }
        };
        let holding = self.holdings.entry(symbol.to_string()).or_default();
        holding.quantity += transaction.qty();
        holding.cost_basis += transaction.amount;
    }

    /// Books the original-currency amount of a contribution into the EUR or
    /// USD bucket. Rows without provenance fall back to `amount / rate` in
    /// the base currency bucket.
    fn attribute_contribution(&mut self, transaction: &Transaction) {
        match (
            transaction.original_currency.as_deref(),
            transaction.original_amount,
        ) {
            (Some(currency), Some(original)) if currency == CURRENCY_EUR => {
                self.invested_eur += original
            }
            (Some(currency), Some(original)) if currency == CURRENCY_USD => {
                self.invested_usd += original
            }
            _ => {
                let rate = transaction
                    .exchange_rate
                    .filter(|r| !r.is_zero())
                    .unwrap_or(Decimal::ONE);
                let original = transaction.amount / rate;
                if self.base_currency == CURRENCY_EUR {
                    self.invested_eur += original;
                } else {
                    self.invested_usd += original;
                }
            }
        }
    }
}

fn asset_symbol_of(transaction: &Transaction) -> Option<&str> {
    transaction
        .asset_symbol
        .as_deref()
        .filter(|s| !s.trim().is_empty())
}

/// Converts a quote-currency price into the portfolio base currency.
///
/// Pence quotes (GBX/GBp) rescale to pounds first. A stored snapshot rate
/// matching the base currency is preferred; otherwise the price pivots
/// through USD with the caller-supplied `usd_to_base` rate. With no FX path
/// at all the rate degrades to 1 and the degradation is logged.
pub fn convert_price_to_base(
    price: Decimal,
    asset: &Asset,
    base_currency: &str,
    usd_to_base: Decimal,
) -> Decimal {
    let (price, quote_currency) = normalize_quote_unit(price, &asset.quote_currency);
    if quote_currency == base_currency {
        return price;
    }

    let direct = match base_currency {
        CURRENCY_USD => asset.exchange_rate_to_usd,
        CURRENCY_EUR => asset.exchange_rate_to_eur,
        _ => None,
    };
    if let Some(rate) = direct.filter(|r| *r > Decimal::ZERO) {
        return price * rate;
    }
    if let Some(to_usd) = asset.exchange_rate_to_usd.filter(|r| *r > Decimal::ZERO) {
        return price * to_usd * usd_to_base;
    }

    warn!(
        "No exchange rate from {} to {} for {}; valuing at rate 1",
        quote_currency, base_currency, asset.symbol
    );
    price
}

fn value_holdings(
    holdings: &HashMap<String, Holding>,
    assets: &HashMap<String, Asset>,
    base_currency: &str,
    usd_to_base: Decimal,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for (symbol, holding) in holdings {
        if !is_quantity_significant(&holding.quantity) {
            continue;
        }
        let asset = match assets.get(symbol) {
            Some(asset) => asset,
            None => {
                warn!("No asset metadata for held symbol {}; valuing at 0", symbol);
                continue;
            }
        };
        let price = match asset.current_price {
            Some(price) => price,
            None => {
                warn!("No current price for {}; valuing at 0", symbol);
                continue;
            }
        };
        total += holding.quantity * convert_price_to_base(price, asset, base_currency, usd_to_base);
    }
    total
}

/// Folds the full ledger and values the open positions at current prices.
///
/// Pure over its inputs. `usd_to_base` is the prefetched USD to base
/// currency rate used for pivoting (1 when the base is USD itself).
pub fn compute_summary(
    transactions: &[Transaction],
    base_currency: &str,
    assets: &HashMap<String, Asset>,
    usd_to_base: Decimal,
    policy: FoldPolicy,
) -> PortfolioSummary {
    let mut fold = LedgerFold::new(base_currency, policy);
    for transaction in transactions {
        fold.apply(transaction);
    }

    let assets_value = value_holdings(&fold.holdings, assets, base_currency, usd_to_base);
    let current_value = fold.cash + assets_value;
    let total_invested = fold.explicit_invested;
    let total_gain = current_value - total_invested;
    let total_gain_percent = if total_invested.is_zero() {
        Decimal::ZERO
    } else {
        total_gain / total_invested * Decimal::ONE_HUNDRED
    };

    // Legacy rows without provenance leave a gap between contributed capital
    // and the source buckets; reconcile it into the base currency bucket.
    let mut invested_eur = fold.invested_eur;
    let mut invested_usd = fold.invested_usd;
    let gap = total_invested - (invested_eur + invested_usd);
    if gap > Decimal::ZERO {
        if base_currency == CURRENCY_EUR {
            invested_eur += gap;
        } else {
            invested_usd += gap;
        }
    }

    PortfolioSummary {
        cash_balance: fold.cash,
        assets_value,
        current_value,
        total_invested,
        total_gain,
        total_gain_percent,
        realized_gains: fold.realized_gains,
        total_dividends: fold.total_dividends,
        total_fees: fold.total_fees,
        total_invested_eur: invested_eur,
        total_invested_usd: invested_usd,
        currency: base_currency.to_string(),
    }
}

/// Folds the ledger and returns the per-asset holdings projection.
pub fn compute_holdings(transactions: &[Transaction]) -> HashMap<String, Holding> {
    let mut fold = LedgerFold::new(CURRENCY_EUR, FoldPolicy::default());
    for transaction in transactions {
        fold.apply(transaction);
    }
    fold.holdings
}

#[derive(Debug, Default)]
struct BreakdownState {
    holding: Holding,
    realized_gain: Decimal,
    dividends: Decimal,
    first_purchase_date: Option<DateTime<Utc>>,
}

/// Per-asset view of the same fold: remaining cost basis, realized gain,
/// dividends and first purchase date per symbol, valued at current prices.
///
/// Fully exited positions with no realized gain and no dividends are
/// omitted unless `include_closed` is set.
pub fn compute_breakdown(
    transactions: &[Transaction],
    base_currency: &str,
    assets: &HashMap<String, Asset>,
    usd_to_base: Decimal,
    include_closed: bool,
) -> Vec<AssetBreakdownRow> {
    let mut states: HashMap<String, BreakdownState> = HashMap::new();

    for transaction in transactions {
        let kind = match transaction.kind() {
            Ok(kind) => kind,
            Err(message) => {
                warn!("{}. Skipping transaction {}.", message, transaction.id);
                continue;
            }
        };
        let symbol = match asset_symbol_of(transaction) {
            Some(symbol) => symbol,
            None => continue,
        };
        let state = states.entry(symbol.to_string()).or_default();

        match kind {
            TransactionType::Buy => {
                state.holding.quantity += transaction.qty();
                state.holding.cost_basis += transaction.amount + transaction.fee_amount();
                track_first_purchase(state, transaction.date);
            }
            TransactionType::Saveback | TransactionType::Roundup => {
                state.holding.quantity += transaction.qty();
                state.holding.cost_basis += transaction.amount;
                track_first_purchase(state, transaction.date);
            }
            TransactionType::Sell => {
                let proceeds = transaction.amount - transaction.fee_amount();
                let sold_basis = state.holding.average_cost() * transaction.qty();
                state.realized_gain += proceeds - sold_basis;
                state.holding.quantity =
                    (state.holding.quantity - transaction.qty()).max(Decimal::ZERO);
                state.holding.cost_basis =
                    (state.holding.cost_basis - sold_basis).max(Decimal::ZERO);
            }
            TransactionType::Dividend => state.dividends += transaction.amount,
            _ => {}
        }
    }

    let mut rows: Vec<AssetBreakdownRow> = Vec::new();
    for (symbol, state) in states {
        let open = is_quantity_significant(&state.holding.quantity);
        if !include_closed
            && !open
            && state.realized_gain.is_zero()
            && state.dividends.is_zero()
        {
            continue;
        }

        let asset = assets.get(&symbol);
        let current_value = match (open, asset) {
            (true, Some(asset)) => match asset.current_price {
                Some(price) => {
                    state.holding.quantity
                        * convert_price_to_base(price, asset, base_currency, usd_to_base)
                }
                None => {
                    warn!("No current price for {}; valuing at 0", symbol);
                    Decimal::ZERO
                }
            },
            (true, None) => {
                warn!("No asset metadata for held symbol {}; valuing at 0", symbol);
                Decimal::ZERO
            }
            (false, _) => Decimal::ZERO,
        };

        rows.push(AssetBreakdownRow {
            name: asset.and_then(|a| a.name.clone()),
            quantity: state.holding.quantity,
            average_cost: state.holding.average_cost(),
            total_cost: state.holding.cost_basis,
            current_value,
            unrealized_gain: current_value - state.holding.cost_basis,
            realized_gain: state.realized_gain,
            dividends: state.dividends,
            allocation_percent: Decimal::ZERO,
            first_purchase_date: state.first_purchase_date,
            symbol,
        });
    }

    let total_value: Decimal = rows.iter().map(|row| row.current_value).sum();
    if total_value > Decimal::ZERO {
        for row in &mut rows {
            row.allocation_percent = row.current_value / total_value * Decimal::ONE_HUNDRED;
        }
    }

    rows.sort_by(|a, b| {
        b.current_value
            .cmp(&a.current_value)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    rows
}

fn track_first_purchase(state: &mut BreakdownState, date: DateTime<Utc>) {
    state.first_purchase_date = Some(match state.first_purchase_date {
        Some(existing) => existing.min(date),
        None => date,
    });
}
