//! eToro account statement normalizer.
//!
//! Reconciles the sheets of an eToro XLSX export (Spanish locale) into
//! canonical ledger rows. The activity sheet drives classification; the
//! dividends sheet contributes withholding detail keyed by position id and
//! the closed-positions sheet contributes sale proceeds.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::imports_errors::ImportError;
use super::workbook::{Sheet, Workbook};
use crate::constants::CURRENCY_USD;
use crate::transactions::{parse_decimal_tolerant, NewTransaction, TransactionType};

pub const SHEET_ACTIVITY: &str = "Actividad de la cuenta";
pub const SHEET_DIVIDENDS: &str = "Dividendos";
pub const SHEET_CLOSED_POSITIONS: &str = "Posiciones cerradas";

const COL_TYPE: &str = "Tipo";
const COL_DATE: &str = "Fecha";
const COL_DETAILS: &str = "Detalles";
const COL_AMOUNT: &str = "Importe";
const COL_POSITION_ID: &str = "ID de posición";
const COL_UNITS: &str = "Unidades";
const COL_CLOSE_DATE: &str = "Fecha de cierre";
const COL_ACTION: &str = "Acción";
const COL_PROFIT: &str = "Ganancias (USD)";
const COL_WITHHOLDING: &str = "Importe de la retención tributaria (USD)";
const COL_TAX_RATE: &str = "Tasa de retención fiscal (%)";
const COL_ISIN: &str = "ISIN";

const ACTIVITY_OPEN_POSITION: &str = "Posición abierta";
const ACTIVITY_DIVIDEND: &str = "Dividendo";
const ACTIVITY_DEPOSIT: &str = "Depósito";
const ACTIVITY_ADJUSTMENT: &str = "Ajuste";

/// Tickers the statement abbreviates; the quote provider wants the
/// exchange-qualified form.
const SYMBOL_REMAPS: &[(&str, &str)] = &[
    ("ITX", "ITX.MC"),
    ("MAP", "MAP.MC"),
    ("AMS", "AMS.MC"),
    ("IBE", "IBE.MC"),
    ("MTS", "MTS.MC"),
    ("SAN", "SAN.MC"),
    ("REP", "REP.MC"),
    ("CLNX", "CLNX.MC"),
    ("ML", "ML.PA"),
];

/// eToro quotes this token in millionths of a unit.
const MILLIONIZED_SYMBOL: &str = "SHIBXM";
const MILLIONIZED_TARGET: &str = "SHIB-USD";

static PAREN_SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("Invalid regex pattern"));
static DEPOSIT_ORIGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d\.,]+)\s+([A-Z]{3})").expect("Invalid regex pattern"));

/// Parsed statement content, ready for persistence.
pub struct EtoroParse {
    pub transactions: Vec<NewTransaction>,
    pub assets: Vec<AssetSeed>,
    pub skipped: u32,
}

/// Asset registration data collected while walking the statement.
pub struct AssetSeed {
    pub symbol: String,
    pub name: Option<String>,
    pub quote_currency: Option<String>,
    pub isin: Option<String>,
}

struct DividendDetail {
    withholding_tax: Option<Decimal>,
    tax_rate: Option<Decimal>,
    isin: Option<String>,
}

/// Normalizes a parsed eToro workbook into ledger rows for one portfolio.
///
/// The activity sheet is required; the dividends and closed-positions
/// sheets are consumed when present. Rows whose date cannot be parsed are
/// counted as skipped, as are rows of an unrecognized activity type.
pub fn parse_workbook(workbook: &Workbook, portfolio_id: &str) -> Result<EtoroParse, ImportError> {
    let activity = workbook
        .sheet(SHEET_ACTIVITY)
        .ok_or_else(|| ImportError::MissingSheet(SHEET_ACTIVITY.to_string()))?;
    let dividends = dividend_details(workbook.sheet(SHEET_DIVIDENDS));

    let mut parse = EtoroParse {
        transactions: Vec::new(),
        assets: Vec::new(),
        skipped: 0,
    };

    for row in activity.rows() {
        activity_row(row, portfolio_id, &dividends, &mut parse);
    }
    if let Some(closed) = workbook.sheet(SHEET_CLOSED_POSITIONS) {
        for row in closed.rows() {
            closed_position_row(row, portfolio_id, &mut parse);
        }
    }

    parse.transactions.sort_by_key(|t| t.date);
    Ok(parse)
}

fn activity_row(
    row: &HashMap<String, String>,
    portfolio_id: &str,
    dividends: &HashMap<String, DividendDetail>,
    parse: &mut EtoroParse,
) {
    let date = match row.get(COL_DATE).and_then(|raw| parse_statement_date(raw)) {
        Some(date) => date,
        None => {
            parse.skipped += 1;
            return;
        }
    };
    let details = row.get(COL_DETAILS).map(String::as_str).unwrap_or_default();
    let amount = cell_decimal(row, COL_AMOUNT);

    match row.get(COL_TYPE).map(String::as_str).unwrap_or_default() {
        ACTIVITY_OPEN_POSITION => {
            let (symbol, asset_currency) = parse_asset_details(details);
            if symbol.is_empty() {
                parse.skipped += 1;
                return;
            }
            let units = cell_decimal(row, COL_UNITS);
            let price = if units > Decimal::ZERO {
                amount / units
            } else {
                Decimal::ZERO
            };
            let (symbol, units, price) = rescale_millionized(symbol, units, price);
            parse.seed_asset(&symbol, Some(details), asset_currency.as_deref(), None);
            parse.transactions.push(NewTransaction {
                portfolio_id: portfolio_id.to_string(),
                transaction_type: TransactionType::Buy.as_str().to_string(),
                date,
                amount,
                currency: CURRENCY_USD.to_string(),
                asset_symbol: Some(symbol),
                quantity: Some(units),
                price_per_unit: Some(price),
                asset_currency,
                ..Default::default()
            });
        }
        ACTIVITY_DIVIDEND => {
            let (symbol, asset_currency) = parse_asset_details(details);
            if symbol.is_empty() {
                parse.skipped += 1;
                return;
            }
            let detail = row.get(COL_POSITION_ID).and_then(|id| dividends.get(id));
            let isin = detail.and_then(|d| d.isin.clone());
            let (symbol, _, _) = rescale_millionized(symbol, Decimal::ZERO, Decimal::ZERO);
            parse.seed_asset(&symbol, Some(details), asset_currency.as_deref(), isin.as_deref());
            parse.transactions.push(NewTransaction {
                portfolio_id: portfolio_id.to_string(),
                transaction_type: TransactionType::Dividend.as_str().to_string(),
                date,
                amount,
                currency: CURRENCY_USD.to_string(),
                asset_symbol: Some(symbol),
                asset_currency,
                isin,
                withholding_tax: detail.and_then(|d| d.withholding_tax),
                tax_rate: detail.and_then(|d| d.tax_rate),
                ..Default::default()
            });
        }
        ACTIVITY_DEPOSIT => {
            let origin = DEPOSIT_ORIGIN_RE.captures(details).and_then(|caps| {
                let original = parse_decimal_tolerant(&caps[1]);
                (original > Decimal::ZERO)
                    .then(|| (original, caps[2].to_string(), amount / original))
            });
            let (original_amount, original_currency, exchange_rate) = match origin {
                Some((original, currency, rate)) => (Some(original), Some(currency), Some(rate)),
                None => (None, None, None),
            };
            parse.transactions.push(NewTransaction {
                portfolio_id: portfolio_id.to_string(),
                transaction_type: TransactionType::Deposit.as_str().to_string(),
                date,
                amount,
                currency: CURRENCY_USD.to_string(),
                original_amount,
                original_currency,
                exchange_rate,
                ..Default::default()
            });
        }
        ACTIVITY_ADJUSTMENT => {
            parse.transactions.push(NewTransaction {
                portfolio_id: portfolio_id.to_string(),
                transaction_type: TransactionType::Gift.as_str().to_string(),
                date,
                amount,
                currency: CURRENCY_USD.to_string(),
                ..Default::default()
            });
        }
        _ => parse.skipped += 1,
    }
}

/// A closed position row becomes a sale at invested capital plus profit.
fn closed_position_row(
    row: &HashMap<String, String>,
    portfolio_id: &str,
    parse: &mut EtoroParse,
) {
    let date = match row
        .get(COL_CLOSE_DATE)
        .and_then(|raw| parse_statement_date(raw))
    {
        Some(date) => date,
        None => {
            parse.skipped += 1;
            return;
        }
    };
    let details = row.get(COL_ACTION).map(String::as_str).unwrap_or_default();
    let (symbol, asset_currency) = parse_asset_details(details);
    if symbol.is_empty() {
        parse.skipped += 1;
        return;
    }

    let invested = cell_decimal(row, COL_AMOUNT);
    let profit = cell_decimal(row, COL_PROFIT);
    let units = cell_decimal(row, COL_UNITS);
    let proceeds = invested + profit;
    let price = if units > Decimal::ZERO {
        proceeds / units
    } else {
        Decimal::ZERO
    };
    let (symbol, units, price) = rescale_millionized(symbol, units, price);

    parse.seed_asset(&symbol, Some(details), asset_currency.as_deref(), None);
    parse.transactions.push(NewTransaction {
        portfolio_id: portfolio_id.to_string(),
        transaction_type: TransactionType::Sell.as_str().to_string(),
        date,
        amount: proceeds,
        currency: CURRENCY_USD.to_string(),
        asset_symbol: Some(symbol),
        quantity: Some(units),
        price_per_unit: Some(price),
        asset_currency,
        ..Default::default()
    });
}

impl EtoroParse {
    /// Records asset registration data, merging detail from later rows
    /// into the first-seen seed.
    fn seed_asset(
        &mut self,
        symbol: &str,
        name: Option<&str>,
        quote_currency: Option<&str>,
        isin: Option<&str>,
    ) {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        if let Some(seed) = self.assets.iter_mut().find(|seed| seed.symbol == symbol) {
            if seed.quote_currency.is_none() {
                seed.quote_currency = quote_currency.map(str::to_string);
            }
            if seed.isin.is_none() {
                seed.isin = isin.map(str::to_string);
            }
            return;
        }
        self.assets.push(AssetSeed {
            symbol: symbol.to_string(),
            name: name.map(str::to_string),
            quote_currency: quote_currency.map(str::to_string),
            isin: isin.map(str::to_string),
        });
    }
}

fn cell_decimal(row: &HashMap<String, String>, column: &str) -> Decimal {
    row.get(column)
        .map(|raw| parse_decimal_tolerant(raw))
        .unwrap_or(Decimal::ZERO)
}

/// Statement dates are `DD/MM/YYYY HH:MM:SS`; the time part is optional.
fn parse_statement_date(raw: &str) -> Option<DateTime<Utc>> {
    let mut parts = raw.trim().splitn(2, ' ');
    let date = NaiveDate::parse_from_str(parts.next()?.trim(), "%d/%m/%Y").ok()?;
    let time = parts
        .next()
        .and_then(|t| NaiveTime::parse_from_str(t.trim(), "%H:%M:%S").ok())
        .unwrap_or(NaiveTime::MIN);
    Some(NaiveDateTime::new(date, time).and_utc())
}

/// Extracts the ticker and, where stated, the quote currency from a
/// `Detalles` cell. The cell comes in three shapes: `Name (TICKER)`,
/// `TICKER/CURRENCY` and a bare ticker. Pence-quoted (`GBX`) tickers gain
/// the `.L` suffix the quote provider expects.
pub fn parse_asset_details(details: &str) -> (String, Option<String>) {
    let details = details.trim();
    let (symbol, currency) = if let Some(caps) = PAREN_SYMBOL_RE.captures(details) {
        (caps[1].trim().to_uppercase(), None)
    } else if details.contains('/') {
        let mut parts = details.splitn(2, '/');
        let mut symbol = parts.next().unwrap_or_default().trim().to_uppercase();
        let currency = parts.next().unwrap_or_default().trim().to_uppercase();
        if currency == "GBX" && !symbol.ends_with(".L") {
            symbol.push_str(".L");
        }
        (symbol, (!currency.is_empty()).then_some(currency))
    } else {
        (details.to_uppercase(), None)
    };

    let symbol = SYMBOL_REMAPS
        .iter()
        .find(|(from, _)| *from == symbol)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(symbol);
    (symbol, currency)
}

/// Rewrites million-unit crypto tokens to their per-unit form.
fn rescale_millionized(
    symbol: String,
    units: Decimal,
    price: Decimal,
) -> (String, Decimal, Decimal) {
    if symbol == MILLIONIZED_SYMBOL {
        (
            MILLIONIZED_TARGET.to_string(),
            units * dec!(1_000_000),
            price / dec!(1_000_000),
        )
    } else {
        (symbol, units, price)
    }
}

fn dividend_details(sheet: Option<&Sheet>) -> HashMap<String, DividendDetail> {
    let mut details = HashMap::new();
    let Some(sheet) = sheet else {
        return details;
    };
    for row in sheet.rows() {
        let Some(position_id) = row.get(COL_POSITION_ID) else {
            continue;
        };
        details.insert(
            position_id.clone(),
            DividendDetail {
                withholding_tax: row.get(COL_WITHHOLDING).map(|v| parse_decimal_tolerant(v)),
                tax_rate: row
                    .get(COL_TAX_RATE)
                    .map(|v| parse_decimal_tolerant(v.trim_end_matches('%'))),
                isin: row
                    .get(COL_ISIN)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
            },
        );
    }
    details
}
