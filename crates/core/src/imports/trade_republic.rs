//! Trade Republic statement text parser.
//!
//! Account statements render as a date / description / amount / balance
//! grid, and PDF text extraction interleaves those columns across lines.
//! The parser re-tokenizes the text into per-transaction blocks at
//! date-shaped line starts, then classifies each block by keyword and
//! pulls out the fields the importer needs.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use super::imports_errors::ImportError;
use crate::transactions::parse_decimal_tolerant;

const MONTHS: &str = "ene|feb|mar|abr|may|jun|jul|ago|sep|oct|nov|dic|sept";

static BLOCK_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(\d{{2}})(\s+({})|\s*$)", MONTHS)).expect("Invalid regex pattern")
});
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(\d{{2}})\s*({})?\s*(20\d{{2}})?", MONTHS))
        .expect("Invalid regex pattern")
});
static MONTH_ANYWHERE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\s({})\s", MONTHS)).expect("Invalid regex pattern")
});
static YEAR_ANYWHERE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b20[2-3]\d\b").expect("Invalid regex pattern"));
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d.,]*)\s*€").expect("Invalid regex pattern"));
static ISIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{2}[A-Z0-9]{9}[0-9])\b").expect("Invalid regex pattern")
});
static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)quantity:\s*([\d.]+)").expect("Invalid regex pattern")
});
static ASSET_NAME_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)quantity:|\d[\d.,]*\s*€").expect("Invalid regex pattern")
});

/// What a statement block describes, decided by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    SavingsPlan,
    BuyTrade,
    SellTrade,
    GiftReward,
    Saveback,
    Dividend,
    Interest,
    IncomingTransfer,
    OutgoingTransfer,
    Unknown,
}

/// One tokenized statement entry.
#[derive(Debug, Clone)]
pub struct StatementBlock {
    pub date: Option<NaiveDate>,
    pub kind: BlockKind,
    /// Transaction amount, the second-to-last euro figure of the block.
    pub raw_amount: Option<Decimal>,
    /// Running account balance, the last euro figure of the block.
    pub balance: Option<Decimal>,
    pub isin: Option<String>,
    pub quantity: Option<Decimal>,
    pub asset_name: Option<String>,
    pub text: String,
}

/// Extracts the text layer of a PDF statement.
pub fn extract_statement_text(data: &[u8]) -> Result<String, ImportError> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| ImportError::Statement(e.to_string()))
}

/// Splits statement text into transaction blocks.
///
/// A new block starts at every line opening with a two-digit day, either
/// followed by a Spanish month abbreviation or standing alone (the month
/// then appears on a later line). Bank letterhead and page-number lines
/// are dropped before tokenizing.
pub fn tokenize_blocks(text: &str) -> Vec<StatementBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.contains("TRADE REPUBLIC BANK")
            || line.contains("Página")
        {
            continue;
        }
        if BLOCK_START_RE.is_match(line) {
            if let Some(block) = parse_block(&current) {
                blocks.push(block);
            }
            current = vec![line];
        } else if !current.is_empty() {
            current.push(line);
        }
    }
    if let Some(block) = parse_block(&current) {
        blocks.push(block);
    }
    blocks
}

fn parse_block(lines: &[&str]) -> Option<StatementBlock> {
    if lines.is_empty() {
        return None;
    }
    let text = lines.join(" ");
    if text.len() < 10 {
        return None;
    }

    let amounts: Vec<Decimal> = AMOUNT_RE
        .captures_iter(&text)
        .map(|caps| parse_decimal_tolerant(&caps[1]))
        .collect();
    let balance = amounts.last().copied();
    let raw_amount = (amounts.len() >= 2).then(|| amounts[amounts.len() - 2]);

    let isin = ISIN_RE.captures(&text).map(|caps| caps[1].to_string());
    let quantity = QUANTITY_RE
        .captures(&text)
        .and_then(|caps| Decimal::from_str(&caps[1]).ok());
    let asset_name = isin
        .as_ref()
        .and_then(|value| extract_asset_name(&text, value));

    Some(StatementBlock {
        date: parse_block_date(&text),
        kind: classify(&text.to_lowercase()),
        raw_amount,
        balance,
        isin,
        quantity,
        asset_name,
        text,
    })
}

fn classify(lower: &str) -> BlockKind {
    if lower.contains("savings plan execution") {
        BlockKind::SavingsPlan
    } else if lower.contains("buy trade") {
        BlockKind::BuyTrade
    } else if lower.contains("sell trade") {
        BlockKind::SellTrade
    } else if lower.contains("reembolso por tu regalo") {
        BlockKind::GiftReward
    } else if lower.contains("saveback payment") {
        BlockKind::Saveback
    } else if lower.contains("cash dividend") {
        BlockKind::Dividend
    } else if lower.contains("intereses") || lower.contains("interest payment") {
        BlockKind::Interest
    } else if lower.contains("incoming transfer") || lower.contains("ingreso aceptado") {
        BlockKind::IncomingTransfer
    } else if lower.contains("outgoing transfer") {
        BlockKind::OutgoingTransfer
    } else {
        BlockKind::Unknown
    }
}

/// Reassembles the entry date. Day, month and year may sit on one line or
/// be spread over the block, so missing pieces fall back to an anywhere
/// search within the block text.
fn parse_block_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = caps
        .get(2)
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            MONTH_ANYWHERE_RE
                .captures(text)
                .map(|found| found[1].to_string())
        })?;
    let year: i32 = caps
        .get(3)
        .map(|y| y.as_str().to_string())
        .or_else(|| {
            YEAR_ANYWHERE_RE
                .find(text)
                .map(|found| found.as_str().to_string())
        })?
        .parse()
        .ok()?;
    NaiveDate::from_ymd_opt(year, month_number(&month)?, day)
}

fn month_number(month: &str) -> Option<u32> {
    let lower = month.to_lowercase();
    let key = lower.get(0..3)?;
    match key {
        "ene" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "abr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "ago" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dic" => Some(12),
        _ => None,
    }
}

/// The instrument name sits between the ISIN and the first quantity
/// marker or euro figure.
fn extract_asset_name(text: &str, isin: &str) -> Option<String> {
    let start = text.find(isin)? + isin.len();
    let tail = &text[start..];
    let end = ASSET_NAME_END_RE
        .find(tail)
        .map(|m| m.start())
        .unwrap_or(tail.len());
    let name: String = tail[..end]
        .chars()
        .filter(|c| !matches!(c, ',' | '|'))
        .collect();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
