use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One day of the portfolio history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: NaiveDate,
    /// Cumulative net contribution up to and including this day.
    pub invested: Decimal,
    /// Cash plus holdings valued at this day's close, in base currency.
    pub value: Decimal,
}
