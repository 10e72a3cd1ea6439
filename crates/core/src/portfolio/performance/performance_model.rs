use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gain and return for one reporting period (a calendar year or month).
///
/// `gain` is market performance only: the change in value net of the change
/// in contributed capital, so deposits never show up as returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPerformance {
    /// `YYYY` for years, `YYYY-MM` for months.
    pub period: String,
    pub gain: Decimal,
    /// Gain over the average invested capital of the period, in percent.
    /// Zero when nothing was invested.
    pub roi: Decimal,
    /// Contributed capital at period end.
    pub invested: Decimal,
    /// Portfolio value at period end.
    pub value: Decimal,
}

/// Yearly and monthly aggregation of the history series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub yearly: Vec<PeriodPerformance>,
    pub monthly: Vec<PeriodPerformance>,
}
