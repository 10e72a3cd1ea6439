use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Investor risk profile selecting a benchmark allocation. The profile is an
/// input here; questionnaire scoring happens outside the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Balanced,
    Dynamic,
    Aggressive,
}

impl RiskProfile {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "CONSERVATIVE",
            RiskProfile::Moderate => "MODERATE",
            RiskProfile::Balanced => "BALANCED",
            RiskProfile::Dynamic => "DYNAMIC",
            RiskProfile::Aggressive => "AGGRESSIVE",
        }
    }
}

/// Inclusive allocation band in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl AllocationRange {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Midpoint of the band, used as the rebalancing target.
    pub fn target(&self) -> Decimal {
        (self.min + self.max) / Decimal::TWO
    }
}

/// Benchmark bands for one risk profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBenchmark {
    pub profile: RiskProfile,
    pub fixed_income: AllocationRange,
    pub equity: AllocationRange,
}

/// Static benchmark table mapping each profile to its allocation bands.
pub fn benchmark_for(profile: RiskProfile) -> AllocationBenchmark {
    let (fixed_income, equity) = match profile {
        RiskProfile::Conservative => (
            AllocationRange::new(dec!(80), dec!(100)),
            AllocationRange::new(dec!(0), dec!(20)),
        ),
        RiskProfile::Moderate => (
            AllocationRange::new(dec!(65), dec!(80)),
            AllocationRange::new(dec!(20), dec!(35)),
        ),
        RiskProfile::Balanced => (
            AllocationRange::new(dec!(40), dec!(60)),
            AllocationRange::new(dec!(40), dec!(60)),
        ),
        RiskProfile::Dynamic => (
            AllocationRange::new(dec!(20), dec!(35)),
            AllocationRange::new(dec!(65), dec!(80)),
        ),
        RiskProfile::Aggressive => (
            AllocationRange::new(dec!(0), dec!(20)),
            AllocationRange::new(dec!(80), dec!(100)),
        ),
    };
    AllocationBenchmark {
        profile,
        fixed_income,
        equity,
    }
}

/// Hard-coded placeholder risk figures carried on every report. These are
/// not statistically derived from the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub volatility: Decimal,
    pub max_drawdown: Decimal,
    pub sharpe_ratio: Decimal,
}

impl RiskMetrics {
    pub fn placeholder() -> Self {
        Self {
            volatility: dec!(12.5),
            max_drawdown: dec!(-15.4),
            sharpe_ratio: dec!(1.2),
        }
    }
}

/// Current allocation aggregates of a portfolio, bucketed by asset class.
///
/// `fixed_income_percent` merges the cash bucket into fixed income, matching
/// how the benchmark table treats uninvested money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub total_value: Decimal,
    pub equity_value: Decimal,
    pub fixed_income_value: Decimal,
    pub cash_value: Decimal,
    pub equity_percent: Decimal,
    pub fixed_income_percent: Decimal,
    pub metrics: RiskMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionAction {
    Buy,
    Sell,
}

/// One rebalancing move: push an asset class back toward its target band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingSuggestion {
    pub action: SuggestionAction,
    /// `EQUITY` or `FIXED_INCOME`.
    pub asset_class: String,
    pub current_percent: Decimal,
    pub target_percent: Decimal,
    /// Signed deviation from target in percentage points.
    pub delta_percent: Decimal,
    pub reason: String,
}

/// Advisor output: current stats plus the suggested moves (empty when the
/// allocation sits within the threshold of its targets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingReport {
    pub profile: RiskProfile,
    pub stats: PortfolioStats,
    pub suggestions: Vec<RebalancingSuggestion>,
}
