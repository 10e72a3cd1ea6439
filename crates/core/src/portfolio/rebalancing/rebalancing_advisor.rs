use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::rebalancing_model::{
    benchmark_for, PortfolioStats, RebalancingReport, RebalancingSuggestion, RiskMetrics,
    RiskProfile, SuggestionAction,
};
use crate::assets::{Asset, AssetClass};
use crate::portfolio::summary::AssetBreakdownRow;

/// Percentage-point deviation from target beyond which a suggestion fires.
pub const REBALANCE_THRESHOLD_PERCENT: Decimal = dec!(5);

/// Buckets the valued breakdown rows into equity / fixed income / cash by
/// asset class. Unknown symbols default to the equity bucket.
pub fn compute_stats(
    breakdown: &[AssetBreakdownRow],
    assets: &HashMap<String, Asset>,
) -> PortfolioStats {
    let mut equity_value = Decimal::ZERO;
    let mut fixed_income_value = Decimal::ZERO;
    let mut cash_value = Decimal::ZERO;

    for row in breakdown {
        let class = assets
            .get(&row.symbol)
            .map(|asset| asset.asset_class)
            .unwrap_or_default();
        match class {
            AssetClass::FixedIncome | AssetClass::Bond => fixed_income_value += row.current_value,
            AssetClass::Cash => cash_value += row.current_value,
            _ => equity_value += row.current_value,
        }
    }

    let total_value = equity_value + fixed_income_value + cash_value;
    let (equity_percent, fixed_income_percent) = if total_value > Decimal::ZERO {
        (
            equity_value / total_value * Decimal::ONE_HUNDRED,
            (fixed_income_value + cash_value) / total_value * Decimal::ONE_HUNDRED,
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    PortfolioStats {
        total_value,
        equity_value,
        fixed_income_value,
        cash_value,
        equity_percent,
        fixed_income_percent,
        metrics: RiskMetrics::placeholder(),
    }
}

/// Compares the current allocation against the profile's benchmark targets
/// and emits a BUY/SELL suggestion per asset class that drifted beyond the
/// threshold.
pub fn recommend(stats: PortfolioStats, profile: RiskProfile) -> RebalancingReport {
    let benchmark = benchmark_for(profile);
    let mut suggestions = Vec::new();

    let classes = [
        ("EQUITY", stats.equity_percent, benchmark.equity),
        ("FIXED_INCOME", stats.fixed_income_percent, benchmark.fixed_income),
    ];
    for (asset_class, current, range) in classes {
        let target = range.target();
        let delta = current - target;
        if delta.abs() <= REBALANCE_THRESHOLD_PERCENT {
            continue;
        }
        let action = if delta > Decimal::ZERO {
            SuggestionAction::Sell
        } else {
            SuggestionAction::Buy
        };
        let verb = match action {
            SuggestionAction::Sell => "Reduce",
            SuggestionAction::Buy => "Increase",
        };
        suggestions.push(RebalancingSuggestion {
            action,
            asset_class: asset_class.to_string(),
            current_percent: current,
            target_percent: target,
            delta_percent: delta,
            reason: format!(
                "{} {} exposure: {:.1}% held vs {:.1}% target for the {} profile",
                verb,
                asset_class,
                current,
                target,
                profile.as_str()
            ),
        });
    }

    RebalancingReport {
        profile,
        stats,
        suggestions,
    }
}
