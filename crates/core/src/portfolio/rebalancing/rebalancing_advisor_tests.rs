#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::assets::{Asset, AssetClass};
    use crate::portfolio::rebalancing::{
        benchmark_for, compute_stats, recommend, RiskProfile, SuggestionAction,
    };
    use crate::portfolio::summary::AssetBreakdownRow;

    fn row(symbol: &str, current_value: Decimal) -> AssetBreakdownRow {
        AssetBreakdownRow {
            symbol: symbol.to_string(),
            name: None,
            quantity: dec!(1),
            average_cost: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            current_value,
            unrealized_gain: Decimal::ZERO,
            realized_gain: Decimal::ZERO,
            dividends: Decimal::ZERO,
            allocation_percent: Decimal::ZERO,
            first_purchase_date: None,
        }
    }

    fn asset(symbol: &str, class: AssetClass) -> (String, Asset) {
        (
            symbol.to_string(),
            Asset {
                symbol: symbol.to_string(),
                name: None,
                quote_currency: "EUR".to_string(),
                asset_class: class,
                isin: None,
                current_price: None,
                exchange_rate_to_usd: None,
                exchange_rate_to_eur: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        )
    }

    #[test]
    fn test_benchmark_targets_are_band_midpoints() {
        let balanced = benchmark_for(RiskProfile::Balanced);
        assert_eq!(balanced.equity.target(), dec!(50));
        assert_eq!(balanced.fixed_income.target(), dec!(50));

        let conservative = benchmark_for(RiskProfile::Conservative);
        assert_eq!(conservative.fixed_income.target(), dec!(90));
        assert_eq!(conservative.equity.target(), dec!(10));

        let aggressive = benchmark_for(RiskProfile::Aggressive);
        assert_eq!(aggressive.equity.target(), dec!(90));
    }

    #[test]
    fn test_stats_bucket_by_asset_class() {
        let breakdown = vec![
            row("AAPL", dec!(600)),
            row("AGGH.MI", dec!(300)),
            row("XEON.DE", dec!(100)),
        ];
        let assets: HashMap<String, Asset> = [
            asset("AAPL", AssetClass::Stock),
            asset("AGGH.MI", AssetClass::Bond),
            asset("XEON.DE", AssetClass::Cash),
        ]
        .into_iter()
        .collect();

        let stats = compute_stats(&breakdown, &assets);
        assert_eq!(stats.total_value, dec!(1000));
        assert_eq!(stats.equity_value, dec!(600));
        assert_eq!(stats.fixed_income_value, dec!(300));
        assert_eq!(stats.cash_value, dec!(100));
        assert_eq!(stats.equity_percent, dec!(60));
        // Cash merges into fixed income for benchmark comparison.
        assert_eq!(stats.fixed_income_percent, dec!(40));
    }

    #[test]
    fn test_unknown_symbol_defaults_to_equity() {
        let breakdown = vec![row("MYSTERY", dec!(100))];
        let stats = compute_stats(&breakdown, &HashMap::new());
        assert_eq!(stats.equity_value, dec!(100));
        assert_eq!(stats.equity_percent, dec!(100));
    }

    #[test]
    fn test_empty_breakdown_has_zero_percents() {
        let stats = compute_stats(&[], &HashMap::new());
        assert_eq!(stats.total_value, Decimal::ZERO);
        assert_eq!(stats.equity_percent, Decimal::ZERO);
        assert_eq!(stats.fixed_income_percent, Decimal::ZERO);
    }

    #[test]
    fn test_overweight_equity_suggests_selling() {
        let breakdown = vec![row("AAPL", dec!(900)), row("AGGH.MI", dec!(100))];
        let assets: HashMap<String, Asset> = [
            asset("AAPL", AssetClass::Stock),
            asset("AGGH.MI", AssetClass::Bond),
        ]
        .into_iter()
        .collect();

        let stats = compute_stats(&breakdown, &assets);
        let report = recommend(stats, RiskProfile::Balanced);

        assert_eq!(report.suggestions.len(), 2);
        let equity = &report.suggestions[0];
        assert_eq!(equity.action, SuggestionAction::Sell);
        assert_eq!(equity.asset_class, "EQUITY");
        assert_eq!(equity.current_percent, dec!(90));
        assert_eq!(equity.target_percent, dec!(50));
        assert_eq!(equity.delta_percent, dec!(40));

        let fixed = &report.suggestions[1];
        assert_eq!(fixed.action, SuggestionAction::Buy);
        assert_eq!(fixed.asset_class, "FIXED_INCOME");
    }

    #[test]
    fn test_within_threshold_keeps_quiet() {
        // 54 / 46 against a 50 / 50 target: inside the 5-point threshold.
        let breakdown = vec![row("AAPL", dec!(54)), row("AGGH.MI", dec!(46))];
        let assets: HashMap<String, Asset> = [
            asset("AAPL", AssetClass::Stock),
            asset("AGGH.MI", AssetClass::Bond),
        ]
        .into_iter()
        .collect();

        let stats = compute_stats(&breakdown, &assets);
        let report = recommend(stats, RiskProfile::Balanced);
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_report_carries_placeholder_metrics() {
        let report = recommend(compute_stats(&[], &HashMap::new()), RiskProfile::Moderate);
        assert_eq!(report.stats.metrics.volatility, dec!(12.5));
        assert_eq!(report.stats.metrics.max_drawdown, dec!(-15.4));
        assert_eq!(report.stats.metrics.sharpe_ratio, dec!(1.2));
        assert_eq!(report.profile, RiskProfile::Moderate);
    }
}
