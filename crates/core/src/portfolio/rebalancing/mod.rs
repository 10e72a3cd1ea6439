//! Rule-based rebalancing advisor.

mod rebalancing_advisor;
mod rebalancing_model;

pub use rebalancing_advisor::{compute_stats, recommend, REBALANCE_THRESHOLD_PERCENT};
pub use rebalancing_model::{
    benchmark_for, AllocationBenchmark, AllocationRange, PortfolioStats, RebalancingReport,
    RebalancingSuggestion, RiskMetrics, RiskProfile, SuggestionAction,
};

#[cfg(test)]
mod rebalancing_advisor_tests;
