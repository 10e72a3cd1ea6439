//! Accounting fold - cash, holdings, realized gains and valuation.

mod summary_calculator;
mod summary_model;

pub use summary_calculator::{
    compute_breakdown, compute_holdings, compute_summary, convert_price_to_base, LedgerFold,
};
pub use summary_model::{
    is_quantity_significant, AssetBreakdownRow, FoldPolicy, Holding, PortfolioSummary,
};

#[cfg(test)]
mod summary_calculator_tests;
