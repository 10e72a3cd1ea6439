//! Daily portfolio history series.

mod history_calculator;
mod history_model;

pub use history_calculator::{build_history, PriceSeries};
pub use history_model::HistoryPoint;
