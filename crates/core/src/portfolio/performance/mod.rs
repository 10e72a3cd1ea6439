//! Period aggregation of the history series.

mod performance_calculator;
mod performance_model;

pub use performance_calculator::aggregate;
pub use performance_model::{PeriodPerformance, PerformanceReport};
