//! Market data module - provider port and wire models.

mod market_data_model;
mod market_data_traits;

pub use market_data_model::{HistoricalPoint, Quote, SearchResult};
pub use market_data_traits::MarketDataProviderTrait;
