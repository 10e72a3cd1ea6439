//! FX module - spot-rate conversion over the market-data port.

mod fx_model;
mod fx_service;


pub use fx_model::{normalize_quote_unit, pair_key, pair_symbol};
pub use fx_service::CurrencyConverter;
