//! Cartera Core - portfolio accounting domain.
//!
//! Folds an ordered transaction ledger into holdings, cost basis, realized
//! gains and multi-currency valuation, builds daily history series and
//! period reports, and normalizes broker statement exports (eToro workbooks,
//! Trade Republic PDF statements, adjustment JSON files) into the canonical
//! ledger. Persistence and market data are consumed through traits so the
//! crate stays storage- and provider-agnostic.

pub mod assets;
pub mod constants;
pub mod errors;
pub mod fx;
pub mod imports;
pub mod market_data;
pub mod portfolio;
pub mod transactions;

// Re-export the domain surface most callers need
pub use assets::*;
pub use portfolio::*;
pub use transactions::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
