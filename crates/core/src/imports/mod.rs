//! Imports module - broker statement normalizers and the orchestration
//! service that books them into the ledger.

mod adjustments;
mod etoro;
mod import_service;
mod imports_errors;
mod imports_model;
mod trade_republic;
mod workbook;


pub use import_service::{ImportService, ImportServiceTrait};
pub use imports_errors::ImportError;
pub use imports_model::ImportSummary;
pub use workbook::{Sheet, Workbook};
