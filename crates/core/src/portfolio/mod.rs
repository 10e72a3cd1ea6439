//! Portfolio domain - accounting fold, daily history, period performance
//! and rebalancing advice, wired together by [`PortfolioService`].

mod portfolio_model;
mod portfolio_service;

pub mod history;
pub mod performance;
pub mod rebalancing;
pub mod summary;

pub use portfolio_model::Portfolio;
pub use portfolio_service::{PortfolioService, PortfolioServiceTrait};

pub use history::*;
pub use performance::*;
pub use rebalancing::*;
pub use summary::*;
