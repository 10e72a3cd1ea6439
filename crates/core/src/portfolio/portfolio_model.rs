use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's portfolio: the base currency everything is reported in, plus
/// the transaction ledger that belongs to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub name: String,
    /// ISO currency code summaries and histories are denominated in.
    pub base_currency: String,
    pub created_at: DateTime<Utc>,
}
