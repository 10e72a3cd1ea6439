use serde::{Deserialize, Serialize};

/// Row-level outcome counts of a best-effort import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Ledger rows written, or assets updated for price adjustments.
    pub created: u32,
    /// Rows that were recognized but could not be imported.
    pub skipped: u32,
    /// Rows referencing an asset that could not be resolved.
    pub not_found: u32,
}
