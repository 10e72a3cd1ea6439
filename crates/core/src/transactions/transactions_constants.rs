/// Transaction types
///
/// Each constant names one canonical ledger event. The importers and manual
/// entry both reduce to this set; the accounting fold dispatches on it.

/// Purchase of an asset. Decreases cash, increases quantity and cost basis.
pub const TRANSACTION_TYPE_BUY: &str = "BUY";

/// Disposal of an asset. Increases cash, decreases quantity, realizes gain.
pub const TRANSACTION_TYPE_SELL: &str = "SELL";

/// Cash paid into the portfolio. Increases cash and invested capital.
pub const TRANSACTION_TYPE_DEPOSIT: &str = "DEPOSIT";

/// Cash taken out of the portfolio. Decreases cash and invested capital.
pub const TRANSACTION_TYPE_WITHDRAWAL: &str = "WITHDRAWAL";

/// Cash dividend received. Increases cash.
pub const TRANSACTION_TYPE_DIVIDEND: &str = "DIVIDEND";

/// Interest earned on cash. Increases cash.
pub const TRANSACTION_TYPE_INTEREST: &str = "INTEREST";

/// Asset units or cash credited from outside (broker reward, adjustment).
/// Counts as contributed capital.
pub const TRANSACTION_TYPE_GIFT: &str = "GIFT";

/// Card-cashback asset credit settled outside the cash balance.
pub const TRANSACTION_TYPE_SAVEBACK: &str = "SAVEBACK";

/// Purchase round-up asset credit settled outside the cash balance.
pub const TRANSACTION_TYPE_ROUNDUP: &str = "ROUNDUP";

/// Types that add to (or, for withdrawals, remove from) contributed capital.
pub const CONTRIBUTION_TRANSACTION_TYPES: [&str; 4] = [
    TRANSACTION_TYPE_DEPOSIT,
    TRANSACTION_TYPE_GIFT,
    TRANSACTION_TYPE_SAVEBACK,
    TRANSACTION_TYPE_ROUNDUP,
];

/// Types that acquire asset quantity and therefore set a first-purchase date.
pub const ACQUISITION_TRANSACTION_TYPES: [&str; 3] = [
    TRANSACTION_TYPE_BUY,
    TRANSACTION_TYPE_SAVEBACK,
    TRANSACTION_TYPE_ROUNDUP,
];

/// Types that must reference an asset symbol to be meaningful.
pub const ASSET_REQUIRED_TRANSACTION_TYPES: [&str; 4] = [
    TRANSACTION_TYPE_BUY,
    TRANSACTION_TYPE_SELL,
    TRANSACTION_TYPE_SAVEBACK,
    TRANSACTION_TYPE_ROUNDUP,
];
