/// Quantity below which a position counts as fully closed.
pub const QUANTITY_THRESHOLD: &str = "0.00001";

/// Decimal precision for valuation calculations.
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display values.
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Lifetime of a cached FX rate, in seconds.
pub const FX_CACHE_TTL_SECS: u64 = 3600;

/// Euro currency code.
pub const CURRENCY_EUR: &str = "EUR";

/// US dollar currency code.
pub const CURRENCY_USD: &str = "USD";

/// Pound sterling currency code.
pub const CURRENCY_GBP: &str = "GBP";

/// Pence-quoted sterling codes as brokers report them.
pub const PENCE_QUOTE_CURRENCIES: [&str; 2] = ["GBX", "GBp"];
