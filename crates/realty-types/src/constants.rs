//! System-wide constants for the tokenized realty ledger.

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default collateral the creator escrows, in basis points of the pool
/// total (1000 bps = 10%). Also caps each holder's credit or debit.
pub const DEFAULT_COLLATERAL_BPS: u32 = 1_000;

/// Default decimal places kept on settlement amounts. Fractions below
/// this scale are rounded toward zero.
pub const DEFAULT_CURRENCY_SCALE: u32 = 0;

/// Largest accepted currency scale.
pub const MAX_CURRENCY_SCALE: u32 = 18;

/// Largest `total_amount` a pool may offer, in whole currency units.
/// Keeps every per-pool sum far below `Decimal::MAX`.
pub const MAX_POOL_AMOUNT: i64 = 1_000_000_000_000_000_000;

/// Default stable currency symbol.
pub const DEFAULT_CURRENCY: &str = "USDC";

/// Default oracle job identifier attached to valuation requests.
pub const DEFAULT_ORACLE_JOB_ID: &str = "property-valuation";

/// Default oracle fee per request, in the oracle's fee token (0.1).
pub const DEFAULT_ORACLE_FEE_MILLIS: i64 = 100;

/// Domain separator for signed valuation reports.
pub const VALUATION_REPORT_DOMAIN: &[u8] = b"tokenized-realty:valuation:v1:";

/// Domain separator for receipt payload hashes.
pub const RECEIPT_DOMAIN: &[u8] = b"tokenized-realty:receipt:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
