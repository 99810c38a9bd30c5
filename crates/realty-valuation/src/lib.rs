//! # realty-valuation
//!
//! **Valuation Coordinator**: issues asynchronous valuation requests to an
//! external price oracle and correlates the fulfillments that come back.
//!
//! ## Two-phase round trip
//!
//! ```text
//! request()  → PendingValuation recorded → ValuationOracle::dispatch()
//!     ... oracle works ...
//! take(id)   → PendingValuation consumed → caller applies the value
//! ```
//!
//! The coordinator knows nothing about pools or positions; the settlement
//! crate decides what a fulfilled value means via [`ValuationPurpose`].
//!
//! [`ValuationPurpose`]: realty_types::ValuationPurpose

pub mod coordinator;
pub mod oracle;

pub use coordinator::ValuationCoordinator;
pub use oracle::{ChannelOracle, RecordingOracle, ValuationOracle};
