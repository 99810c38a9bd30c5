//! # realty-types
//!
//! Shared types, errors, and configuration for the **tokenized realty**
//! settlement ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PropertyId`], [`AccountId`], [`CorrelationId`], [`Generation`]
//! - **Pool model**: [`PropertyPool`], [`PoolPhase`]
//! - **Position model**: [`HolderPosition`]
//! - **Valuation model**: [`ValuationPurpose`], [`PendingValuation`], [`ValuationRequest`], [`ValuationReport`]
//! - **Receipt model**: [`Receipt`], [`ReceiptType`]
//! - **Configuration**: [`LedgerConfig`], [`OracleConfig`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Errors**: [`RealtyError`] with `RT_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod pool;
pub mod position;
pub mod receipt;
pub mod valuation;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use pool::*;
pub use position::*;
pub use receipt::*;
pub use valuation::*;

// Constants are accessed via `realty_types::constants::FOO`
// (not re-exported to avoid name collisions).
