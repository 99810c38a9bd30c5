//! # realty-escrow
//!
//! **Escrow Gateway**: the interface the ledger uses to hold and release
//! the stable currency, plus an in-memory reference implementation.
//!
//! ## Flow
//!
//! ```text
//! create  → hold_from(creator, collateral)
//! buy     → hold_from(holder, principal)
//! claim   → release_to(holder, principal + credit − debit)
//! collect → release_to(creator, collateral − net settlement)
//! ```
//!
//! Every call is all-or-nothing, so the ledger can commit its own state
//! only after the gateway reports success.

pub mod balance_manager;
pub mod escrow;
pub mod gateway;
pub mod supply_conservation;

pub use balance_manager::{AccountBalance, BalanceManager};
pub use escrow::InMemoryEscrow;
pub use gateway::EscrowGateway;
pub use supply_conservation::SupplyConservation;
