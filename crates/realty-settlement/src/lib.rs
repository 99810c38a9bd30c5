//! # realty-settlement
//!
//! **Settlement Engine**: the tokenized realty ledger itself.
//!
//! ## Architecture
//!
//! [`TokenizedRealty`] ties the pieces together:
//! 1. [`PropertyRegistry`] holds one slot per property id (current
//!    generation plus archived ones)
//! 2. [`PoolGeneration`] tracks holder positions and runs settlement
//! 3. [`allocation`] computes each holder's capped gain or loss
//! 4. [`ReceiptLog`] records every committed mutation
//!
//! Currency moves through a [`realty_escrow::EscrowGateway`]; valuations
//! come from a [`realty_valuation::ValuationOracle`] and land through
//! [`TokenizedRealty::fulfill_valuation`].
//!
//! ## Lifecycle
//!
//! ```text
//! create ─▶ purchase* ─▶ (maturity) ─▶ reconcile ─▶ fulfill ─▶ claim* ─▶ re-create
//!              │                                                    (next generation)
//!              └─▶ purchase valuation ─▶ fulfill
//! ```

pub mod allocation;
pub mod audit;
pub mod engine;
pub mod ledger;
pub mod registry;

pub use allocation::Allocation;
pub use audit::ReceiptLog;
pub use engine::TokenizedRealty;
pub use ledger::PoolGeneration;
pub use registry::{PoolSlot, PropertyRegistry};
