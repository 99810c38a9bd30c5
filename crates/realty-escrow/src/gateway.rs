//! The escrow seam between the ledger and the currency it settles in.
//!
//! The ledger never moves currency itself. It asks a gateway to hold funds
//! from a payer (collateral, principal) and to release funds to a payee
//! (payouts). Each call must either complete fully or fail without effect,
//! so the ledger can treat it as part of its own atomic mutation.

use std::sync::Arc;

use realty_types::{AccountId, Result};
use rust_decimal::Decimal;

/// Transfers the stable currency into and out of the ledger's custody.
pub trait EscrowGateway: Send + Sync {
    /// Move `amount` from `payer` into escrow.
    ///
    /// # Errors
    /// `InsufficientAllowance`, `InsufficientBalance` or `EscrowFailed`;
    /// on error nothing was moved.
    fn hold_from(&self, payer: AccountId, amount: Decimal) -> Result<()>;

    /// Move `amount` out of escrow to `payee`.
    ///
    /// # Errors
    /// `EscrowFailed`; on error nothing was moved.
    fn release_to(&self, payee: AccountId, amount: Decimal) -> Result<()>;

    /// How much `payer` has approved the ledger to hold.
    fn allowance_of(&self, payer: AccountId) -> Decimal;
}

impl<T: EscrowGateway + ?Sized> EscrowGateway for Arc<T> {
    fn hold_from(&self, payer: AccountId, amount: Decimal) -> Result<()> {
        (**self).hold_from(payer, amount)
    }

    fn release_to(&self, payee: AccountId, amount: Decimal) -> Result<()> {
        (**self).release_to(payee, amount)
    }

    fn allowance_of(&self, payer: AccountId) -> Decimal {
        (**self).allowance_of(payer)
    }
}
