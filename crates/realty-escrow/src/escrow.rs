//! In-memory escrow gateway.
//!
//! Models an allowance-based stable currency: accounts approve the ledger,
//! the ledger pulls funds into a single escrow vault and later releases
//! them. Used by simulations and tests; production deployments plug their
//! own [`EscrowGateway`] in front of a real currency.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use realty_types::{AccountId, RealtyError, Result};
use rust_decimal::Decimal;

use crate::balance_manager::{AccountBalance, BalanceManager};
use crate::gateway::EscrowGateway;
use crate::supply_conservation::SupplyConservation;

#[derive(Debug, Default)]
struct EscrowState {
    balances: BalanceManager,
    /// Currency currently held on behalf of the ledger.
    escrowed: Decimal,
    supply: SupplyConservation,
}

/// Allowance-based escrow vault with fault injection for tests.
#[derive(Debug, Default)]
pub struct InMemoryEscrow {
    state: Mutex<EscrowState>,
    fail_holds: AtomicBool,
    fail_releases: AtomicBool,
}

impl InMemoryEscrow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue currency to an account.
    pub fn deposit(&self, account: AccountId, amount: Decimal) {
        let mut state = self.state.lock();
        state.balances.deposit(account, amount);
        state.supply.record_issue(amount);
    }

    /// Approve the ledger to pull up to `amount` from `account`.
    pub fn request_allowance(&self, account: AccountId, amount: Decimal) {
        self.state.lock().balances.approve(account, amount);
        tracing::debug!(account = %account.short(), %amount, "Allowance approved");
    }

    #[must_use]
    pub fn account(&self, account: AccountId) -> AccountBalance {
        self.state.lock().balances.balance(account)
    }

    #[must_use]
    pub fn balance_of(&self, account: AccountId) -> Decimal {
        self.account(account).balance
    }

    /// Currency currently held in escrow.
    #[must_use]
    pub fn escrowed(&self) -> Decimal {
        self.state.lock().escrowed
    }

    /// Verify balances plus escrow still equal everything issued.
    pub fn verify_supply(&self) -> Result<()> {
        let state = self.state.lock();
        state
            .supply
            .verify(state.balances.total_balances(), state.escrowed)
    }

    /// Make every subsequent hold fail (simulates a rejected transfer).
    pub fn set_fail_holds(&self, fail: bool) {
        self.fail_holds.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent release fail.
    pub fn set_fail_releases(&self, fail: bool) {
        self.fail_releases.store(fail, Ordering::SeqCst);
    }
}

impl EscrowGateway for InMemoryEscrow {
    fn hold_from(&self, payer: AccountId, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(RealtyError::InvalidAmount(amount));
        }
        if self.fail_holds.load(Ordering::SeqCst) {
            return Err(RealtyError::EscrowFailed {
                reason: format!("hold of {amount} from {payer} rejected"),
            });
        }

        let mut state = self.state.lock();
        state.balances.debit_with_allowance(payer, amount)?;
        // escrowed + balances == issued, so this cannot exceed total issued.
        state.escrowed += amount;
        tracing::debug!(payer = %payer.short(), %amount, escrowed = %state.escrowed, "Funds held");
        Ok(())
    }

    fn release_to(&self, payee: AccountId, amount: Decimal) -> Result<()> {
        if amount.is_sign_negative() {
            return Err(RealtyError::InvalidAmount(amount));
        }
        if self.fail_releases.load(Ordering::SeqCst) {
            return Err(RealtyError::EscrowFailed {
                reason: format!("release of {amount} to {payee} rejected"),
            });
        }

        let mut state = self.state.lock();
        if state.escrowed < amount {
            return Err(RealtyError::EscrowFailed {
                reason: format!("escrow holds {}, cannot release {amount}", state.escrowed),
            });
        }
        state.escrowed -= amount;
        state.balances.credit(payee, amount);
        tracing::debug!(payee = %payee.short(), %amount, escrowed = %state.escrowed, "Funds released");
        Ok(())
    }

    fn allowance_of(&self, payer: AccountId) -> Decimal {
        self.state.lock().balances.balance(payer).allowance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(amount: i64) -> (InMemoryEscrow, AccountId) {
        let escrow = InMemoryEscrow::new();
        let user = AccountId::random();
        escrow.deposit(user, Decimal::new(amount, 0));
        escrow.request_allowance(user, Decimal::new(amount, 0));
        (escrow, user)
    }

    #[test]
    fn hold_moves_funds_into_escrow() {
        let (escrow, user) = funded(10_000);
        escrow.hold_from(user, Decimal::new(500, 0)).unwrap();
        assert_eq!(escrow.balance_of(user), Decimal::new(9500, 0));
        assert_eq!(escrow.allowance_of(user), Decimal::new(9500, 0));
        assert_eq!(escrow.escrowed(), Decimal::new(500, 0));
        escrow.verify_supply().unwrap();
    }

    #[test]
    fn hold_without_allowance_fails() {
        let escrow = InMemoryEscrow::new();
        let user = AccountId::random();
        escrow.deposit(user, Decimal::new(1000, 0));
        let err = escrow.hold_from(user, Decimal::new(100, 0)).unwrap_err();
        assert!(matches!(err, RealtyError::InsufficientAllowance { .. }));
        assert_eq!(escrow.escrowed(), Decimal::ZERO);
    }

    #[test]
    fn release_pays_out_of_escrow() {
        let (escrow, user) = funded(1000);
        let other = AccountId::random();
        escrow.hold_from(user, Decimal::new(1000, 0)).unwrap();
        escrow.release_to(other, Decimal::new(400, 0)).unwrap();
        assert_eq!(escrow.balance_of(other), Decimal::new(400, 0));
        assert_eq!(escrow.escrowed(), Decimal::new(600, 0));
        escrow.verify_supply().unwrap();
    }

    #[test]
    fn release_more_than_escrowed_fails() {
        let (escrow, user) = funded(100);
        escrow.hold_from(user, Decimal::new(100, 0)).unwrap();
        let err = escrow.release_to(user, Decimal::new(101, 0)).unwrap_err();
        assert!(matches!(err, RealtyError::EscrowFailed { .. }));
        assert_eq!(escrow.escrowed(), Decimal::new(100, 0));
    }

    #[test]
    fn injected_failures_leave_state_unchanged() {
        let (escrow, user) = funded(1000);
        escrow.set_fail_holds(true);
        assert!(matches!(
            escrow.hold_from(user, Decimal::ONE),
            Err(RealtyError::EscrowFailed { .. })
        ));
        escrow.set_fail_holds(false);
        escrow.hold_from(user, Decimal::ONE).unwrap();

        escrow.set_fail_releases(true);
        assert!(escrow.release_to(user, Decimal::ONE).is_err());
        assert_eq!(escrow.escrowed(), Decimal::ONE);
        escrow.verify_supply().unwrap();
    }

    #[test]
    fn zero_hold_is_invalid() {
        let (escrow, user) = funded(10);
        assert!(matches!(
            escrow.hold_from(user, Decimal::ZERO),
            Err(RealtyError::InvalidAmount(_))
        ));
    }
}
