//! Currency conservation checker for the in-memory gateway.
//!
//! Invariant enforced after every hold and release:
//! ```text
//! Σ(account balances) + escrowed == Σ(issued)
//! ```
//!
//! Holds and releases only move currency between accounts and escrow, so
//! any drift means the gateway itself is broken.

use realty_types::{RealtyError, Result};
use rust_decimal::Decimal;

/// Tracks total currency issued into the gateway.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    issued: Decimal,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record currency entering the system (a deposit).
    pub fn record_issue(&mut self, amount: Decimal) {
        self.issued += amount;
    }

    #[must_use]
    pub fn total_issued(&self) -> Decimal {
        self.issued
    }

    /// Verify that account balances plus escrow equal what was issued.
    ///
    /// # Errors
    /// Returns [`RealtyError::ConservationViolation`] if they differ.
    pub fn verify(&self, balances: Decimal, escrowed: Decimal) -> Result<()> {
        let actual = balances + escrowed;
        if actual != self.issued {
            return Err(RealtyError::ConservationViolation {
                reason: format!(
                    "actual supply {actual} != issued {} (balances={balances}, escrowed={escrowed})",
                    self.issued
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_supply_is_zero() {
        let sc = SupplyConservation::new();
        assert_eq!(sc.total_issued(), Decimal::ZERO);
        assert!(sc.verify(Decimal::ZERO, Decimal::ZERO).is_ok());
    }

    #[test]
    fn issues_accumulate() {
        let mut sc = SupplyConservation::new();
        sc.record_issue(Decimal::new(1000, 0));
        sc.record_issue(Decimal::new(500, 0));
        assert_eq!(sc.total_issued(), Decimal::new(1500, 0));
    }

    #[test]
    fn moving_into_escrow_keeps_supply() {
        let mut sc = SupplyConservation::new();
        sc.record_issue(Decimal::new(1000, 0));
        assert!(sc.verify(Decimal::new(700, 0), Decimal::new(300, 0)).is_ok());
    }

    #[test]
    fn imbalance_is_reported() {
        let mut sc = SupplyConservation::new();
        sc.record_issue(Decimal::new(10, 0));
        let err = sc.verify(Decimal::new(10, 0), Decimal::ONE).unwrap_err();
        assert!(matches!(err, RealtyError::ConservationViolation { .. }));
    }
}
