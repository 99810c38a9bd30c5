//! Holder positions within a pool generation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, RealtyError, Result};

/// A holder's stake in one pool generation.
///
/// Created at purchase with the valuation pending, stamped once by the
/// purchase valuation, updated once by reconciliation and consumed once
/// by the claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderPosition {
    pub holder: AccountId,
    /// Currency amount purchased.
    pub principal: Decimal,
    /// Property valuation at purchase time. `None` until the oracle answers.
    pub value_at_purchase: Option<Decimal>,
    /// Gain allocated at reconciliation.
    pub credit: Decimal,
    /// Loss allocated at reconciliation.
    pub debit: Decimal,
    pub claimed: bool,
    pub purchased_at: DateTime<Utc>,
}

impl HolderPosition {
    #[must_use]
    pub fn new(holder: AccountId, principal: Decimal, purchased_at: DateTime<Utc>) -> Self {
        Self {
            holder,
            principal,
            value_at_purchase: None,
            credit: Decimal::ZERO,
            debit: Decimal::ZERO,
            claimed: false,
            purchased_at,
        }
    }

    /// Whether the purchase valuation is still outstanding.
    #[must_use]
    pub fn valuation_pending(&self) -> bool {
        self.value_at_purchase.is_none()
    }

    /// What the holder receives on claim: `principal + credit − debit`.
    ///
    /// # Errors
    /// `ConservationViolation` if the sum overflows or goes negative.
    pub fn payout(&self) -> Result<Decimal> {
        let payout = self
            .principal
            .checked_add(self.credit)
            .and_then(|n| n.checked_sub(self.debit))
            .ok_or_else(|| RealtyError::ConservationViolation {
                reason: format!("payout of {} overflows", self.holder),
            })?;
        if payout < Decimal::ZERO {
            return Err(RealtyError::ConservationViolation {
                reason: format!("payout of {} is negative: {payout}", self.holder),
            });
        }
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_position_is_pending_and_pays_principal() {
        let pos = HolderPosition::new(AccountId::from_bytes([2u8; 20]), Decimal::new(1700, 0), Utc::now());
        assert!(pos.valuation_pending());
        assert!(!pos.claimed);
        assert_eq!(pos.payout().unwrap(), Decimal::new(1700, 0));
    }

    #[test]
    fn payout_applies_credit_and_debit() {
        let mut pos = HolderPosition::new(AccountId::from_bytes([2u8; 20]), Decimal::new(2000, 0), Utc::now());
        pos.credit = Decimal::new(40, 0);
        assert_eq!(pos.payout().unwrap(), Decimal::new(2040, 0));
        pos.credit = Decimal::ZERO;
        pos.debit = Decimal::new(200, 0);
        assert_eq!(pos.payout().unwrap(), Decimal::new(1800, 0));
    }

    #[test]
    fn payout_overflow_is_an_error() {
        let mut pos = HolderPosition::new(AccountId::from_bytes([3u8; 20]), Decimal::MAX, Utc::now());
        pos.credit = Decimal::ONE;
        assert!(matches!(
            pos.payout(),
            Err(RealtyError::ConservationViolation { .. })
        ));
    }
}
