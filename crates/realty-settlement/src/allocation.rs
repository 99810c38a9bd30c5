//! Proportional, collateral-capped profit/loss allocation.
//!
//! For a holder who bought at valuation `v0` with principal `p`, a final
//! valuation `v1` changes their stake by
//!
//! ```text
//! raw = p × (v1 − v0) / v0
//! ```
//!
//! The magnitude is rounded toward zero at the currency scale and then
//! clamped to `p × collateral_rate`. A gain becomes the holder's credit
//! (owed by the creator); a loss becomes the holder's debit (owed to the
//! creator). Rounding toward zero means the ledger never pays out more
//! than the exact proportional change.

use realty_types::{LedgerConfig, RealtyError, Result};
use rust_decimal::Decimal;

/// One holder's share of the valuation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Allocation {
    pub credit: Decimal,
    pub debit: Decimal,
    /// Whether the cap clipped the proportional change.
    pub capped: bool,
}

impl Allocation {
    /// Signed change applied to the principal.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.credit - self.debit
    }
}

/// Compute one holder's allocation.
///
/// # Errors
/// `InvalidValuation` if either valuation is non-positive or the
/// arithmetic overflows.
pub fn allocate(
    config: &LedgerConfig,
    principal: Decimal,
    value_at_purchase: Decimal,
    final_value: Decimal,
) -> Result<Allocation> {
    if value_at_purchase <= Decimal::ZERO {
        return Err(RealtyError::InvalidValuation(value_at_purchase));
    }
    if final_value <= Decimal::ZERO {
        return Err(RealtyError::InvalidValuation(final_value));
    }

    let change = final_value - value_at_purchase;
    let raw = principal
        .checked_mul(change.abs())
        .and_then(|n| n.checked_div(value_at_purchase))
        .ok_or(RealtyError::InvalidValuation(final_value))?;
    let magnitude = config.round_down(raw);
    let cap = cap_for(config, principal);
    let capped = magnitude > cap;
    let amount = magnitude.min(cap);

    Ok(if change.is_sign_positive() {
        Allocation {
            credit: amount,
            debit: Decimal::ZERO,
            capped,
        }
    } else {
        Allocation {
            credit: Decimal::ZERO,
            debit: amount,
            capped,
        }
    })
}

/// Largest credit or debit a holder with `principal` can receive.
#[must_use]
pub fn cap_for(config: &LedgerConfig, principal: Decimal) -> Decimal {
    config.round_down(principal * config.collateral_rate())
}

/// Check that a generation's payouts release exactly what it escrowed.
///
/// `Σ holder payouts + creator payout == collateral + amount sold`, and the
/// creator payout may not be negative.
///
/// # Errors
/// `ConservationViolation` when either condition fails.
pub fn check_conservation(
    collateral: Decimal,
    sold: Decimal,
    holder_payouts: Decimal,
    creator_payout: Decimal,
) -> Result<()> {
    if creator_payout.is_sign_negative() && !creator_payout.is_zero() {
        return Err(RealtyError::ConservationViolation {
            reason: format!("creator payout {creator_payout} is negative (collateral {collateral})"),
        });
    }
    let escrowed = collateral.checked_add(sold);
    let released = holder_payouts.checked_add(creator_payout);
    if escrowed.is_none() || escrowed != released {
        return Err(RealtyError::ConservationViolation {
            reason: format!(
                "escrowed {collateral} + {sold} != released {holder_payouts} + {creator_payout}"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LedgerConfig {
        LedgerConfig::default()
    }

    fn d(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn gain_is_proportional_credit() {
        let a = allocate(&cfg(), d(2000), d(10_000), d(10_200)).unwrap();
        assert_eq!(a.credit, d(40));
        assert_eq!(a.debit, Decimal::ZERO);
        assert!(!a.capped);
    }

    #[test]
    fn fractional_gain_rounds_down() {
        // 3000 × 100 / 10100 = 29.70…
        let a = allocate(&cfg(), d(3000), d(10_100), d(10_200)).unwrap();
        assert_eq!(a.credit, d(29));
    }

    #[test]
    fn loss_is_proportional_debit() {
        // 1700 × 500 / 10000 = 85
        let a = allocate(&cfg(), d(1700), d(10_000), d(9_500)).unwrap();
        assert_eq!(a.debit, d(85));
        assert_eq!(a.credit, Decimal::ZERO);
        assert_eq!(a.net(), d(-85));
    }

    #[test]
    fn fractional_loss_rounds_toward_zero() {
        // 3000 × 100 / 10100 = 29.70… lost → debit 29
        let a = allocate(&cfg(), d(3000), d(10_100), d(10_000)).unwrap();
        assert_eq!(a.debit, d(29));
    }

    #[test]
    fn gain_is_capped_at_collateral_rate() {
        let a = allocate(&cfg(), d(2000), d(10_000), d(50_000)).unwrap();
        assert_eq!(a.credit, d(200));
        assert!(a.capped);
    }

    #[test]
    fn loss_is_capped_at_collateral_rate() {
        let a = allocate(&cfg(), d(2000), d(10_000), d(1)).unwrap();
        assert_eq!(a.debit, d(200));
        assert!(a.capped);
    }

    #[test]
    fn unchanged_value_allocates_nothing() {
        let a = allocate(&cfg(), d(2000), d(10_000), d(10_000)).unwrap();
        assert_eq!(a, Allocation::default());
    }

    #[test]
    fn finer_scale_keeps_cents() {
        let config = LedgerConfig {
            currency_scale: 2,
            ..LedgerConfig::default()
        };
        let a = allocate(&config, d(3000), d(10_100), d(10_200)).unwrap();
        assert_eq!(a.credit, Decimal::new(2970, 2));
    }

    #[test]
    fn non_positive_valuations_are_rejected() {
        assert!(matches!(
            allocate(&cfg(), d(1), Decimal::ZERO, d(1)),
            Err(RealtyError::InvalidValuation(_))
        ));
        assert!(matches!(
            allocate(&cfg(), d(1), d(1), d(-5)),
            Err(RealtyError::InvalidValuation(_))
        ));
    }

    #[test]
    fn overflow_is_an_error_not_a_panic() {
        let err = allocate(&cfg(), Decimal::MAX, Decimal::ONE, Decimal::MAX).unwrap_err();
        assert!(matches!(err, RealtyError::InvalidValuation(_)));
    }

    #[test]
    fn conservation_balances() {
        // collateral 500, principals 5000, holder payouts 5069, creator 431
        check_conservation(d(500), d(5000), d(5069), d(431)).unwrap();
        let err = check_conservation(d(500), d(5000), d(5069), d(432)).unwrap_err();
        assert!(matches!(err, RealtyError::ConservationViolation { .. }));
        let err = check_conservation(d(0), d(100), d(101), d(-1)).unwrap_err();
        assert!(matches!(err, RealtyError::ConservationViolation { .. }));
        let err = check_conservation(Decimal::MAX, d(1), Decimal::MAX, d(1)).unwrap_err();
        assert!(matches!(err, RealtyError::ConservationViolation { .. }));
    }
}
