//! Holder ledger: positions within one pool generation, and the
//! settlement computation that runs over them.
//!
//! A [`PoolGeneration`] owns its pool record and every holder position.
//! Mutations are split into a check step and a commit step so the engine
//! can run the escrow transfer in between: if the transfer fails, nothing
//! has been committed.

use chrono::{DateTime, Utc};
use realty_types::{
    AccountId, HolderPosition, LedgerConfig, PoolPhase, PropertyPool, RealtyError, Result,
};
use rust_decimal::Decimal;

use crate::allocation::{self, Allocation};

/// A pool generation and its holder positions (in purchase order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolGeneration {
    pub pool: PropertyPool,
    positions: Vec<HolderPosition>,
}

impl PoolGeneration {
    #[must_use]
    pub fn new(pool: PropertyPool) -> Self {
        Self {
            pool,
            positions: Vec::new(),
        }
    }

    #[must_use]
    pub fn position(&self, holder: AccountId) -> Option<&HolderPosition> {
        self.positions.iter().find(|p| p.holder == holder)
    }

    fn position_mut(&mut self, holder: AccountId) -> Option<&mut HolderPosition> {
        self.positions.iter_mut().find(|p| p.holder == holder)
    }

    #[must_use]
    pub fn positions(&self) -> &[HolderPosition] {
        &self.positions
    }

    /// Holders in purchase order.
    #[must_use]
    pub fn holders(&self) -> Vec<AccountId> {
        self.positions.iter().map(|p| p.holder).collect()
    }

    /// Positions whose purchase valuation has not arrived yet.
    #[must_use]
    pub fn pending_valuations(&self) -> usize {
        self.positions.iter().filter(|p| p.valuation_pending()).count()
    }

    // -----------------------------------------------------------------
    // Purchase
    // -----------------------------------------------------------------

    /// Check that `holder` may buy `amount`.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount <= 0`
    /// - `PurchaseWindowClosed` if the pool is not open or has matured
    /// - `HolderExists` if the holder already bought into this generation
    /// - `InsufficientSupply` if `amount > amount_available`
    pub fn check_purchase(
        &self,
        holder: AccountId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(RealtyError::InvalidAmount(amount));
        }
        if self.pool.phase != PoolPhase::Open || self.pool.has_matured(now) {
            return Err(RealtyError::PurchaseWindowClosed(self.pool.id.clone()));
        }
        if self.position(holder).is_some() {
            return Err(RealtyError::HolderExists {
                property: self.pool.id.clone(),
                holder,
            });
        }
        if amount > self.pool.amount_available {
            return Err(RealtyError::InsufficientSupply {
                requested: amount,
                available: self.pool.amount_available,
            });
        }
        Ok(())
    }

    /// Record a purchase already validated by [`Self::check_purchase`].
    pub fn commit_purchase(&mut self, holder: AccountId, amount: Decimal, now: DateTime<Utc>) {
        self.pool.amount_available -= amount;
        self.pool.holder_count += 1;
        self.positions.push(HolderPosition::new(holder, amount, now));
        debug_assert_eq!(self.pool.holder_count, self.positions.len());
        debug_assert!(self.pool.amount_available >= Decimal::ZERO);
    }

    #[cfg(test)]
    pub(crate) fn open_position(
        &mut self,
        holder: AccountId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.check_purchase(holder, amount, now)?;
        self.commit_purchase(holder, amount, now);
        Ok(())
    }

    /// Stamp the purchase-time valuation (first and only write).
    ///
    /// # Errors
    /// - `NotAHolder` if no position exists
    /// - `InvalidValuation` if a valuation was already recorded
    pub fn record_valuation(&mut self, holder: AccountId, value: Decimal) -> Result<()> {
        let property = self.pool.id.clone();
        let position = self
            .position_mut(holder)
            .ok_or(RealtyError::NotAHolder { property, holder })?;
        if position.value_at_purchase.is_some() {
            return Err(RealtyError::InvalidValuation(value));
        }
        position.value_at_purchase = Some(value);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------

    /// Check that a reconciliation valuation may be requested.
    ///
    /// # Errors
    /// - `AlreadyReconciled` if settlement already ran
    /// - `RequestInFlight` if a reconciliation valuation is outstanding
    /// - `StillActive` if the pool has not matured
    /// - `ValuationPending` if purchase valuations are still outstanding
    pub fn check_reconcile(&self, now: DateTime<Utc>) -> Result<()> {
        match self.pool.phase {
            PoolPhase::Open => {}
            PoolPhase::Reconciling => {
                return Err(RealtyError::RequestInFlight {
                    key: format!("{}/{}/RECONCILIATION", self.pool.id, self.pool.generation),
                });
            }
            PoolPhase::Reconciled | PoolPhase::FullySettled => {
                return Err(RealtyError::AlreadyReconciled(self.pool.id.clone()));
            }
        }
        if !self.pool.has_matured(now) {
            return Err(RealtyError::StillActive(self.pool.id.clone()));
        }
        let pending = self.pending_valuations();
        if pending > 0 {
            return Err(RealtyError::ValuationPending {
                property: self.pool.id.clone(),
                pending,
            });
        }
        Ok(())
    }

    /// Run settlement against `final_value`. Exactly once per generation.
    ///
    /// Allocations are computed and checked for conservation before any
    /// position is touched.
    ///
    /// # Errors
    /// - `StillActive` if `now < maturity`
    /// - `AlreadyReconciled` if settlement already ran
    /// - `ValuationPending` if a purchase valuation never arrived
    /// - `InvalidValuation` / `ConservationViolation` from the arithmetic
    pub fn settle(
        &mut self,
        config: &LedgerConfig,
        final_value: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.pool.has_matured(now) {
            return Err(RealtyError::StillActive(self.pool.id.clone()));
        }
        if self.pool.is_reconciled() {
            return Err(RealtyError::AlreadyReconciled(self.pool.id.clone()));
        }

        let mut allocations: Vec<Allocation> = Vec::with_capacity(self.positions.len());
        for position in &self.positions {
            let value_at_purchase =
                position
                    .value_at_purchase
                    .ok_or_else(|| RealtyError::ValuationPending {
                        property: self.pool.id.clone(),
                        pending: self.pending_valuations(),
                    })?;
            allocations.push(allocation::allocate(
                config,
                position.principal,
                value_at_purchase,
                final_value,
            )?);
        }

        let overflow = || RealtyError::ConservationViolation {
            reason: format!("settlement sums overflow for {}", self.pool.id),
        };
        let mut pool_debit = Decimal::ZERO;
        let mut pool_credit = Decimal::ZERO;
        let mut holder_payouts = Decimal::ZERO;
        for (position, alloc) in self.positions.iter().zip(&allocations) {
            pool_debit = pool_debit.checked_add(alloc.credit).ok_or_else(overflow)?;
            pool_credit = pool_credit.checked_add(alloc.debit).ok_or_else(overflow)?;
            let payout = position
                .principal
                .checked_add(alloc.net())
                .ok_or_else(overflow)?;
            holder_payouts = holder_payouts.checked_add(payout).ok_or_else(overflow)?;
        }
        let creator_payout = pool_debit
            .checked_sub(pool_credit)
            .and_then(|net| self.pool.collateral.checked_sub(net))
            .ok_or_else(overflow)?;
        // Checked against the pool's own sold counter, not the positions.
        allocation::check_conservation(
            self.pool.collateral,
            self.pool.amount_sold(),
            holder_payouts,
            creator_payout,
        )?;

        let capped = allocations.iter().filter(|a| a.capped).count();
        for (position, alloc) in self.positions.iter_mut().zip(&allocations) {
            position.credit = alloc.credit;
            position.debit = alloc.debit;
        }
        self.pool.debit = pool_debit;
        self.pool.credit = pool_credit;
        self.pool.final_value = Some(final_value);
        self.pool.phase = PoolPhase::Reconciled;

        tracing::info!(
            property = %self.pool.id,
            generation = %self.pool.generation,
            %final_value,
            holders = self.positions.len(),
            capped,
            pool_debit = %pool_debit,
            pool_credit = %pool_credit,
            "Pool reconciled"
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // Claims
    // -----------------------------------------------------------------

    /// Payout owed to `holder`, if they may claim now.
    ///
    /// # Errors
    /// `NotReconciled`, `NotAHolder`, `AlreadyClaimed`.
    pub fn claimable(&self, holder: AccountId) -> Result<Decimal> {
        if !self.pool.is_reconciled() {
            return Err(RealtyError::NotReconciled(self.pool.id.clone()));
        }
        let position = self.position(holder).ok_or_else(|| RealtyError::NotAHolder {
            property: self.pool.id.clone(),
            holder,
        })?;
        if position.claimed {
            return Err(RealtyError::AlreadyClaimed {
                property: self.pool.id.clone(),
                account: holder,
            });
        }
        position.payout()
    }

    /// Mark a holder paid. Call only after the release succeeded.
    pub fn mark_claimed(&mut self, holder: AccountId) {
        if let Some(position) = self.position_mut(holder) {
            position.claimed = true;
        }
        self.finish_if_settled();
    }

    /// Collateral payout owed to the creator, if they may claim now.
    ///
    /// # Errors
    /// `NotReconciled`, `NotCreator`, `AlreadyClaimed`.
    pub fn creator_claimable(&self, account: AccountId) -> Result<Decimal> {
        if !self.pool.is_reconciled() {
            return Err(RealtyError::NotReconciled(self.pool.id.clone()));
        }
        if account != self.pool.creator {
            return Err(RealtyError::NotCreator {
                property: self.pool.id.clone(),
                account,
            });
        }
        if self.pool.creator_claimed {
            return Err(RealtyError::AlreadyClaimed {
                property: self.pool.id.clone(),
                account,
            });
        }
        Ok(self.pool.creator_payout())
    }

    /// Mark the creator paid. Call only after the release succeeded.
    pub fn mark_creator_claimed(&mut self) {
        self.pool.creator_claimed = true;
        self.finish_if_settled();
    }

    /// Whether every holder and the creator have been paid.
    #[must_use]
    pub fn all_claimed(&self) -> bool {
        self.pool.creator_claimed && self.positions.iter().all(|p| p.claimed)
    }

    fn finish_if_settled(&mut self) {
        if self.pool.phase == PoolPhase::Reconciled && self.all_claimed() {
            self.pool.phase = PoolPhase::FullySettled;
            tracing::info!(
                property = %self.pool.id,
                generation = %self.pool.generation,
                "Pool fully settled"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use realty_types::{Generation, PropertyId};

    fn d(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    struct Fixture {
        generation: PoolGeneration,
        creator: AccountId,
        start: DateTime<Utc>,
        matured: DateTime<Utc>,
        config: LedgerConfig,
    }

    fn fixture(total: i64) -> Fixture {
        let config = LedgerConfig::default();
        let start = Utc::now();
        let creator = AccountId::random();
        let pool = PropertyPool::new(
            PropertyId::new("94103").unwrap(),
            Generation::FIRST,
            creator,
            start + Duration::days(30),
            d(total),
            config.collateral_for(d(total)),
            start,
        );
        Fixture {
            generation: PoolGeneration::new(pool),
            creator,
            start,
            matured: start + Duration::days(31),
            config,
        }
    }

    #[test]
    fn purchases_decrement_supply() {
        let mut f = fixture(5000);
        let a = AccountId::random();
        let b = AccountId::random();
        f.generation.open_position(a, d(1700), f.start).unwrap();
        f.generation.open_position(b, d(3300), f.start).unwrap();
        assert_eq!(f.generation.pool.amount_available, Decimal::ZERO);
        assert_eq!(f.generation.pool.holder_count, 2);
        assert_eq!(f.generation.holders(), vec![a, b]);
        assert_eq!(f.generation.pending_valuations(), 2);
    }

    #[test]
    fn over_purchase_is_rejected_without_change() {
        let mut f = fixture(5000);
        let err = f
            .generation
            .open_position(AccountId::random(), d(5001), f.start)
            .unwrap_err();
        assert!(matches!(err, RealtyError::InsufficientSupply { .. }));
        assert_eq!(f.generation.pool.amount_available, d(5000));
        assert_eq!(f.generation.pool.holder_count, 0);
    }

    #[test]
    fn second_purchase_by_same_holder_is_rejected() {
        let mut f = fixture(5000);
        let a = AccountId::random();
        f.generation.open_position(a, d(100), f.start).unwrap();
        let err = f.generation.open_position(a, d(100), f.start).unwrap_err();
        assert!(matches!(err, RealtyError::HolderExists { .. }));
        assert_eq!(f.generation.pool.amount_available, d(4900));
    }

    #[test]
    fn zero_and_late_purchases_are_rejected() {
        let mut f = fixture(5000);
        assert!(matches!(
            f.generation.open_position(AccountId::random(), Decimal::ZERO, f.start),
            Err(RealtyError::InvalidAmount(_))
        ));
        assert!(matches!(
            f.generation.open_position(AccountId::random(), d(10), f.matured),
            Err(RealtyError::PurchaseWindowClosed(_))
        ));
    }

    #[test]
    fn valuation_is_written_once() {
        let mut f = fixture(5000);
        let a = AccountId::random();
        f.generation.open_position(a, d(1000), f.start).unwrap();
        f.generation.record_valuation(a, d(10_000)).unwrap();
        assert_eq!(f.generation.position(a).unwrap().value_at_purchase, Some(d(10_000)));
        assert!(f.generation.record_valuation(a, d(11_000)).is_err());
        assert!(matches!(
            f.generation.record_valuation(AccountId::random(), d(1)),
            Err(RealtyError::NotAHolder { .. })
        ));
    }

    #[test]
    fn reconcile_preconditions() {
        let mut f = fixture(5000);
        let a = AccountId::random();
        f.generation.open_position(a, d(1000), f.start).unwrap();
        assert!(matches!(
            f.generation.check_reconcile(f.start),
            Err(RealtyError::StillActive(_))
        ));
        assert!(matches!(
            f.generation.check_reconcile(f.matured),
            Err(RealtyError::ValuationPending { pending: 1, .. })
        ));
        f.generation.record_valuation(a, d(10_000)).unwrap();
        f.generation.check_reconcile(f.matured).unwrap();
    }

    #[test]
    fn settle_allocates_credits_and_rounds_down() {
        let mut f = fixture(5000);
        let a = AccountId::random();
        let b = AccountId::random();
        f.generation.open_position(a, d(2000), f.start).unwrap();
        f.generation.open_position(b, d(3000), f.start).unwrap();
        f.generation.record_valuation(a, d(10_000)).unwrap();
        f.generation.record_valuation(b, d(10_100)).unwrap();

        f.generation.settle(&f.config, d(10_200), f.matured).unwrap();

        assert_eq!(f.generation.position(a).unwrap().credit, d(40));
        assert_eq!(f.generation.position(b).unwrap().credit, d(29));
        assert_eq!(f.generation.pool.debit, d(69));
        assert_eq!(f.generation.pool.credit, Decimal::ZERO);
        assert_eq!(f.generation.pool.phase, PoolPhase::Reconciled);
        assert_eq!(f.generation.pool.final_value, Some(d(10_200)));
    }

    #[test]
    fn settle_runs_once_and_not_before_maturity() {
        let mut f = fixture(1000);
        assert!(matches!(
            f.generation.settle(&f.config, d(1), f.start),
            Err(RealtyError::StillActive(_))
        ));
        f.generation.settle(&f.config, d(1), f.matured).unwrap();
        assert!(matches!(
            f.generation.settle(&f.config, d(1), f.matured),
            Err(RealtyError::AlreadyReconciled(_))
        ));
    }

    #[test]
    fn settle_refuses_missing_purchase_valuation() {
        let mut f = fixture(1000);
        f.generation.open_position(AccountId::random(), d(100), f.start).unwrap();
        let err = f.generation.settle(&f.config, d(1), f.matured).unwrap_err();
        assert!(matches!(err, RealtyError::ValuationPending { .. }));
        assert_eq!(f.generation.pool.phase, PoolPhase::Open);
    }

    #[test]
    fn settle_refuses_positions_that_disagree_with_sold_supply() {
        let mut f = fixture(5000);
        let a = AccountId::random();
        f.generation.open_position(a, d(1000), f.start).unwrap();
        f.generation.record_valuation(a, d(10_000)).unwrap();
        // Sold counter says 500, positions say 1000.
        f.generation.pool.amount_available = d(4500);

        let err = f.generation.settle(&f.config, d(10_100), f.matured).unwrap_err();

        assert!(matches!(err, RealtyError::ConservationViolation { .. }));
        assert_eq!(f.generation.pool.phase, PoolPhase::Open);
        assert_eq!(f.generation.pool.final_value, None);
        assert_eq!(f.generation.position(a).unwrap().credit, Decimal::ZERO);
    }

    #[test]
    fn mixed_gains_and_losses_net_against_collateral() {
        let mut f = fixture(5000);
        let a = AccountId::random();
        let b = AccountId::random();
        f.generation.open_position(a, d(1700), f.start).unwrap();
        f.generation.open_position(b, d(3300), f.start).unwrap();
        f.generation.record_valuation(a, d(10_000)).unwrap();
        f.generation.record_valuation(b, d(15_000)).unwrap();

        f.generation.settle(&f.config, d(12_000), f.matured).unwrap();

        // A: 1700 × 2000 / 10000 = 340 → capped at 170
        // B: 3300 × 3000 / 15000 = 660 → capped at 330 (loss)
        let pa = f.generation.position(a).unwrap();
        let pb = f.generation.position(b).unwrap();
        assert_eq!((pa.credit, pa.debit), (d(170), Decimal::ZERO));
        assert_eq!((pb.credit, pb.debit), (Decimal::ZERO, d(330)));
        assert_eq!(f.generation.pool.net_settlement(), d(-160));
        assert_eq!(f.generation.pool.creator_payout(), d(660));
    }

    #[test]
    fn claims_are_one_shot_and_finish_the_generation() {
        let mut f = fixture(1000);
        let a = AccountId::random();
        f.generation.open_position(a, d(1000), f.start).unwrap();
        f.generation.record_valuation(a, d(10_000)).unwrap();

        assert!(matches!(
            f.generation.claimable(a),
            Err(RealtyError::NotReconciled(_))
        ));
        f.generation.settle(&f.config, d(9_000), f.matured).unwrap();

        assert_eq!(f.generation.claimable(a).unwrap(), d(900));
        f.generation.mark_claimed(a);
        assert!(matches!(
            f.generation.claimable(a),
            Err(RealtyError::AlreadyClaimed { .. })
        ));
        assert!(matches!(
            f.generation.claimable(AccountId::random()),
            Err(RealtyError::NotAHolder { .. })
        ));
        assert_eq!(f.generation.pool.phase, PoolPhase::Reconciled);

        assert!(matches!(
            f.generation.creator_claimable(a),
            Err(RealtyError::NotCreator { .. })
        ));
        assert_eq!(f.generation.creator_claimable(f.creator).unwrap(), d(200));
        f.generation.mark_creator_claimed();
        assert!(f.generation.all_claimed());
        assert_eq!(f.generation.pool.phase, PoolPhase::FullySettled);
        assert!(matches!(
            f.generation.creator_claimable(f.creator),
            Err(RealtyError::AlreadyClaimed { .. })
        ));
    }
}
