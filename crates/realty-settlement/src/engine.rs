//! The ledger facade: create → purchase → reconcile → claim.
//!
//! Every mutating operation follows the same order while holding the
//! property's slot lock:
//!
//! 1. check preconditions (no state touched)
//! 2. call the escrow gateway
//! 3. commit the local mutation and append a receipt
//!
//! so a failed transfer leaves the ledger exactly as it was.
//!
//! ## Re-entrancy
//!
//! Slot locks are not re-entrant. A [`ValuationOracle`] must not call
//! [`TokenizedRealty::fulfill_valuation`] from inside `dispatch`; answer
//! from another task or thread (see [`realty_valuation::ChannelOracle`]).

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use realty_escrow::EscrowGateway;
use realty_types::{
    constants, AccountId, Clock, CorrelationId, HolderPosition, LedgerConfig, OracleConfig,
    PendingValuation, PoolPhase, PropertyId, PropertyPool, RealtyError, Receipt, ReceiptType,
    Result, SystemClock, ValuationPurpose, ValuationReport,
};
use realty_valuation::{ValuationCoordinator, ValuationOracle};
use rust_decimal::Decimal;

use crate::audit::ReceiptLog;
use crate::ledger::PoolGeneration;
use crate::registry::{PoolSlot, PropertyRegistry};

/// Tokenized realty ledger.
pub struct TokenizedRealty {
    config: LedgerConfig,
    registry: PropertyRegistry,
    valuations: ValuationCoordinator,
    escrow: Arc<dyn EscrowGateway>,
    clock: Arc<dyn Clock>,
    receipts: ReceiptLog,
}

impl TokenizedRealty {
    /// Build a ledger on the wall clock.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate.
    pub fn new(
        config: LedgerConfig,
        escrow: Arc<dyn EscrowGateway>,
        oracle: Arc<dyn ValuationOracle>,
    ) -> Result<Self> {
        Self::with_clock(config, escrow, oracle, Arc::new(SystemClock))
    }

    /// Build a ledger on an explicit clock.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate.
    pub fn with_clock(
        config: LedgerConfig,
        escrow: Arc<dyn EscrowGateway>,
        oracle: Arc<dyn ValuationOracle>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let valuations = ValuationCoordinator::new(oracle, config.oracle.clone())?;
        tracing::info!(
            currency = %config.currency,
            currency_scale = config.currency_scale,
            collateral_bps = config.collateral_bps,
            job_id = %config.oracle.job_id,
            "Tokenized realty ledger started"
        );
        Ok(Self {
            config,
            registry: PropertyRegistry::new(),
            valuations,
            escrow,
            clock,
            receipts: ReceiptLog::new(),
        })
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Create a pool for `id`, escrowing the creator's collateral.
    ///
    /// # Errors
    /// - `InvalidPool` if `total_amount` is not in `(0, MAX_POOL_AMOUNT]` or
    ///   `maturity` is not in the future
    /// - `DuplicateProperty` if a generation of `id` is not yet fully settled
    /// - escrow errors from `hold_from` (nothing is inserted)
    pub fn create_property_tokens(
        &self,
        creator: AccountId,
        id: PropertyId,
        maturity: DateTime<Utc>,
        total_amount: Decimal,
    ) -> Result<PropertyPool> {
        let now = self.clock.now();
        if total_amount <= Decimal::ZERO {
            return Err(RealtyError::InvalidPool {
                reason: format!("total amount {total_amount} must be positive"),
            });
        }
        if total_amount > Decimal::from(constants::MAX_POOL_AMOUNT) {
            return Err(RealtyError::InvalidPool {
                reason: format!(
                    "total amount {total_amount} exceeds {}",
                    constants::MAX_POOL_AMOUNT
                ),
            });
        }
        if maturity <= now {
            return Err(RealtyError::InvalidPool {
                reason: format!("maturity {maturity} is not after {now}"),
            });
        }

        let slot = self.registry.slot_or_insert(&id);
        let created = self.install_pool(&slot, creator, &id, maturity, total_amount, now);
        if created.is_err() {
            drop(slot);
            self.registry.discard_if_empty(&id);
        }
        created
    }

    fn install_pool(
        &self,
        slot: &Mutex<PoolSlot>,
        creator: AccountId,
        id: &PropertyId,
        maturity: DateTime<Utc>,
        total_amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PropertyPool> {
        let collateral = self.config.collateral_for(total_amount);
        let mut slot = slot.lock();
        slot.check_vacant(id)?;
        let generation = slot.next_generation();

        if collateral > Decimal::ZERO {
            self.escrow
                .hold_from(creator, collateral)
                .inspect_err(|err| {
                    tracing::warn!(property = %id, creator = %creator.short(), error = %err, "Collateral hold failed");
                })?;
        }

        let pool = PropertyPool::new(
            id.clone(),
            generation,
            creator,
            maturity,
            total_amount,
            collateral,
            now,
        );
        slot.install(pool.clone());
        self.receipts.append(
            ReceiptType::PoolCreated,
            &pool.id,
            generation,
            Some(creator),
            collateral,
            now,
        );

        tracing::info!(
            property = %pool.id,
            %generation,
            creator = %creator.short(),
            %total_amount,
            %collateral,
            %maturity,
            "Pool created"
        );
        Ok(pool)
    }

    /// Buy `amount` of `id`, escrowing it and requesting the purchase-time
    /// valuation. The position stays provisional until the valuation lands.
    ///
    /// # Errors
    /// - `PropertyNotFound`, `InvalidAmount`, `PurchaseWindowClosed`,
    ///   `HolderExists`, `InsufficientSupply`
    /// - escrow errors from `hold_from`
    /// - `OracleUnavailable` if dispatch failed (the hold is refunded)
    /// - `EscrowFailed` naming the stranded amount if dispatch failed and
    ///   the refund failed too
    pub fn purchase_property_tokens(
        &self,
        holder: AccountId,
        id: &PropertyId,
        amount: Decimal,
    ) -> Result<CorrelationId> {
        let now = self.clock.now();
        let slot = self.registry.slot(id)?;
        let mut slot = slot.lock();
        let generation = slot.live_mut(id)?;
        generation.check_purchase(holder, amount, now)?;

        self.escrow.hold_from(holder, amount).inspect_err(|err| {
            tracing::warn!(property = %id, holder = %holder.short(), error = %err, "Purchase hold failed");
        })?;

        let purpose = ValuationPurpose::Purchase { holder };
        let correlation_id =
            match self
                .valuations
                .request(id, generation.pool.generation, purpose, now)
            {
                Ok(correlation_id) => correlation_id,
                Err(err) => {
                    if let Err(refund) = self.escrow.release_to(holder, amount) {
                        tracing::error!(
                            property = %id,
                            holder = %holder.short(),
                            %amount,
                            dispatch_error = %err,
                            error = %refund,
                            "Purchase funds stranded in escrow"
                        );
                        return Err(RealtyError::EscrowFailed {
                            reason: format!(
                                "{amount} held from {holder} for {id} is stranded in escrow: \
                                 valuation dispatch failed ({err}), refund failed ({refund})"
                            ),
                        });
                    }
                    return Err(err);
                }
            };

        generation.commit_purchase(holder, amount, now);
        self.receipts.append(
            ReceiptType::PositionOpened,
            id,
            generation.pool.generation,
            Some(holder),
            amount,
            now,
        );

        tracing::info!(
            property = %id,
            generation = %generation.pool.generation,
            holder = %holder.short(),
            %amount,
            available = %generation.pool.amount_available,
            %correlation_id,
            "Position opened"
        );
        Ok(correlation_id)
    }

    /// Request the maturity valuation for `id`. Settlement runs when it
    /// is fulfilled.
    ///
    /// # Errors
    /// - `PropertyNotFound`
    /// - `AlreadyReconciled`, `RequestInFlight`, `StillActive`, `ValuationPending`
    /// - `OracleUnavailable` if dispatch failed (the pool stays open)
    pub fn reconcile_property_tokens(&self, id: &PropertyId) -> Result<CorrelationId> {
        let now = self.clock.now();
        let slot = self.registry.slot(id)?;
        let mut slot = slot.lock();
        let generation = slot.live_mut(id)?;
        generation.check_reconcile(now)?;
        transition(generation, PoolPhase::Reconciling)?;

        let correlation_id = match self.valuations.request(
            id,
            generation.pool.generation,
            ValuationPurpose::Reconciliation,
            now,
        ) {
            Ok(correlation_id) => correlation_id,
            Err(err) => {
                transition(generation, PoolPhase::Open)?;
                return Err(err);
            }
        };

        tracing::info!(
            property = %id,
            generation = %generation.pool.generation,
            holders = generation.pool.holder_count,
            %correlation_id,
            "Reconciliation requested"
        );
        Ok(correlation_id)
    }

    /// Pay a holder `principal + credit − debit`.
    ///
    /// # Errors
    /// - `PropertyNotFound`, `NotReconciled`, `NotAHolder`, `AlreadyClaimed`
    /// - escrow errors from `release_to` (the claim stays open)
    pub fn claim_property_token_earnings(
        &self,
        holder: AccountId,
        id: &PropertyId,
    ) -> Result<Decimal> {
        let now = self.clock.now();
        let slot = self.registry.slot(id)?;
        let mut slot = slot.lock();
        let generation = slot.live_mut(id)?;
        let payout = generation.claimable(holder)?;

        self.escrow.release_to(holder, payout).inspect_err(|err| {
            tracing::warn!(property = %id, holder = %holder.short(), error = %err, "Payout release failed");
        })?;

        generation.mark_claimed(holder);
        self.receipts.append(
            ReceiptType::EarningsClaimed,
            id,
            generation.pool.generation,
            Some(holder),
            payout,
            now,
        );
        tracing::info!(property = %id, holder = %holder.short(), %payout, "Earnings claimed");
        Ok(payout)
    }

    /// Pay the creator `collateral − debit + credit`.
    ///
    /// # Errors
    /// - `PropertyNotFound`, `NotReconciled`, `NotCreator`, `AlreadyClaimed`
    /// - escrow errors from `release_to` (the claim stays open)
    pub fn claim_creator_collateral(&self, creator: AccountId, id: &PropertyId) -> Result<Decimal> {
        let now = self.clock.now();
        let slot = self.registry.slot(id)?;
        let mut slot = slot.lock();
        let generation = slot.live_mut(id)?;
        let payout = generation.creator_claimable(creator)?;

        self.escrow.release_to(creator, payout).inspect_err(|err| {
            tracing::warn!(property = %id, creator = %creator.short(), error = %err, "Collateral release failed");
        })?;

        generation.mark_creator_claimed();
        self.receipts.append(
            ReceiptType::CollateralClaimed,
            id,
            generation.pool.generation,
            Some(creator),
            payout,
            now,
        );
        tracing::info!(property = %id, creator = %creator.short(), %payout, "Collateral claimed");
        Ok(payout)
    }

    // -----------------------------------------------------------------
    // Oracle callbacks
    // -----------------------------------------------------------------

    /// Deliver a valuation for an outstanding request.
    ///
    /// If the value cannot be applied the request is put back so the
    /// oracle may answer again.
    ///
    /// # Errors
    /// - `UnknownCorrelation` if nothing is pending under `correlation_id`
    /// - `InvalidValuation` if `value <= 0`
    /// - whatever applying the value returns (settlement errors)
    pub fn fulfill_valuation(&self, correlation_id: CorrelationId, value: Decimal) -> Result<()> {
        let target = self.valuations.lookup(correlation_id)?;
        let slot = self.registry.slot(&target.property_id)?;
        let mut slot = slot.lock();
        // Consume under the slot lock so a concurrent duplicate loses.
        let pending = self.valuations.take(correlation_id, value)?;
        let now = self.clock.now();

        let generation = slot.live_mut(&pending.property_id)?;
        if generation.pool.generation != pending.generation {
            tracing::error!(
                %correlation_id,
                property = %pending.property_id,
                requested_for = %pending.generation,
                current = %generation.pool.generation,
                "Fulfillment for a retired generation"
            );
            return Err(RealtyError::UnknownCorrelation(correlation_id));
        }

        if let Err(err) = self.apply_valuation(generation, &pending, value, now) {
            tracing::warn!(%correlation_id, error = %err, "Valuation not applied, request kept pending");
            self.valuations.restore(pending);
            return Err(err);
        }
        Ok(())
    }

    /// Verify an oracle-signed report, then deliver it.
    ///
    /// # Errors
    /// `UnauthorizedOracle` on a bad signature, else as [`Self::fulfill_valuation`].
    pub fn fulfill_signed_valuation(&self, report: &ValuationReport) -> Result<()> {
        self.valuations.verify_report(report)?;
        self.fulfill_valuation(report.correlation_id, report.value)
    }

    fn apply_valuation(
        &self,
        generation: &mut PoolGeneration,
        pending: &PendingValuation,
        value: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let pool_generation = generation.pool.generation;
        match pending.purpose {
            ValuationPurpose::Purchase { holder } => {
                generation.record_valuation(holder, value)?;
                self.receipts.append(
                    ReceiptType::ValuationRecorded,
                    &pending.property_id,
                    pool_generation,
                    Some(holder),
                    value,
                    now,
                );
                tracing::debug!(
                    property = %pending.property_id,
                    holder = %holder.short(),
                    %value,
                    "Purchase valuation recorded"
                );
            }
            ValuationPurpose::Reconciliation => {
                generation.settle(&self.config, value, now)?;
                self.receipts.append(
                    ReceiptType::PoolReconciled,
                    &pending.property_id,
                    pool_generation,
                    None,
                    value,
                    now,
                );
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Current generation of `id`.
    ///
    /// # Errors
    /// `PropertyNotFound`.
    pub fn get_property_token(&self, id: &PropertyId) -> Result<PropertyPool> {
        self.registry.get_pool(id)
    }

    /// Every property id with a pool, sorted.
    #[must_use]
    pub fn get_property_token_list(&self) -> Vec<PropertyId> {
        self.registry.list_pool_ids()
    }

    /// Holders of the current generation, in purchase order.
    ///
    /// # Errors
    /// `PropertyNotFound`.
    pub fn get_holders_for_token(&self, id: &PropertyId) -> Result<Vec<AccountId>> {
        let slot = self.registry.slot(id)?;
        let slot = slot.lock();
        Ok(slot.live(id)?.holders())
    }

    /// One holder's position in the current generation.
    ///
    /// # Errors
    /// `PropertyNotFound`, `NotAHolder`.
    pub fn get_holder_for_address(
        &self,
        holder: AccountId,
        id: &PropertyId,
    ) -> Result<HolderPosition> {
        let slot = self.registry.slot(id)?;
        let slot = slot.lock();
        slot.live(id)?
            .position(holder)
            .cloned()
            .ok_or_else(|| RealtyError::NotAHolder {
                property: id.clone(),
                holder,
            })
    }

    /// Archived generations of `id`, oldest first.
    ///
    /// # Errors
    /// `PropertyNotFound`.
    pub fn pool_history(&self, id: &PropertyId) -> Result<Vec<PropertyPool>> {
        self.registry.pool_history(id)
    }

    /// Audit receipts for `id`, in commit order.
    #[must_use]
    pub fn receipts(&self, id: &PropertyId) -> Vec<Receipt> {
        self.receipts.for_property(id)
    }

    /// Valuation requests awaiting fulfillment.
    #[must_use]
    pub fn pending_valuations(&self) -> Vec<PendingValuation> {
        self.valuations.pending()
    }

    #[must_use]
    pub fn oracle_config(&self) -> &OracleConfig {
        self.valuations.config()
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

fn transition(generation: &mut PoolGeneration, target: PoolPhase) -> Result<()> {
    generation
        .pool
        .transition(target)
        .map_err(|current| RealtyError::InvalidPool {
            reason: format!(
                "{} cannot move from {current} to {target}",
                generation.pool.id
            ),
        })
}

impl fmt::Debug for TokenizedRealty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizedRealty")
            .field("config", &self.config)
            .field("pools", &self.registry.len())
            .field("valuations", &self.valuations)
            .field("receipts", &self.receipts.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use realty_escrow::InMemoryEscrow;
    use realty_types::ManualClock;
    use realty_valuation::RecordingOracle;

    fn d(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    struct Harness {
        ledger: TokenizedRealty,
        escrow: Arc<InMemoryEscrow>,
        oracle: Arc<RecordingOracle>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let escrow = Arc::new(InMemoryEscrow::new());
        let oracle = Arc::new(RecordingOracle::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ledger = TokenizedRealty::with_clock(
            LedgerConfig::default(),
            escrow.clone(),
            oracle.clone(),
            clock.clone(),
        )
        .unwrap();
        Harness {
            ledger,
            escrow,
            oracle,
            clock,
        }
    }

    fn funded(escrow: &InMemoryEscrow, amount: i64) -> AccountId {
        let account = AccountId::random();
        escrow.deposit(account, d(amount));
        escrow.request_allowance(account, d(amount));
        account
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = LedgerConfig {
            collateral_bps: 0,
            ..LedgerConfig::default()
        };
        let err = TokenizedRealty::new(
            config,
            Arc::new(InMemoryEscrow::new()),
            Arc::new(RecordingOracle::new()),
        )
        .unwrap_err();
        assert!(matches!(err, RealtyError::Configuration(_)));
    }

    #[test]
    fn create_validates_inputs() {
        let h = harness();
        let creator = funded(&h.escrow, 1000);
        let id = PropertyId::new("73301").unwrap();
        let now = h.clock.now();
        assert!(matches!(
            h.ledger.create_property_tokens(creator, id.clone(), now + Duration::days(1), Decimal::ZERO),
            Err(RealtyError::InvalidPool { .. })
        ));
        assert!(matches!(
            h.ledger.create_property_tokens(creator, id.clone(), now, d(100)),
            Err(RealtyError::InvalidPool { .. })
        ));
        assert!(h.ledger.get_property_token_list().is_empty());
        assert_eq!(h.escrow.escrowed(), Decimal::ZERO);
    }

    #[test]
    fn failed_dispatch_refunds_purchase() {
        let h = harness();
        let creator = funded(&h.escrow, 1000);
        let holder = funded(&h.escrow, 500);
        let id = PropertyId::new("73301").unwrap();
        h.ledger
            .create_property_tokens(creator, id.clone(), h.clock.now() + Duration::days(1), d(1000))
            .unwrap();

        h.oracle.set_unavailable(true);
        let err = h.ledger.purchase_property_tokens(holder, &id, d(500)).unwrap_err();
        assert!(matches!(err, RealtyError::OracleUnavailable { .. }));

        let pool = h.ledger.get_property_token(&id).unwrap();
        assert_eq!(pool.amount_available, d(1000));
        assert_eq!(pool.holder_count, 0);
        assert_eq!(h.escrow.balance_of(holder), d(500));
        h.escrow.verify_supply().unwrap();
    }

    #[test]
    fn failed_dispatch_with_failed_refund_reports_stranded_funds() {
        let h = harness();
        let creator = funded(&h.escrow, 1000);
        let holder = funded(&h.escrow, 500);
        let id = PropertyId::new("73301").unwrap();
        h.ledger
            .create_property_tokens(creator, id.clone(), h.clock.now() + Duration::days(1), d(1000))
            .unwrap();

        h.oracle.set_unavailable(true);
        h.escrow.set_fail_releases(true);
        let err = h.ledger.purchase_property_tokens(holder, &id, d(500)).unwrap_err();

        let RealtyError::EscrowFailed { reason } = &err else {
            panic!("expected EscrowFailed, got {err}");
        };
        assert!(reason.contains("500"));
        assert!(reason.contains(&holder.to_string()));
        assert!(reason.contains("stranded"));

        let pool = h.ledger.get_property_token(&id).unwrap();
        assert_eq!(pool.holder_count, 0);
        assert_eq!(pool.amount_available, d(1000));
        assert!(h.ledger.pending_valuations().is_empty());
        assert_eq!(h.escrow.escrowed(), d(600));
        h.escrow.verify_supply().unwrap();
    }

    #[test]
    fn failed_collateral_hold_leaves_no_slot_behind() {
        let h = harness();
        let creator = funded(&h.escrow, 1000);
        let id = PropertyId::new("73301").unwrap();
        let maturity = h.clock.now() + Duration::days(1);

        h.escrow.set_fail_holds(true);
        for _ in 0..3 {
            assert!(matches!(
                h.ledger.create_property_tokens(creator, id.clone(), maturity, d(1000)),
                Err(RealtyError::EscrowFailed { .. })
            ));
        }
        assert!(matches!(
            h.ledger.registry.slot(&id),
            Err(RealtyError::PropertyNotFound(_))
        ));

        h.escrow.set_fail_holds(false);
        h.ledger
            .create_property_tokens(creator, id.clone(), maturity, d(1000))
            .unwrap();
        assert_eq!(h.ledger.get_property_token_list(), vec![id]);
    }

    #[test]
    fn oversized_pool_is_rejected() {
        let h = harness();
        let creator = funded(&h.escrow, 1000);
        let too_big = Decimal::from(constants::MAX_POOL_AMOUNT) + Decimal::ONE;
        assert!(matches!(
            h.ledger.create_property_tokens(
                creator,
                PropertyId::new("73301").unwrap(),
                h.clock.now() + Duration::days(1),
                too_big,
            ),
            Err(RealtyError::InvalidPool { .. })
        ));
        assert!(h.ledger.get_property_token_list().is_empty());
    }

    #[test]
    fn failed_settlement_keeps_reconciliation_pending() {
        let h = harness();
        let creator = funded(&h.escrow, 1000);
        let holder = funded(&h.escrow, 500);
        let id = PropertyId::new("73301").unwrap();
        h.ledger
            .create_property_tokens(creator, id.clone(), h.clock.now() + Duration::days(1), d(1000))
            .unwrap();
        let purchase = h.ledger.purchase_property_tokens(holder, &id, d(500)).unwrap();
        h.ledger.fulfill_valuation(purchase, d(1)).unwrap();

        h.clock.advance(Duration::days(2));
        let reconcile = h.ledger.reconcile_property_tokens(&id).unwrap();

        // 500 × (MAX − 1) / 1 overflows the allocation arithmetic.
        let err = h.ledger.fulfill_valuation(reconcile, Decimal::MAX).unwrap_err();
        assert!(matches!(err, RealtyError::InvalidValuation(_)));
        let pending = h.ledger.pending_valuations();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].correlation_id, reconcile);
        assert_eq!(pending[0].purpose, ValuationPurpose::Reconciliation);
        let pool = h.ledger.get_property_token(&id).unwrap();
        assert_eq!(pool.phase, PoolPhase::Reconciling);
        assert_eq!(pool.final_value, None);

        // The oracle may answer again.
        h.ledger.fulfill_valuation(reconcile, d(1)).unwrap();
        assert_eq!(h.ledger.get_property_token(&id).unwrap().phase, PoolPhase::Reconciled);
        assert!(h.ledger.pending_valuations().is_empty());
    }

    #[test]
    fn failed_reconcile_dispatch_reopens_pool() {
        let h = harness();
        let creator = funded(&h.escrow, 1000);
        let id = PropertyId::new("73301").unwrap();
        h.ledger
            .create_property_tokens(creator, id.clone(), h.clock.now() + Duration::days(1), d(1000))
            .unwrap();
        h.clock.advance(Duration::days(2));

        h.oracle.set_unavailable(true);
        assert!(h.ledger.reconcile_property_tokens(&id).is_err());
        assert_eq!(h.ledger.get_property_token(&id).unwrap().phase, PoolPhase::Open);

        h.oracle.set_unavailable(false);
        h.ledger.reconcile_property_tokens(&id).unwrap();
        assert_eq!(
            h.ledger.get_property_token(&id).unwrap().phase,
            PoolPhase::Reconciling
        );
        assert!(matches!(
            h.ledger.reconcile_property_tokens(&id),
            Err(RealtyError::RequestInFlight { .. })
        ));
    }

    #[test]
    fn unknown_property_is_not_found() {
        let h = harness();
        let id = PropertyId::new("00000").unwrap();
        assert!(matches!(
            h.ledger.purchase_property_tokens(AccountId::random(), &id, d(1)),
            Err(RealtyError::PropertyNotFound(_))
        ));
        assert!(matches!(
            h.ledger.get_holders_for_token(&id),
            Err(RealtyError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn oracle_config_is_exposed() {
        let h = harness();
        assert_eq!(h.ledger.oracle_config().job_id, OracleConfig::default().job_id);
        assert!(format!("{:?}", h.ledger).contains("TokenizedRealty"));
    }
}
