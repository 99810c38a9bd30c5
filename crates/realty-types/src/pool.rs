//! Property pool model.
//!
//! ## State Machine (per generation)
//!
//! ```text
//!   ┌──────┐ reconcile  ┌─────────────┐ fulfill  ┌────────────┐ last claim ┌───────────────┐
//!   │ OPEN ├───────────▶│ RECONCILING ├─────────▶│ RECONCILED ├───────────▶│ FULLY_SETTLED │
//!   └──────┘  request   └─────────────┘          └────────────┘            └───────┬───────┘
//!      ▲                                                                            │
//!      └──────────────────────── re-create (next generation) ◀──────────────────────┘
//! ```
//!
//! Transitions are monotonic within a generation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, Generation, PropertyId};

/// Lifecycle phase of one pool generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolPhase {
    /// Accepting purchases until maturity.
    Open,
    /// A reconciliation valuation is in flight.
    Reconciling,
    /// Settlement computed; claims are open.
    Reconciled,
    /// Every holder and the creator have claimed.
    FullySettled,
}

impl PoolPhase {
    /// Can this phase move to `target`?
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Reconciling | Self::Reconciled)
                | (Self::Reconciling, Self::Open | Self::Reconciled)
                | (Self::Reconciled, Self::FullySettled)
        )
    }
}

impl std::fmt::Display for PoolPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Reconciling => write!(f, "RECONCILING"),
            Self::Reconciled => write!(f, "RECONCILED"),
            Self::FullySettled => write!(f, "FULLY_SETTLED"),
        }
    }
}

/// One generation of a property's share offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPool {
    /// External property key.
    pub id: PropertyId,
    /// Which create → settle cycle of `id` this is.
    pub generation: Generation,
    /// Account that escrowed the collateral.
    pub creator: AccountId,
    /// Reconciliation is permitted at or after this instant.
    pub maturity: DateTime<Utc>,
    /// Total currency value offered (fixed at creation).
    pub total_amount: Decimal,
    /// Unsold remainder, `0 ≤ amount_available ≤ total_amount`.
    pub amount_available: Decimal,
    /// Collateral escrowed from the creator.
    pub collateral: Decimal,
    /// Number of holder positions in this generation.
    pub holder_count: usize,
    /// What the creator owes holders (sum of holder credits).
    pub debit: Decimal,
    /// What holders owe the creator (sum of holder debits).
    pub credit: Decimal,
    /// Reconciliation valuation, once settled.
    pub final_value: Option<Decimal>,
    pub phase: PoolPhase,
    pub creator_claimed: bool,
    pub created_at: DateTime<Utc>,
}

impl PropertyPool {
    /// Fresh pool in the OPEN phase with the full amount available.
    #[must_use]
    pub fn new(
        id: PropertyId,
        generation: Generation,
        creator: AccountId,
        maturity: DateTime<Utc>,
        total_amount: Decimal,
        collateral: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            generation,
            creator,
            maturity,
            total_amount,
            amount_available: total_amount,
            collateral,
            holder_count: 0,
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
            final_value: None,
            phase: PoolPhase::Open,
            creator_claimed: false,
            created_at,
        }
    }

    /// Whether settlement has been computed for this generation.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.phase >= PoolPhase::Reconciled
    }

    #[must_use]
    pub fn has_matured(&self, now: DateTime<Utc>) -> bool {
        now >= self.maturity
    }

    /// Amount sold so far.
    #[must_use]
    pub fn amount_sold(&self) -> Decimal {
        self.total_amount - self.amount_available
    }

    /// Signed settlement against the creator's collateral: positive when
    /// holders gained in aggregate (the creator pays), negative otherwise.
    #[must_use]
    pub fn net_settlement(&self) -> Decimal {
        self.debit - self.credit
    }

    /// What the creator receives when claiming the collateral.
    #[must_use]
    pub fn creator_payout(&self) -> Decimal {
        self.collateral - self.net_settlement()
    }

    /// Advance the phase, refusing non-monotonic moves.
    ///
    /// # Errors
    /// Returns `Err(current)` if the transition is not allowed.
    pub fn transition(&mut self, target: PoolPhase) -> std::result::Result<(), PoolPhase> {
        if !self.phase.can_transition_to(target) {
            return Err(self.phase);
        }
        self.phase = target;
        Ok(())
    }
}
