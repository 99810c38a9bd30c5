//! Receipt types for the ledger's audit trail.
//!
//! Every committed mutation (pool created, position opened, valuation
//! stamped, reconciliation, payout) produces a [`Receipt`] whose payload
//! hash can be recomputed independently.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, Generation, PropertyId, constants};

/// The type of action this receipt proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptType {
    /// A pool generation was created and collateral escrowed.
    PoolCreated,
    /// A holder bought shares and their principal was escrowed.
    PositionOpened,
    /// A purchase-time valuation was stamped on a position.
    ValuationRecorded,
    /// Settlement was computed for a pool generation.
    PoolReconciled,
    /// A holder was paid out.
    EarningsClaimed,
    /// The creator's collateral was paid out.
    CollateralClaimed,
}

impl std::fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PoolCreated => write!(f, "POOL_CREATED"),
            Self::PositionOpened => write!(f, "POSITION_OPENED"),
            Self::ValuationRecorded => write!(f, "VALUATION_RECORDED"),
            Self::PoolReconciled => write!(f, "POOL_RECONCILED"),
            Self::EarningsClaimed => write!(f, "EARNINGS_CLAIMED"),
            Self::CollateralClaimed => write!(f, "COLLATERAL_CLAIMED"),
        }
    }
}

/// Append-only audit record of one committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_type: ReceiptType,
    pub property_id: PropertyId,
    pub generation: Generation,
    /// The participant the action concerns, if any.
    pub account: Option<AccountId>,
    /// Currency amount (or valuation) the action moved or recorded.
    pub amount: Decimal,
    /// Position of this receipt in the ledger's log.
    pub sequence: u64,
    /// SHA-256 over the canonical payload.
    pub payload_hash: [u8; 32],
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    #[must_use]
    pub fn new(
        receipt_type: ReceiptType,
        property_id: PropertyId,
        generation: Generation,
        account: Option<AccountId>,
        amount: Decimal,
        sequence: u64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let payload_hash = Self::compute_hash(
            receipt_type,
            &property_id,
            generation,
            account.as_ref(),
            amount,
            sequence,
        );
        Self {
            receipt_type,
            property_id,
            generation,
            account,
            amount,
            sequence,
            payload_hash,
            issued_at,
        }
    }

    /// Canonical hash:
    /// `SHA-256("tokenized-realty:receipt:v1:" || type || property || generation || account || amount || sequence)`
    #[must_use]
    pub fn compute_hash(
        receipt_type: ReceiptType,
        property_id: &PropertyId,
        generation: Generation,
        account: Option<&AccountId>,
        amount: Decimal,
        sequence: u64,
    ) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(constants::RECEIPT_DOMAIN);
        hasher.update(receipt_type.to_string().as_bytes());
        hasher.update(property_id.as_str().as_bytes());
        hasher.update(generation.0.to_le_bytes());
        match account {
            Some(a) => hasher.update(a.as_bytes()),
            None => hasher.update([0u8; 20]),
        }
        hasher.update(amount.normalize().to_string().as_bytes());
        hasher.update(sequence.to_le_bytes());
        hasher.finalize().into()
    }

    /// Recompute the payload hash and compare.
    #[must_use]
    pub fn verify(&self) -> bool {
        Self::compute_hash(
            self.receipt_type,
            &self.property_id,
            self.generation,
            self.account.as_ref(),
            self.amount,
            self.sequence,
        ) == self.payload_hash
    }

    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.payload_hash)
    }
}
