//! Error types for the tokenized realty ledger.
//!
//! All errors use the `RT_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by category:
//! - 1xx: Conflict (duplicate or repeated one-shot operations)
//! - 2xx: Precondition (lifecycle ordering, supply)
//! - 3xx: Authorization
//! - 4xx: Integrity (protocol or accounting violations)
//! - 5xx: Collaborator failures (escrow, oracle)
//! - 9xx: Validation / configuration / internal

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, CorrelationId, PropertyId};

/// Broad category of a [`RealtyError`], used by callers to decide how to
/// surface or react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Conflict,
    Precondition,
    Authorization,
    Integrity,
    Collaborator,
    Validation,
}

/// Central error enum for all ledger operations.
#[derive(Debug, Error)]
pub enum RealtyError {
    // =================================================================
    // Conflict (1xx)
    // =================================================================
    /// A live (not fully settled) pool already exists under this id.
    #[error("RT_ERR_100: Property already has an active pool: {0}")]
    DuplicateProperty(PropertyId),

    /// The holder already bought into this pool generation.
    #[error("RT_ERR_101: Holder {holder} already has a position in {property}")]
    HolderExists {
        property: PropertyId,
        holder: AccountId,
    },

    /// A valuation request for the same key is still outstanding.
    #[error("RT_ERR_102: Valuation request already in flight: {key}")]
    RequestInFlight { key: String },

    /// The pool generation has already been reconciled.
    #[error("RT_ERR_103: Property already reconciled: {0}")]
    AlreadyReconciled(PropertyId),

    /// The position (or creator collateral) was already paid out.
    #[error("RT_ERR_104: Already claimed: {account} in {property}")]
    AlreadyClaimed {
        property: PropertyId,
        account: AccountId,
    },

    // =================================================================
    // Precondition (2xx)
    // =================================================================
    /// Reconciliation attempted before the pool matured.
    #[error("RT_ERR_200: Property still active until maturity: {0}")]
    StillActive(PropertyId),

    /// Claim attempted before reconciliation completed.
    #[error("RT_ERR_201: Property not reconciled: {0}")]
    NotReconciled(PropertyId),

    /// Not enough unsold supply to fill the purchase.
    #[error("RT_ERR_202: Insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply {
        requested: Decimal,
        available: Decimal,
    },

    /// Some purchase-time valuations have not been fulfilled yet.
    #[error("RT_ERR_203: {pending} purchase valuation(s) still pending for {property}")]
    ValuationPending { property: PropertyId, pending: usize },

    /// Purchases are only accepted while the pool is open and not matured.
    #[error("RT_ERR_204: Purchase window closed for {0}")]
    PurchaseWindowClosed(PropertyId),

    /// No pool has ever been created under this id.
    #[error("RT_ERR_205: Property not found: {0}")]
    PropertyNotFound(PropertyId),

    // =================================================================
    // Authorization (3xx)
    // =================================================================
    /// The account holds no position in this pool generation.
    #[error("RT_ERR_300: {holder} is not a holder of {property}")]
    NotAHolder {
        property: PropertyId,
        holder: AccountId,
    },

    /// Only the pool creator may claim the collateral.
    #[error("RT_ERR_301: {account} is not the creator of {property}")]
    NotCreator {
        property: PropertyId,
        account: AccountId,
    },

    /// A valuation report was not signed by the configured oracle.
    #[error("RT_ERR_302: Unauthorized oracle: {reason}")]
    UnauthorizedOracle { reason: String },

    // =================================================================
    // Integrity (4xx)
    // =================================================================
    /// Fulfillment for a correlation id with no pending request.
    #[error("RT_ERR_400: Unknown correlation id: {0}")]
    UnknownCorrelation(CorrelationId),

    /// Escrowed funds and computed payouts do not balance.
    #[error("RT_ERR_401: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Collaborator (5xx)
    // =================================================================
    /// The payer has not approved enough currency for the hold.
    #[error("RT_ERR_500: Insufficient allowance: need {needed}, approved {approved}")]
    InsufficientAllowance { needed: Decimal, approved: Decimal },

    /// The payer's balance cannot cover the hold.
    #[error("RT_ERR_501: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// The escrow gateway rejected the transfer.
    #[error("RT_ERR_502: Escrow transfer failed: {reason}")]
    EscrowFailed { reason: String },

    /// The valuation request could not be handed to the oracle.
    #[error("RT_ERR_503: Oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    // =================================================================
    // Validation / Config / Internal (9xx)
    // =================================================================
    /// Pool creation parameters are invalid.
    #[error("RT_ERR_900: Invalid pool: {reason}")]
    InvalidPool { reason: String },

    /// Amount must be strictly positive.
    #[error("RT_ERR_901: Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Valuation must be strictly positive.
    #[error("RT_ERR_902: Invalid valuation: {0}")]
    InvalidValuation(Decimal),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("RT_ERR_903: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("RT_ERR_904: Serialization error: {0}")]
    Serialization(String),
}

impl RealtyError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateProperty(_)
            | Self::HolderExists { .. }
            | Self::RequestInFlight { .. }
            | Self::AlreadyReconciled(_)
            | Self::AlreadyClaimed { .. } => ErrorKind::Conflict,
            Self::StillActive(_)
            | Self::NotReconciled(_)
            | Self::InsufficientSupply { .. }
            | Self::ValuationPending { .. }
            | Self::PurchaseWindowClosed(_)
            | Self::PropertyNotFound(_) => ErrorKind::Precondition,
            Self::NotAHolder { .. } | Self::NotCreator { .. } | Self::UnauthorizedOracle { .. } => {
                ErrorKind::Authorization
            }
            Self::UnknownCorrelation(_) | Self::ConservationViolation { .. } => {
                ErrorKind::Integrity
            }
            Self::InsufficientAllowance { .. }
            | Self::InsufficientBalance { .. }
            | Self::EscrowFailed { .. }
            | Self::OracleUnavailable { .. } => ErrorKind::Collaborator,
            Self::InvalidPool { .. }
            | Self::InvalidAmount(_)
            | Self::InvalidValuation(_)
            | Self::Configuration(_)
            | Self::Serialization(_) => ErrorKind::Validation,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RealtyError>;

impl From<serde_json::Error> for RealtyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> PropertyId {
        PropertyId::new("10001").unwrap()
    }

    #[test]
    fn error_display_contains_prefix() {
        let err = RealtyError::DuplicateProperty(pid());
        let msg = format!("{err}");
        assert!(msg.starts_with("RT_ERR_100"), "Got: {msg}");
        assert!(msg.contains("10001"));
    }

    #[test]
    fn insufficient_supply_display() {
        let err = RealtyError::InsufficientSupply {
            requested: Decimal::new(600, 0),
            available: Decimal::new(500, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("RT_ERR_202"));
        assert!(msg.contains("600"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn kinds_follow_taxonomy() {
        let holder = AccountId::from_bytes([7u8; 20]);
        assert_eq!(
            RealtyError::HolderExists { property: pid(), holder }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(RealtyError::StillActive(pid()).kind(), ErrorKind::Precondition);
        assert_eq!(
            RealtyError::NotAHolder { property: pid(), holder }.kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            RealtyError::UnknownCorrelation(CorrelationId::new()).kind(),
            ErrorKind::Integrity
        );
        assert_eq!(
            RealtyError::EscrowFailed { reason: "down".into() }.kind(),
            ErrorKind::Collaborator
        );
    }

    #[test]
    fn all_errors_have_rt_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(RealtyError::NotReconciled(pid())),
            Box::new(RealtyError::InvalidAmount(Decimal::ZERO)),
            Box::new(RealtyError::OracleUnavailable { reason: "closed".into() }),
            Box::new(RealtyError::Configuration("bad".into())),
            Box::new(RealtyError::ConservationViolation { reason: "x".into() }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("RT_ERR_"),
                "Error missing RT_ERR_ prefix: {msg}"
            );
        }
    }
}
