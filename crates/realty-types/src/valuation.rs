//! Valuation request/response types exchanged with the price oracle.
//!
//! Every outbound [`ValuationRequest`] carries a [`CorrelationId`]; the
//! oracle answers with that id and a value, optionally as a signed
//! [`ValuationReport`].

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, CorrelationId, Generation, PropertyId, RealtyError, Result, constants};

/// What a valuation will be used for once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValuationPurpose {
    /// Stamp `value_at_purchase` on this holder's position.
    Purchase { holder: AccountId },
    /// Run settlement for the pool.
    Reconciliation,
}

impl std::fmt::Display for ValuationPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Purchase { holder } => write!(f, "PURCHASE({})", holder.short()),
            Self::Reconciliation => write!(f, "RECONCILIATION"),
        }
    }
}

/// Correlation record kept until the matching fulfillment arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingValuation {
    pub correlation_id: CorrelationId,
    pub property_id: PropertyId,
    pub generation: Generation,
    pub purpose: ValuationPurpose,
    pub requested_at: DateTime<Utc>,
}

/// Message handed to the oracle collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub correlation_id: CorrelationId,
    pub property_id: PropertyId,
    pub purpose: ValuationPurpose,
    /// Oracle job to run.
    pub job_id: String,
    /// Fee attached to the request.
    pub fee: Decimal,
    pub requested_at: DateTime<Utc>,
}

/// A fulfillment signed by the oracle's ed25519 key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub correlation_id: CorrelationId,
    pub value: Decimal,
    pub signature: Vec<u8>,
}

impl ValuationReport {
    /// Canonical signing payload.
    ///
    /// Format: `"tokenized-realty:valuation:v1:" || correlation_id || value`
    #[must_use]
    pub fn signing_payload(correlation_id: CorrelationId, value: Decimal) -> Vec<u8> {
        let value = value.normalize().to_string();
        let mut payload = Vec::with_capacity(constants::VALUATION_REPORT_DOMAIN.len() + 16 + value.len());
        payload.extend_from_slice(constants::VALUATION_REPORT_DOMAIN);
        payload.extend_from_slice(correlation_id.0.as_bytes());
        payload.extend_from_slice(value.as_bytes());
        payload
    }

    /// Sign a fulfillment (oracle side).
    #[must_use]
    pub fn sign(key: &SigningKey, correlation_id: CorrelationId, value: Decimal) -> Self {
        let signature = key.sign(&Self::signing_payload(correlation_id, value));
        Self {
            correlation_id,
            value,
            signature: signature.to_bytes().to_vec(),
        }
    }

    /// Check the signature against the configured oracle key.
    ///
    /// # Errors
    /// Returns [`RealtyError::UnauthorizedOracle`] if the signature is
    /// malformed or was not produced by `key`.
    pub fn verify(&self, key: &VerifyingKey) -> Result<()> {
        let signature = Signature::from_slice(&self.signature).map_err(|e| {
            RealtyError::UnauthorizedOracle {
                reason: format!("malformed signature on {}: {e}", self.correlation_id),
            }
        })?;
        key.verify(
            &Self::signing_payload(self.correlation_id, self.value),
            &signature,
        )
        .map_err(|_| RealtyError::UnauthorizedOracle {
            reason: format!("signature on {} does not match oracle key", self.correlation_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn signed_report_verifies() {
        let key = SigningKey::generate(&mut OsRng);
        let report = ValuationReport::sign(&key, CorrelationId::new(), Decimal::new(10_200, 0));
        report.verify(&key.verifying_key()).unwrap();
    }

    #[test]
    fn tampered_value_is_rejected() {
        let key = SigningKey::generate(&mut OsRng);
        let mut report = ValuationReport::sign(&key, CorrelationId::new(), Decimal::new(10_200, 0));
        report.value = Decimal::new(99_999, 0);
        let err = report.verify(&key.verifying_key()).unwrap_err();
        assert!(matches!(err, RealtyError::UnauthorizedOracle { .. }));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let oracle = SigningKey::generate(&mut OsRng);
        let imposter = SigningKey::generate(&mut OsRng);
        let report = ValuationReport::sign(&imposter, CorrelationId::new(), Decimal::ONE);
        assert!(report.verify(&oracle.verifying_key()).is_err());
    }

    #[test]
    fn equal_values_sign_identically_regardless_of_scale() {
        let id = CorrelationId::new();
        assert_eq!(
            ValuationReport::signing_payload(id, Decimal::new(10_200, 0)),
            ValuationReport::signing_payload(id, Decimal::new(1_020_000, 2)),
        );
    }

    #[test]
    fn purpose_display() {
        let holder = AccountId::from_bytes([0xab; 20]);
        assert_eq!(ValuationPurpose::Purchase { holder }.to_string(), "PURCHASE(0xabababab)");
        assert_eq!(ValuationPurpose::Reconciliation.to_string(), "RECONCILIATION");
    }
}
