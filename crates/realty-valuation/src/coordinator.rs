//! Correlation table for asynchronous valuations.
//!
//! Each outstanding request is keyed twice: by its [`CorrelationId`] (for
//! fulfillment lookup) and by `(property, generation, purpose)` (so a
//! second request for the same thing is refused with `RequestInFlight`).
//! A correlation id is consumed exactly once; anything that arrives for an
//! unknown id is a protocol violation by the oracle and is logged loudly.

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey;
use parking_lot::Mutex;
use realty_types::{
    CorrelationId, Generation, OracleConfig, PendingValuation, PropertyId, RealtyError, Result,
    ValuationPurpose, ValuationReport, ValuationRequest,
};
use rust_decimal::Decimal;

use crate::oracle::ValuationOracle;

/// Uniqueness key for in-flight requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RequestKey {
    property_id: PropertyId,
    generation: Generation,
    purpose: ValuationPurpose,
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.property_id, self.generation, self.purpose)
    }
}

impl From<&PendingValuation> for RequestKey {
    fn from(p: &PendingValuation) -> Self {
        Self {
            property_id: p.property_id.clone(),
            generation: p.generation,
            purpose: p.purpose,
        }
    }
}

#[derive(Debug, Default)]
struct Table {
    pending: HashMap<CorrelationId, PendingValuation>,
    in_flight: HashMap<RequestKey, CorrelationId>,
}

impl Table {
    fn insert(&mut self, pending: PendingValuation) {
        self.in_flight
            .insert(RequestKey::from(&pending), pending.correlation_id);
        self.pending.insert(pending.correlation_id, pending);
    }

    fn remove(&mut self, correlation_id: &CorrelationId) -> Option<PendingValuation> {
        let pending = self.pending.remove(correlation_id)?;
        self.in_flight.remove(&RequestKey::from(&pending));
        Some(pending)
    }
}

/// Issues valuation requests and matches fulfillments to them.
pub struct ValuationCoordinator {
    oracle: Arc<dyn ValuationOracle>,
    config: OracleConfig,
    oracle_key: Option<VerifyingKey>,
    table: Mutex<Table>,
}

impl ValuationCoordinator {
    /// Build a coordinator dispatching to `oracle`.
    ///
    /// # Errors
    /// `Configuration` if the configured oracle key does not decode.
    pub fn new(oracle: Arc<dyn ValuationOracle>, config: OracleConfig) -> Result<Self> {
        let oracle_key = config.verifying_key()?;
        Ok(Self {
            oracle,
            config,
            oracle_key,
            table: Mutex::new(Table::default()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Record a pending request and hand it to the oracle.
    ///
    /// The record is written before dispatch so an oracle that answers
    /// synchronously still finds it. If dispatch fails the record is
    /// removed again and nothing is outstanding.
    ///
    /// # Errors
    /// - `RequestInFlight` if the same request is already outstanding
    /// - `OracleUnavailable` if the oracle refused the request
    pub fn request(
        &self,
        property_id: &PropertyId,
        generation: Generation,
        purpose: ValuationPurpose,
        now: DateTime<Utc>,
    ) -> Result<CorrelationId> {
        let key = RequestKey {
            property_id: property_id.clone(),
            generation,
            purpose,
        };
        let correlation_id = CorrelationId::new();
        {
            let mut table = self.table.lock();
            if let Some(existing) = table.in_flight.get(&key) {
                tracing::warn!(%key, in_flight = %existing, "Duplicate valuation request refused");
                return Err(RealtyError::RequestInFlight {
                    key: key.to_string(),
                });
            }
            table.insert(PendingValuation {
                correlation_id,
                property_id: property_id.clone(),
                generation,
                purpose,
                requested_at: now,
            });
        }

        let request = ValuationRequest {
            correlation_id,
            property_id: property_id.clone(),
            purpose,
            job_id: self.config.job_id.clone(),
            fee: self.config.fee,
            requested_at: now,
        };
        if let Err(err) = self.oracle.dispatch(request) {
            self.table.lock().remove(&correlation_id);
            tracing::warn!(%key, error = %err, "Valuation dispatch failed");
            return Err(err);
        }

        tracing::debug!(%key, %correlation_id, "Valuation requested");
        Ok(correlation_id)
    }

    /// Look up a pending request without consuming it.
    ///
    /// # Errors
    /// `UnknownCorrelation` if no request is pending under this id.
    pub fn lookup(&self, correlation_id: CorrelationId) -> Result<PendingValuation> {
        self.table
            .lock()
            .pending
            .get(&correlation_id)
            .cloned()
            .ok_or_else(|| Self::unknown(correlation_id))
    }

    /// Consume the pending request for a fulfillment.
    ///
    /// A non-positive value is refused and the request stays pending, so
    /// the oracle can answer again.
    ///
    /// # Errors
    /// - `UnknownCorrelation` if absent (consumed, forged, or stale)
    /// - `InvalidValuation` if `value <= 0`
    pub fn take(&self, correlation_id: CorrelationId, value: Decimal) -> Result<PendingValuation> {
        let mut table = self.table.lock();
        if !table.pending.contains_key(&correlation_id) {
            return Err(Self::unknown(correlation_id));
        }
        if value <= Decimal::ZERO {
            tracing::warn!(%correlation_id, %value, "Non-positive valuation refused");
            return Err(RealtyError::InvalidValuation(value));
        }
        table
            .remove(&correlation_id)
            .ok_or_else(|| Self::unknown(correlation_id))
    }

    /// Put a consumed request back (its consumer failed to apply it).
    pub fn restore(&self, pending: PendingValuation) {
        tracing::debug!(correlation_id = %pending.correlation_id, "Valuation request restored");
        self.table.lock().insert(pending);
    }

    /// Check that a report was signed by the configured oracle.
    ///
    /// # Errors
    /// `UnauthorizedOracle` if no key is configured or the signature fails.
    pub fn verify_report(&self, report: &ValuationReport) -> Result<()> {
        let key = self
            .oracle_key
            .as_ref()
            .ok_or_else(|| RealtyError::UnauthorizedOracle {
                reason: "no oracle key configured".to_string(),
            })?;
        report.verify(key).inspect_err(|err| {
            tracing::error!(correlation_id = %report.correlation_id, error = %err, "Rejected valuation report");
        })
    }

    /// All outstanding requests, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingValuation> {
        let mut all: Vec<_> = self.table.lock().pending.values().cloned().collect();
        all.sort_by_key(|p| p.correlation_id);
        all
    }

    #[cfg(test)]
    fn is_in_flight(
        &self,
        property_id: &PropertyId,
        generation: Generation,
        purpose: ValuationPurpose,
    ) -> bool {
        self.table.lock().in_flight.contains_key(&RequestKey {
            property_id: property_id.clone(),
            generation,
            purpose,
        })
    }

    fn unknown(correlation_id: CorrelationId) -> RealtyError {
        tracing::error!(%correlation_id, "Fulfillment for unknown correlation id");
        RealtyError::UnknownCorrelation(correlation_id)
    }
}

impl fmt::Debug for ValuationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuationCoordinator")
            .field("config", &self.config)
            .field("pending", &self.table.lock().pending.len())
            .finish_non_exhaustive()
    }
}
