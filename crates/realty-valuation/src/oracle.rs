//! Outbound side of the oracle link.
//!
//! A [`ValuationOracle`] only has to accept a request without blocking;
//! the answer comes back later through the ledger's fulfillment entry
//! points.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use realty_types::{RealtyError, Result, ValuationRequest};
use tokio::sync::mpsc;

/// Accepts valuation requests for asynchronous processing.
pub trait ValuationOracle: Send + Sync {
    /// Hand off a request. Must not block waiting for the answer.
    ///
    /// # Errors
    /// Returns `OracleUnavailable` if the request could not be accepted.
    fn dispatch(&self, request: ValuationRequest) -> Result<()>;
}

// ---------------------------------------------------------------------------
// ChannelOracle
// ---------------------------------------------------------------------------

/// Forwards requests into a tokio channel served by an oracle task.
#[derive(Debug, Clone)]
pub struct ChannelOracle {
    tx: mpsc::UnboundedSender<ValuationRequest>,
}

impl ChannelOracle {
    /// Create the oracle and the receiver its serving task reads from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ValuationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ValuationOracle for ChannelOracle {
    fn dispatch(&self, request: ValuationRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|e| RealtyError::OracleUnavailable {
                reason: format!("oracle channel closed, dropped {}", e.0.correlation_id),
            })
    }
}

// ---------------------------------------------------------------------------
// RecordingOracle
// ---------------------------------------------------------------------------

/// Keeps requests in memory until the caller drains them. Drives
/// deterministic, single-threaded flows.
#[derive(Debug, Default)]
pub struct RecordingOracle {
    requests: Mutex<Vec<ValuationRequest>>,
    unavailable: AtomicBool,
}

impl RecordingOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every request received so far, oldest first.
    pub fn drain(&self) -> Vec<ValuationRequest> {
        std::mem::take(&mut *self.requests.lock())
    }

    /// Most recent request, without draining.
    #[must_use]
    pub fn last(&self) -> Option<ValuationRequest> {
        self.requests.lock().last().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }

    /// Reject every subsequent dispatch.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl ValuationOracle for RecordingOracle {
    fn dispatch(&self, request: ValuationRequest) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RealtyError::OracleUnavailable {
                reason: "oracle offline".to_string(),
            });
        }
        self.requests.lock().push(request);
        Ok(())
    }
}
