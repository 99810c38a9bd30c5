//! In-process stand-in for the external price oracle.
//!
//! Reads requests off the [`realty_valuation::ChannelOracle`] channel,
//! prices them with a fixed schedule, signs a report and fulfills it.

use std::sync::Arc;

use ed25519_dalek::SigningKey;
use realty_settlement::TokenizedRealty;
use realty_types::{CorrelationId, ValuationPurpose, ValuationReport, ValuationRequest};
use rust_decimal::Decimal;
use tokio::{sync::mpsc, task::JoinHandle};

/// Valuation schedule the simulated oracle answers with.
#[derive(Debug, Clone, Copy)]
pub struct PriceSchedule {
    pub base_value: Decimal,
    pub value_step: Decimal,
    pub final_value: Decimal,
}

/// Outcome of one fulfillment, reported back to the driver.
#[derive(Debug)]
pub struct Fulfilled {
    pub correlation_id: CorrelationId,
    pub value: Decimal,
    pub applied: bool,
}

/// Spawn the oracle task. It stops when either channel closes.
pub fn spawn(
    ledger: Arc<TokenizedRealty>,
    signer: SigningKey,
    schedule: PriceSchedule,
    mut requests: mpsc::UnboundedReceiver<ValuationRequest>,
    done: mpsc::UnboundedSender<Fulfilled>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut purchases = 0u32;
        while let Some(request) = requests.recv().await {
            let value = match request.purpose {
                ValuationPurpose::Purchase { .. } => {
                    let value = schedule.base_value + schedule.value_step * Decimal::from(purchases);
                    purchases += 1;
                    value
                }
                ValuationPurpose::Reconciliation => schedule.final_value,
            };
            tracing::debug!(
                correlation_id = %request.correlation_id,
                property = %request.property_id,
                purpose = %request.purpose,
                job_id = %request.job_id,
                fee = %request.fee,
                %value,
                "Oracle answering"
            );

            let report = ValuationReport::sign(&signer, request.correlation_id, value);
            let applied = match ledger.fulfill_signed_valuation(&report) {
                Ok(()) => true,
                Err(err) => {
                    tracing::error!(correlation_id = %request.correlation_id, error = %err, "Fulfillment rejected");
                    false
                }
            };
            let outcome = Fulfilled {
                correlation_id: request.correlation_id,
                value,
                applied,
            };
            if done.send(outcome).is_err() {
                break;
            }
        }
        tracing::debug!("Oracle task stopped");
    })
}
