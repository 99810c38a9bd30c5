//! Append-only receipt log.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use realty_types::{AccountId, Generation, PropertyId, Receipt, ReceiptType};
use rust_decimal::Decimal;

#[derive(Debug, Default)]
struct LogState {
    receipts: Vec<Receipt>,
    next_sequence: u64,
}

/// Audit trail of every committed ledger mutation, in commit order.
#[derive(Debug, Default)]
pub struct ReceiptLog {
    state: Mutex<LogState>,
}

impl ReceiptLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a receipt and return a copy of it.
    pub fn append(
        &self,
        receipt_type: ReceiptType,
        property_id: &PropertyId,
        generation: Generation,
        account: Option<AccountId>,
        amount: Decimal,
        issued_at: DateTime<Utc>,
    ) -> Receipt {
        let mut state = self.state.lock();
        let receipt = Receipt::new(
            receipt_type,
            property_id.clone(),
            generation,
            account,
            amount,
            state.next_sequence,
            issued_at,
        );
        state.next_sequence += 1;
        state.receipts.push(receipt.clone());
        receipt
    }

    /// Receipts for one property, across all its generations.
    #[must_use]
    pub fn for_property(&self, property_id: &PropertyId) -> Vec<Receipt> {
        self.state
            .lock()
            .receipts
            .iter()
            .filter(|r| &r.property_id == property_id)
            .cloned()
            .collect()
    }

    #[cfg(test)]
    fn all(&self) -> Vec<Receipt> {
        self.state.lock().receipts.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().receipts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_contiguous_and_hashes_verify() {
        let log = ReceiptLog::new();
        let a = PropertyId::new("a").unwrap();
        let b = PropertyId::new("b").unwrap();
        let now = Utc::now();
        log.append(ReceiptType::PoolCreated, &a, Generation::FIRST, None, Decimal::ONE, now);
        log.append(ReceiptType::PoolCreated, &b, Generation::FIRST, None, Decimal::ONE, now);
        log.append(ReceiptType::PoolReconciled, &a, Generation::FIRST, None, Decimal::TEN, now);

        let all = log.all();
        assert_eq!(all.len(), 3);
        assert!(all.iter().enumerate().all(|(i, r)| r.sequence == i as u64 && r.verify()));

        let for_a = log.for_property(&a);
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[1].receipt_type, ReceiptType::PoolReconciled);
    }
}
