//! The in-memory shop ledger: an append-only log of validated batches.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Batch-atomic**: a [`LedgerBatch`] is appended whole; there is no API
//!   for appending a single unvalidated row.
//! - **Derived state**: balances are never stored, only folded on demand.

use std::collections::BTreeMap;

use apothecary_types::{CapacityTotals, Color, LedgerEntry, TransactionId};

use crate::aggregate;
use crate::{LedgerBatch, LedgerError};

/// The complete set of ledger rows for one shop.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// All entries, in insertion order.
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every row of a validated batch. Returns the batch's
    /// transaction id.
    pub fn append_batch(&mut self, batch: LedgerBatch) -> TransactionId {
        let transaction_id = batch.transaction_id();
        let rows = batch.len();
        self.entries.extend(batch.into_entries());
        tracing::trace!(%transaction_id, rows, "Appended ledger batch");
        transaction_id
    }

    /// Current gold on hand.
    pub fn gold_total(&self) -> Result<i64, LedgerError> {
        aggregate::gold_total(&self.entries)
    }

    /// Current ml per color.
    pub fn ml_totals(&self) -> Result<BTreeMap<Color, i64>, LedgerError> {
        aggregate::ml_totals(&self.entries)
    }

    /// Current bottles per recipe SKU.
    pub fn potion_totals(&self) -> Result<BTreeMap<String, i64>, LedgerError> {
        aggregate::potion_totals(&self.entries)
    }

    /// Current capacity ceilings.
    pub fn capacity_totals(&self) -> Result<CapacityTotals, LedgerError> {
        aggregate::capacity_totals(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use apothecary_types::LedgerReason;

    use super::*;
    use crate::TransactionBuilder;

    fn seeded() -> Ledger {
        let mut ledger = Ledger::new();
        if let Ok(batch) = TransactionBuilder::new(LedgerReason::OpeningBalance)
            .gold(100)
            .capacity(10_000, 50)
            .build()
        {
            ledger.append_batch(batch);
        }
        ledger
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn append_batch_adds_every_row() {
        let mut ledger = seeded();
        assert_eq!(ledger.len(), 2);

        let batch = TransactionBuilder::new(LedgerReason::BarrelDelivery)
            .reference("1")
            .gold(-60)
            .ml(Color::Green, 500)
            .ml(Color::Blue, 200)
            .build();
        assert!(batch.is_ok());
        if let Ok(batch) = batch {
            let expected = batch.transaction_id();
            assert_eq!(ledger.append_batch(batch), expected);
            assert_eq!(ledger.len(), 5);
            assert_eq!(ledger.gold_total().ok(), Some(40));
        }
    }

    #[test]
    fn totals_reflect_every_ledger() {
        let mut ledger = seeded();
        if let Ok(batch) = TransactionBuilder::new(LedgerReason::Bottling)
            .ml(Color::Red, 300)
            .build()
        {
            ledger.append_batch(batch);
        }
        if let Ok(batch) = TransactionBuilder::new(LedgerReason::Bottling)
            .ml(Color::Red, -200)
            .potion("RED_POTION_0", 2)
            .build()
        {
            ledger.append_batch(batch);
        }

        assert_eq!(ledger.gold_total().ok(), Some(100));
        assert_eq!(
            ledger.ml_totals().ok().and_then(|m| m.get(&Color::Red).copied()),
            Some(100)
        );
        assert_eq!(
            ledger
                .potion_totals()
                .ok()
                .and_then(|p| p.get("RED_POTION_0").copied()),
            Some(2)
        );
        assert_eq!(
            ledger.capacity_totals().ok(),
            Some(CapacityTotals {
                ml_capacity: 10_000,
                potion_capacity: 50
            })
        );
    }

    #[test]
    fn repeated_totals_are_identical() {
        let ledger = seeded();
        assert_eq!(ledger.gold_total().ok(), ledger.gold_total().ok());
        assert_eq!(ledger.ml_totals().ok(), ledger.ml_totals().ok());
    }

    #[test]
    fn overdrawn_gold_folds_negative() {
        let mut ledger = seeded();
        if let Ok(batch) = TransactionBuilder::new(LedgerReason::BarrelDelivery)
            .gold(-500)
            .ml(Color::Dark, 100)
            .build()
        {
            ledger.append_batch(batch);
        }
        assert_eq!(ledger.gold_total().ok(), Some(-400));
    }
}
