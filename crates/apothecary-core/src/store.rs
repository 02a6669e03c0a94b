//! Storage collaborator traits and the in-memory store.
//!
//! Reads go through a [`LedgerView`] opened by [`LedgerSource::begin_read`]:
//! every total read from one view comes from the same point in time.
//! Writes go through [`LedgerSink::append_ledger_rows`], which appends a
//! whole [`LedgerBatch`] or nothing.
//!
//! [`MemoryStore`] backs tests and dry runs. The `PostgreSQL` store lives in
//! the `apothecary-db` crate.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use apothecary_ledger::{Ledger, LedgerBatch, LedgerError};
use apothecary_types::{CapacityTotals, Color, TransactionId};
use tokio::sync::RwLock;

/// Errors surfaced by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Backend-specific detail.
        message: String,
    },

    /// A write transaction was rolled back.
    #[error("transaction failed: {message}")]
    TransactionFailed {
        /// Backend-specific detail.
        message: String,
    },

    /// Stored rows could not be folded.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// A consistent read snapshot over the four ledgers.
pub trait LedgerView: Send {
    /// Sum of ml changes per color.
    fn read_ml_totals_by_color(
        &mut self,
    ) -> impl Future<Output = Result<BTreeMap<Color, i64>, StoreError>> + Send;

    /// Sum of gold changes.
    fn read_gold_total(&mut self) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Sum of potion changes per recipe SKU.
    fn read_potion_totals_by_recipe(
        &mut self,
    ) -> impl Future<Output = Result<BTreeMap<String, i64>, StoreError>> + Send;

    /// Running capacity grants.
    fn read_capacity_totals(
        &mut self,
    ) -> impl Future<Output = Result<CapacityTotals, StoreError>> + Send;

    /// Release the snapshot.
    fn finish(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Opens read snapshots.
pub trait LedgerSource: Send + Sync {
    /// The snapshot type.
    type View: LedgerView;

    /// Open a read snapshot.
    fn begin_read(&self) -> impl Future<Output = Result<Self::View, StoreError>> + Send;
}

/// Appends validated batches atomically.
pub trait LedgerSink: Send + Sync {
    /// Append every row of `batch` in one unit, returning its transaction id.
    fn append_ledger_rows(
        &self,
        batch: LedgerBatch,
    ) -> impl Future<Output = Result<TransactionId, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A shared in-memory ledger.
///
/// Cloning the store shares the underlying ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows appended so far.
    pub async fn len(&self) -> usize {
        self.ledger.read().await.len()
    }

    /// Whether no row has been appended.
    pub async fn is_empty(&self) -> bool {
        self.ledger.read().await.is_empty()
    }
}

/// A frozen copy of the committed ledger.
#[derive(Debug, Clone)]
pub struct MemoryView {
    ledger: Ledger,
}

impl LedgerView for MemoryView {
    async fn read_ml_totals_by_color(&mut self) -> Result<BTreeMap<Color, i64>, StoreError> {
        Ok(self.ledger.ml_totals()?)
    }

    async fn read_gold_total(&mut self) -> Result<i64, StoreError> {
        Ok(self.ledger.gold_total()?)
    }

    async fn read_potion_totals_by_recipe(&mut self) -> Result<BTreeMap<String, i64>, StoreError> {
        Ok(self.ledger.potion_totals()?)
    }

    async fn read_capacity_totals(&mut self) -> Result<CapacityTotals, StoreError> {
        Ok(self.ledger.capacity_totals()?)
    }

    async fn finish(self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl LedgerSource for MemoryStore {
    type View = MemoryView;

    async fn begin_read(&self) -> Result<MemoryView, StoreError> {
        let ledger = self.ledger.read().await.clone();
        Ok(MemoryView { ledger })
    }
}

impl LedgerSink for MemoryStore {
    async fn append_ledger_rows(&self, batch: LedgerBatch) -> Result<TransactionId, StoreError> {
        let mut ledger = self.ledger.write().await;
        Ok(ledger.append_batch(batch))
    }
}
