//! `PostgreSQL` implementation of the shop's storage traits.
//!
//! Reads run inside a `REPEATABLE READ, READ ONLY` transaction so the four
//! totals of one snapshot come from the same point in time. Each appended
//! batch runs inside its own transaction; if any insert fails the
//! transaction is dropped and rolled back, so no partial batch persists.

use std::collections::BTreeMap;

use apothecary_core::store::{LedgerSink, LedgerSource, LedgerView, StoreError};
use apothecary_ledger::LedgerBatch;
use apothecary_types::{CapacityTotals, Color, LedgerChange, LedgerEntry, TransactionId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbError;

/// Ledger storage backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Create a store over `pool`.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn open_snapshot(&self) -> Result<PgLedgerView, DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(PgLedgerView { tx })
    }

    async fn insert_batch(&self, batch: &LedgerBatch) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for entry in batch.entries() {
            insert_entry(&mut tx, entry).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Count rows per ledger table, for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if a query fails.
    pub async fn row_counts(&self) -> Result<BTreeMap<&'static str, i64>, DbError> {
        let mut counts = BTreeMap::new();
        for table in TABLES {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&self.pool)
                .await?;
            counts.insert(table, count);
        }
        Ok(counts)
    }
}

/// The four ledger tables.
const TABLES: [&str; 4] = ["gold_ledger", "ml_ledger", "potion_ledger", "capacity_ledger"];

/// Insert one row into the table matching its change.
async fn insert_entry(
    tx: &mut Transaction<'static, Postgres>,
    entry: &LedgerEntry,
) -> Result<(), DbError> {
    let id = entry.id.into_inner();
    let transaction_id = entry.transaction_id.into_inner();
    let reason = entry.reason.as_str();
    let reference = entry.reference.as_deref();

    match &entry.change {
        LedgerChange::Gold { change } => {
            sqlx::query(
                r"INSERT INTO gold_ledger (id, transaction_id, change, reason, reference, created_at)
                  VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(id)
            .bind(transaction_id)
            .bind(change)
            .bind(reason)
            .bind(reference)
            .bind(entry.created_at)
            .execute(&mut **tx)
            .await?;
        }
        LedgerChange::Ml { color, change } => {
            sqlx::query(
                r"INSERT INTO ml_ledger (id, transaction_id, color, change, reason, reference, created_at)
                  VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(id)
            .bind(transaction_id)
            .bind(color.as_str())
            .bind(change)
            .bind(reason)
            .bind(reference)
            .bind(entry.created_at)
            .execute(&mut **tx)
            .await?;
        }
        LedgerChange::Potion { sku, change } => {
            sqlx::query(
                r"INSERT INTO potion_ledger (id, transaction_id, sku, change, reason, reference, created_at)
                  VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(id)
            .bind(transaction_id)
            .bind(sku)
            .bind(change)
            .bind(reason)
            .bind(reference)
            .bind(entry.created_at)
            .execute(&mut **tx)
            .await?;
        }
        LedgerChange::Capacity {
            ml_capacity,
            potion_capacity,
        } => {
            sqlx::query(
                r"INSERT INTO capacity_ledger (id, transaction_id, ml_capacity, potion_capacity, reason, reference, created_at)
                  VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(id)
            .bind(transaction_id)
            .bind(ml_capacity)
            .bind(potion_capacity)
            .bind(reason)
            .bind(reference)
            .bind(entry.created_at)
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}

/// An open read-only snapshot.
pub struct PgLedgerView {
    tx: Transaction<'static, Postgres>,
}

impl core::fmt::Debug for PgLedgerView {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PgLedgerView").finish_non_exhaustive()
    }
}

impl PgLedgerView {
    async fn ml_totals(&mut self) -> Result<BTreeMap<Color, i64>, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT color, COALESCE(SUM(change), 0)::BIGINT FROM ml_ledger GROUP BY color",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        let mut totals = BTreeMap::new();
        for (name, total) in rows {
            let color = Color::parse(&name).ok_or_else(|| DbError::CorruptRow {
                table: "ml_ledger",
                detail: format!("unknown color {name:?}"),
            })?;
            totals.insert(color, total);
        }
        Ok(totals)
    }

    async fn gold_total(&mut self) -> Result<i64, DbError> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(change), 0)::BIGINT FROM gold_ledger")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(total)
    }

    async fn potion_totals(&mut self) -> Result<BTreeMap<String, i64>, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT sku, COALESCE(SUM(change), 0)::BIGINT FROM potion_ledger GROUP BY sku",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn capacity_totals(&mut self) -> Result<CapacityTotals, DbError> {
        let (ml_capacity, potion_capacity): (i64, i64) = sqlx::query_as(
            r"SELECT COALESCE(SUM(ml_capacity), 0)::BIGINT,
                     COALESCE(SUM(potion_capacity), 0)::BIGINT
              FROM capacity_ledger",
        )
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(CapacityTotals {
            ml_capacity,
            potion_capacity,
        })
    }
}

impl LedgerView for PgLedgerView {
    async fn read_ml_totals_by_color(&mut self) -> Result<BTreeMap<Color, i64>, StoreError> {
        self.ml_totals().await.map_err(DbError::into_read_error)
    }

    async fn read_gold_total(&mut self) -> Result<i64, StoreError> {
        self.gold_total().await.map_err(DbError::into_read_error)
    }

    async fn read_potion_totals_by_recipe(&mut self) -> Result<BTreeMap<String, i64>, StoreError> {
        self.potion_totals().await.map_err(DbError::into_read_error)
    }

    async fn read_capacity_totals(&mut self) -> Result<CapacityTotals, StoreError> {
        self.capacity_totals().await.map_err(DbError::into_read_error)
    }

    async fn finish(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::from(e).into_read_error())
    }
}

impl LedgerSource for PgLedgerStore {
    type View = PgLedgerView;

    async fn begin_read(&self) -> Result<PgLedgerView, StoreError> {
        self.open_snapshot().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to open ledger snapshot");
            e.into_read_error()
        })
    }
}

impl LedgerSink for PgLedgerStore {
    async fn append_ledger_rows(&self, batch: LedgerBatch) -> Result<TransactionId, StoreError> {
        let transaction_id = batch.transaction_id();
        match self.insert_batch(&batch).await {
            Ok(()) => {
                tracing::debug!(%transaction_id, rows = batch.len(), "Inserted ledger batch");
                Ok(transaction_id)
            }
            Err(e) => {
                tracing::error!(%transaction_id, error = %e, "Ledger batch rolled back");
                Err(e.into_write_error())
            }
        }
    }
}
