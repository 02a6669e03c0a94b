//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors. At the storage-trait boundary a [`DbError`] becomes a
//! [`StoreError`]: read failures as `Unavailable`, write failures as
//! `TransactionFailed`.

use apothecary_core::StoreError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row holds a value the shop does not recognize.
    #[error("corrupt row in {table}: {detail}")]
    CorruptRow {
        /// Table the row was read from.
        table: &'static str,
        /// What was wrong with it.
        detail: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Convert a failure while reading into a [`StoreError`].
    pub fn into_read_error(self) -> StoreError {
        StoreError::Unavailable {
            message: self.to_string(),
        }
    }

    /// Convert a failure while appending into a [`StoreError`].
    pub fn into_write_error(self) -> StoreError {
        StoreError::TransactionFailed {
            message: self.to_string(),
        }
    }
}
