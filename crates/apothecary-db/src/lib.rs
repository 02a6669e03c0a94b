//! `PostgreSQL` storage for the Apothecary potion shop.
//!
//! Implements the core crate's [`LedgerSource`] and [`LedgerSink`] traits
//! over four append-only tables. Totals are computed with `SUM` in the
//! database; no summary table is ever written.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration, and migrations
//! - [`ledger_store`] -- [`PgLedgerStore`], the trait implementation
//! - [`error`] -- Shared error types
//!
//! [`LedgerSource`]: apothecary_core::LedgerSource
//! [`LedgerSink`]: apothecary_core::LedgerSink

pub mod error;
pub mod ledger_store;
pub mod postgres;

// Re-export primary types for convenience.
pub use error::DbError;
pub use ledger_store::{PgLedgerStore, PgLedgerView};
pub use postgres::{PostgresConfig, PostgresPool};
