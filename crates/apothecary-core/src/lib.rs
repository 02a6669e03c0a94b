//! Planning engine, state mutation, and configuration for the Apothecary
//! potion shop.
//!
//! A planning cycle reads the ledgers into a snapshot, runs a pure planner
//! over it, and hands the plan back to the caller. When the caller reports
//! what was actually delivered or sold, the mutator appends one atomic batch
//! of ledger rows, and the next aggregation sees the new totals.
//!
//! # Modules
//!
//! - [`aggregator`] -- Snapshot reads and post-read audit.
//! - [`barrels`] -- Barrel purchase planner.
//! - [`bottler`] -- Bottling planner with the restock fallback.
//! - [`capacity`] -- Capacity purchase planner.
//! - [`cart`] -- Customer carts and checkout pricing.
//! - [`catalog`] -- Sellable catalog and inventory audit.
//! - [`clock`] -- Shop clock and the [`RestockPredicate`] seam.
//! - [`config`] -- Loading `apothecary-config.yaml` into typed structs.
//! - [`error`] -- Planning and mutation errors.
//! - [`mutator`] -- Ledger batches for deliveries, sales, and grants.
//! - [`service`] -- The caller-facing [`PlanningService`].
//! - [`store`] -- Storage traits and the in-memory store.
//!
//! [`RestockPredicate`]: clock::RestockPredicate
//! [`PlanningService`]: service::PlanningService

pub mod aggregator;
pub mod barrels;
pub mod bottler;
pub mod capacity;
pub mod cart;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod mutator;
pub mod service;
pub mod store;

pub use error::{MutationError, PlanningError};
pub use service::PlanningService;
pub use store::{LedgerSink, LedgerSource, LedgerView, MemoryStore, StoreError};
