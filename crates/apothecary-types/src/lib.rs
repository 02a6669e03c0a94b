//! Shared type definitions for the Apothecary potion shop.
//!
//! This crate is the single source of truth for the data shapes that flow
//! between the ledger, the planners, the storage layer, and the driver
//! binary. Everything here is plain data plus serde; no I/O.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for ledger rows, transactions, carts
//! - [`enums`] -- Liquid colors, ledger kinds, and entry reasons
//! - [`structs`] -- Compositions, recipes, offers, plans, snapshots, ledger entries

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Color, LedgerKind, LedgerReason};
pub use ids::{CartId, LedgerEntryId, TransactionId};
pub use structs::{
    BarrelOffer, BottleLine, CapacityPlan, CapacityTotals, CatalogItem, Customer, InventoryAudit,
    LedgerChange, LedgerEntry, PotionType, PurchaseLine, Recipe, SaleLine, StateSnapshot, UNIT_ML,
};
