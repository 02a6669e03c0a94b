//! Append-only shop ledgers for the Apothecary potion shop.
//!
//! Every unit of gold, every ml of liquid, every bottled potion, and every
//! capacity grant is tracked as a signed row in one of four ledgers. Rows are
//! never updated or deleted; the current state of the shop is always a fold
//! over the rows. Recomputing state is therefore idempotent and auditable.
//!
//! # Architecture
//!
//! - [`transaction`] -- The [`TransactionBuilder`] that validates a batch of
//!   rows destined to be appended atomically.
//! - [`ledger`] -- The in-memory [`Ledger`]: append-only log of batches.
//! - [`aggregate`] -- Folding rows into totals and a [`StateSnapshot`].
//! - [`audit`] -- Consistency checks on a folded snapshot.
//!
//! # Ledgers
//!
//! | Ledger | Key | Change |
//! |--------|-----|--------|
//! | gold | -- | signed gold |
//! | ml | color | signed ml |
//! | potion | recipe SKU | signed bottles |
//! | capacity | -- | granted ml / potion ceiling |
//!
//! # Usage
//!
//! ```
//! use apothecary_ledger::{Ledger, TransactionBuilder};
//! use apothecary_types::{Color, LedgerReason};
//!
//! let mut ledger = Ledger::new();
//!
//! let opening = TransactionBuilder::new(LedgerReason::OpeningBalance)
//!     .gold(100)
//!     .capacity(10_000, 50)
//!     .build();
//! assert!(opening.is_ok());
//! if let Ok(batch) = opening {
//!     ledger.append_batch(batch);
//! }
//!
//! let delivery = TransactionBuilder::new(LedgerReason::BarrelDelivery)
//!     .gold(-60)
//!     .ml(Color::Green, 500)
//!     .build();
//! if let Ok(batch) = delivery {
//!     ledger.append_batch(batch);
//! }
//!
//! assert_eq!(ledger.gold_total().ok(), Some(40));
//! let ml = ledger.ml_totals().unwrap_or_default();
//! assert_eq!(ml.get(&Color::Green), Some(&500));
//! ```
//!
//! [`StateSnapshot`]: apothecary_types::StateSnapshot

pub mod aggregate;
pub mod audit;
pub mod ledger;
pub mod transaction;

// Re-export primary types at crate root.
pub use audit::AuditResult;
pub use ledger::Ledger;
pub use transaction::{LedgerBatch, TransactionBuilder};

use apothecary_types::{Color, LedgerKind};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when building or folding ledger rows.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A gold, ml, or potion change of zero carries no information.
    #[error("{kind:?} ledger change must be non-zero")]
    ZeroChange {
        /// The ledger the change was destined for.
        kind: LedgerKind,
    },

    /// Capacity can only be granted, never revoked.
    #[error("capacity grant must be non-negative, got ml={ml_capacity} potions={potion_capacity}")]
    NegativeCapacity {
        /// The requested ml capacity change.
        ml_capacity: i64,
        /// The requested potion capacity change.
        potion_capacity: i64,
    },

    /// A batch must contain at least one row.
    #[error("ledger batch is empty")]
    EmptyBatch,

    /// A required field was not set.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Summing rows overflowed `i64`.
    #[error("arithmetic overflow while summing the {0:?} ledger")]
    Overflow(LedgerKind),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// One inconsistency found in a folded snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditFinding {
    /// Gold went below zero.
    NegativeGold {
        /// Folded gold total.
        gold: i64,
    },
    /// A color's ml went below zero.
    NegativeMl {
        /// The color.
        color: Color,
        /// Folded ml total.
        ml: i64,
    },
    /// A recipe's bottle count went below zero.
    NegativePotions {
        /// Recipe SKU.
        sku: String,
        /// Folded bottle count.
        quantity: i64,
    },
    /// Total ml exceeds the ml capacity.
    MlOverCapacity {
        /// Total ml across colors.
        total: i64,
        /// Folded ml capacity.
        capacity: i64,
    },
    /// Total bottles exceed the potion capacity.
    PotionsOverCapacity {
        /// Total bottles across recipes.
        total: i64,
        /// Folded potion capacity.
        capacity: i64,
    },
}

impl core::fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NegativeGold { gold } => write!(f, "gold is negative ({gold})"),
            Self::NegativeMl { color, ml } => write!(f, "{color} ml is negative ({ml})"),
            Self::NegativePotions { sku, quantity } => {
                write!(f, "{sku} stock is negative ({quantity})")
            }
            Self::MlOverCapacity { total, capacity } => {
                write!(f, "ml total {total} exceeds capacity {capacity}")
            }
            Self::PotionsOverCapacity { total, capacity } => {
                write!(f, "potion total {total} exceeds capacity {capacity}")
            }
        }
    }
}

/// The set of inconsistencies detected in one snapshot.
///
/// A consistent system never produces one; when it does, the ledger rows
/// were written by something that bypassed the planners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// Every finding, in check order.
    pub findings: Vec<AuditFinding>,
    /// Human-readable summary.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
