//! Error types for planning and state mutation.

use apothecary_ledger::LedgerError;
use apothecary_types::PotionType;

use crate::store::StoreError;

/// Errors that abort a planning call.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    /// The ledgers could not be read; no plan is produced.
    #[error("storage unavailable: {message}")]
    StorageUnavailable {
        /// Backend-specific detail.
        message: String,
    },

    /// Stored rows could not be folded into totals.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<StoreError> for PlanningError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Ledger(inner) => Self::Ledger(inner),
            StoreError::Unavailable { message } | StoreError::TransactionFailed { message } => {
                Self::StorageUnavailable { message }
            }
        }
    }
}

/// Errors that abort a delivery, sale, or capacity grant.
///
/// When any of these is returned, no row of the batch was persisted.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// The storage backend rolled the batch back.
    #[error("transaction failed: {message}")]
    TransactionFailed {
        /// Backend-specific detail.
        message: String,
    },

    /// A delivered barrel does not select exactly one color.
    #[error("barrel {sku} has unrecognized color marker {potion_type}")]
    UnrecognizedColor {
        /// Barrel SKU.
        sku: String,
        /// The offending marker.
        potion_type: PotionType,
    },

    /// A delivered bottle composition matches no recipe.
    #[error("no recipe has composition {potion_type}")]
    UnknownRecipe {
        /// The offending composition.
        potion_type: PotionType,
    },

    /// A sale names a SKU that is not in the catalog.
    #[error("no recipe has sku {sku}")]
    UnknownSku {
        /// The offending SKU.
        sku: String,
    },

    /// A batch row was rejected by the ledger.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Current state could not be read before mutating.
    #[error("planning error: {0}")]
    Planning(#[from] PlanningError),

    /// A batch total overflowed.
    #[error("arithmetic overflow computing {context}")]
    Overflow {
        /// Which quantity overflowed.
        context: &'static str,
    },
}

impl From<StoreError> for MutationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Ledger(inner) => Self::Ledger(inner),
            StoreError::Unavailable { message } | StoreError::TransactionFailed { message } => {
                Self::TransactionFailed { message }
            }
        }
    }
}
