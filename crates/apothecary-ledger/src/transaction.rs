//! Transaction builder and batch validation for the shop ledgers.
//!
//! A [`TransactionBuilder`] collects the rows produced by one business event
//! (a barrel delivery, a checkout, a capacity purchase) and validates them
//! into a [`LedgerBatch`]. A batch is the unit of atomicity: storage appends
//! every row of a batch or none of them.

use chrono::Utc;

use apothecary_types::{
    Color, LedgerChange, LedgerEntry, LedgerEntryId, LedgerKind, LedgerReason, TransactionId,
};

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// A validated, non-empty group of ledger rows sharing one transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerBatch {
    transaction_id: TransactionId,
    entries: Vec<LedgerEntry>,
}

impl LedgerBatch {
    /// The id shared by every row in the batch.
    pub const fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// The rows, in the order they were added.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the builder rejects empty batches.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the batch, yielding its rows.
    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }
}

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for a [`LedgerBatch`].
///
/// Enforces that the batch is non-empty, that gold, ml, and potion changes
/// are non-zero, that potion rows name a recipe, and that capacity is only
/// ever granted.
///
/// # Examples
///
/// ```
/// use apothecary_ledger::TransactionBuilder;
/// use apothecary_types::{Color, LedgerReason};
///
/// let batch = TransactionBuilder::new(LedgerReason::Bottling)
///     .reference("order-7")
///     .ml(Color::Red, -300)
///     .potion("RED_POTION_0", 3)
///     .build();
///
/// assert!(batch.is_ok());
/// assert_eq!(batch.map(|b| b.len()).unwrap_or(0), 2);
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    reason: LedgerReason,
    reference: Option<String>,
    changes: Vec<LedgerChange>,
}

impl TransactionBuilder {
    /// Start building a batch for the given reason.
    pub const fn new(reason: LedgerReason) -> Self {
        Self {
            reason,
            reference: None,
            changes: Vec::new(),
        }
    }

    /// Attach an external reference (order id, cart id) to every row.
    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Add a gold row.
    #[must_use]
    pub fn gold(mut self, change: i64) -> Self {
        self.changes.push(LedgerChange::Gold { change });
        self
    }

    /// Add an ml row for one color.
    #[must_use]
    pub fn ml(mut self, color: Color, change: i64) -> Self {
        self.changes.push(LedgerChange::Ml { color, change });
        self
    }

    /// Add a potion row for one recipe.
    #[must_use]
    pub fn potion(mut self, sku: impl Into<String>, change: i64) -> Self {
        self.changes.push(LedgerChange::Potion {
            sku: sku.into(),
            change,
        });
        self
    }

    /// Add a capacity grant row.
    #[must_use]
    pub fn capacity(mut self, ml_capacity: i64, potion_capacity: i64) -> Self {
        self.changes.push(LedgerChange::Capacity {
            ml_capacity,
            potion_capacity,
        });
        self
    }

    /// Add an arbitrary change in place, for callers building rows in a loop.
    pub fn push(&mut self, change: LedgerChange) {
        self.changes.push(change);
    }

    /// Number of changes collected so far.
    pub const fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether no change has been collected yet.
    pub const fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Validate the collected changes and produce a [`LedgerBatch`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EmptyBatch`] if no change was added.
    /// Returns [`LedgerError::ZeroChange`] for a zero gold/ml/potion change.
    /// Returns [`LedgerError::MissingField`] for a potion row without a SKU.
    /// Returns [`LedgerError::NegativeCapacity`] for a capacity row that
    /// would shrink capacity, or grants nothing at all.
    pub fn build(self) -> Result<LedgerBatch, LedgerError> {
        if self.changes.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }

        for change in &self.changes {
            validate_change(change)?;
        }

        let transaction_id = TransactionId::new();
        let created_at = Utc::now();
        let entries = self
            .changes
            .into_iter()
            .map(|change| LedgerEntry {
                id: LedgerEntryId::new(),
                transaction_id,
                change,
                reason: self.reason,
                reference: self.reference.clone(),
                created_at,
            })
            .collect();

        Ok(LedgerBatch {
            transaction_id,
            entries,
        })
    }
}

/// Validate a single change against its ledger's contract.
const fn validate_change(change: &LedgerChange) -> Result<(), LedgerError> {
    match change {
        LedgerChange::Gold { change } if *change == 0 => Err(LedgerError::ZeroChange {
            kind: LedgerKind::Gold,
        }),
        LedgerChange::Ml { change, .. } if *change == 0 => Err(LedgerError::ZeroChange {
            kind: LedgerKind::Ml,
        }),
        LedgerChange::Potion { sku, .. } if sku.is_empty() => Err(LedgerError::MissingField("sku")),
        LedgerChange::Potion { change, .. } if *change == 0 => Err(LedgerError::ZeroChange {
            kind: LedgerKind::Potion,
        }),
        LedgerChange::Capacity {
            ml_capacity,
            potion_capacity,
        } if *ml_capacity < 0
            || *potion_capacity < 0
            || (*ml_capacity == 0 && *potion_capacity == 0) =>
        {
            Err(LedgerError::NegativeCapacity {
                ml_capacity: *ml_capacity,
                potion_capacity: *potion_capacity,
            })
        }
        LedgerChange::Gold { .. }
        | LedgerChange::Ml { .. }
        | LedgerChange::Potion { .. }
        | LedgerChange::Capacity { .. } => Ok(()),
    }
}
