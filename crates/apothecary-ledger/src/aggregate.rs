//! Folding ledger rows into current totals.
//!
//! Each total is the sum of the signed changes in one ledger, grouped by its
//! key. Absent rows project to zero: a color that was never delivered reads
//! as `0` ml, not as a missing value. All sums use checked arithmetic.

use std::collections::BTreeMap;

use apothecary_types::{
    CapacityTotals, Color, LedgerChange, LedgerEntry, LedgerKind, StateSnapshot,
};

use crate::LedgerError;

/// Sum of every gold change.
pub fn gold_total(entries: &[LedgerEntry]) -> Result<i64, LedgerError> {
    let mut total: i64 = 0;
    for entry in entries {
        if let LedgerChange::Gold { change } = entry.change {
            total = total
                .checked_add(change)
                .ok_or(LedgerError::Overflow(LedgerKind::Gold))?;
        }
    }
    Ok(total)
}

/// Sum of ml changes per color. Every color is present in the result.
pub fn ml_totals(entries: &[LedgerEntry]) -> Result<BTreeMap<Color, i64>, LedgerError> {
    let mut totals: BTreeMap<Color, i64> = Color::ALL.into_iter().map(|c| (c, 0)).collect();
    for entry in entries {
        if let LedgerChange::Ml { color, change } = entry.change {
            let slot = totals.entry(color).or_insert(0);
            *slot = slot
                .checked_add(change)
                .ok_or(LedgerError::Overflow(LedgerKind::Ml))?;
        }
    }
    Ok(totals)
}

/// Sum of potion changes per recipe SKU.
///
/// Only recipes that appear in the ledger are present; callers read missing
/// recipes as zero.
pub fn potion_totals(entries: &[LedgerEntry]) -> Result<BTreeMap<String, i64>, LedgerError> {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for entry in entries {
        if let LedgerChange::Potion { sku, change } = &entry.change {
            let slot = totals.entry(sku.clone()).or_insert(0);
            *slot = slot
                .checked_add(*change)
                .ok_or(LedgerError::Overflow(LedgerKind::Potion))?;
        }
    }
    Ok(totals)
}

/// Running sum of capacity grants.
pub fn capacity_totals(entries: &[LedgerEntry]) -> Result<CapacityTotals, LedgerError> {
    let mut totals = CapacityTotals::default();
    for entry in entries {
        if let LedgerChange::Capacity {
            ml_capacity,
            potion_capacity,
        } = entry.change
        {
            totals.ml_capacity = totals
                .ml_capacity
                .checked_add(ml_capacity)
                .ok_or(LedgerError::Overflow(LedgerKind::Capacity))?;
            totals.potion_capacity = totals
                .potion_capacity
                .checked_add(potion_capacity)
                .ok_or(LedgerError::Overflow(LedgerKind::Capacity))?;
        }
    }
    Ok(totals)
}

/// Fold all four ledgers into a [`StateSnapshot`].
pub fn fold(entries: &[LedgerEntry]) -> Result<StateSnapshot, LedgerError> {
    let capacity = capacity_totals(entries)?;
    Ok(StateSnapshot {
        gold: gold_total(entries)?,
        ml: ml_totals(entries)?,
        potions: potion_totals(entries)?,
        ml_capacity: capacity.ml_capacity,
        potion_capacity: capacity.potion_capacity,
    })
}

/// Assemble a snapshot from separately read totals.
///
/// Storage backends that aggregate in the database call this with their
/// query results. Colors missing from `ml` are filled with zero so every
/// snapshot carries all four.
pub fn assemble(
    gold: i64,
    mut ml: BTreeMap<Color, i64>,
    potions: BTreeMap<String, i64>,
    capacity: CapacityTotals,
) -> StateSnapshot {
    for color in Color::ALL {
        ml.entry(color).or_insert(0);
    }
    StateSnapshot {
        gold,
        ml,
        potions,
        ml_capacity: capacity.ml_capacity,
        potion_capacity: capacity.potion_capacity,
    }
}
