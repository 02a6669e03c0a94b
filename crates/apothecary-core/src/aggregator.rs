//! Reduce the four ledgers into a [`StateSnapshot`].
//!
//! Every total is read from one [`LedgerView`], so the snapshot reflects a
//! single point in time. The snapshot is then audited; inconsistencies are
//! logged at `warn` and the snapshot is returned regardless.

use apothecary_ledger::aggregate::assemble;
use apothecary_ledger::audit::{audit_snapshot, AuditResult};
use apothecary_types::StateSnapshot;

use crate::error::PlanningError;
use crate::store::{LedgerSource, LedgerView};

/// Read and fold current shop state.
///
/// # Errors
///
/// Returns [`PlanningError::StorageUnavailable`] if the backend cannot be
/// read, or [`PlanningError::Ledger`] if the stored rows cannot be summed.
pub async fn aggregate<S: LedgerSource>(source: &S) -> Result<StateSnapshot, PlanningError> {
    let mut view = source.begin_read().await?;
    let gold = view.read_gold_total().await?;
    let ml = view.read_ml_totals_by_color().await?;
    let potions = view.read_potion_totals_by_recipe().await?;
    let capacity = view.read_capacity_totals().await?;
    view.finish().await?;

    let snapshot = assemble(gold, ml, potions, capacity);

    if let AuditResult::Anomaly(anomaly) = audit_snapshot(&snapshot) {
        for finding in &anomaly.findings {
            tracing::warn!(%finding, "Ledger inconsistency");
        }
    }

    tracing::debug!(
        gold = snapshot.gold,
        ml_total = ?snapshot.total_ml(),
        potion_total = ?snapshot.total_potions(),
        ml_capacity = snapshot.ml_capacity,
        potion_capacity = snapshot.potion_capacity,
        "Aggregated shop state"
    );

    Ok(snapshot)
}
