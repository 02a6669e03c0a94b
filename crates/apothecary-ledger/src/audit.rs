//! Consistency checks on a folded snapshot.
//!
//! The planners guarantee that a plan never overspends gold, never consumes
//! more ml than stocked, and never exceeds capacity. If the ledgers were
//! written only through planned deliveries, every check here passes. A
//! failure produces a [`LedgerAnomaly`] listing each violated invariant.

use apothecary_types::StateSnapshot;

use crate::{AuditFinding, LedgerAnomaly};

/// The result of auditing one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditResult {
    /// Every invariant holds.
    Consistent,
    /// One or more invariants are violated.
    Anomaly(LedgerAnomaly),
}

impl AuditResult {
    /// Whether the snapshot passed every check.
    pub const fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }
}

/// Check a snapshot for negative stocks and capacity overruns.
///
/// Totals that overflow while summing are skipped here; the aggregation
/// step already reports overflow as an error.
pub fn audit_snapshot(snapshot: &StateSnapshot) -> AuditResult {
    let mut findings = Vec::new();

    if snapshot.gold < 0 {
        findings.push(AuditFinding::NegativeGold {
            gold: snapshot.gold,
        });
    }

    for (color, ml) in &snapshot.ml {
        if *ml < 0 {
            findings.push(AuditFinding::NegativeMl {
                color: *color,
                ml: *ml,
            });
        }
    }

    for (sku, quantity) in &snapshot.potions {
        if *quantity < 0 {
            findings.push(AuditFinding::NegativePotions {
                sku: sku.clone(),
                quantity: *quantity,
            });
        }
    }

    if let Some(total) = snapshot.total_ml()
        && total > snapshot.ml_capacity
    {
        findings.push(AuditFinding::MlOverCapacity {
            total,
            capacity: snapshot.ml_capacity,
        });
    }

    if let Some(total) = snapshot.total_potions()
        && total > snapshot.potion_capacity
    {
        findings.push(AuditFinding::PotionsOverCapacity {
            total,
            capacity: snapshot.potion_capacity,
        });
    }

    if findings.is_empty() {
        return AuditResult::Consistent;
    }

    let count = findings.len();
    let detail = findings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    AuditResult::Anomaly(LedgerAnomaly {
        findings,
        message: format!("LEDGER_ANOMALY: {count} inconsistency(ies): {detail}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use apothecary_types::Color;

    use super::*;

    fn snapshot() -> StateSnapshot {
        let ml: BTreeMap<Color, i64> = Color::ALL.into_iter().map(|c| (c, 100)).collect();
        let mut potions = BTreeMap::new();
        potions.insert("GREEN_POTION_0".to_owned(), 5);
        StateSnapshot {
            gold: 100,
            ml,
            potions,
            ml_capacity: 10_000,
            potion_capacity: 50,
        }
    }

    #[test]
    fn healthy_snapshot_is_consistent() {
        assert_eq!(audit_snapshot(&snapshot()), AuditResult::Consistent);
    }

    #[test]
    fn negative_values_reported() {
        let mut state = snapshot();
        state.gold = -5;
        state.ml.insert(Color::Dark, -20);
        state.potions.insert("RED_POTION_0".to_owned(), -1);

        let result = audit_snapshot(&state);
        assert!(!result.is_consistent());
        if let AuditResult::Anomaly(anomaly) = result {
            assert_eq!(anomaly.findings.len(), 3);
            assert!(anomaly
                .findings
                .contains(&AuditFinding::NegativeMl {
                    color: Color::Dark,
                    ml: -20
                }));
            assert!(anomaly.message.starts_with("LEDGER_ANOMALY"));
        }
    }

    #[test]
    fn capacity_overruns_reported() {
        let mut state = snapshot();
        state.ml_capacity = 300;
        state.potion_capacity = 4;

        let result = audit_snapshot(&state);
        assert!(!result.is_consistent());
        if let AuditResult::Anomaly(anomaly) = result {
            assert_eq!(
                anomaly.findings,
                vec![
                    AuditFinding::MlOverCapacity {
                        total: 400,
                        capacity: 300
                    },
                    AuditFinding::PotionsOverCapacity {
                        total: 5,
                        capacity: 4
                    },
                ]
            );
        }
    }
}
