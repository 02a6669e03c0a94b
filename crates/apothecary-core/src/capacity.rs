//! Capacity purchase planning.
//!
//! Each capacity unit costs `unit_cost` gold and grants either
//! `potions_per_unit` potion slots or `ml_per_unit` ml. At most one unit of
//! each kind is bought per cycle: potions first, then ml.

use apothecary_types::{CapacityPlan, StateSnapshot};

use crate::config::CapacityPolicy;

/// Whether `used` has reached `percent`% of `capacity`.
fn crowded(used: i64, capacity: i64, percent: u32) -> bool {
    if capacity <= 0 {
        return true;
    }
    let lhs = i128::from(used).saturating_mul(100);
    let rhs = i128::from(capacity).saturating_mul(i128::from(percent));
    lhs >= rhs
}

/// Decide how many capacity units to buy this cycle.
pub fn plan_capacity(state: &StateSnapshot, policy: &CapacityPolicy) -> CapacityPlan {
    let mut plan = CapacityPlan::default();
    if !policy.enabled {
        return plan;
    }

    let cost = i64::from(policy.unit_cost);
    let reserve = i64::from(policy.gold_reserve);
    let mut gold = state.gold.max(0);
    let affordable = |gold: &mut i64| match gold.checked_sub(cost) {
        Some(left) if left >= reserve => {
            *gold = left;
            true
        }
        _ => false,
    };

    let potions = state.total_potions().unwrap_or(i64::MAX);
    if crowded(potions, state.potion_capacity, policy.utilization_percent) && affordable(&mut gold) {
        plan.potion_capacity = 1;
    }

    let ml = state.total_ml().unwrap_or(i64::MAX);
    if crowded(ml, state.ml_capacity, policy.utilization_percent) && affordable(&mut gold) {
        plan.ml_capacity = 1;
    }

    if !plan.is_empty() {
        tracing::info!(
            potion_units = plan.potion_capacity,
            ml_units = plan.ml_capacity,
            gold_left = gold,
            "Planned capacity purchase"
        );
    }
    plan
}
