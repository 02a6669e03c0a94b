//! Bottling planner.
//!
//! Recipes are visited from least to most stocked. Each recipe bottles one
//! unit at a time while every color it needs is on hand, its per-cycle cap
//! is not reached, and the shop still has potion capacity.
//!
//! When that produces nothing and the restock predicate fires, a fixed
//! fallback batch of one single-color recipe is planned instead. The
//! fallback obeys the same ml and capacity limits as the main pass.

use std::collections::BTreeMap;

use apothecary_types::{BottleLine, Color, Recipe, StateSnapshot};
use serde::Serialize;

use crate::clock::{RestockPredicate, ShopTime};
use crate::config::{BottlingPolicy, FallbackConfig};

/// The result of one bottling planning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BottlingPlan {
    /// Potions to bottle, in production order.
    pub lines: Vec<BottleLine>,
    /// Whether the lines came from the restock fallback.
    pub fallback: bool,
}

impl BottlingPlan {
    /// Total bottles planned.
    pub fn total(&self) -> u64 {
        self.lines
            .iter()
            .fold(0_u64, |acc, l| acc.saturating_add(u64::from(l.quantity)))
    }
}

/// Working ml during planning.
#[derive(Debug, Clone)]
struct Stock {
    ml: BTreeMap<Color, i64>,
}

impl Stock {
    fn new(state: &StateSnapshot) -> Self {
        Self {
            ml: Color::ALL
                .into_iter()
                .map(|c| (c, state.ml_of(c).max(0)))
                .collect(),
        }
    }

    /// Whole bottles of `recipe` the current ml can make.
    fn units_available(&self, recipe: &Recipe) -> u64 {
        recipe
            .potion_type
            .components()
            .into_iter()
            .filter(|(_, need)| *need > 0)
            .map(|(color, need)| {
                let have = u64::try_from(self.ml.get(&color).copied().unwrap_or(0)).unwrap_or(0);
                have.checked_div(u64::from(need)).unwrap_or(0)
            })
            .min()
            .unwrap_or(0)
    }

    /// Remove the ml for `units` bottles of `recipe`.
    fn consume(&mut self, recipe: &Recipe, units: u32) {
        for (color, need) in recipe.potion_type.components() {
            let used = i64::from(need).saturating_mul(i64::from(units));
            if let Some(slot) = self.ml.get_mut(&color) {
                *slot = slot.saturating_sub(used);
            }
        }
    }
}

/// Bottles the shop may still add before hitting potion capacity.
fn max_creatable(state: &StateSnapshot) -> u64 {
    state
        .total_potions()
        .and_then(|total| state.potion_capacity.checked_sub(total))
        .and_then(|room| u64::try_from(room).ok())
        .unwrap_or(0)
}

/// Choose how many potions of each recipe to bottle.
///
/// `recipes` is the catalog in catalog order; ties in stock keep that order.
/// Recipes with an all-zero composition are skipped.
pub fn plan_bottling(
    state: &StateSnapshot,
    recipes: &[Recipe],
    policy: &BottlingPolicy,
    restock: &dyn RestockPredicate,
    now: ShopTime,
) -> BottlingPlan {
    let capacity_left = max_creatable(state);
    if capacity_left == 0 {
        tracing::debug!(
            potion_capacity = state.potion_capacity,
            "Potion capacity reached, nothing to bottle"
        );
        return BottlingPlan::default();
    }

    let mut stock = Stock::new(state);
    let mut ordered: Vec<&Recipe> = recipes.iter().collect();
    ordered.sort_by_key(|r| state.potions_of(&r.sku));

    let mut lines = Vec::new();
    let mut planned: u64 = 0;

    for recipe in ordered {
        if recipe.potion_type.is_empty() {
            tracing::warn!(sku = %recipe.sku, "Skipping recipe with empty composition");
            continue;
        }
        if let Some(target) = policy.stock_target
            && state.potions_of(&recipe.sku) >= i64::from(target)
        {
            continue;
        }

        let room = capacity_left.saturating_sub(planned);
        let units = stock
            .units_available(recipe)
            .min(u64::from(policy.per_recipe_cap))
            .min(room);
        let Ok(units) = u32::try_from(units) else {
            continue;
        };
        if units == 0 {
            continue;
        }

        stock.consume(recipe, units);
        planned = planned.saturating_add(u64::from(units));
        lines.push(BottleLine {
            potion_type: recipe.potion_type,
            quantity: units,
        });

        if planned >= capacity_left {
            tracing::debug!(planned, "Bottling capped by potion capacity");
            break;
        }
    }

    if lines.is_empty()
        && restock.is_restock_tick(now)
        && let Some(line) = fallback_batch(&policy.fallback, recipes, &stock, capacity_left)
    {
        tracing::info!(
            potion_type = %line.potion_type,
            quantity = line.quantity,
            %now,
            "Planned restock fallback batch"
        );
        return BottlingPlan {
            lines: vec![line],
            fallback: true,
        };
    }

    tracing::info!(lines = lines.len(), bottles = planned, "Computed bottling plan");
    BottlingPlan {
        lines,
        fallback: false,
    }
}

/// The restock fallback: a fixed batch of the configured single-color
/// recipe, capped by capacity and by the ml on hand.
fn fallback_batch(
    fallback: &FallbackConfig,
    recipes: &[Recipe],
    stock: &Stock,
    capacity_left: u64,
) -> Option<BottleLine> {
    if !fallback.enabled {
        return None;
    }
    let recipe = recipes.iter().find(|r| r.sku == fallback.sku)?;
    recipe.potion_type.pure_color()?;

    let units = stock
        .units_available(recipe)
        .min(u64::from(fallback.batch))
        .min(capacity_left);
    let units = u32::try_from(units).ok().filter(|u| *u > 0)?;

    Some(BottleLine {
        potion_type: recipe.potion_type,
        quantity: units,
    })
}
