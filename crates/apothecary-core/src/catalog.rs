//! The sellable catalog and the inventory audit.

use std::cmp::Reverse;

use apothecary_types::{CatalogItem, InventoryAudit, Recipe, StateSnapshot};

/// Recipes with bottles in stock, most stocked first, at most `max_items`.
///
/// Ties keep catalog order.
pub fn build_catalog(state: &StateSnapshot, recipes: &[Recipe], max_items: usize) -> Vec<CatalogItem> {
    let mut items: Vec<CatalogItem> = recipes
        .iter()
        .filter_map(|recipe| {
            let quantity = state.potions_of(&recipe.sku);
            (quantity > 0).then(|| CatalogItem {
                sku: recipe.sku.clone(),
                name: recipe.name.clone(),
                quantity,
                price: recipe.price,
                potion_type: recipe.potion_type,
            })
        })
        .collect();
    items.sort_by_key(|item| Reverse(item.quantity));
    items.truncate(max_items);
    items
}

/// Headline inventory figures.
///
/// Totals that overflow saturate; the aggregator has already reported the
/// ledger as inconsistent in that case.
pub fn inventory_audit(state: &StateSnapshot) -> InventoryAudit {
    InventoryAudit {
        number_of_potions: state.total_potions().unwrap_or(i64::MAX),
        ml_in_barrels: state.total_ml().unwrap_or(i64::MAX),
        gold: state.gold,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use apothecary_types::Color;

    use super::*;
    use crate::config::default_recipes;

    fn state(potions: &[(&str, i64)]) -> StateSnapshot {
        StateSnapshot {
            gold: 250,
            ml: Color::ALL.into_iter().map(|c| (c, 100)).collect(),
            potions: potions
                .iter()
                .map(|(sku, q)| ((*sku).to_owned(), *q))
                .collect::<BTreeMap<_, _>>(),
            ml_capacity: 10_000,
            potion_capacity: 50,
        }
    }

    #[test]
    fn out_of_stock_recipes_hidden() {
        let catalog = build_catalog(&state(&[("RED_POTION_0", 0)]), &default_recipes(), 6);
        assert!(catalog.is_empty());
    }

    #[test]
    fn ordered_by_stock_then_catalog() {
        let current = state(&[
            ("BLUE_POTION_0", 2),
            ("GREEN_POTION_0", 5),
            ("RED_POTION_0", 2),
        ]);
        let catalog = build_catalog(&current, &default_recipes(), 6);
        let skus: Vec<&str> = catalog.iter().map(|c| c.sku.as_str()).collect();
        assert_eq!(skus, vec!["GREEN_POTION_0", "RED_POTION_0", "BLUE_POTION_0"]);
        assert_eq!(catalog.first().map(|c| c.name.as_str()), Some("green potion"));
    }

    #[test]
    fn catalog_is_truncated() {
        let current = state(&[
            ("RED_POTION_0", 1),
            ("GREEN_POTION_0", 1),
            ("BLUE_POTION_0", 1),
        ]);
        assert_eq!(build_catalog(&current, &default_recipes(), 2).len(), 2);
    }

    #[test]
    fn audit_sums_totals() {
        let current = state(&[("RED_POTION_0", 3), ("GREEN_POTION_0", 4)]);
        assert_eq!(
            inventory_audit(&current),
            InventoryAudit {
                number_of_potions: 7,
                ml_in_barrels: 400,
                gold: 250
            }
        );
    }
}
