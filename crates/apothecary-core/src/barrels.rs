//! Barrel purchase planner.
//!
//! Greedy round-robin over colors in priority order: each pass buys at most
//! one barrel per needed color, always the most cost-efficient offer that
//! is still available, affordable, and fits in the remaining ml capacity.
//! Passes repeat until no color is needed, gold runs out, or a whole pass
//! buys nothing.
//!
//! The planner is a pure function of its inputs. It never touches storage.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use apothecary_types::{BarrelOffer, Color, PurchaseLine, StateSnapshot};
use serde::Serialize;

use crate::config::BarrelPolicy;

/// Why an offer was left out of planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferIssue {
    /// The color marker is not one-hot.
    UnrecognizedColor,
    /// The barrel yields no liquid.
    ZeroYield,
}

/// An offer the planner could not classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnrecognizedOffer {
    /// Barrel SKU.
    pub sku: String,
    /// What was wrong with it.
    pub issue: OfferIssue,
}

/// The result of one purchase planning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurchasePlan {
    /// Barrels to buy, in first-purchase order.
    pub lines: Vec<PurchaseLine>,
    /// Offers skipped because they could not be classified.
    pub unrecognized: Vec<UnrecognizedOffer>,
    /// Gold the plan spends.
    pub gold_spent: i64,
}

/// An offer with its remaining availability during planning.
#[derive(Debug)]
struct Candidate<'a> {
    offer: &'a BarrelOffer,
    remaining: u32,
}

/// Mutable planning state: what is left after the purchases so far.
#[derive(Debug)]
struct Budget {
    gold: i64,
    ml: BTreeMap<Color, i64>,
    ml_room: i64,
}

impl Budget {
    fn new(state: &StateSnapshot) -> Self {
        let ml: BTreeMap<Color, i64> = Color::ALL
            .into_iter()
            .map(|c| (c, state.ml_of(c).max(0)))
            .collect();
        let tracked = ml.values().try_fold(0_i64, |acc, v| acc.checked_add(*v));
        let ml_room = tracked
            .and_then(|t| state.ml_capacity.checked_sub(t))
            .unwrap_or(0)
            .max(0);
        Self {
            gold: state.gold.max(0),
            ml,
            ml_room,
        }
    }

    fn ml_of(&self, color: Color) -> i64 {
        self.ml.get(&color).copied().unwrap_or(0)
    }

    fn can_take(&self, offer: &BarrelOffer) -> bool {
        i64::from(offer.price) <= self.gold && i64::from(offer.ml_per_barrel) <= self.ml_room
    }

    /// Commit one barrel. Returns `false` and changes nothing if any total
    /// would overflow.
    fn take(&mut self, color: Color, offer: &BarrelOffer) -> bool {
        let price = i64::from(offer.price);
        let ml = i64::from(offer.ml_per_barrel);
        let (Some(gold), Some(room), Some(stock)) = (
            self.gold.checked_sub(price),
            self.ml_room.checked_sub(ml),
            self.ml_of(color).checked_add(ml),
        ) else {
            return false;
        };
        self.gold = gold;
        self.ml_room = room;
        self.ml.insert(color, stock);
        true
    }
}

/// Order two offers by price per ml, cheapest first.
///
/// Compares `a.price / a.ml` against `b.price / b.ml` by cross
/// multiplication. Both yields must be non-zero.
fn cost_per_ml(a: &BarrelOffer, b: &BarrelOffer) -> Ordering {
    let lhs = u64::from(a.price).saturating_mul(u64::from(b.ml_per_barrel));
    let rhs = u64::from(b.price).saturating_mul(u64::from(a.ml_per_barrel));
    lhs.cmp(&rhs)
}

/// Group offers by color, cheapest per ml first, and collect the ones that
/// cannot be classified.
fn partition(
    offers: &[BarrelOffer],
) -> (BTreeMap<Color, Vec<Candidate<'_>>>, Vec<UnrecognizedOffer>) {
    let mut by_color: BTreeMap<Color, Vec<Candidate<'_>>> = BTreeMap::new();
    let mut unrecognized = Vec::new();

    for offer in offers {
        let issue = if offer.ml_per_barrel == 0 {
            Some(OfferIssue::ZeroYield)
        } else if offer.potion_type.one_hot_color().is_none() {
            Some(OfferIssue::UnrecognizedColor)
        } else {
            None
        };

        if let Some(issue) = issue {
            tracing::warn!(
                sku = %offer.sku,
                potion_type = %offer.potion_type,
                ml_per_barrel = offer.ml_per_barrel,
                ?issue,
                "Unrecognized barrel offer"
            );
            unrecognized.push(UnrecognizedOffer {
                sku: offer.sku.clone(),
                issue,
            });
            continue;
        }

        if let Some(color) = offer.potion_type.one_hot_color() {
            by_color.entry(color).or_default().push(Candidate {
                offer,
                remaining: offer.quantity,
            });
        }
    }

    for candidates in by_color.values_mut() {
        candidates.sort_by(|a, b| cost_per_ml(a.offer, b.offer));
    }

    (by_color, unrecognized)
}

/// Add one barrel of `sku` to the plan, merging with an existing line.
fn record(lines: &mut Vec<PurchaseLine>, sku: &str) {
    if let Some(line) = lines.iter_mut().find(|l| l.sku == sku) {
        line.quantity = line.quantity.saturating_add(1);
    } else {
        lines.push(PurchaseLine {
            sku: sku.to_owned(),
            quantity: 1,
        });
    }
}

/// Choose which barrels to buy.
///
/// A color is needed while its ml is below `policy.low_water_ml`. Colors
/// missing from `policy.color_priority` are never bought. Negative stocks
/// and gold in `state` are treated as zero.
pub fn plan_purchases(
    offers: &[BarrelOffer],
    state: &StateSnapshot,
    policy: &BarrelPolicy,
) -> PurchasePlan {
    let (mut by_color, unrecognized) = partition(offers);
    let mut budget = Budget::new(state);
    let starting_gold = budget.gold;
    let low_water = i64::from(policy.low_water_ml);
    let mut lines: Vec<PurchaseLine> = Vec::new();

    loop {
        if budget.gold <= 0 {
            tracing::debug!("Gold exhausted");
            break;
        }

        let mut any_needed = false;
        let mut bought = false;

        for color in &policy.color_priority {
            if budget.ml_of(*color) >= low_water {
                continue;
            }
            any_needed = true;

            let Some(candidates) = by_color.get_mut(color) else {
                continue;
            };
            let Some(candidate) = candidates
                .iter_mut()
                .find(|c| c.remaining > 0 && budget.can_take(c.offer))
            else {
                continue;
            };

            if !budget.take(*color, candidate.offer) {
                continue;
            }
            candidate.remaining = candidate.remaining.saturating_sub(1);
            record(&mut lines, &candidate.offer.sku);
            bought = true;
        }

        if !any_needed {
            break;
        }
        if !bought {
            tracing::debug!(
                gold = budget.gold,
                ml_room = budget.ml_room,
                "No affordable barrel fits for any needed color"
            );
            break;
        }
    }

    let gold_spent = starting_gold.saturating_sub(budget.gold);
    tracing::info!(
        lines = lines.len(),
        gold_spent,
        unrecognized = unrecognized.len(),
        "Computed barrel purchase plan"
    );

    PurchasePlan {
        lines,
        unrecognized,
        gold_spent,
    }
}

#[cfg(test)]
mod tests {
    use apothecary_types::PotionType;

    use super::*;

    fn offer(sku: &str, color: Color, ml: u32, price: u32, quantity: u32) -> BarrelOffer {
        BarrelOffer {
            sku: sku.to_owned(),
            ml_per_barrel: ml,
            potion_type: PotionType::single(color, 1),
            price,
            quantity,
        }
    }

    fn state(gold: i64) -> StateSnapshot {
        StateSnapshot {
            gold,
            ml: Color::ALL.into_iter().map(|c| (c, 0)).collect(),
            potions: BTreeMap::new(),
            ml_capacity: 10_000,
            potion_capacity: 50,
        }
    }

    fn policy() -> BarrelPolicy {
        BarrelPolicy::default()
    }

    fn quantity_of(plan: &PurchasePlan, sku: &str) -> u32 {
        plan.lines
            .iter()
            .find(|l| l.sku == sku)
            .map_or(0, |l| l.quantity)
    }

    #[test]
    fn buys_until_low_water_reached() {
        let offers = vec![offer("SMALL_GREEN_BARREL", Color::Green, 50, 10, 5)];
        let plan = plan_purchases(&offers, &state(100), &policy());
        assert_eq!(
            plan.lines,
            vec![PurchaseLine {
                sku: "SMALL_GREEN_BARREL".to_owned(),
                quantity: 4
            }]
        );
        assert_eq!(plan.gold_spent, 40);
    }

    #[test]
    fn stocked_colors_are_not_bought() {
        let offers = vec![offer("SMALL_RED_BARREL", Color::Red, 500, 100, 10)];
        let mut current = state(1000);
        current.ml.insert(Color::Red, 200);
        let plan = plan_purchases(&offers, &current, &policy());
        assert!(plan.lines.is_empty());
        assert_eq!(plan.gold_spent, 0);
    }

    #[test]
    fn never_spends_more_than_gold() {
        let offers = vec![
            offer("MEDIUM_RED_BARREL", Color::Red, 2500, 250, 10),
            offer("SMALL_BLUE_BARREL", Color::Blue, 500, 120, 10),
            offer("SMALL_GREEN_BARREL", Color::Green, 500, 100, 10),
        ];
        let plan = plan_purchases(&offers, &state(300), &policy());
        assert!(plan.gold_spent <= 300);
        assert_eq!(quantity_of(&plan, "MEDIUM_RED_BARREL"), 1);
        assert_eq!(quantity_of(&plan, "SMALL_BLUE_BARREL"), 0);
        assert_eq!(plan.gold_spent, 250);
    }

    #[test]
    fn unaffordable_offer_does_not_halt_scan() {
        let offers = vec![
            offer("LARGE_DARK_BARREL", Color::Dark, 10_000, 750, 10),
            offer("MINI_GREEN_BARREL", Color::Green, 200, 60, 1),
        ];
        let plan = plan_purchases(&offers, &state(100), &policy());
        assert_eq!(quantity_of(&plan, "LARGE_DARK_BARREL"), 0);
        assert_eq!(quantity_of(&plan, "MINI_GREEN_BARREL"), 1);
    }

    #[test]
    fn never_exceeds_availability() {
        let offers = vec![offer("MINI_RED_BARREL", Color::Red, 50, 10, 2)];
        let plan = plan_purchases(&offers, &state(1000), &policy());
        assert_eq!(quantity_of(&plan, "MINI_RED_BARREL"), 2);
    }

    #[test]
    fn zero_availability_skipped() {
        let offers = vec![
            offer("SMALL_RED_BARREL", Color::Red, 500, 100, 0),
            offer("MINI_RED_BARREL", Color::Red, 200, 60, 1),
        ];
        let plan = plan_purchases(&offers, &state(1000), &policy());
        assert_eq!(
            plan.lines,
            vec![PurchaseLine {
                sku: "MINI_RED_BARREL".to_owned(),
                quantity: 1
            }]
        );
    }

    #[test]
    fn cheapest_per_ml_chosen_first() {
        let offers = vec![
            offer("MINI_BLUE_BARREL", Color::Blue, 200, 60, 10),
            offer("SMALL_BLUE_BARREL", Color::Blue, 500, 120, 10),
        ];
        let plan = plan_purchases(&offers, &state(1000), &policy());
        assert_eq!(plan.lines.first().map(|l| l.sku.as_str()), Some("SMALL_BLUE_BARREL"));
        assert_eq!(quantity_of(&plan, "MINI_BLUE_BARREL"), 0);
    }

    #[test]
    fn equal_cost_keeps_offer_order() {
        let offers = vec![
            offer("FIRST_RED", Color::Red, 100, 10, 5),
            offer("SECOND_RED", Color::Red, 200, 20, 5),
        ];
        let plan = plan_purchases(&offers, &state(1000), &policy());
        assert_eq!(quantity_of(&plan, "FIRST_RED"), 2);
        assert_eq!(quantity_of(&plan, "SECOND_RED"), 0);
    }

    #[test]
    fn priority_order_decides_who_gets_scarce_gold() {
        let offers = vec![
            offer("SMALL_RED_BARREL", Color::Red, 500, 100, 1),
            offer("SMALL_DARK_BARREL", Color::Dark, 500, 100, 1),
        ];
        let plan = plan_purchases(&offers, &state(100), &policy());
        assert_eq!(
            plan.lines,
            vec![PurchaseLine {
                sku: "SMALL_DARK_BARREL".to_owned(),
                quantity: 1
            }]
        );
    }

    #[test]
    fn round_robin_interleaves_colors() {
        let offers = vec![
            offer("MINI_RED_BARREL", Color::Red, 100, 10, 5),
            offer("MINI_GREEN_BARREL", Color::Green, 100, 10, 5),
        ];
        let plan = plan_purchases(&offers, &state(30), &policy());
        assert_eq!(quantity_of(&plan, "MINI_RED_BARREL"), 2);
        assert_eq!(quantity_of(&plan, "MINI_GREEN_BARREL"), 1);
        assert_eq!(
            plan.lines.iter().map(|l| l.sku.as_str()).collect::<Vec<_>>(),
            vec!["MINI_RED_BARREL", "MINI_GREEN_BARREL"]
        );
    }

    #[test]
    fn ml_capacity_caps_purchases() {
        let offers = vec![offer("SMALL_GREEN_BARREL", Color::Green, 500, 10, 10)];
        let mut current = state(1000);
        current.ml_capacity = 600;
        current.ml.insert(Color::Red, 300);
        let plan = plan_purchases(&offers, &current, &policy());
        assert!(plan.lines.is_empty());

        current.ml_capacity = 800;
        let plan = plan_purchases(&offers, &current, &policy());
        assert_eq!(quantity_of(&plan, "SMALL_GREEN_BARREL"), 1);
    }

    #[test]
    fn unrecognized_offers_reported() {
        let mut mixed = offer("MIXED_BARREL", Color::Red, 500, 10, 5);
        mixed.potion_type = PotionType::new(1, 1, 0, 0);
        let mut scaled = offer("SCALED_BARREL", Color::Red, 500, 10, 5);
        scaled.potion_type = PotionType::new(0, 0, 100, 0);
        let empty = offer("EMPTY_BARREL", Color::Red, 0, 10, 5);

        let plan = plan_purchases(&[mixed, scaled, empty], &state(1000), &policy());
        assert!(plan.lines.is_empty());
        assert_eq!(plan.unrecognized.len(), 3);
        assert_eq!(
            plan.unrecognized.last(),
            Some(&UnrecognizedOffer {
                sku: "EMPTY_BARREL".to_owned(),
                issue: OfferIssue::ZeroYield
            })
        );
    }

    #[test]
    fn negative_gold_buys_nothing() {
        let offers = vec![offer("MINI_RED_BARREL", Color::Red, 100, 10, 5)];
        let plan = plan_purchases(&offers, &state(-50), &policy());
        assert!(plan.lines.is_empty());
    }

    #[test]
    fn planning_is_deterministic() {
        let offers = vec![
            offer("MINI_RED_BARREL", Color::Red, 100, 10, 5),
            offer("MINI_BLUE_BARREL", Color::Blue, 100, 12, 5),
            offer("MINI_DARK_BARREL", Color::Dark, 100, 15, 5),
        ];
        let first = plan_purchases(&offers, &state(90), &policy());
        let second = plan_purchases(&offers, &state(90), &policy());
        assert_eq!(first, second);
    }
}
