//! Customer carts and checkout pricing.
//!
//! A cart line is sold only when the shop holds at least the requested
//! quantity; lines that cannot be filled are skipped, never partially
//! filled.

use std::collections::BTreeMap;

use apothecary_types::{CartId, Customer, Recipe, SaleLine, StateSnapshot};
use serde::{Deserialize, Serialize};

/// A customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart identifier.
    pub id: CartId,
    /// Who is shopping.
    pub customer: Customer,
    /// Requested bottles per recipe SKU.
    items: BTreeMap<String, u32>,
}

impl Cart {
    /// Open an empty cart.
    pub fn new(customer: Customer) -> Self {
        Self {
            id: CartId::new(),
            customer,
            items: BTreeMap::new(),
        }
    }

    /// Set the requested quantity for `sku`. Zero removes the line.
    pub fn set_item_quantity(&mut self, sku: impl Into<String>, quantity: u32) {
        let sku = sku.into();
        if quantity == 0 {
            self.items.remove(&sku);
        } else {
            self.items.insert(sku, quantity);
        }
    }

    /// Requested lines, ordered by SKU.
    pub const fn items(&self) -> &BTreeMap<String, u32> {
        &self.items
    }
}

/// What a checkout sold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    /// Lines actually sold.
    pub lines: Vec<SaleLine>,
    /// Bottles sold.
    pub potions_bought: u64,
    /// Gold received.
    pub total_gold_paid: i64,
}

/// Price a cart against current stock.
pub fn price_checkout(cart: &Cart, state: &StateSnapshot, recipes: &[Recipe]) -> CheckoutReceipt {
    let mut receipt = CheckoutReceipt::default();

    for (sku, quantity) in &cart.items {
        let Some(recipe) = recipes.iter().find(|r| &r.sku == sku) else {
            tracing::warn!(cart_id = %cart.id, %sku, "Cart names an unknown recipe");
            continue;
        };
        let stock = state.potions_of(sku);
        if i64::from(*quantity) > stock {
            tracing::debug!(cart_id = %cart.id, %sku, quantity, stock, "Not enough stock for cart line");
            continue;
        }
        let paid = i64::from(recipe.price).saturating_mul(i64::from(*quantity));
        receipt.potions_bought = receipt.potions_bought.saturating_add(u64::from(*quantity));
        receipt.total_gold_paid = receipt.total_gold_paid.saturating_add(paid);
        receipt.lines.push(SaleLine {
            sku: sku.clone(),
            quantity: *quantity,
            price: recipe.price,
        });
    }

    receipt
}

#[cfg(test)]
mod tests {
    use apothecary_types::Color;

    use super::*;
    use crate::config::default_recipes;

    fn customer() -> Customer {
        Customer {
            customer_name: "Aldric".to_owned(),
            character_class: "Ranger".to_owned(),
            level: 7,
        }
    }

    fn state() -> StateSnapshot {
        let mut potions = BTreeMap::new();
        potions.insert("GREEN_POTION_0".to_owned(), 5);
        potions.insert("RED_POTION_0".to_owned(), 1);
        StateSnapshot {
            gold: 0,
            ml: Color::ALL.into_iter().map(|c| (c, 0)).collect(),
            potions,
            ml_capacity: 10_000,
            potion_capacity: 50,
        }
    }

    #[test]
    fn set_quantity_zero_removes_line() {
        let mut cart = Cart::new(customer());
        cart.set_item_quantity("GREEN_POTION_0", 2);
        cart.set_item_quantity("GREEN_POTION_0", 0);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn checkout_sells_filled_lines_only() {
        let mut cart = Cart::new(customer());
        cart.set_item_quantity("GREEN_POTION_0", 3);
        cart.set_item_quantity("RED_POTION_0", 2);
        let receipt = price_checkout(&cart, &state(), &default_recipes());
        assert_eq!(
            receipt.lines,
            vec![SaleLine {
                sku: "GREEN_POTION_0".to_owned(),
                quantity: 3,
                price: 50
            }]
        );
        assert_eq!(receipt.potions_bought, 3);
        assert_eq!(receipt.total_gold_paid, 150);
    }

    #[test]
    fn exact_stock_can_be_sold() {
        let mut cart = Cart::new(customer());
        cart.set_item_quantity("RED_POTION_0", 1);
        let receipt = price_checkout(&cart, &state(), &default_recipes());
        assert_eq!(receipt.potions_bought, 1);
    }

    #[test]
    fn unknown_sku_skipped() {
        let mut cart = Cart::new(customer());
        cart.set_item_quantity("MYSTERY_POTION_0", 1);
        let receipt = price_checkout(&cart, &state(), &default_recipes());
        assert!(receipt.lines.is_empty());
        assert_eq!(receipt.total_gold_paid, 0);
    }
}
