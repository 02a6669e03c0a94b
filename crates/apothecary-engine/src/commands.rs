//! Command implementations.
//!
//! Each command takes the connected [`PlanningService`], does one planning
//! or recording step, and returns a serializable outcome that `main` prints
//! as JSON.

use std::collections::BTreeMap;
use std::path::Path;

use apothecary_core::PlanningService;
use apothecary_core::barrels::PurchasePlan;
use apothecary_core::bottler::BottlingPlan;
use apothecary_core::cart::{Cart, CheckoutReceipt};
use apothecary_core::clock::ShopTime;
use apothecary_db::PgLedgerStore;
use apothecary_types::{
    BarrelOffer, BottleLine, CapacityPlan, CatalogItem, Customer, InventoryAudit, TransactionId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EngineError;

/// The service every command runs against.
pub type Service = PlanningService<PgLedgerStore>;

/// Outcome of a recording command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recorded {
    /// The caller's order or cart reference.
    pub reference: String,
    /// Transaction the rows were appended in, or `None` if nothing was
    /// recorded.
    pub transaction_id: Option<TransactionId>,
}

/// A cart as supplied on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct CartFile {
    /// Who is buying.
    pub customer: Customer,
    /// Requested quantity per recipe SKU.
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
}

impl CartFile {
    /// Build a cart, dropping zero-quantity lines.
    pub fn into_cart(self) -> Cart {
        let mut cart = Cart::new(self.customer);
        for (sku, quantity) in self.items {
            cart.set_item_quantity(sku, quantity);
        }
        cart
    }
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let contents = std::fs::read_to_string(path).map_err(|source| EngineError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Plan barrel purchases against a wholesale catalog file.
pub async fn plan_barrels(service: &Service, catalog: &Path) -> Result<PurchasePlan, EngineError> {
    let offers: Vec<BarrelOffer> = read_json(catalog)?;
    info!(offers = offers.len(), "Planning barrel purchases");
    Ok(service.compute_purchase_plan(&offers).await?)
}

/// Plan bottling at `tick`.
pub async fn plan_bottles(service: &Service, tick: u64) -> Result<BottlingPlan, EngineError> {
    let now = ShopTime::from_tick(tick);
    info!(tick, %now, "Planning bottling");
    Ok(service.compute_bottling_plan(now).await?)
}

/// Plan capacity purchases.
pub async fn plan_capacity(service: &Service) -> Result<CapacityPlan, EngineError> {
    Ok(service.compute_capacity_plan().await?)
}

/// Headline inventory figures.
pub async fn audit(service: &Service) -> Result<InventoryAudit, EngineError> {
    Ok(service.audit().await?)
}

/// The sellable catalog.
pub async fn catalog(service: &Service) -> Result<Vec<CatalogItem>, EngineError> {
    Ok(service.catalog().await?)
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// Seed an empty ledger with the configured opening balance.
///
/// A ledger that already holds rows is left alone.
pub async fn seed(service: &Service) -> Result<Recorded, EngineError> {
    let counts = service.store().row_counts().await?;
    let rows = counts.values().fold(0_i64, |acc, n| acc.saturating_add(*n));
    if rows > 0 {
        warn!(rows, "Ledger already seeded, skipping opening balance");
        return Ok(Recorded {
            reference: "opening".to_owned(),
            transaction_id: None,
        });
    }

    let shop = &service.config().shop;
    let transaction_id = service
        .mutator()
        .record_opening_balance(
            shop.opening_gold,
            shop.opening_ml_capacity,
            shop.opening_potion_capacity,
        )
        .await?;
    Ok(Recorded {
        reference: "opening".to_owned(),
        transaction_id,
    })
}

/// Record delivered barrels listed in `file`.
pub async fn deliver_barrels(
    service: &Service,
    order_id: &str,
    file: &Path,
) -> Result<Recorded, EngineError> {
    let barrels: Vec<BarrelOffer> = read_json(file)?;
    let transaction_id = service
        .mutator()
        .record_barrel_delivery(order_id, &barrels)
        .await?;
    Ok(Recorded {
        reference: order_id.to_owned(),
        transaction_id,
    })
}

/// Record bottled potions listed in `file`.
pub async fn deliver_bottles(
    service: &Service,
    order_id: &str,
    file: &Path,
) -> Result<Recorded, EngineError> {
    let lines: Vec<BottleLine> = read_json(file)?;
    let transaction_id = service
        .mutator()
        .record_bottle_delivery(order_id, &lines)
        .await?;
    Ok(Recorded {
        reference: order_id.to_owned(),
        transaction_id,
    })
}

/// Record purchased capacity units.
pub async fn deliver_capacity(
    service: &Service,
    order_id: &str,
    plan: CapacityPlan,
) -> Result<Recorded, EngineError> {
    let transaction_id = service
        .mutator()
        .record_capacity_grant(order_id, plan)
        .await?;
    Ok(Recorded {
        reference: order_id.to_owned(),
        transaction_id,
    })
}

/// Check out the cart described in `file`.
pub async fn checkout(service: &Service, file: &Path) -> Result<CheckoutReceipt, EngineError> {
    let cart = read_json::<CartFile>(file)?.into_cart();
    Ok(service.checkout(&cart).await?)
}

#[cfg(test)]
mod tests {
    use apothecary_types::{Color, PotionType};

    use super::*;

    #[test]
    fn cart_file_drops_zero_lines() {
        let json = r#"{
            "customer": {"customer_name": "Mira", "character_class": "Cleric", "level": 3},
            "items": {"GREEN_POTION_0": 2, "RED_POTION_0": 0}
        }"#;
        let file: Result<CartFile, _> = serde_json::from_str(json);
        assert!(file.is_ok());
        if let Ok(file) = file {
            let cart = file.into_cart();
            assert_eq!(cart.items().len(), 1);
            assert_eq!(cart.items().get("GREEN_POTION_0"), Some(&2));
            assert_eq!(cart.customer.customer_name, "Mira");
        }
    }

    #[test]
    fn cart_file_without_items_is_empty() {
        let json = r#"{"customer": {"customer_name": "Ash", "character_class": "Rogue", "level": 1}}"#;
        let file: Result<CartFile, _> = serde_json::from_str(json);
        assert!(file.is_ok());
        if let Ok(file) = file {
            assert!(file.into_cart().items().is_empty());
        }
    }

    #[test]
    fn barrel_catalog_parses() {
        let json = r#"[{
            "sku": "SMALL_RED_BARREL",
            "ml_per_barrel": 500,
            "potion_type": [1, 0, 0, 0],
            "price": 100,
            "quantity": 10
        }]"#;
        let offers: Result<Vec<BarrelOffer>, _> = serde_json::from_str(json);
        assert!(offers.is_ok());
        if let Ok(offers) = offers {
            assert_eq!(offers.len(), 1);
            assert_eq!(
                offers.first().map(|o| o.potion_type),
                Some(PotionType::single(Color::Red, 1))
            );
        }
    }

    #[test]
    fn bottle_lines_parse() {
        let json = r#"[{"potion_type": [50, 0, 50, 0], "quantity": 3}]"#;
        let lines: Result<Vec<BottleLine>, _> = serde_json::from_str(json);
        assert!(lines.is_ok());
        if let Ok(lines) = lines {
            assert_eq!(
                lines,
                vec![BottleLine {
                    potion_type: PotionType::new(50, 0, 50, 0),
                    quantity: 3
                }]
            );
        }
    }

    #[test]
    fn missing_input_file_is_reported() {
        let result = read_json::<Vec<BottleLine>>(Path::new("/nonexistent/bottles.json"));
        assert!(matches!(result, Err(EngineError::Input { .. })));
    }

    #[test]
    fn recorded_serializes_reference_and_transaction() {
        let recorded = Recorded {
            reference: "7".to_owned(),
            transaction_id: None,
        };
        let json = serde_json::to_string(&recorded).unwrap_or_default();
        assert_eq!(json, r#"{"reference":"7","transaction_id":null}"#);
    }
}
