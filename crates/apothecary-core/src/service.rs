//! The caller-facing planning service.
//!
//! Each planning call aggregates current state from storage, then runs a
//! pure planner over it. Planning never writes; the caller executes the plan
//! and reports deliveries back through [`PlanningService::mutator`].

use apothecary_types::{BarrelOffer, CapacityPlan, CatalogItem, InventoryAudit, StateSnapshot};

use crate::aggregator::aggregate;
use crate::barrels::{plan_purchases, PurchasePlan};
use crate::bottler::{plan_bottling, BottlingPlan};
use crate::capacity::plan_capacity;
use crate::cart::{price_checkout, Cart, CheckoutReceipt};
use crate::catalog::{build_catalog, inventory_audit};
use crate::clock::{RestockPredicate, RestockSchedule, ShopTime};
use crate::config::ShopConfig;
use crate::error::{MutationError, PlanningError};
use crate::mutator::StateMutator;
use crate::store::{LedgerSink, LedgerSource};

/// Planning and mutation over one store.
pub struct PlanningService<S> {
    store: S,
    config: ShopConfig,
    restock: Box<dyn RestockPredicate>,
}

impl<S> core::fmt::Debug for PlanningService<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlanningService")
            .field("shop", &self.config.shop.name)
            .field("recipes", &self.config.recipes.len())
            .finish_non_exhaustive()
    }
}

impl<S: LedgerSource + LedgerSink> PlanningService<S> {
    /// Create a service whose restock fallback follows the configured
    /// schedule.
    pub fn new(store: S, config: ShopConfig) -> Self {
        let restock = Box::new(RestockSchedule::from_config(&config.restock));
        Self {
            store,
            config,
            restock,
        }
    }

    /// Replace the restock predicate.
    #[must_use]
    pub fn with_restock(mut self, restock: impl RestockPredicate + 'static) -> Self {
        self.restock = Box::new(restock);
        self
    }

    /// The active configuration.
    pub const fn config(&self) -> &ShopConfig {
        &self.config
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Aggregate current state.
    pub async fn snapshot(&self) -> Result<StateSnapshot, PlanningError> {
        aggregate(&self.store).await
    }

    /// Plan barrel purchases against today's offers.
    pub async fn compute_purchase_plan(
        &self,
        offers: &[BarrelOffer],
    ) -> Result<PurchasePlan, PlanningError> {
        let state = self.snapshot().await?;
        Ok(plan_purchases(offers, &state, &self.config.barrels))
    }

    /// Plan bottling for the tick at `now`.
    pub async fn compute_bottling_plan(&self, now: ShopTime) -> Result<BottlingPlan, PlanningError> {
        let state = self.snapshot().await?;
        Ok(plan_bottling(
            &state,
            &self.config.recipes,
            &self.config.bottling,
            self.restock.as_ref(),
            now,
        ))
    }

    /// Plan capacity purchases.
    pub async fn compute_capacity_plan(&self) -> Result<CapacityPlan, PlanningError> {
        let state = self.snapshot().await?;
        Ok(plan_capacity(&state, &self.config.capacity))
    }

    /// Headline inventory figures.
    pub async fn audit(&self) -> Result<InventoryAudit, PlanningError> {
        let state = self.snapshot().await?;
        Ok(inventory_audit(&state))
    }

    /// The sellable catalog.
    pub async fn catalog(&self) -> Result<Vec<CatalogItem>, PlanningError> {
        let state = self.snapshot().await?;
        Ok(build_catalog(
            &state,
            &self.config.recipes,
            self.config.catalog.max_items,
        ))
    }

    /// A mutator appending to this service's store.
    pub fn mutator(&self) -> StateMutator<'_, S> {
        StateMutator::new(&self.store, &self.config.recipes, &self.config.capacity)
    }

    /// Sell what the cart asks for, as far as stock allows, and record the
    /// sale.
    ///
    /// Stock is read from one snapshot and the sale is appended in a
    /// separate transaction. This assumes a single writer per shop: two
    /// checkouts racing on the same stock can both pass the read and
    /// oversell.
    pub async fn checkout(&self, cart: &Cart) -> Result<CheckoutReceipt, MutationError> {
        let state = self.snapshot().await?;
        let receipt = price_checkout(cart, &state, &self.config.recipes);
        self.mutator()
            .record_sale(&cart.id.to_string(), &receipt.lines)
            .await?;
        tracing::info!(
            cart_id = %cart.id,
            customer = %cart.customer.customer_name,
            potions_bought = receipt.potions_bought,
            total_gold_paid = receipt.total_gold_paid,
            "Checked out cart"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use apothecary_ledger::LedgerBatch;
    use apothecary_types::{BottleLine, Color, Customer, PotionType, PurchaseLine, TransactionId};

    use super::*;
    use crate::clock::NeverRestock;
    use crate::store::{MemoryStore, MemoryView, StoreError};

    async fn seeded() -> PlanningService<MemoryStore> {
        let service = PlanningService::new(MemoryStore::new(), ShopConfig::default())
            .with_restock(NeverRestock);
        let _ = service.mutator().record_opening_balance(100, 10_000, 50).await;
        service
    }

    fn green_barrel(quantity: u32) -> BarrelOffer {
        BarrelOffer {
            sku: "SMALL_GREEN_BARREL".to_owned(),
            ml_per_barrel: 50,
            potion_type: PotionType::single(Color::Green, 1),
            price: 10,
            quantity,
        }
    }

    /// A store whose backend is down.
    struct OfflineStore;

    impl LedgerSource for OfflineStore {
        type View = MemoryView;

        async fn begin_read(&self) -> Result<MemoryView, StoreError> {
            Err(StoreError::Unavailable {
                message: "connection refused".to_owned(),
            })
        }
    }

    impl LedgerSink for OfflineStore {
        async fn append_ledger_rows(&self, _batch: LedgerBatch) -> Result<TransactionId, StoreError> {
            Err(StoreError::Unavailable {
                message: "connection refused".to_owned(),
            })
        }
    }

    #[tokio::test]
    async fn purchase_plan_from_seeded_shop() {
        let service = seeded().await;
        let plan = service.compute_purchase_plan(&[green_barrel(5)]).await;
        assert!(plan.is_ok());
        if let Ok(plan) = plan {
            assert_eq!(
                plan.lines,
                vec![PurchaseLine {
                    sku: "SMALL_GREEN_BARREL".to_owned(),
                    quantity: 4
                }]
            );
        }
    }

    #[tokio::test]
    async fn planning_does_not_write() {
        let service = seeded().await;
        let before = service.store().len().await;
        let _ = service.compute_purchase_plan(&[green_barrel(5)]).await;
        let _ = service.compute_bottling_plan(ShopTime::from_tick(0)).await;
        let _ = service.compute_capacity_plan().await;
        assert_eq!(service.store().len().await, before);
    }

    #[tokio::test]
    async fn full_cycle_buy_bottle_sell() {
        let service = seeded().await;

        let plan = service
            .compute_purchase_plan(&[green_barrel(5)])
            .await
            .unwrap_or_default();
        let delivered: Vec<BarrelOffer> = plan
            .lines
            .iter()
            .map(|line| BarrelOffer {
                quantity: line.quantity,
                ..green_barrel(0)
            })
            .collect();
        assert!(service
            .mutator()
            .record_barrel_delivery("1", &delivered)
            .await
            .is_ok());

        let bottling = service
            .compute_bottling_plan(ShopTime::from_tick(1))
            .await
            .unwrap_or_default();
        assert_eq!(
            bottling.lines,
            vec![BottleLine {
                potion_type: PotionType::new(0, 100, 0, 0),
                quantity: 2
            }]
        );
        assert!(service
            .mutator()
            .record_bottle_delivery("2", &bottling.lines)
            .await
            .is_ok());

        let catalog = service.catalog().await.unwrap_or_default();
        assert_eq!(catalog.len(), 1);

        let mut cart = Cart::new(Customer {
            customer_name: "Mira".to_owned(),
            character_class: "Cleric".to_owned(),
            level: 3,
        });
        cart.set_item_quantity("GREEN_POTION_0", 2);
        let receipt = service.checkout(&cart).await;
        assert_eq!(receipt.map(|r| r.total_gold_paid).ok(), Some(100));

        let audit = service.audit().await;
        assert_eq!(
            audit.ok(),
            Some(InventoryAudit {
                number_of_potions: 0,
                ml_in_barrels: 0,
                gold: 160
            })
        );
    }

    #[tokio::test]
    async fn restock_fallback_uses_injected_predicate() {
        let mut config = ShopConfig::default();
        config.bottling.stock_target = Some(0);
        let service = PlanningService::new(MemoryStore::new(), config)
            .with_restock(|now: ShopTime| now.hour == 4);
        let _ = service.mutator().record_opening_balance(100, 10_000, 50).await;
        let _ = service
            .mutator()
            .record_barrel_delivery("1", &[green_barrel(10)])
            .await;

        let quiet = service
            .compute_bottling_plan(ShopTime::from_tick(0))
            .await
            .unwrap_or_default();
        assert!(quiet.lines.is_empty());

        let restock = service
            .compute_bottling_plan(ShopTime::from_tick(2))
            .await
            .unwrap_or_default();
        assert!(restock.fallback);
        assert_eq!(restock.total(), 5);
    }

    #[tokio::test]
    async fn default_schedule_restocks_a_fully_stocked_shop() {
        let service = PlanningService::new(MemoryStore::new(), ShopConfig::default());
        let _ = service.mutator().record_opening_balance(1000, 10_000, 50).await;
        let _ = service
            .mutator()
            .record_barrel_delivery("1", &[green_barrel(16)])
            .await;
        let _ = service
            .mutator()
            .record_bottle_delivery(
                "2",
                &[BottleLine {
                    potion_type: PotionType::new(0, 100, 0, 0),
                    quantity: 3,
                }],
            )
            .await;

        let quiet = service
            .compute_bottling_plan(ShopTime::from_tick(5))
            .await
            .unwrap_or_default();
        assert!(quiet.lines.is_empty());

        let restock = service
            .compute_bottling_plan(ShopTime::from_tick(0))
            .await
            .unwrap_or_default();
        assert!(restock.fallback);
        assert_eq!(restock.total(), 5);
    }

    #[tokio::test]
    async fn unreachable_store_fails_closed() {
        let service = PlanningService::new(OfflineStore, ShopConfig::default());
        assert!(matches!(
            service.compute_purchase_plan(&[green_barrel(5)]).await,
            Err(PlanningError::StorageUnavailable { .. })
        ));
        assert!(matches!(
            service.compute_bottling_plan(ShopTime::from_tick(0)).await,
            Err(PlanningError::StorageUnavailable { .. })
        ));
        assert!(matches!(
            service.mutator().record_opening_balance(100, 10_000, 50).await,
            Err(MutationError::TransactionFailed { .. })
        ));
    }
}
