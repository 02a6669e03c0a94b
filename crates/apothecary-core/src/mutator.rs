//! State mutation: turning deliveries, sales, and capacity grants into
//! ledger batches.
//!
//! Each `*_batch` function is pure and builds one [`LedgerBatch`] (or `None`
//! when the event carries nothing to record). [`StateMutator`] appends the
//! batch through a [`LedgerSink`], so every event lands as one atomic unit.

use std::collections::BTreeMap;

use apothecary_ledger::{LedgerBatch, TransactionBuilder};
use apothecary_types::{
    BarrelOffer, BottleLine, CapacityPlan, Color, LedgerChange, LedgerReason, Recipe, SaleLine,
    TransactionId,
};

use crate::config::CapacityPolicy;
use crate::error::MutationError;
use crate::store::LedgerSink;

// ---------------------------------------------------------------------------
// Batch builders
// ---------------------------------------------------------------------------

/// `a * b` as `i64`, or an overflow error naming `context`.
fn product(a: u32, b: u32, context: &'static str) -> Result<i64, MutationError> {
    i64::from(a)
        .checked_mul(i64::from(b))
        .ok_or(MutationError::Overflow { context })
}

fn add(slot: &mut i64, delta: i64, context: &'static str) -> Result<(), MutationError> {
    *slot = slot
        .checked_add(delta)
        .ok_or(MutationError::Overflow { context })?;
    Ok(())
}

/// Batch for the opening balance of a fresh ledger.
///
/// # Errors
///
/// Returns [`MutationError::Ledger`] if capacity is negative.
pub fn opening_balance_batch(
    gold: i64,
    ml_capacity: i64,
    potion_capacity: i64,
) -> Result<Option<LedgerBatch>, MutationError> {
    let mut builder = TransactionBuilder::new(LedgerReason::OpeningBalance).reference("opening");
    if gold != 0 {
        builder = builder.gold(gold);
    }
    if ml_capacity != 0 || potion_capacity != 0 {
        builder = builder.capacity(ml_capacity, potion_capacity);
    }
    if builder.is_empty() {
        return Ok(None);
    }
    Ok(Some(builder.build()?))
}

/// Batch for a barrel delivery: gold out, ml in per color.
///
/// Lines with zero quantity are ignored.
///
/// # Errors
///
/// Returns [`MutationError::UnrecognizedColor`] if a delivered barrel's
/// marker is not one-hot, or [`MutationError::Overflow`] if a total
/// overflows.
pub fn barrel_delivery_batch(
    reference: &str,
    barrels: &[BarrelOffer],
) -> Result<Option<LedgerBatch>, MutationError> {
    let mut cost: i64 = 0;
    let mut ml: BTreeMap<Color, i64> = BTreeMap::new();

    for barrel in barrels.iter().filter(|b| b.quantity > 0) {
        let color = barrel
            .potion_type
            .one_hot_color()
            .ok_or_else(|| MutationError::UnrecognizedColor {
                sku: barrel.sku.clone(),
                potion_type: barrel.potion_type,
            })?;
        add(&mut cost, product(barrel.price, barrel.quantity, "barrel cost")?, "barrel cost")?;
        add(
            ml.entry(color).or_insert(0),
            product(barrel.ml_per_barrel, barrel.quantity, "barrel ml")?,
            "barrel ml",
        )?;
    }

    let mut builder = TransactionBuilder::new(LedgerReason::BarrelDelivery).reference(reference);
    if cost != 0 {
        builder = builder.gold(cost.saturating_neg());
    }
    for (color, amount) in ml.into_iter().filter(|(_, v)| *v != 0) {
        builder = builder.ml(color, amount);
    }
    if builder.is_empty() {
        return Ok(None);
    }
    Ok(Some(builder.build()?))
}

/// Batch for a bottle delivery: potions in per recipe, ml out per color.
///
/// # Errors
///
/// Returns [`MutationError::UnknownRecipe`] if a composition matches no
/// recipe, or [`MutationError::Overflow`] if a total overflows.
pub fn bottle_delivery_batch(
    reference: &str,
    lines: &[BottleLine],
    recipes: &[Recipe],
) -> Result<Option<LedgerBatch>, MutationError> {
    let mut ml: BTreeMap<Color, i64> = BTreeMap::new();
    let mut potions: Vec<(&str, i64)> = Vec::new();

    for line in lines.iter().filter(|l| l.quantity > 0) {
        let recipe = recipes
            .iter()
            .find(|r| r.potion_type == line.potion_type)
            .ok_or(MutationError::UnknownRecipe {
                potion_type: line.potion_type,
            })?;

        let bottles = i64::from(line.quantity);
        match potions.iter_mut().find(|(sku, _)| *sku == recipe.sku) {
            Some((_, total)) => add(total, bottles, "bottle count")?,
            None => potions.push((recipe.sku.as_str(), bottles)),
        }

        for (color, need) in line.potion_type.components() {
            add(
                ml.entry(color).or_insert(0),
                product(need, line.quantity, "bottled ml")?,
                "bottled ml",
            )?;
        }
    }

    let mut builder = TransactionBuilder::new(LedgerReason::Bottling).reference(reference);
    for (color, used) in ml.into_iter().filter(|(_, v)| *v != 0) {
        builder = builder.ml(color, used.saturating_neg());
    }
    for (sku, bottles) in potions {
        builder = builder.potion(sku, bottles);
    }
    if builder.is_empty() {
        return Ok(None);
    }
    Ok(Some(builder.build()?))
}

/// Batch for a completed sale: potions out, gold in.
///
/// # Errors
///
/// Returns [`MutationError::UnknownSku`] if a line names no recipe, or
/// [`MutationError::Overflow`] if the takings overflow.
pub fn sale_batch(
    reference: &str,
    lines: &[SaleLine],
    recipes: &[Recipe],
) -> Result<Option<LedgerBatch>, MutationError> {
    let mut takings: i64 = 0;
    let mut builder = TransactionBuilder::new(LedgerReason::Sale).reference(reference);

    for line in lines.iter().filter(|l| l.quantity > 0) {
        if !recipes.iter().any(|r| r.sku == line.sku) {
            return Err(MutationError::UnknownSku {
                sku: line.sku.clone(),
            });
        }
        builder.push(LedgerChange::Potion {
            sku: line.sku.clone(),
            change: i64::from(line.quantity).saturating_neg(),
        });
        add(&mut takings, product(line.price, line.quantity, "sale takings")?, "sale takings")?;
    }

    if takings != 0 {
        builder = builder.gold(takings);
    }
    if builder.is_empty() {
        return Ok(None);
    }
    Ok(Some(builder.build()?))
}

/// Batch for a capacity purchase: capacity in, gold out.
///
/// # Errors
///
/// Returns [`MutationError::Overflow`] if a grant or the cost overflows.
pub fn capacity_batch(
    reference: &str,
    plan: CapacityPlan,
    policy: &CapacityPolicy,
) -> Result<Option<LedgerBatch>, MutationError> {
    if plan.is_empty() {
        return Ok(None);
    }
    let ml = product(plan.ml_capacity, policy.ml_per_unit, "ml capacity")?;
    let potions = product(plan.potion_capacity, policy.potions_per_unit, "potion capacity")?;
    let units = plan
        .ml_capacity
        .checked_add(plan.potion_capacity)
        .ok_or(MutationError::Overflow {
            context: "capacity units",
        })?;
    let cost = product(units, policy.unit_cost, "capacity cost")?;

    let mut builder = TransactionBuilder::new(LedgerReason::CapacityPurchase)
        .reference(reference)
        .capacity(ml, potions);
    if cost != 0 {
        builder = builder.gold(cost.saturating_neg());
    }
    Ok(Some(builder.build()?))
}

// ---------------------------------------------------------------------------
// Mutator
// ---------------------------------------------------------------------------

/// Appends event batches through a [`LedgerSink`].
///
/// Every `record_*` method returns `Ok(None)` when the event carries nothing
/// to record, and `Ok(Some(id))` with the batch's transaction id otherwise.
/// On error, nothing was appended.
#[derive(Debug)]
pub struct StateMutator<'a, S> {
    sink: &'a S,
    recipes: &'a [Recipe],
    capacity: &'a CapacityPolicy,
}

impl<'a, S: LedgerSink> StateMutator<'a, S> {
    /// Create a mutator over `sink`, resolving recipes against `recipes`.
    pub const fn new(sink: &'a S, recipes: &'a [Recipe], capacity: &'a CapacityPolicy) -> Self {
        Self {
            sink,
            recipes,
            capacity,
        }
    }

    async fn append(
        &self,
        batch: Option<LedgerBatch>,
        event: &'static str,
    ) -> Result<Option<TransactionId>, MutationError> {
        let Some(batch) = batch else {
            tracing::debug!(event, "Nothing to record");
            return Ok(None);
        };
        let rows = batch.len();
        let transaction_id = self.sink.append_ledger_rows(batch).await?;
        tracing::info!(event, %transaction_id, rows, "Recorded ledger batch");
        Ok(Some(transaction_id))
    }

    /// Seed a fresh ledger with opening gold and capacity.
    ///
    /// # Errors
    ///
    /// See [`opening_balance_batch`]; storage failures surface as
    /// [`MutationError::TransactionFailed`].
    pub async fn record_opening_balance(
        &self,
        gold: i64,
        ml_capacity: i64,
        potion_capacity: i64,
    ) -> Result<Option<TransactionId>, MutationError> {
        let batch = opening_balance_batch(gold, ml_capacity, potion_capacity)?;
        self.append(batch, "opening_balance").await
    }

    /// Record delivered barrels.
    ///
    /// # Errors
    ///
    /// See [`barrel_delivery_batch`]; storage failures surface as
    /// [`MutationError::TransactionFailed`].
    pub async fn record_barrel_delivery(
        &self,
        reference: &str,
        barrels: &[BarrelOffer],
    ) -> Result<Option<TransactionId>, MutationError> {
        let batch = barrel_delivery_batch(reference, barrels)?;
        self.append(batch, "barrel_delivery").await
    }

    /// Record bottled potions.
    ///
    /// # Errors
    ///
    /// See [`bottle_delivery_batch`]; storage failures surface as
    /// [`MutationError::TransactionFailed`].
    pub async fn record_bottle_delivery(
        &self,
        reference: &str,
        lines: &[BottleLine],
    ) -> Result<Option<TransactionId>, MutationError> {
        let batch = bottle_delivery_batch(reference, lines, self.recipes)?;
        self.append(batch, "bottle_delivery").await
    }

    /// Record a completed sale.
    ///
    /// # Errors
    ///
    /// See [`sale_batch`]; storage failures surface as
    /// [`MutationError::TransactionFailed`].
    pub async fn record_sale(
        &self,
        reference: &str,
        lines: &[SaleLine],
    ) -> Result<Option<TransactionId>, MutationError> {
        let batch = sale_batch(reference, lines, self.recipes)?;
        self.append(batch, "sale").await
    }

    /// Record purchased capacity units.
    ///
    /// # Errors
    ///
    /// See [`capacity_batch`]; storage failures surface as
    /// [`MutationError::TransactionFailed`].
    pub async fn record_capacity_grant(
        &self,
        reference: &str,
        plan: CapacityPlan,
    ) -> Result<Option<TransactionId>, MutationError> {
        let batch = capacity_batch(reference, plan, self.capacity)?;
        self.append(batch, "capacity_grant").await
    }
}
