//! Core data structs: compositions, recipes, wholesale offers, plans,
//! ledger-derived snapshots, and ledger entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Color, LedgerKind, LedgerReason};
use crate::ids::{LedgerEntryId, TransactionId};

/// Millilitres of liquid in one bottled potion.
pub const UNIT_ML: u32 = 100;

// ---------------------------------------------------------------------------
// Composition vector
// ---------------------------------------------------------------------------

/// Per-color ml vector, serialized as `[red, green, blue, dark]`.
///
/// For a recipe this is the ml of each color in one bottle. For a barrel
/// offer it is a one-hot marker selecting the barrel's color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct PotionType {
    /// Red component.
    pub red: u32,
    /// Green component.
    pub green: u32,
    /// Blue component.
    pub blue: u32,
    /// Dark component.
    pub dark: u32,
}

impl PotionType {
    /// Build a vector from its four components.
    pub const fn new(red: u32, green: u32, blue: u32, dark: u32) -> Self {
        Self {
            red,
            green,
            blue,
            dark,
        }
    }

    /// A vector with `amount` in `color` and zero elsewhere.
    pub const fn single(color: Color, amount: u32) -> Self {
        match color {
            Color::Red => Self::new(amount, 0, 0, 0),
            Color::Green => Self::new(0, amount, 0, 0),
            Color::Blue => Self::new(0, 0, amount, 0),
            Color::Dark => Self::new(0, 0, 0, amount),
        }
    }

    /// The component for `color`.
    pub const fn ml(&self, color: Color) -> u32 {
        match color {
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Blue => self.blue,
            Color::Dark => self.dark,
        }
    }

    /// `(color, component)` pairs in canonical order.
    pub const fn components(&self) -> [(Color, u32); 4] {
        [
            (Color::Red, self.red),
            (Color::Green, self.green),
            (Color::Blue, self.blue),
            (Color::Dark, self.dark),
        ]
    }

    /// Sum of all components. `None` on overflow.
    pub fn total(&self) -> Option<u32> {
        self.red
            .checked_add(self.green)?
            .checked_add(self.blue)?
            .checked_add(self.dark)
    }

    /// Whether every component is zero.
    pub const fn is_empty(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0 && self.dark == 0
    }

    /// The color selected by a one-hot barrel marker.
    ///
    /// Returns `Some` only when exactly one component is `1` and the rest
    /// are `0`.
    pub fn one_hot_color(&self) -> Option<Color> {
        let mut selected = None;
        for (color, value) in self.components() {
            match value {
                0 => {}
                1 if selected.is_none() => selected = Some(color),
                _ => return None,
            }
        }
        selected
    }

    /// If this composition uses a single color, return it.
    pub fn pure_color(&self) -> Option<Color> {
        let mut nonzero = self.components().into_iter().filter(|(_, v)| *v > 0);
        let first = nonzero.next()?;
        if nonzero.next().is_some() {
            return None;
        }
        Some(first.0)
    }
}

impl From<[u32; 4]> for PotionType {
    fn from([red, green, blue, dark]: [u32; 4]) -> Self {
        Self::new(red, green, blue, dark)
    }
}

impl From<PotionType> for [u32; 4] {
    fn from(p: PotionType) -> Self {
        [p.red, p.green, p.blue, p.dark]
    }
}

impl core::fmt::Display for PotionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.red, self.green, self.blue, self.dark)
    }
}

// ---------------------------------------------------------------------------
// Catalog data
// ---------------------------------------------------------------------------

/// A potion recipe: fixed composition per bottle and a sale price.
///
/// Stock on hand is never stored here; it is derived from the potion ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stock-keeping unit, unique across recipes.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// ml of each color in one bottle.
    pub potion_type: PotionType,
    /// Sale price in gold.
    pub price: u32,
}

/// A wholesale barrel listing.
///
/// The same shape describes a delivery line, in which case `quantity` is
/// the number of barrels delivered rather than the number advertised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrelOffer {
    /// Barrel stock-keeping unit.
    pub sku: String,
    /// ml of liquid yielded by one barrel.
    pub ml_per_barrel: u32,
    /// One-hot color marker.
    pub potion_type: PotionType,
    /// Price of one barrel in gold.
    pub price: u32,
    /// Available (or delivered) barrel count.
    pub quantity: u32,
}

/// A customer visiting the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer name.
    pub customer_name: String,
    /// Character class, informational only.
    pub character_class: String,
    /// Character level, informational only.
    pub level: u32,
}

// ---------------------------------------------------------------------------
// Plans and outcomes
// ---------------------------------------------------------------------------

/// One line of a barrel purchase plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    /// Barrel SKU to buy.
    pub sku: String,
    /// Number of barrels, always at least 1.
    pub quantity: u32,
}

/// One line of a bottling plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottleLine {
    /// Composition of the potion to bottle; identifies the recipe.
    pub potion_type: PotionType,
    /// Number of bottles, always at least 1.
    pub quantity: u32,
}

/// One line of a completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    /// Recipe SKU sold.
    pub sku: String,
    /// Bottles sold.
    pub quantity: u32,
    /// Unit price charged.
    pub price: u32,
}

/// Capacity units to buy this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPlan {
    /// Potion capacity units.
    pub potion_capacity: u32,
    /// ml capacity units.
    pub ml_capacity: u32,
}

impl CapacityPlan {
    /// Whether nothing is to be bought.
    pub const fn is_empty(&self) -> bool {
        self.potion_capacity == 0 && self.ml_capacity == 0
    }
}

/// Summary figures reported by the inventory audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAudit {
    /// Total bottled potions across recipes.
    pub number_of_potions: i64,
    /// Total ml across colors.
    pub ml_in_barrels: i64,
    /// Gold on hand.
    pub gold: i64,
}

/// A sellable catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Recipe SKU.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Bottles in stock.
    pub quantity: i64,
    /// Unit price.
    pub price: u32,
    /// Composition.
    pub potion_type: PotionType,
}

// ---------------------------------------------------------------------------
// Ledger-derived state
// ---------------------------------------------------------------------------

/// Current shop state, computed as a fold over the ledgers.
///
/// Missing colors or recipes read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Gold on hand.
    pub gold: i64,
    /// ml stocked per color.
    pub ml: BTreeMap<Color, i64>,
    /// Bottles stocked per recipe SKU.
    pub potions: BTreeMap<String, i64>,
    /// Maximum total ml across colors.
    pub ml_capacity: i64,
    /// Maximum total bottles across recipes.
    pub potion_capacity: i64,
}

impl StateSnapshot {
    /// ml of `color` on hand.
    pub fn ml_of(&self, color: Color) -> i64 {
        self.ml.get(&color).copied().unwrap_or(0)
    }

    /// Bottles of `sku` on hand.
    pub fn potions_of(&self, sku: &str) -> i64 {
        self.potions.get(sku).copied().unwrap_or(0)
    }

    /// Total ml across colors. `None` on overflow.
    pub fn total_ml(&self) -> Option<i64> {
        self.ml.values().try_fold(0_i64, |acc, v| acc.checked_add(*v))
    }

    /// Total bottles across recipes. `None` on overflow.
    pub fn total_potions(&self) -> Option<i64> {
        self.potions
            .values()
            .try_fold(0_i64, |acc, v| acc.checked_add(*v))
    }
}

/// Running capacity totals from the capacity ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityTotals {
    /// Maximum total ml across colors.
    pub ml_capacity: i64,
    /// Maximum total bottles across recipes.
    pub potion_capacity: i64,
}

// ---------------------------------------------------------------------------
// Ledger entries
// ---------------------------------------------------------------------------

/// The signed change a ledger row carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ledger", rename_all = "snake_case")]
pub enum LedgerChange {
    /// Gold gained (positive) or spent (negative).
    Gold {
        /// Signed gold delta.
        change: i64,
    },
    /// ml of one color gained or consumed.
    Ml {
        /// The liquid color.
        color: Color,
        /// Signed ml delta.
        change: i64,
    },
    /// Bottles of one recipe gained or sold.
    Potion {
        /// Recipe SKU.
        sku: String,
        /// Signed bottle delta.
        change: i64,
    },
    /// Capacity granted.
    Capacity {
        /// ml capacity added.
        ml_capacity: i64,
        /// Potion capacity added.
        potion_capacity: i64,
    },
}

impl LedgerChange {
    /// Which ledger this change belongs to.
    pub const fn kind(&self) -> LedgerKind {
        match self {
            Self::Gold { .. } => LedgerKind::Gold,
            Self::Ml { .. } => LedgerKind::Ml,
            Self::Potion { .. } => LedgerKind::Potion,
            Self::Capacity { .. } => LedgerKind::Capacity,
        }
    }
}

/// A single immutable row in one of the shop ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique row identifier.
    pub id: LedgerEntryId,
    /// Batch this row was appended in.
    pub transaction_id: TransactionId,
    /// The change recorded.
    pub change: LedgerChange,
    /// Why the row was written.
    pub reason: LedgerReason,
    /// External reference such as an order or cart id.
    pub reference: Option<String>,
    /// Real-world timestamp.
    pub created_at: DateTime<Utc>,
}
