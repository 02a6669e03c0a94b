//! Enumeration types for the potion shop.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Liquid colors
// ---------------------------------------------------------------------------

/// A color of liquid stocked in barrels and mixed into potions.
///
/// The declaration order is the canonical vector order used by every
/// composition: `[red, green, blue, dark]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Red liquid.
    Red,
    /// Green liquid.
    Green,
    /// Blue liquid.
    Blue,
    /// Dark liquid.
    Dark,
}

impl Color {
    /// Every color, in canonical vector order.
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::Blue, Self::Dark];

    /// Lowercase name used in logs, config files, and database rows.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Dark => "dark",
        }
    }

    /// Parse a lowercase color name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl core::fmt::Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ledger kinds and reasons
// ---------------------------------------------------------------------------

/// Which of the four append-only ledgers a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    /// Signed gold changes.
    Gold,
    /// Signed ml changes for one color.
    Ml,
    /// Signed quantity changes for one recipe.
    Potion,
    /// Capacity grants (ml and potion ceilings).
    Capacity,
}

/// Why a ledger row was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    /// Baseline gold and capacity seeded into a fresh ledger.
    OpeningBalance,
    /// Wholesale barrels delivered: gold out, ml in.
    BarrelDelivery,
    /// Potions bottled: ml out, potions in.
    Bottling,
    /// Cart checkout: potions out, gold in.
    Sale,
    /// Extra capacity bought: gold out, capacity in.
    CapacityPurchase,
}

impl LedgerReason {
    /// Snake-case name used in database rows.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpeningBalance => "opening_balance",
            Self::BarrelDelivery => "barrel_delivery",
            Self::Bottling => "bottling",
            Self::Sale => "sale",
            Self::CapacityPurchase => "capacity_purchase",
        }
    }

    /// Parse a snake-case reason name.
    pub fn parse(name: &str) -> Option<Self> {
        [
            Self::OpeningBalance,
            Self::BarrelDelivery,
            Self::Bottling,
            Self::Sale,
            Self::CapacityPurchase,
        ]
        .into_iter()
        .find(|r| r.as_str() == name)
    }
}
