//! Shop clock and the restock schedule.
//!
//! The outside world advances in ticks of two in-game hours. Twelve ticks
//! make a day and seven days make a week. The day and hour are derived from
//! the tick counter, never stored independently.
//!
//! The bottling planner's fallback asks a [`RestockPredicate`] whether the
//! current time is a restock tick. The predicate is injected so planners
//! stay deterministic under test.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::RestockConfig;

/// Ticks in one in-game day.
pub const TICKS_PER_DAY: u64 = 12;

/// In-game hours per tick.
const HOURS_PER_TICK: u64 = 2;

/// The seven days of the in-game week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShopDay {
    /// First day of the week.
    Edgeday,
    /// Second day.
    Bloomday,
    /// Third day.
    Arcanaday,
    /// Fourth day.
    Hearthday,
    /// Fifth day.
    Crownday,
    /// Sixth day.
    Blesseday,
    /// Seventh day.
    Soulday,
}

impl ShopDay {
    /// Every day in week order.
    pub const ALL: [Self; 7] = [
        Self::Edgeday,
        Self::Bloomday,
        Self::Arcanaday,
        Self::Hearthday,
        Self::Crownday,
        Self::Blesseday,
        Self::Soulday,
    ];
}

impl core::fmt::Display for ShopDay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Edgeday => "Edgeday",
            Self::Bloomday => "Bloomday",
            Self::Arcanaday => "Arcanaday",
            Self::Hearthday => "Hearthday",
            Self::Crownday => "Crownday",
            Self::Blesseday => "Blesseday",
            Self::Soulday => "Soulday",
        };
        f.write_str(name)
    }
}

/// A point in in-game time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopTime {
    /// Day of the week.
    pub day: ShopDay,
    /// Even hour of the day, 0 through 22.
    pub hour: u8,
}

impl ShopTime {
    /// Derive the day and hour for a tick number.
    pub fn from_tick(tick: u64) -> Self {
        let tick_of_day = tick.checked_rem(TICKS_PER_DAY).unwrap_or(0);
        let day_number = tick.checked_div(TICKS_PER_DAY).unwrap_or(0);
        let day_index = day_number.checked_rem(7).unwrap_or(0);

        let day = usize::try_from(day_index)
            .ok()
            .and_then(|i| ShopDay::ALL.get(i).copied())
            .unwrap_or(ShopDay::Edgeday);
        let hour = tick_of_day
            .checked_mul(HOURS_PER_TICK)
            .and_then(|h| u8::try_from(h).ok())
            .unwrap_or(0);

        Self { day, hour }
    }
}

impl core::fmt::Display for ShopTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {:02}:00", self.day, self.hour)
    }
}

// ---------------------------------------------------------------------------
// Restock predicate
// ---------------------------------------------------------------------------

/// Decides whether a point in time is a restock tick.
pub trait RestockPredicate: Send + Sync {
    /// Whether the bottling fallback may fire at `now`.
    fn is_restock_tick(&self, now: ShopTime) -> bool;
}

impl<F> RestockPredicate for F
where
    F: Fn(ShopTime) -> bool + Send + Sync,
{
    fn is_restock_tick(&self, now: ShopTime) -> bool {
        self(now)
    }
}

/// A predicate that never allows a restock.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRestock;

impl RestockPredicate for NeverRestock {
    fn is_restock_tick(&self, _now: ShopTime) -> bool {
        false
    }
}

/// Restock on configured days and hours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestockSchedule {
    days: BTreeSet<ShopDay>,
    hours: BTreeSet<u8>,
}

impl RestockSchedule {
    /// Build a schedule from configuration.
    pub fn from_config(config: &RestockConfig) -> Self {
        Self {
            days: config.days.iter().copied().collect(),
            hours: config.hours.iter().copied().collect(),
        }
    }
}

impl RestockPredicate for RestockSchedule {
    fn is_restock_tick(&self, now: ShopTime) -> bool {
        self.days.contains(&now.day) && (self.hours.is_empty() || self.hours.contains(&now.hour))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_zero_is_edgeday_midnight() {
        let now = ShopTime::from_tick(0);
        assert_eq!(now.day, ShopDay::Edgeday);
        assert_eq!(now.hour, 0);
    }

    #[test]
    fn ticks_map_to_even_hours() {
        assert_eq!(ShopTime::from_tick(1).hour, 2);
        assert_eq!(ShopTime::from_tick(11).hour, 22);
        let next_day = ShopTime::from_tick(12);
        assert_eq!(next_day.day, ShopDay::Bloomday);
        assert_eq!(next_day.hour, 0);
    }

    #[test]
    fn week_wraps_after_seven_days() {
        let last = ShopTime::from_tick(77);
        assert_eq!(last.day, ShopDay::Soulday);
        assert_eq!(last.hour, 10);
        assert_eq!(ShopTime::from_tick(84).day, ShopDay::Edgeday);
    }

    #[test]
    fn schedule_matches_configured_slots() {
        let schedule = RestockSchedule::from_config(&RestockConfig {
            days: vec![ShopDay::Crownday],
            hours: vec![4],
        });
        let hit = ShopTime {
            day: ShopDay::Crownday,
            hour: 4,
        };
        let wrong_hour = ShopTime {
            day: ShopDay::Crownday,
            hour: 6,
        };
        let wrong_day = ShopTime {
            day: ShopDay::Soulday,
            hour: 4,
        };
        assert!(schedule.is_restock_tick(hit));
        assert!(!schedule.is_restock_tick(wrong_hour));
        assert!(!schedule.is_restock_tick(wrong_day));
    }

    #[test]
    fn empty_hours_means_whole_day() {
        let schedule = RestockSchedule::from_config(&RestockConfig {
            days: vec![ShopDay::Edgeday],
            hours: Vec::new(),
        });
        assert!(schedule.is_restock_tick(ShopTime::from_tick(7)));
    }

    #[test]
    fn empty_days_never_restocks() {
        let schedule = RestockSchedule::from_config(&RestockConfig {
            days: Vec::new(),
            hours: Vec::new(),
        });
        assert!(!schedule.is_restock_tick(ShopTime::from_tick(0)));
    }

    #[test]
    fn closures_are_predicates() {
        let always = |_: ShopTime| true;
        assert!(always.is_restock_tick(ShopTime::from_tick(3)));
        assert!(!NeverRestock.is_restock_tick(ShopTime::from_tick(3)));
    }
}
