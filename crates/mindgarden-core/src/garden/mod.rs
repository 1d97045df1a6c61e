//! Garden growth economy: XP, levels, nutrients and cosmetics.

pub mod social;
pub mod unlocks;

pub use social::{
    generate_friend_code, normalize_friend_code, Friend, GestureKind, GestureRecord,
    FRIEND_CODE_ALPHABET, FRIEND_CODE_LEN,
};
pub use unlocks::{
    apply_customization, unlock_statuses, CosmeticSlot, CustomizationRequest, Requirement,
    UnlockStatus, Unlockable, UNLOCKABLES,
};

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::DayKey;
use crate::catalog::ActionCategory;
use crate::completion::ActionKind;

/// One of the four progression counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Water,
    Sunlight,
    Soil,
    Bloom,
}

impl Nutrient {
    pub fn as_str(self) -> &'static str {
        match self {
            Nutrient::Water => "water",
            Nutrient::Sunlight => "sunlight",
            Nutrient::Soil => "soil",
            Nutrient::Bloom => "bloom",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ActionCategory {
    /// The bucket this category feeds.
    pub fn nutrient(self) -> Nutrient {
        match self {
            ActionCategory::Calm => Nutrient::Water,
            ActionCategory::Focus => Nutrient::Sunlight,
            ActionCategory::Resilience => Nutrient::Soil,
            ActionCategory::Gratitude => Nutrient::Bloom,
            ActionCategory::Mood => Nutrient::Water,
        }
    }
}

/// Nutrient counters. They only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Nutrients {
    pub water: u32,
    pub sunlight: u32,
    pub soil: u32,
    pub bloom: u32,
}

impl Nutrients {
    pub fn get(&self, nutrient: Nutrient) -> u32 {
        match nutrient {
            Nutrient::Water => self.water,
            Nutrient::Sunlight => self.sunlight,
            Nutrient::Soil => self.soil,
            Nutrient::Bloom => self.bloom,
        }
    }

    pub fn feed(&mut self, nutrient: Nutrient) {
        let slot = match nutrient {
            Nutrient::Water => &mut self.water,
            Nutrient::Sunlight => &mut self.sunlight,
            Nutrient::Soil => &mut self.soil,
            Nutrient::Bloom => &mut self.bloom,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Current cosmetic selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cosmetics {
    pub background: String,
    pub plant_skin: String,
    pub decor: Vec<String>,
}

pub const DEFAULT_BACKGROUND: &str = "dawn-haze";
pub const DEFAULT_PLANT_SKIN: &str = "classic";

impl Default for Cosmetics {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND.to_string(),
            plant_skin: DEFAULT_PLANT_SKIN.to_string(),
            decor: Vec::new(),
        }
    }
}

/// Per-user garden record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenState {
    pub xp_total: u32,
    pub level: u32,
    pub nutrients: Nutrients,
    pub preferred_categories: BTreeSet<ActionCategory>,
    pub cosmetics: Cosmetics,
    pub last_swap_day: Option<DayKey>,
}

impl Default for GardenState {
    fn default() -> Self {
        Self {
            xp_total: 0,
            level: 1,
            nutrients: Nutrients::default(),
            preferred_categories: BTreeSet::new(),
            cosmetics: Cosmetics::default(),
            last_swap_day: None,
        }
    }
}

/// Result of crediting one completion to the garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GardenGrowth {
    pub xp_gained: u32,
    pub xp_total: u32,
    pub level_before: u32,
    pub level_after: u32,
    pub nutrient: Nutrient,
}

impl GardenGrowth {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

pub const DEFAULT_CORE_XP: u32 = 15;
pub const DEFAULT_BONUS_XP: u32 = 7;
pub const DEFAULT_XP_PER_LEVEL: u32 = 100;

/// XP and level rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionRules {
    pub core_xp: u32,
    pub bonus_xp: u32,
    pub xp_per_level: u32,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            core_xp: DEFAULT_CORE_XP,
            bonus_xp: DEFAULT_BONUS_XP,
            xp_per_level: DEFAULT_XP_PER_LEVEL,
        }
    }
}

impl ProgressionRules {
    pub fn xp_for(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Core => self.core_xp,
            ActionKind::Bonus => self.bonus_xp,
        }
    }

    /// `floor(xp / xp_per_level) + 1`.
    pub fn level_for(&self, xp_total: u32) -> u32 {
        xp_total / self.xp_per_level.max(1) + 1
    }

    /// Credit a completion: add XP, raise the level (never lower it), and
    /// feed the category's nutrient by one.
    pub fn apply(
        &self,
        garden: &mut GardenState,
        kind: ActionKind,
        category: ActionCategory,
    ) -> GardenGrowth {
        let xp_gained = self.xp_for(kind);
        let level_before = garden.level;

        garden.xp_total = garden.xp_total.saturating_add(xp_gained);
        garden.level = garden.level.max(self.level_for(garden.xp_total));

        let nutrient = category.nutrient();
        garden.nutrients.feed(nutrient);

        debug!(
            xp_gained,
            xp_total = garden.xp_total,
            level = garden.level,
            %nutrient,
            "garden credited"
        );

        GardenGrowth {
            xp_gained,
            xp_total: garden.xp_total,
            level_before,
            level_after: garden.level,
            nutrient,
        }
    }
}

/// Level for an XP total under the default rules.
pub fn level_for_xp(xp_total: u32) -> u32 {
    ProgressionRules::default().level_for(xp_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_table() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(250), 3);
    }

    #[test]
    fn test_xp_by_kind() {
        let rules = ProgressionRules::default();
        assert_eq!(rules.xp_for(ActionKind::Core), 15);
        assert_eq!(rules.xp_for(ActionKind::Bonus), 7);
    }

    #[test]
    fn test_focus_feeds_only_sunlight() {
        let rules = ProgressionRules::default();
        let mut garden = GardenState::default();
        let growth = rules.apply(&mut garden, ActionKind::Core, ActionCategory::Focus);
        assert_eq!(growth.nutrient, Nutrient::Sunlight);
        assert_eq!(
            garden.nutrients,
            Nutrients { water: 0, sunlight: 1, soil: 0, bloom: 0 }
        );
        assert_eq!(garden.xp_total, 15);
    }

    #[test]
    fn test_nutrient_routing_table() {
        assert_eq!(ActionCategory::Calm.nutrient(), Nutrient::Water);
        assert_eq!(ActionCategory::Focus.nutrient(), Nutrient::Sunlight);
        assert_eq!(ActionCategory::Resilience.nutrient(), Nutrient::Soil);
        assert_eq!(ActionCategory::Gratitude.nutrient(), Nutrient::Bloom);
        assert_eq!(ActionCategory::Mood.nutrient(), Nutrient::Water);
    }

    #[test]
    fn test_level_up_on_crossing_hundred() {
        let rules = ProgressionRules::default();
        let mut garden = GardenState {
            xp_total: 90,
            ..GardenState::default()
        };
        let growth = rules.apply(&mut garden, ActionKind::Core, ActionCategory::Calm);
        assert_eq!(growth.xp_total, 105);
        assert_eq!(growth.level_after, 2);
        assert!(growth.leveled_up());
    }

    #[test]
    fn test_level_never_decreases() {
        let rules = ProgressionRules::default();
        let mut garden = GardenState {
            xp_total: 10,
            level: 4,
            ..GardenState::default()
        };
        let growth = rules.apply(&mut garden, ActionKind::Bonus, ActionCategory::Mood);
        assert_eq!(growth.level_after, 4);
        assert!(!growth.leveled_up());
    }
}
