//! Cosmetic unlock catalog.
//!
//! Each item carries its own requirement; unlocking one item never unlocks
//! another.

use serde::{Deserialize, Serialize};

use super::Cosmetics;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticSlot {
    Background,
    Decor,
    PlantSkin,
}

/// Unlock condition of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Requirement {
    /// Garden level at least this
    Level(u32),
    /// Streak count at least this
    Streak(u32),
}

impl Requirement {
    pub fn is_met(self, level: u32, streak_count: u32) -> bool {
        match self {
            Requirement::Level(min) => level >= min,
            Requirement::Streak(min) => streak_count >= min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unlockable {
    pub id: &'static str,
    pub slot: CosmeticSlot,
    pub label: &'static str,
    pub requirement: Requirement,
}

const fn item(
    id: &'static str,
    slot: CosmeticSlot,
    label: &'static str,
    requirement: Requirement,
) -> Unlockable {
    Unlockable {
        id,
        slot,
        label,
        requirement,
    }
}

pub static UNLOCKABLES: [Unlockable; 9] = [
    item("dawn-haze", CosmeticSlot::Background, "Dawn Haze", Requirement::Level(2)),
    item("sunlit-terrace", CosmeticSlot::Background, "Sunlit Terrace", Requirement::Level(4)),
    item("rainy-glass", CosmeticSlot::Background, "Rainy Glass", Requirement::Level(6)),
    item("stone-path", CosmeticSlot::Decor, "Stone Path", Requirement::Streak(5)),
    item("wind-chimes", CosmeticSlot::Decor, "Wind Chimes", Requirement::Streak(10)),
    item("lantern", CosmeticSlot::Decor, "Paper Lantern", Requirement::Streak(21)),
    item("classic", CosmeticSlot::PlantSkin, "Classic Leaves", Requirement::Level(1)),
    item("gloss", CosmeticSlot::PlantSkin, "Gloss Finish", Requirement::Level(3)),
    item("dusk", CosmeticSlot::PlantSkin, "Dusk Veil", Requirement::Level(5)),
];

/// An unlockable with its eligibility for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockStatus {
    #[serde(flatten)]
    pub item: &'static Unlockable,
    pub unlocked: bool,
}

pub fn unlock_statuses(level: u32, streak_count: u32) -> Vec<UnlockStatus> {
    UNLOCKABLES
        .iter()
        .map(|item| UnlockStatus {
            item,
            unlocked: item.requirement.is_met(level, streak_count),
        })
        .collect()
}

fn find_unlockable(id: &str) -> Option<&'static Unlockable> {
    UNLOCKABLES.iter().find(|item| item.id == id)
}

/// Requested cosmetic changes. `None` leaves the slot as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationRequest {
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub plant_skin: Option<String>,
    #[serde(default)]
    pub decor: Option<Vec<String>>,
}

/// Validate every requested id, then return the new selections.
///
/// Nothing is applied if any id is unknown, in the wrong slot, or locked.
///
/// # Errors
/// [`EngineError::UnknownCosmetic`] or [`EngineError::LockedCosmetic`].
pub fn apply_customization(
    current: &Cosmetics,
    request: &CustomizationRequest,
    level: u32,
    streak_count: u32,
) -> Result<Cosmetics, EngineError> {
    let check = |id: &str, slot: CosmeticSlot| -> Result<String, EngineError> {
        let item = find_unlockable(id)
            .filter(|item| item.slot == slot)
            .ok_or_else(|| EngineError::UnknownCosmetic { id: id.to_string() })?;
        if !item.requirement.is_met(level, streak_count) {
            return Err(EngineError::LockedCosmetic { id: id.to_string() });
        }
        Ok(item.id.to_string())
    };

    let mut next = current.clone();
    if let Some(id) = &request.background {
        next.background = check(id, CosmeticSlot::Background)?;
    }
    if let Some(id) = &request.plant_skin {
        next.plant_skin = check(id, CosmeticSlot::PlantSkin)?;
    }
    if let Some(ids) = &request.decor {
        let mut decor = Vec::with_capacity(ids.len());
        for id in ids {
            let id = check(id, CosmeticSlot::Decor)?;
            if !decor.contains(&id) {
                decor.push(id);
            }
        }
        next.decor = decor;
    }
    Ok(next)
}
