//! Garden growth stages driven by streak length.

use serde::{Deserialize, Serialize};

/// Cosmetic streak-length tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrowthStage {
    Seed,
    Sprout,
    Plant,
    Flower,
    Tree,
}

/// Ascending `(stage, minimum streak)` table.
pub const STAGE_THRESHOLDS: [(GrowthStage, u32); 5] = [
    (GrowthStage::Seed, 0),
    (GrowthStage::Sprout, 2),
    (GrowthStage::Plant, 5),
    (GrowthStage::Flower, 10),
    (GrowthStage::Tree, 21),
];

impl GrowthStage {
    /// Highest stage whose threshold is at most `streak_count`.
    pub fn for_streak(streak_count: u32) -> Self {
        STAGE_THRESHOLDS
            .iter()
            .rev()
            .find(|(_, days)| streak_count >= *days)
            .map_or(GrowthStage::Seed, |(stage, _)| *stage)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        STAGE_THRESHOLDS.get(index).map(|(stage, _)| *stage)
    }

    pub fn threshold(self) -> u32 {
        STAGE_THRESHOLDS[self.index()].1
    }

    pub fn name(self) -> &'static str {
        match self {
            GrowthStage::Seed => "Seed",
            GrowthStage::Sprout => "Sprout",
            GrowthStage::Plant => "Plant",
            GrowthStage::Flower => "Flower",
            GrowthStage::Tree => "Tree",
        }
    }
}

pub fn stage_index(streak_count: u32) -> usize {
    GrowthStage::for_streak(streak_count).index()
}

pub fn stage_name(streak_count: u32) -> &'static str {
    GrowthStage::for_streak(streak_count).name()
}

/// The next unreached stage and how many streak days remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextStageInfo {
    pub stage: GrowthStage,
    pub days_remaining: u32,
}

/// `None` once the top stage is reached.
pub fn next_stage_info(streak_count: u32) -> Option<NextStageInfo> {
    STAGE_THRESHOLDS
        .iter()
        .find(|(_, days)| *days > streak_count)
        .map(|(stage, days)| NextStageInfo {
            stage: *stage,
            days_remaining: days - streak_count,
        })
}
