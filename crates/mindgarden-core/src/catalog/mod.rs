//! Fixed catalog of daily micro-actions.
//!
//! The catalog order is significant: bonus candidates are taken in catalog
//! order, and the rotation fallback indexes into it by epoch day.

pub mod seed;

pub use seed::{seed_prompt, seed_variant, seed_variants, SeedType, SeedVariant};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Category of an action. Each category feeds exactly one nutrient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionCategory {
    Calm,
    Focus,
    Resilience,
    Gratitude,
    Mood,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 5] = [
        ActionCategory::Calm,
        ActionCategory::Focus,
        ActionCategory::Resilience,
        ActionCategory::Gratitude,
        ActionCategory::Mood,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionCategory::Calm => "Calm",
            ActionCategory::Focus => "Focus",
            ActionCategory::Resilience => "Resilience",
            ActionCategory::Gratitude => "Gratitude",
            ActionCategory::Mood => "Mood",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Stable identifier of a catalog entry.
///
/// Declaration order matches [`ACTION_CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Mood,
    Gratitude,
    Breath,
    Reflection,
    Goal,
    Kindness,
    BodyScan,
    Reframe,
    Reset,
    FocusBlock,
    GratitudeNote,
    MicroBreak,
    Release,
    Affirmation,
    MindfulWalk,
    SelfCompassion,
    ClearSpace,
    Connection,
    FutureSelf,
    Savor,
}

/// What the user has to hand in to complete an action as a core action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseRequirement {
    /// Tap to complete
    None,
    /// A 1..=5 mood score
    MoodScore,
    /// One non-empty sentence
    Text,
    /// Three noticed sensations
    BodyScan,
    /// A stressful thought and its gentler rewrite
    Reframe,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Mood => "mood",
            ActionType::Gratitude => "gratitude",
            ActionType::Breath => "breath",
            ActionType::Reflection => "reflection",
            ActionType::Goal => "goal",
            ActionType::Kindness => "kindness",
            ActionType::BodyScan => "body_scan",
            ActionType::Reframe => "reframe",
            ActionType::Reset => "reset",
            ActionType::FocusBlock => "focus_block",
            ActionType::GratitudeNote => "gratitude_note",
            ActionType::MicroBreak => "micro_break",
            ActionType::Release => "release",
            ActionType::Affirmation => "affirmation",
            ActionType::MindfulWalk => "mindful_walk",
            ActionType::SelfCompassion => "self_compassion",
            ActionType::ClearSpace => "clear_space",
            ActionType::Connection => "connection",
            ActionType::FutureSelf => "future_self",
            ActionType::Savor => "savor",
        }
    }

    pub fn definition(self) -> &'static ActionDefinition {
        &ACTION_CATALOG[self as usize]
    }

    pub fn category(self) -> ActionCategory {
        self.definition().category
    }

    /// Reflective types that are reserved for the core slot and never
    /// offered as bonus actions.
    pub fn is_core_flavored(self) -> bool {
        matches!(
            self,
            ActionType::Mood
                | ActionType::Gratitude
                | ActionType::GratitudeNote
                | ActionType::Reflection
                | ActionType::Goal
                | ActionType::FutureSelf
                | ActionType::Kindness
                | ActionType::Reframe
                | ActionType::BodyScan
        )
    }

    /// Types whose form asks for a sentence of text.
    pub fn takes_text(self) -> bool {
        matches!(
            self,
            ActionType::Gratitude
                | ActionType::GratitudeNote
                | ActionType::Reflection
                | ActionType::Goal
                | ActionType::FutureSelf
                | ActionType::Kindness
                | ActionType::Affirmation
                | ActionType::SelfCompassion
                | ActionType::Connection
                | ActionType::Savor
        )
    }

    pub fn response_requirement(self) -> ResponseRequirement {
        match self {
            ActionType::Mood => ResponseRequirement::MoodScore,
            ActionType::BodyScan => ResponseRequirement::BodyScan,
            ActionType::Reframe => ResponseRequirement::Reframe,
            t if t.takes_text() => ResponseRequirement::Text,
            _ => ResponseRequirement::None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_action(s)
            .map(|def| def.action_type)
            .ok_or_else(|| EngineError::InvalidActionType(s.to_string()))
    }
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub label: &'static str,
    pub prompt: &'static str,
    pub category: ActionCategory,
}

const fn action(
    action_type: ActionType,
    label: &'static str,
    prompt: &'static str,
    category: ActionCategory,
) -> ActionDefinition {
    ActionDefinition {
        action_type,
        label,
        prompt,
        category,
    }
}

/// The action designated as the mood check-in.
pub const MOOD_ACTION: ActionType = ActionType::Mood;

/// Label shown for types that are not in the catalog.
pub const FALLBACK_LABEL: &str = "Daily Action";

pub static ACTION_CATALOG: [ActionDefinition; 20] = [
    action(ActionType::Mood, "Mood Check", "Where is your mood today?", ActionCategory::Mood),
    action(ActionType::Gratitude, "Gratitude", "Name one thing you appreciate.", ActionCategory::Gratitude),
    action(ActionType::Breath, "Calm Breath", "Take three slow breaths.", ActionCategory::Calm),
    action(ActionType::Reflection, "Stress Reflection", "What is one thing you can release?", ActionCategory::Resilience),
    action(ActionType::Goal, "Micro Goal", "Set one tiny goal for today.", ActionCategory::Focus),
    action(ActionType::Kindness, "Kindness Ping", "Name one kind action you can do today.", ActionCategory::Gratitude),
    action(ActionType::BodyScan, "Body Scan", "Notice three sensations in your body.", ActionCategory::Calm),
    action(ActionType::Reframe, "Positive Reframe", "Rewrite a stressful thought into a gentler one.", ActionCategory::Resilience),
    action(ActionType::Reset, "60-Second Reset", "Close your eyes and relax your shoulders.", ActionCategory::Calm),
    action(ActionType::FocusBlock, "Focus Block", "Choose one task and set a 10-minute timer.", ActionCategory::Focus),
    action(ActionType::GratitudeNote, "Gratitude Note", "Write a single sentence of thanks.", ActionCategory::Gratitude),
    action(ActionType::MicroBreak, "Micro Break", "Step away from your screen for one minute.", ActionCategory::Calm),
    action(ActionType::Release, "Let It Go", "Name one thing you can let slide today.", ActionCategory::Resilience),
    action(ActionType::Affirmation, "Gentle Affirmation", "Say a kind sentence to yourself.", ActionCategory::Resilience),
    action(ActionType::MindfulWalk, "Mindful Step", "Take 10 slow steps and notice your feet.", ActionCategory::Calm),
    action(ActionType::SelfCompassion, "Self-Compassion", "Offer yourself the words you would give a friend.", ActionCategory::Gratitude),
    action(ActionType::ClearSpace, "Clear Space", "Put away one small item around you.", ActionCategory::Focus),
    action(ActionType::Connection, "Connection Ping", "Think of someone and wish them well.", ActionCategory::Gratitude),
    action(ActionType::FutureSelf, "Future Self", "Name one feeling you want tomorrow.", ActionCategory::Focus),
    action(ActionType::Savor, "Savor Moment", "Notice one thing that is good right now.", ActionCategory::Calm),
];

/// The full catalog in display order.
pub fn catalog() -> &'static [ActionDefinition] {
    &ACTION_CATALOG
}

/// Look up a definition by its wire id (e.g. `"body_scan"`).
pub fn find_action(raw: &str) -> Option<&'static ActionDefinition> {
    let raw = raw.trim();
    ACTION_CATALOG
        .iter()
        .find(|def| def.action_type.as_str() == raw)
}

/// Display label for a stored action type; unknown types get a generic label.
pub fn action_label(raw: &str) -> &'static str {
    find_action(raw).map_or(FALLBACK_LABEL, |def| def.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_order_matches_enum() {
        for (index, def) in ACTION_CATALOG.iter().enumerate() {
            assert_eq!(def.action_type as usize, index, "{}", def.action_type);
            assert_eq!(def.action_type.definition(), def);
        }
    }

    #[test]
    fn test_types_are_unique_and_round_trip() {
        let ids: HashSet<_> = ACTION_CATALOG.iter().map(|d| d.action_type.as_str()).collect();
        assert_eq!(ids.len(), ACTION_CATALOG.len());
        for def in catalog() {
            assert_eq!(def.action_type.as_str().parse::<ActionType>().unwrap(), def.action_type);
        }
    }

    #[test]
    fn test_every_category_is_represented() {
        for category in ActionCategory::ALL {
            assert!(
                catalog().iter().any(|d| d.category == category),
                "missing {category}"
            );
        }
        let moods: Vec<_> = catalog()
            .iter()
            .filter(|d| d.category == ActionCategory::Mood)
            .collect();
        assert_eq!(moods.len(), 1);
        assert_eq!(moods[0].action_type, MOOD_ACTION);
    }

    #[test]
    fn test_unknown_type_is_invalid_action_type() {
        let err = "juggling".parse::<ActionType>().unwrap_err();
        assert_eq!(err, EngineError::InvalidActionType("juggling".into()));
    }

    #[test]
    fn test_action_label_fallback() {
        assert_eq!(action_label("body_scan"), "Body Scan");
        assert_eq!(action_label("nope"), FALLBACK_LABEL);
    }

    #[test]
    fn test_response_requirements() {
        assert_eq!(ActionType::Mood.response_requirement(), ResponseRequirement::MoodScore);
        assert_eq!(ActionType::BodyScan.response_requirement(), ResponseRequirement::BodyScan);
        assert_eq!(ActionType::Reframe.response_requirement(), ResponseRequirement::Reframe);
        assert_eq!(ActionType::Savor.response_requirement(), ResponseRequirement::Text);
        assert_eq!(ActionType::Breath.response_requirement(), ResponseRequirement::None);
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(serde_json::to_string(&ActionType::FocusBlock).unwrap(), "\"focus_block\"");
        assert_eq!(serde_json::to_string(&ActionCategory::Resilience).unwrap(), "\"Resilience\"");
        assert_eq!("gratitude".parse::<ActionCategory>().unwrap(), ActionCategory::Gratitude);
    }
}
