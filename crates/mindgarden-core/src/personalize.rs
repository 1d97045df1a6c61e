//! Prompt personalization by seed type and recent mood.

use serde::Serialize;

use crate::catalog::{seed_prompt, ActionCategory, ActionDefinition, ActionType, SeedType};

pub const STANDARD_VARIANT: &str = "standard";
pub const LOW_MOOD_SUFFIX: &str = " Keep it gentle today.";
pub const HIGH_MOOD_SUFFIX: &str = " Ride that lift with a small win.";

/// An action as it is shown to the user today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalizedAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub label: &'static str,
    pub category: ActionCategory,
    pub prompt: String,
    pub variant: String,
}

/// Rewrite `action`'s prompt for the seed and mood.
///
/// The seed override is applied first, then the mood clause is appended:
/// mood <= 2 gentles the prompt, mood >= 4 encourages, 3 leaves it alone.
pub fn personalize(
    action: &ActionDefinition,
    seed_type: SeedType,
    recent_mood: Option<u8>,
) -> PersonalizedAction {
    let mut prompt = action.prompt.to_string();
    let mut variant = STANDARD_VARIANT.to_string();

    if let Some(seeded) = seed_prompt(action.action_type, seed_type) {
        prompt = seeded.to_string();
        variant = format!("seed-{}", seed_type.as_str().to_lowercase());
    }

    match recent_mood {
        Some(mood) if mood <= 2 => {
            prompt.push_str(LOW_MOOD_SUFFIX);
            variant.push_str("|mood-low");
        }
        Some(mood) if mood >= 4 => {
            prompt.push_str(HIGH_MOOD_SUFFIX);
            variant.push_str("|mood-high");
        }
        _ => {}
    }

    PersonalizedAction {
        action_type: action.action_type,
        label: action.label,
        category: action.category,
        prompt,
        variant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_is_standard() {
        let out = personalize(ActionType::Savor.definition(), SeedType::Calm, None);
        assert_eq!(out.prompt, "Notice one thing that is good right now.");
        assert_eq!(out.variant, "standard");
        assert_eq!(out.label, "Savor Moment");
    }

    #[test]
    fn test_seed_override() {
        let out = personalize(ActionType::Breath.definition(), SeedType::Focus, Some(3));
        assert_eq!(out.prompt, "Take three focused breaths to steady your Focus seed.");
        assert_eq!(out.variant, "seed-focus");
    }

    #[test]
    fn test_seed_override_then_low_mood() {
        let out = personalize(ActionType::Mood.definition(), SeedType::Gratitude, Some(1));
        assert_eq!(
            out.prompt,
            "How bright does your Gratitude seed feel today? Keep it gentle today."
        );
        assert_eq!(out.variant, "seed-gratitude|mood-low");
    }

    #[test]
    fn test_high_mood_without_override() {
        let out = personalize(ActionType::Reset.definition(), SeedType::Resilience, Some(5));
        assert_eq!(
            out.prompt,
            "Close your eyes and relax your shoulders. Ride that lift with a small win."
        );
        assert_eq!(out.variant, "standard|mood-high");
    }

    #[test]
    fn test_mood_boundaries() {
        let def = ActionType::Reset.definition();
        assert!(personalize(def, SeedType::Calm, Some(2)).variant.ends_with("mood-low"));
        assert_eq!(personalize(def, SeedType::Calm, Some(3)).variant, "standard");
        assert!(personalize(def, SeedType::Calm, Some(4)).variant.ends_with("mood-high"));
    }

    #[test]
    fn test_deterministic() {
        let def = ActionType::Goal.definition();
        assert_eq!(
            personalize(def, SeedType::Focus, Some(2)),
            personalize(def, SeedType::Focus, Some(2))
        );
    }
}
