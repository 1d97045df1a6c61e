//! Seed types, their cosmetic variants, and seed-specific prompt overrides.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ActionType;
use crate::random::RandomSource;

/// The kind of seed a user planted at onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedType {
    Calm,
    Focus,
    Resilience,
    Gratitude,
}

impl SeedType {
    pub const ALL: [SeedType; 4] = [
        SeedType::Calm,
        SeedType::Focus,
        SeedType::Resilience,
        SeedType::Gratitude,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SeedType::Calm => "Calm",
            SeedType::Focus => "Focus",
            SeedType::Resilience => "Resilience",
            SeedType::Gratitude => "Gratitude",
        }
    }
}

impl fmt::Display for SeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|seed| seed.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown seed type '{s}'"))
    }
}

/// Cosmetic look of a seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedVariant {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub palette: &'static str,
}

const fn variant(
    id: &'static str,
    label: &'static str,
    description: &'static str,
    palette: &'static str,
) -> SeedVariant {
    SeedVariant {
        id,
        label,
        description,
        palette,
    }
}

static CALM_VARIANTS: [SeedVariant; 2] = [
    variant("mist", "Mist Veil", "Soft blue-green leaves that curl inward as you breathe.", "Blue-green"),
    variant("lagoon", "Lagoon Drift", "Gentle teal fronds with rounded edges and quiet glow.", "Teal"),
];

static FOCUS_VARIANTS: [SeedVariant; 2] = [
    variant("ember", "Ember Edge", "Sharp leaf tips and steady amber highlights.", "Amber"),
    variant("stone", "Stone Line", "Structured leaves with cool gray undertones.", "Slate"),
];

static RESILIENCE_VARIANTS: [SeedVariant; 2] = [
    variant("fern", "Fern Rise", "Layered fronds with lively green gradients.", "Green"),
    variant("root", "Rootbound", "Thicker stems and grounded, earthy tones.", "Earth"),
];

static GRATITUDE_VARIANTS: [SeedVariant; 2] = [
    variant("sun", "Sunlit Bloom", "Warm petals that brighten as you grow.", "Golden"),
    variant("peach", "Peach Glow", "Soft blush leaves with subtle warmth.", "Peach"),
];

pub fn seed_variants(seed: SeedType) -> &'static [SeedVariant] {
    match seed {
        SeedType::Calm => &CALM_VARIANTS,
        SeedType::Focus => &FOCUS_VARIANTS,
        SeedType::Resilience => &RESILIENCE_VARIANTS,
        SeedType::Gratitude => &GRATITUDE_VARIANTS,
    }
}

/// The user's selected variant if it belongs to this seed, otherwise a
/// random one from the seed's list.
pub fn seed_variant(
    seed: SeedType,
    selected: Option<&str>,
    rng: &mut impl RandomSource,
) -> &'static SeedVariant {
    let options = seed_variants(seed);
    if let Some(found) = selected.and_then(|id| options.iter().find(|v| v.id == id)) {
        return found;
    }
    &options[rng.next_index(options.len())]
}

/// Seed-specific prompt that replaces the catalog default, if any.
pub fn seed_prompt(action: ActionType, seed: SeedType) -> Option<&'static str> {
    use ActionType as A;
    use SeedType as S;

    let prompt = match (action, seed) {
        (A::Mood, S::Calm) => "How steady does your Calm seed feel today?",
        (A::Mood, S::Focus) => "How centered is your Focus seed today?",
        (A::Mood, S::Resilience) => "How resilient does your seed feel right now?",
        (A::Mood, S::Gratitude) => "How bright does your Gratitude seed feel today?",
        (A::Breath, S::Calm) => "For your Calm seed, take three slow breaths.",
        (A::Breath, S::Focus) => "Take three focused breaths to steady your Focus seed.",
        (A::Reflection, S::Resilience) => "Name one weight your Resilience seed can let go of today.",
        (A::Kindness, S::Gratitude) => {
            "For your Gratitude seed, name one kind action you can offer today."
        }
        (A::Goal, S::Focus) => "Set one tiny goal to nourish your Focus seed.",
        _ => return None,
    };
    Some(prompt)
}
