//! Friend codes and nutrient gestures between friends.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GardenState, Nutrient};
use crate::calendar::Instant;
use crate::catalog::ActionCategory;
use crate::random::RandomSource;

pub const FRIEND_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const FRIEND_CODE_LEN: usize = 6;

/// Draw a fresh friend code from the injected random source.
pub fn generate_friend_code(rng: &mut impl RandomSource) -> String {
    (0..FRIEND_CODE_LEN)
        .map(|_| FRIEND_CODE_ALPHABET[rng.next_index(FRIEND_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Trim and uppercase a typed-in code. Blank input yields `None`.
pub fn normalize_friend_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    (!code.is_empty()).then_some(code)
}

/// Gesture a user can send to a friend's garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Sunshine,
    Encouragement,
    Bloom,
    Water,
}

impl GestureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GestureKind::Sunshine => "sunshine",
            GestureKind::Encouragement => "encouragement",
            GestureKind::Bloom => "bloom",
            GestureKind::Water => "water",
        }
    }

    /// Parse a gesture name. Unrecognised, non-blank names are treated as water.
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" => None,
            "sunshine" => Some(GestureKind::Sunshine),
            "encouragement" => Some(GestureKind::Encouragement),
            "bloom" => Some(GestureKind::Bloom),
            _ => Some(GestureKind::Water),
        }
    }

    /// The category whose nutrient the gesture feeds.
    pub fn category(self) -> ActionCategory {
        match self {
            GestureKind::Sunshine => ActionCategory::Focus,
            GestureKind::Encouragement => ActionCategory::Resilience,
            GestureKind::Bloom => ActionCategory::Gratitude,
            GestureKind::Water => ActionCategory::Calm,
        }
    }

    pub fn nutrient(self) -> Nutrient {
        self.category().nutrient()
    }

    /// Feed the receiving garden by one unit of the gesture's nutrient.
    pub fn apply(self, garden: &mut GardenState) -> Nutrient {
        let nutrient = self.nutrient();
        garden.nutrients.feed(nutrient);
        nutrient
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a mutual friendship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Friend {
    pub user_id: String,
    pub friend_code: String,
    pub since: Instant,
}

/// A delivered gesture, kept in the receiver's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GestureRecord {
    pub sender_id: String,
    pub receiver_id: String,
    pub gesture: GestureKind,
    pub created_at: Instant,
}
