//! Completion log entries and user submissions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calendar::Instant;
use crate::catalog::{ActionCategory, ActionType, ResponseRequirement};
use crate::error::EngineError;

/// Whether a completion fills the daily core slot or a bonus slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Core,
    Bonus,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Core => "core",
            ActionKind::Bonus => "bonus",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "core" => Ok(ActionKind::Core),
            "bonus" => Ok(ActionKind::Bonus),
            other => Err(format!("unknown action kind '{other}'")),
        }
    }
}

/// Append-only log entry. Never mutated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub action_type: ActionType,
    pub action_kind: ActionKind,
    pub category: ActionCategory,
    pub action_variant: Option<String>,
    pub mood_score: Option<u8>,
    pub text_input: Option<String>,
    pub created_at: Instant,
}

/// What the user handed in with a completion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionResponse {
    #[default]
    Empty,
    Mood { score: u8 },
    Text { text: String },
    BodyScan { sensations: [String; 3] },
    Reframe { stress: String, shift: String },
}

/// A completion request before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSubmission {
    pub action_type: String,
    pub kind: ActionKind,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub response: ActionResponse,
}

impl CompletionSubmission {
    pub fn new(action_type: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            action_type: action_type.into(),
            kind,
            variant: None,
            response: ActionResponse::Empty,
        }
    }

    pub fn with_response(mut self, response: ActionResponse) -> Self {
        self.response = response;
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

/// Normalized `(mood_score, text_input)` as stored in the log.
pub type NormalizedResponse = (Option<u8>, Option<String>);

/// What a completion of `action` as `kind` must contain.
///
/// Bonus completions only ask for the quick note on text actions.
pub fn requirement_for(action: ActionType, kind: ActionKind) -> ResponseRequirement {
    match kind {
        ActionKind::Core => action.response_requirement(),
        ActionKind::Bonus if action.takes_text() => ResponseRequirement::Text,
        ActionKind::Bonus => ResponseRequirement::None,
    }
}

/// Check a response against the requirement and flatten it for the log.
///
/// # Errors
/// [`EngineError::InvalidSubmission`] naming the offending field.
pub fn normalize_response(
    action: ActionType,
    kind: ActionKind,
    response: &ActionResponse,
) -> Result<NormalizedResponse, EngineError> {
    let requirement = requirement_for(action, kind);
    match (requirement, response) {
        (_, ActionResponse::Mood { score }) if !(1..=5).contains(score) => Err(
            EngineError::submission("mood_score", format!("{score} is outside 1..=5")),
        ),
        (ResponseRequirement::MoodScore, ActionResponse::Mood { score }) => Ok((Some(*score), None)),
        (ResponseRequirement::MoodScore, _) => {
            Err(EngineError::submission("mood_score", "a mood score is required"))
        }
        (ResponseRequirement::Text, ActionResponse::Text { text }) => {
            Ok((None, Some(required_text("text_input", text)?)))
        }
        (ResponseRequirement::Text, _) => {
            Err(EngineError::submission("text_input", "a short note is required"))
        }
        (ResponseRequirement::BodyScan, ActionResponse::BodyScan { sensations }) => {
            let mut noticed = Vec::with_capacity(sensations.len());
            for (i, sensation) in sensations.iter().enumerate() {
                noticed.push(required_text(&format!("sensation_{}", i + 1), sensation)?);
            }
            Ok((None, Some(noticed.join("; "))))
        }
        (ResponseRequirement::BodyScan, _) => {
            Err(EngineError::submission("sensations", "three sensations are required"))
        }
        (ResponseRequirement::Reframe, ActionResponse::Reframe { stress, shift }) => {
            let stress = required_text("stress", stress)?;
            let shift = required_text("shift", shift)?;
            Ok((None, Some(format!("{stress} -> {shift}"))))
        }
        (ResponseRequirement::Reframe, _) => Err(EngineError::submission(
            "reframe",
            "a stressful thought and a gentler reframe are required",
        )),
        (ResponseRequirement::None, ActionResponse::Empty) => Ok((None, None)),
        (ResponseRequirement::None, ActionResponse::Mood { score }) => Ok((Some(*score), None)),
        (ResponseRequirement::None, ActionResponse::Text { text }) => {
            let text = text.trim();
            Ok((None, (!text.is_empty()).then(|| text.to_string())))
        }
        (ResponseRequirement::None, _) => Err(EngineError::submission(
            "response",
            format!("{action} does not take this kind of response"),
        )),
    }
}

fn required_text(field: &str, value: &str) -> Result<String, EngineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::submission(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ActionResponse {
        ActionResponse::Text { text: s.into() }
    }

    #[test]
    fn test_mood_requires_score_in_range() {
        assert_eq!(
            normalize_response(ActionType::Mood, ActionKind::Core, &ActionResponse::Mood { score: 4 }),
            Ok((Some(4), None))
        );
        assert!(matches!(
            normalize_response(ActionType::Mood, ActionKind::Core, &ActionResponse::Mood { score: 6 }),
            Err(EngineError::InvalidSubmission { field, .. }) if field == "mood_score"
        ));
        assert!(normalize_response(ActionType::Mood, ActionKind::Core, &ActionResponse::Empty).is_err());
    }

    #[test]
    fn test_text_is_trimmed_and_required() {
        assert_eq!(
            normalize_response(ActionType::Gratitude, ActionKind::Core, &text("  my dog  ")),
            Ok((None, Some("my dog".into())))
        );
        assert!(normalize_response(ActionType::Gratitude, ActionKind::Core, &text("   ")).is_err());
        assert!(normalize_response(ActionType::Gratitude, ActionKind::Core, &ActionResponse::Empty).is_err());
    }

    #[test]
    fn test_body_scan_joins_sensations() {
        let response = ActionResponse::BodyScan {
            sensations: ["Warm shoulders".into(), "Light chest".into(), " Tingling hands ".into()],
        };
        assert_eq!(
            normalize_response(ActionType::BodyScan, ActionKind::Core, &response),
            Ok((None, Some("Warm shoulders; Light chest; Tingling hands".into())))
        );

        let missing = ActionResponse::BodyScan {
            sensations: ["Warm".into(), "".into(), "Cold".into()],
        };
        assert!(matches!(
            normalize_response(ActionType::BodyScan, ActionKind::Core, &missing),
            Err(EngineError::InvalidSubmission { field, .. }) if field == "sensation_2"
        ));
    }

    #[test]
    fn test_reframe_format() {
        let response = ActionResponse::Reframe {
            stress: "I will fail".into(),
            shift: "I can try one step".into(),
        };
        assert_eq!(
            normalize_response(ActionType::Reframe, ActionKind::Core, &response),
            Ok((None, Some("I will fail -> I can try one step".into())))
        );
    }

    #[test]
    fn test_bonus_only_asks_for_text() {
        assert_eq!(requirement_for(ActionType::Breath, ActionKind::Bonus), ResponseRequirement::None);
        assert_eq!(requirement_for(ActionType::Savor, ActionKind::Bonus), ResponseRequirement::Text);
        assert_eq!(
            normalize_response(ActionType::Reset, ActionKind::Bonus, &ActionResponse::Empty),
            Ok((None, None))
        );
    }

    #[test]
    fn test_plain_action_accepts_optional_note() {
        assert_eq!(
            normalize_response(ActionType::Breath, ActionKind::Core, &text("felt good")),
            Ok((None, Some("felt good".into())))
        );
        assert_eq!(
            normalize_response(ActionType::Breath, ActionKind::Core, &text("")),
            Ok((None, None))
        );
        let reframe = ActionResponse::Reframe { stress: "a".into(), shift: "b".into() };
        assert!(normalize_response(ActionType::Breath, ActionKind::Core, &reframe).is_err());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("Core".parse::<ActionKind>().unwrap(), ActionKind::Core);
        assert_eq!("bonus".parse::<ActionKind>().unwrap(), ActionKind::Bonus);
        assert!("extra".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_submission_json_shape() {
        let json = r#"{"action_type":"mood","kind":"core","response":{"kind":"mood","score":2}}"#;
        let parsed: CompletionSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response, ActionResponse::Mood { score: 2 });
        assert_eq!(parsed.variant, None);
    }
}
