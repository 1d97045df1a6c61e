//! New-user onboarding.
//!
//! Builds the initial profile: streak 0, stage Seed, no last action and no
//! grace spent. The timezone and reminder time are validated here so that
//! everything downstream can trust the stored values.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::parse_timezone;
use crate::catalog::{seed_variant, SeedType};
use crate::error::ValidationError;
use crate::garden::generate_friend_code;
use crate::profile::ProfileRecord;
use crate::random::RandomSource;
use crate::streak::GrowthStage;

/// Answers collected from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingRequest {
    pub user_id: String,
    pub seed_type: SeedType,
    #[serde(default)]
    pub seed_variant: Option<String>,
    #[serde(default)]
    pub reminder_time: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl OnboardingRequest {
    pub fn new(user_id: impl Into<String>, seed_type: SeedType) -> Self {
        Self {
            user_id: user_id.into(),
            seed_type,
            seed_variant: None,
            reminder_time: None,
            timezone: None,
        }
    }
}

/// Accepts `HH:MM` (24h). Returns the canonical zero-padded form.
pub fn parse_reminder_time(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ValidationError::InvalidReminderTime(raw.to_string()))
}

/// Build the initial profile for `request`.
///
/// A missing or blank timezone is stored as `UTC`.
///
/// # Errors
/// [`ValidationError`] for a blank user id, an unknown timezone or a
/// malformed reminder time.
pub fn onboard(
    request: &OnboardingRequest,
    rng: &mut impl RandomSource,
) -> Result<ProfileRecord, ValidationError> {
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "user_id".into(),
            message: "must not be blank".into(),
        });
    }

    let timezone = match request.timezone.as_deref().map(str::trim) {
        None | Some("") => "UTC".to_string(),
        Some(name) => parse_timezone(name)?.name().to_string(),
    };

    let reminder_time = match request.reminder_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_reminder_time(raw)?),
    };

    let variant = seed_variant(request.seed_type, request.seed_variant.as_deref(), &mut *rng);
    let friend_code = generate_friend_code(&mut *rng);

    debug!(user_id, seed = %request.seed_type, variant = variant.id, %timezone, "onboarded");

    Ok(ProfileRecord {
        user_id: user_id.to_string(),
        seed_type: request.seed_type,
        seed_variant: variant.id.to_string(),
        timezone,
        reminder_time,
        streak_count: 0,
        current_stage: GrowthStage::Seed.index(),
        last_action_day_key: None,
        grace_used_at: None,
        friend_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::engine_rng;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_onboard_defaults() {
        let mut rng = StepRng::new(0, 0);
        let profile = onboard(&OnboardingRequest::new("ada", SeedType::Focus), &mut rng).unwrap();
        assert_eq!(profile.timezone, "UTC");
        assert_eq!(profile.streak_count, 0);
        assert_eq!(profile.current_stage, 0);
        assert_eq!(profile.last_action_day_key, None);
        assert_eq!(profile.grace_used_at, None);
        assert_eq!(profile.seed_variant, "ember");
        assert_eq!(profile.friend_code, "AAAAAA");
    }

    #[test]
    fn test_selected_variant_is_kept() {
        let mut request = OnboardingRequest::new("ada", SeedType::Calm);
        request.seed_variant = Some("lagoon".into());
        request.timezone = Some("Europe/Berlin".into());
        request.reminder_time = Some(" 07:05 ".into());
        let profile = onboard(&request, &mut engine_rng(Some(1))).unwrap();
        assert_eq!(profile.seed_variant, "lagoon");
        assert_eq!(profile.timezone, "Europe/Berlin");
        assert_eq!(profile.reminder_time.as_deref(), Some("07:05"));
    }

    #[test]
    fn test_variant_from_another_seed_is_replaced() {
        let mut request = OnboardingRequest::new("ada", SeedType::Gratitude);
        request.seed_variant = Some("mist".into());
        let profile = onboard(&request, &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(profile.seed_variant, "sun");
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut rng = StepRng::new(0, 0);
        let mut request = OnboardingRequest::new("ada", SeedType::Calm);
        request.timezone = Some("Mars/Olympus".into());
        assert_eq!(
            onboard(&request, &mut rng).unwrap_err(),
            ValidationError::UnknownTimezone("Mars/Olympus".into())
        );

        let mut request = OnboardingRequest::new("ada", SeedType::Calm);
        request.reminder_time = Some("25:00".into());
        assert!(matches!(
            onboard(&request, &mut rng),
            Err(ValidationError::InvalidReminderTime(_))
        ));

        assert!(onboard(&OnboardingRequest::new("  ", SeedType::Calm), &mut rng).is_err());
    }
}
