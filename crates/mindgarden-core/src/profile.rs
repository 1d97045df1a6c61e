//! Persisted per-user profile.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::calendar::ZonedCalendar;
use crate::catalog::SeedType;
use crate::streak::{StreakState, StreakUpdate};

/// Profile row as the store keeps it.
///
/// Streak fields stay in their stored string form so a malformed value is
/// recovered when read, not rejected when loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: String,
    pub seed_type: SeedType,
    pub seed_variant: String,
    /// IANA name; empty means UTC.
    pub timezone: String,
    /// Local `HH:MM`.
    pub reminder_time: Option<String>,
    pub streak_count: u32,
    pub current_stage: usize,
    pub last_action_day_key: Option<String>,
    /// RFC 3339 instant.
    pub grace_used_at: Option<String>,
    pub friend_code: String,
}

impl ProfileRecord {
    pub fn streak_state(&self, calendar: &ZonedCalendar) -> StreakState {
        StreakState::from_stored(
            self.streak_count,
            self.last_action_day_key.as_deref(),
            self.grace_used_at.as_deref(),
            calendar,
        )
    }

    /// Write a streak transition back, including the derived stage index.
    pub fn apply_streak(&mut self, update: &StreakUpdate) {
        self.streak_count = update.streak_count;
        self.last_action_day_key = Some(update.last_action_day.to_string());
        self.grace_used_at = update
            .grace_used_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true));
        self.current_stage = update.stage.index();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streak::StreakEngine;
    use chrono::{TimeZone, Utc};

    fn profile() -> ProfileRecord {
        ProfileRecord {
            user_id: "u1".into(),
            seed_type: SeedType::Calm,
            seed_variant: "mist".into(),
            timezone: "UTC".into(),
            reminder_time: None,
            streak_count: 4,
            current_stage: 1,
            last_action_day_key: Some("2024-05-08".into()),
            grace_used_at: None,
            friend_code: "ABCDEF".into(),
        }
    }

    #[test]
    fn test_apply_streak_rewrites_stage_and_grace() {
        let cal = ZonedCalendar::default();
        let mut profile = profile();
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let update = StreakEngine::new()
            .apply_core_completion(&profile.streak_state(&cal), now, &cal)
            .unwrap();
        profile.apply_streak(&update);

        assert_eq!(profile.streak_count, 5);
        assert_eq!(profile.current_stage, 2);
        assert_eq!(profile.last_action_day_key.as_deref(), Some("2024-05-10"));
        assert_eq!(profile.grace_used_at.as_deref(), Some("2024-05-10T12:00:00.000Z"));
        assert_eq!(profile.streak_state(&cal).grace_used_at, Some(now));
    }
}
