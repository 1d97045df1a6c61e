//! Streak and grace-day state machine.
//!
//! A core completion either extends the streak (acted yesterday), spends the
//! grace day (missed exactly one day, grace available), or restarts at 1.
//! A grace day, once spent on day N, is available again from day N+7.

pub mod stage;

pub use stage::{next_stage_info, stage_index, stage_name, GrowthStage, NextStageInfo, STAGE_THRESHOLDS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::{DayKey, Instant, ZonedCalendar};
use crate::error::EngineError;

/// Grace is available again once more than this many civil days have passed.
pub const DEFAULT_GRACE_COOLDOWN_DAYS: i64 = 6;

/// Typed streak state of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub streak_count: u32,
    pub last_action_day: Option<DayKey>,
    pub grace_used_at: Option<Instant>,
}

impl StreakState {
    /// Decode the persisted fields.
    ///
    /// Unparsable values are treated as "no history" and logged; they never
    /// fail the caller. A last-action value stored as a full instant is
    /// mapped to its civil date in `calendar`.
    pub fn from_stored(
        streak_count: u32,
        last_action_day_key: Option<&str>,
        grace_used_at: Option<&str>,
        calendar: &ZonedCalendar,
    ) -> Self {
        let last_action_day = last_action_day_key.and_then(|raw| {
            if let Some(key) = DayKey::parse(raw) {
                return Some(key);
            }
            if let Ok(instant) = DateTime::parse_from_rfc3339(raw.trim()) {
                return Some(calendar.day_key(instant.with_timezone(&Utc)));
            }
            warn!(field = "last_action_day_key", value = raw, "malformed prior state, treating as no history");
            None
        });

        let grace_used_at = grace_used_at.and_then(|raw| match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(instant) => Some(instant.with_timezone(&Utc)),
            Err(_) => {
                warn!(field = "grace_used_at", value = raw, "malformed prior state, treating as no history");
                None
            }
        });

        Self {
            streak_count,
            last_action_day,
            grace_used_at,
        }
    }
}

/// How the streak moved on a core completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// Acted yesterday
    Extended,
    /// Missed exactly one day and spent the grace day
    GraceUsed,
    /// First action ever, or the gap was too long
    Restarted,
}

/// Mutation to persist after a core completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub previous_count: u32,
    pub streak_count: u32,
    pub last_action_day: DayKey,
    pub grace_used_at: Option<Instant>,
    pub transition: StreakTransition,
    pub stage: GrowthStage,
    pub stage_changed: bool,
}

impl StreakUpdate {
    pub fn state(&self) -> StreakState {
        StreakState {
            streak_count: self.streak_count,
            last_action_day: Some(self.last_action_day),
            grace_used_at: self.grace_used_at,
        }
    }
}

/// Streak transition calculator.
#[derive(Debug, Clone, Copy)]
pub struct StreakEngine {
    grace_cooldown_days: i64,
}

impl Default for StreakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StreakEngine {
    pub fn new() -> Self {
        Self {
            grace_cooldown_days: DEFAULT_GRACE_COOLDOWN_DAYS,
        }
    }

    pub fn with_grace_cooldown(grace_cooldown_days: i64) -> Self {
        Self { grace_cooldown_days }
    }

    /// True when no grace was spent, or it was spent more than the cooldown ago.
    pub fn grace_available(
        &self,
        grace_used_at: Option<Instant>,
        now: Instant,
        calendar: &ZonedCalendar,
    ) -> bool {
        grace_used_at.map_or(true, |used| calendar.day_diff(used, now) > self.grace_cooldown_days)
    }

    /// Apply a core completion at `now`.
    ///
    /// # Errors
    /// [`EngineError::AlreadyCompletedToday`] when the last credited day is
    /// today; the state is left untouched.
    pub fn apply_core_completion(
        &self,
        state: &StreakState,
        now: Instant,
        calendar: &ZonedCalendar,
    ) -> Result<StreakUpdate, EngineError> {
        let today = calendar.day_key(now);
        if state.last_action_day == Some(today) {
            return Err(EngineError::AlreadyCompletedToday);
        }

        let yesterday = today.days_before(1);
        let day_before_yesterday = today.days_before(2);

        let is_consecutive = state.last_action_day == Some(yesterday);
        let can_use_grace = state.last_action_day == Some(day_before_yesterday)
            && self.grace_available(state.grace_used_at, now, calendar);

        let (streak_count, grace_used_at, transition) = if is_consecutive {
            (state.streak_count.saturating_add(1), state.grace_used_at, StreakTransition::Extended)
        } else if can_use_grace {
            (state.streak_count.saturating_add(1), Some(now), StreakTransition::GraceUsed)
        } else {
            (1, state.grace_used_at, StreakTransition::Restarted)
        };

        let previous_stage = GrowthStage::for_streak(state.streak_count);
        let stage = GrowthStage::for_streak(streak_count);

        debug!(
            day = %today,
            previous = state.streak_count,
            streak = streak_count,
            ?transition,
            "streak transition"
        );

        Ok(StreakUpdate {
            previous_count: state.streak_count,
            streak_count,
            last_action_day: today,
            grace_used_at,
            transition,
            stage,
            stage_changed: stage != previous_stage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn noon(day: u32) -> Instant {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn key(day: u32) -> DayKey {
        DayKey::from_ymd(2024, 5, day).unwrap()
    }

    fn state(streak: u32, last: Option<u32>, grace: Option<Instant>) -> StreakState {
        StreakState {
            streak_count: streak,
            last_action_day: last.map(key),
            grace_used_at: grace,
        }
    }

    #[test]
    fn test_first_action_starts_at_one() {
        let engine = StreakEngine::new();
        let update = engine
            .apply_core_completion(&StreakState::default(), noon(10), &ZonedCalendar::default())
            .unwrap();
        assert_eq!(update.streak_count, 1);
        assert_eq!(update.transition, StreakTransition::Restarted);
        assert_eq!(update.last_action_day, key(10));
        assert_eq!(update.grace_used_at, None);
    }

    #[test]
    fn test_consecutive_day_extends() {
        let engine = StreakEngine::new();
        let update = engine
            .apply_core_completion(&state(3, Some(9), None), noon(10), &ZonedCalendar::default())
            .unwrap();
        assert_eq!(update.streak_count, 4);
        assert_eq!(update.transition, StreakTransition::Extended);
    }

    #[test]
    fn test_missed_one_day_spends_grace() {
        let engine = StreakEngine::new();
        let now = noon(10);
        let update = engine
            .apply_core_completion(&state(5, Some(8), None), now, &ZonedCalendar::default())
            .unwrap();
        assert_eq!(update.streak_count, 6);
        assert_eq!(update.grace_used_at, Some(now));
        assert_eq!(update.transition, StreakTransition::GraceUsed);
        assert_eq!(update.stage, GrowthStage::Plant);
        assert!(!update.stage_changed);
    }

    #[test]
    fn test_same_day_is_rejected() {
        let engine = StreakEngine::new();
        let before = state(6, Some(10), Some(noon(10)));
        let err = engine
            .apply_core_completion(&before, noon(10) + Duration::hours(3), &ZonedCalendar::default())
            .unwrap_err();
        assert_eq!(err, EngineError::AlreadyCompletedToday);
    }

    #[test]
    fn test_grace_within_cooldown_resets() {
        let engine = StreakEngine::new();
        // Grace spent on the 4th; missing the 9th and acting on the 10th is
        // only 6 days later.
        let update = engine
            .apply_core_completion(&state(8, Some(8), Some(noon(4))), noon(10), &ZonedCalendar::default())
            .unwrap();
        assert_eq!(update.streak_count, 1);
        assert_eq!(update.transition, StreakTransition::Restarted);
        assert_eq!(update.grace_used_at, Some(noon(4)), "unused grace record is preserved");
    }

    #[test]
    fn test_grace_available_again_after_seven_days() {
        let engine = StreakEngine::new();
        let cal = ZonedCalendar::default();
        assert!(!engine.grace_available(Some(noon(3)), noon(9), &cal));
        assert!(engine.grace_available(Some(noon(3)), noon(10), &cal));

        let update = engine
            .apply_core_completion(&state(8, Some(8), Some(noon(3))), noon(10), &cal)
            .unwrap();
        assert_eq!(update.streak_count, 9);
        assert_eq!(update.transition, StreakTransition::GraceUsed);
    }

    #[test]
    fn test_two_missed_days_resets() {
        let engine = StreakEngine::new();
        let update = engine
            .apply_core_completion(&state(12, Some(7), None), noon(10), &ZonedCalendar::default())
            .unwrap();
        assert_eq!(update.streak_count, 1);
        assert_eq!(update.grace_used_at, None);
        assert!(update.stage_changed);
    }

    #[test]
    fn test_yesterday_is_zone_relative() {
        let engine = StreakEngine::new();
        let cal = ZonedCalendar::from_name("Pacific/Auckland");
        // 2024-05-09T12:00Z is the evening of the 10th in Auckland (UTC+12),
        // and 2024-05-10T12:00Z is the 11th there.
        let first = engine
            .apply_core_completion(&StreakState::default(), noon(9), &cal)
            .unwrap();
        assert_eq!(first.last_action_day, key(10));
        let second = engine.apply_core_completion(&first.state(), noon(10), &cal).unwrap();
        assert_eq!(second.streak_count, 2);
        assert_eq!(second.last_action_day, key(11));
    }

    #[test]
    fn test_from_stored_recovers_malformed_values() {
        let cal = ZonedCalendar::default();
        let decoded = StreakState::from_stored(4, Some("last tuesday"), Some("soon"), &cal);
        assert_eq!(decoded.streak_count, 4);
        assert_eq!(decoded.last_action_day, None);
        assert_eq!(decoded.grace_used_at, None);

        let update = StreakEngine::new()
            .apply_core_completion(&decoded, noon(10), &cal)
            .unwrap();
        assert_eq!(update.streak_count, 1);
    }

    #[test]
    fn test_from_stored_accepts_legacy_instant() {
        let cal = ZonedCalendar::from_name("America/Los_Angeles");
        let decoded = StreakState::from_stored(
            2,
            Some("2024-05-10T03:00:00Z"),
            Some("2024-05-01T08:00:00+00:00"),
            &cal,
        );
        assert_eq!(decoded.last_action_day, Some(key(9)));
        assert_eq!(decoded.grace_used_at, Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()));
    }

    #[test]
    fn test_custom_cooldown() {
        let cal = ZonedCalendar::default();
        let engine = StreakEngine::with_grace_cooldown(2);
        assert!(engine.grace_available(Some(noon(1)), noon(4), &cal));
        assert!(!engine.grace_available(Some(noon(1)), noon(3), &cal));
    }
}
