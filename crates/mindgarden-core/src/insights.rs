//! Weekly recap computed from the recent completion log.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::calendar::{DayKey, Instant, ZonedCalendar};
use crate::catalog::ActionCategory;
use crate::completion::{ActionKind, CompletionRecord};

pub const DEFAULT_INSIGHT_WINDOW: usize = 50;
pub const MOOD_TREND_DAYS: i64 = 7;

/// Mood score recorded on one civil day, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayMood {
    pub day: DayKey,
    pub mood_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insights {
    /// Oldest first, ending today.
    pub mood_by_day: Vec<DayMood>,
    pub category_counts: BTreeMap<ActionCategory, u32>,
    pub top_category: ActionCategory,
    pub recommendation: &'static str,
    pub core_count: u32,
    pub bonus_count: u32,
    /// Distinct civil days with at least one completion.
    pub consistency_days: u32,
    pub today_completed: Option<&'static str>,
}

/// Suggestion shown for the dominant category.
pub fn recommendation_for(top: ActionCategory) -> &'static str {
    match top {
        ActionCategory::Focus => "Try a Calm action tomorrow to give your mind a breather.",
        ActionCategory::Resilience => "Consider a Gratitude action to soften your week.",
        _ => "Pick a Focus action to build momentum.",
    }
}

/// Summarise `records` (most recent first); only the first `window` are read.
pub fn compute_insights(
    records: &[CompletionRecord],
    window: usize,
    now: Instant,
    calendar: &ZonedCalendar,
) -> Insights {
    let records = &records[..records.len().min(window)];
    let today = calendar.day_key(now);

    let mood_by_day = (0..MOOD_TREND_DAYS)
        .rev()
        .map(|back| {
            let day = today.days_before(back);
            let mood_score = records
                .iter()
                .filter(|r| calendar.is_on_day(r.created_at, day))
                .find_map(|r| r.mood_score);
            DayMood { day, mood_score }
        })
        .collect();

    let mut category_counts = BTreeMap::new();
    let mut core_count = 0;
    let mut bonus_count = 0;
    let mut active_days = HashSet::new();
    for record in records {
        *category_counts.entry(record.category).or_insert(0) += 1;
        match record.action_kind {
            ActionKind::Core => core_count += 1,
            ActionKind::Bonus => bonus_count += 1,
        }
        active_days.insert(calendar.day_key(record.created_at));
    }

    // Ties go to the earlier category.
    let top_category = category_counts
        .iter()
        .fold(None, |best: Option<(ActionCategory, u32)>, (category, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((*category, *count)),
        })
        .map_or(ActionCategory::Calm, |(category, _)| category);

    let today_completed = records
        .iter()
        .filter(|r| calendar.is_on_day(r.created_at, today))
        .min_by_key(|r| r.created_at)
        .map(|r| r.action_type.definition().label);

    Insights {
        mood_by_day,
        category_counts,
        top_category,
        recommendation: recommendation_for(top_category),
        core_count,
        bonus_count,
        consistency_days: active_days.len() as u32,
        today_completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionType;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Instant {
        Utc.with_ymd_and_hms(2024, 7, 10, 18, 0, 0).unwrap()
    }

    fn record(action: ActionType, kind: ActionKind, mood: Option<u8>, at: Instant) -> CompletionRecord {
        CompletionRecord {
            action_type: action,
            action_kind: kind,
            category: action.category(),
            action_variant: None,
            mood_score: mood,
            text_input: None,
            created_at: at,
        }
    }

    #[test]
    fn test_empty_log() {
        let insights = compute_insights(&[], 50, now(), &ZonedCalendar::default());
        assert_eq!(insights.mood_by_day.len(), 7);
        assert!(insights.mood_by_day.iter().all(|d| d.mood_score.is_none()));
        assert_eq!(insights.top_category, ActionCategory::Calm);
        assert_eq!(insights.recommendation, "Pick a Focus action to build momentum.");
        assert_eq!(insights.consistency_days, 0);
        assert_eq!(insights.today_completed, None);
    }

    #[test]
    fn test_recap_counts() {
        let day = Duration::days(1);
        let records = vec![
            record(ActionType::FocusBlock, ActionKind::Bonus, None, now()),
            record(ActionType::Mood, ActionKind::Core, Some(4), now() - Duration::hours(2)),
            record(ActionType::Goal, ActionKind::Core, None, now() - day),
            record(ActionType::Mood, ActionKind::Core, Some(2), now() - day * 3),
            record(ActionType::ClearSpace, ActionKind::Bonus, None, now() - day * 3),
        ];
        let insights = compute_insights(&records, 50, now(), &ZonedCalendar::default());

        assert_eq!(insights.core_count, 3);
        assert_eq!(insights.bonus_count, 2);
        assert_eq!(insights.consistency_days, 3);
        assert_eq!(insights.top_category, ActionCategory::Focus);
        assert_eq!(
            insights.recommendation,
            "Try a Calm action tomorrow to give your mind a breather."
        );
        let moods: Vec<_> = insights.mood_by_day.iter().map(|d| d.mood_score).collect();
        assert_eq!(moods, vec![None, None, None, Some(2), None, None, Some(4)]);
        assert_eq!(insights.mood_by_day[6].day.to_string(), "2024-07-10");
        assert_eq!(insights.today_completed, Some("Mood Check"));
    }

    #[test]
    fn test_top_category_tie_uses_category_order() {
        let records = vec![
            record(ActionType::Reframe, ActionKind::Core, None, now()),
            record(ActionType::Breath, ActionKind::Bonus, None, now()),
        ];
        let insights = compute_insights(&records, 50, now(), &ZonedCalendar::default());
        assert_eq!(insights.top_category, ActionCategory::Calm);
    }

    #[test]
    fn test_window_limits_records() {
        let records = vec![record(ActionType::Reframe, ActionKind::Core, None, now()); 60];
        let insights = compute_insights(&records, DEFAULT_INSIGHT_WINDOW, now(), &ZonedCalendar::default());
        assert_eq!(insights.core_count, 50);
        assert_eq!(insights.recommendation, "Consider a Gratitude action to soften your week.");
    }
}
