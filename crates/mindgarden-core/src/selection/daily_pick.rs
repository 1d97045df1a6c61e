use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calendar::DayKey;
use crate::catalog::ActionType;

/// Cached assignment of the day's actions.
///
/// The core pick is valid while `pick_day` is today, and the bonus list
/// while `bonus_day` is today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPick {
    pub core_action_type: Option<ActionType>,
    pub core_action_variant: Option<String>,
    pub pick_day: Option<DayKey>,
    pub bonus_action_types: Vec<ActionType>,
    pub bonus_day: Option<DayKey>,
}

impl DailyPick {
    /// Rebuild from stored columns. Unknown action types and unparsable day
    /// keys are dropped, which simply makes the cache stale.
    pub fn from_stored(
        core_action_type: Option<&str>,
        core_action_variant: Option<&str>,
        pick_day: Option<&str>,
        bonus_action_types: &[String],
        bonus_day: Option<&str>,
    ) -> Self {
        let core = core_action_type.and_then(|raw| match raw.parse::<ActionType>() {
            Ok(action) => Some(action),
            Err(_) => {
                warn!(value = raw, "dropping unknown cached core action");
                None
            }
        });
        let bonus = bonus_action_types
            .iter()
            .filter_map(|raw| raw.parse::<ActionType>().ok())
            .collect();
        Self {
            core_action_type: core,
            core_action_variant: core_action_variant.map(str::to_string),
            pick_day: stored_day("pick_day", pick_day),
            bonus_action_types: bonus,
            bonus_day: stored_day("bonus_day", bonus_day),
        }
    }

    /// The cached core action, if it was picked on `today`.
    pub fn core_for(&self, today: DayKey) -> Option<ActionType> {
        if self.pick_day == Some(today) {
            self.core_action_type
        } else {
            None
        }
    }

    /// The cached bonus list, if derived on `today` and non-empty.
    pub fn bonus_for(&self, today: DayKey) -> Option<&[ActionType]> {
        if self.bonus_day == Some(today) && !self.bonus_action_types.is_empty() {
            Some(&self.bonus_action_types)
        } else {
            None
        }
    }
}

fn stored_day(column: &str, raw: Option<&str>) -> Option<DayKey> {
    let raw = raw?;
    let day = DayKey::parse(raw);
    if day.is_none() {
        warn!(column, value = raw, "ignoring malformed cached day key");
    }
    day
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    #[test]
    fn test_cache_hits_only_on_matching_day() {
        let pick = DailyPick {
            core_action_type: Some(ActionType::Breath),
            pick_day: Some(day("2024-04-02")),
            bonus_action_types: vec![ActionType::Reset],
            bonus_day: Some(day("2024-04-01")),
            ..Default::default()
        };
        assert_eq!(pick.core_for(day("2024-04-02")), Some(ActionType::Breath));
        assert_eq!(pick.core_for(day("2024-04-03")), None);
        assert_eq!(pick.bonus_for(day("2024-04-02")), None);
        assert_eq!(pick.bonus_for(day("2024-04-01")), Some(&[ActionType::Reset][..]));
    }

    #[test]
    fn test_empty_bonus_list_is_stale() {
        let pick = DailyPick {
            bonus_day: Some(day("2024-04-02")),
            ..Default::default()
        };
        assert_eq!(pick.bonus_for(day("2024-04-02")), None);
    }

    #[test]
    fn test_from_stored_drops_garbage() {
        let pick = DailyPick::from_stored(
            Some("juggling"),
            Some("standard"),
            Some("yesterday"),
            &["reset".to_string(), "nope".to_string()],
            Some("2024-04-02"),
        );
        assert_eq!(pick.core_action_type, None);
        assert_eq!(pick.pick_day, None);
        assert_eq!(pick.bonus_action_types, vec![ActionType::Reset]);
        assert_eq!(pick.bonus_day, Some(day("2024-04-02")));
    }
}
