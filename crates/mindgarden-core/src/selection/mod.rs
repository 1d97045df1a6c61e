//! Weighted daily action selection.
//!
//! Under-used actions and actions in the user's preferred categories are
//! more likely, and every eligible entry keeps a positive weight.

mod daily_pick;

pub use daily_pick::DailyPick;

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::calendar::{Instant, ZonedCalendar};
use crate::catalog::{catalog, ActionCategory, ActionDefinition, ActionType};
use crate::completion::CompletionRecord;
use crate::random::RandomSource;

pub const DEFAULT_HISTORY_WINDOW: usize = 30;
pub const DEFAULT_WEIGHT_FLOOR: f64 = 0.4;
pub const DEFAULT_PREFERRED_BOOST: f64 = 1.4;
pub const DEFAULT_BONUS_CANDIDATES: usize = 3;

/// Occurrences of each action type in a bounded recent-history window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryCounts(HashMap<ActionType, u32>);

impl HistoryCounts {
    /// Count the first `window` records (most recent first).
    pub fn from_recent(records: &[CompletionRecord], window: usize) -> Self {
        let mut counts = HashMap::new();
        for record in records.iter().take(window) {
            *counts.entry(record.action_type).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn get(&self, action: ActionType) -> u32 {
        self.0.get(&action).copied().unwrap_or(0)
    }

    pub fn record(&mut self, action: ActionType, times: u32) {
        *self.0.entry(action).or_insert(0) += times;
    }
}

impl FromIterator<(ActionType, u32)> for HistoryCounts {
    fn from_iter<I: IntoIterator<Item = (ActionType, u32)>>(iter: I) -> Self {
        let mut counts = HistoryCounts::default();
        for (action, times) in iter {
            counts.record(action, times);
        }
        counts
    }
}

/// Tunables for selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRules {
    pub weight_floor: f64,
    pub preferred_boost: f64,
    pub bonus_candidates: usize,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            weight_floor: DEFAULT_WEIGHT_FLOOR,
            preferred_boost: DEFAULT_PREFERRED_BOOST,
            bonus_candidates: DEFAULT_BONUS_CANDIDATES,
        }
    }
}

/// Chooses the day's core action and bonus candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionSelector {
    rules: SelectionRules,
}

impl ActionSelector {
    pub fn new(rules: SelectionRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &SelectionRules {
        &self.rules
    }

    /// `max(floor, 1 / (1 + history)) * (preferred ? boost : 1)`.
    pub fn weight(
        &self,
        action: &ActionDefinition,
        history: &HistoryCounts,
        preferred: &BTreeSet<ActionCategory>,
    ) -> f64 {
        let seen = f64::from(history.get(action.action_type));
        let novelty = (1.0 / (1.0 + seen)).max(self.rules.weight_floor);
        let boost = if preferred.contains(&action.category) {
            self.rules.preferred_boost
        } else {
            1.0
        };
        novelty * boost
    }

    /// Weighted draw over the catalog minus `exclude`.
    ///
    /// With nothing left to choose from, falls back to rotating through the
    /// catalog by UTC epoch day.
    pub fn choose_core(
        &self,
        history: &HistoryCounts,
        preferred: &BTreeSet<ActionCategory>,
        exclude: &[ActionType],
        now: Instant,
        rng: &mut impl RandomSource,
    ) -> &'static ActionDefinition {
        let candidates: Vec<&'static ActionDefinition> = catalog()
            .iter()
            .filter(|def| !exclude.contains(&def.action_type))
            .collect();
        if candidates.is_empty() {
            return rotation_action(now);
        }

        let weights: Vec<f64> = candidates
            .iter()
            .map(|def| self.weight(def, history, preferred))
            .collect();
        let total: f64 = weights.iter().sum();
        let pick = rng.next_unit() * total;

        let mut running = 0.0;
        for (def, weight) in candidates.iter().zip(&weights) {
            running += weight;
            if running >= pick {
                debug!(action = %def.action_type, pick, total, "weighted core pick");
                return def;
            }
        }
        candidates[0]
    }

    /// The first few catalog entries that are not core-flavored and not
    /// today's core action, in catalog order.
    pub fn bonus_candidates(&self, core: ActionType) -> Vec<ActionType> {
        catalog()
            .iter()
            .map(|def| def.action_type)
            .filter(|action| !action.is_core_flavored() && *action != core)
            .take(self.rules.bonus_candidates)
            .collect()
    }
}

/// `catalog[epoch_day mod len]`, the deterministic daily rotation.
pub fn rotation_action(now: Instant) -> &'static ActionDefinition {
    let epoch_day = ZonedCalendar::default().day_key(now).epoch_day();
    let len = catalog().len() as i64;
    &catalog()[epoch_day.rem_euclid(len) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionCategory;
    use crate::completion::ActionKind;
    use crate::random::engine_rng;
    use chrono::{TimeZone, Utc};
    use rand::rngs::mock::StepRng;

    fn now() -> Instant {
        Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap()
    }

    fn preferred(categories: &[ActionCategory]) -> BTreeSet<ActionCategory> {
        categories.iter().copied().collect()
    }

    fn record(action: ActionType) -> CompletionRecord {
        CompletionRecord {
            action_type: action,
            action_kind: ActionKind::Core,
            category: action.category(),
            action_variant: None,
            mood_score: None,
            text_input: None,
            created_at: now(),
        }
    }

    #[test]
    fn test_weight_formula() {
        let selector = ActionSelector::default();
        let history: HistoryCounts = [(ActionType::Breath, 1), (ActionType::Reset, 9)].into_iter().collect();
        let none = BTreeSet::new();
        assert!((selector.weight(ActionType::Savor.definition(), &history, &none) - 1.0).abs() < 1e-9);
        assert!((selector.weight(ActionType::Breath.definition(), &history, &none) - 0.5).abs() < 1e-9);
        // 1/10 is below the floor.
        assert!((selector.weight(ActionType::Reset.definition(), &history, &none) - 0.4).abs() < 1e-9);
        let calm = preferred(&[ActionCategory::Calm]);
        assert!((selector.weight(ActionType::Reset.definition(), &history, &calm) - 0.56).abs() < 1e-9);
    }

    #[test]
    fn test_played_gratitude_weighs_less_than_unplayed_preferred_calm() {
        let selector = ActionSelector::default();
        let history: HistoryCounts = [(ActionType::Gratitude, 5)].into_iter().collect();
        let calm = preferred(&[ActionCategory::Calm]);
        let gratitude = selector.weight(ActionType::Gratitude.definition(), &history, &calm);
        let breath = selector.weight(ActionType::Breath.definition(), &history, &calm);
        assert!(gratitude < breath, "{gratitude} should be < {breath}");
    }

    #[test]
    fn test_zero_draw_picks_first_candidate() {
        let selector = ActionSelector::default();
        let mut rng = StepRng::new(0, 0);
        let pick = selector.choose_core(&HistoryCounts::default(), &BTreeSet::new(), &[], now(), &mut rng);
        assert_eq!(pick.action_type, ActionType::Mood);

        let pick = selector.choose_core(
            &HistoryCounts::default(),
            &BTreeSet::new(),
            &[ActionType::Mood],
            now(),
            &mut rng,
        );
        assert_eq!(pick.action_type, ActionType::Gratitude);
    }

    #[test]
    fn test_excluded_type_is_never_chosen() {
        let selector = ActionSelector::default();
        let mut rng = engine_rng(Some(99));
        for _ in 0..500 {
            let pick = selector.choose_core(
                &HistoryCounts::default(),
                &BTreeSet::new(),
                &[ActionType::Breath, ActionType::Savor],
                now(),
                &mut rng,
            );
            assert_ne!(pick.action_type, ActionType::Breath);
            assert_ne!(pick.action_type, ActionType::Savor);
        }
    }

    #[test]
    fn test_everything_excluded_falls_back_to_rotation() {
        let selector = ActionSelector::default();
        let all: Vec<_> = catalog().iter().map(|d| d.action_type).collect();
        let mut rng = StepRng::new(0, 0);
        let pick = selector.choose_core(&HistoryCounts::default(), &BTreeSet::new(), &all, now(), &mut rng);
        assert_eq!(pick, rotation_action(now()));
    }

    #[test]
    fn test_rotation_index() {
        // 1970-01-21 is epoch day 20, which wraps to index 0.
        let day = Utc.with_ymd_and_hms(1970, 1, 21, 23, 0, 0).unwrap();
        assert_eq!(rotation_action(day).action_type, ActionType::Mood);
        let day = Utc.with_ymd_and_hms(1970, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(rotation_action(day).action_type, ActionType::Breath);
    }

    #[test]
    fn test_bias_towards_unplayed_and_preferred() {
        let selector = ActionSelector::default();
        let history: HistoryCounts = catalog()
            .iter()
            .filter(|d| d.category != ActionCategory::Focus)
            .map(|d| (d.action_type, 5))
            .collect();
        let focus = preferred(&[ActionCategory::Focus]);
        let mut rng = engine_rng(Some(2024));
        let focus_picks = (0..2000)
            .filter(|_| {
                selector
                    .choose_core(&history, &focus, &[], now(), &mut rng)
                    .category
                    == ActionCategory::Focus
            })
            .count();
        // Focus holds 4 of 20 entries but 5.6 of 11.999 total weight.
        assert!(focus_picks > 800, "focus picked {focus_picks} times");
    }

    #[test]
    fn test_history_window_is_bounded() {
        let mut records = vec![record(ActionType::Savor); 3];
        records.extend(vec![record(ActionType::Reset); 40]);
        let counts = HistoryCounts::from_recent(&records, 30);
        assert_eq!(counts.get(ActionType::Savor), 3);
        assert_eq!(counts.get(ActionType::Reset), 27);
        assert_eq!(counts.get(ActionType::Mood), 0);
    }

    #[test]
    fn test_bonus_candidates_skip_core_flavored_and_core() {
        let selector = ActionSelector::default();
        assert_eq!(
            selector.bonus_candidates(ActionType::Mood),
            vec![ActionType::Breath, ActionType::Reset, ActionType::FocusBlock]
        );
        assert_eq!(
            selector.bonus_candidates(ActionType::Reset),
            vec![ActionType::Breath, ActionType::FocusBlock, ActionType::MicroBreak]
        );
    }
}
