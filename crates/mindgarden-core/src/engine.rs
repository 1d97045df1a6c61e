//! The rules engine.
//!
//! [`GardenEngine`] turns a [`UserSnapshot`] plus a request into a result
//! and the [`Mutations`] to persist. It performs no I/O; stores apply the
//! mutations inside the same per-user transaction that produced the snapshot.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::calendar::{DayKey, Instant, ZonedCalendar};
use crate::catalog::{ActionCategory, ActionDefinition, ActionType, SeedType};
use crate::completion::{normalize_response, ActionKind, CompletionRecord, CompletionSubmission};
use crate::error::EngineError;
use crate::garden::{
    apply_customization, unlock_statuses, Cosmetics, CustomizationRequest, GardenGrowth,
    GardenState, GestureKind, GestureRecord, Nutrient, ProgressionRules, UnlockStatus,
};
use crate::insights::{compute_insights, Insights, DEFAULT_INSIGHT_WINDOW};
use crate::personalize::{personalize, PersonalizedAction};
use crate::random::RandomSource;
use crate::selection::{ActionSelector, HistoryCounts};
use crate::storage::{EngineConfig, Mutations, SnapshotQuery, UserSnapshot};
use crate::streak::{next_stage_info, GrowthStage, NextStageInfo, StreakEngine, StreakUpdate};

/// What the user sees for today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayPlan {
    pub day: DayKey,
    pub core: PersonalizedAction,
    pub bonus: Vec<&'static ActionDefinition>,
    pub core_done: bool,
    pub bonus_done: u32,
    pub bonus_remaining: u32,
    pub swap_applied: bool,
    /// Whether a swap could still be requested today.
    pub swap_available: bool,
    pub grace_available: bool,
    pub streak_count: u32,
    pub stage: GrowthStage,
    pub next_stage: Option<NextStageInfo>,
}

/// Result of an accepted completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub record: CompletionRecord,
    /// Present for core completions only.
    pub streak: Option<StreakUpdate>,
    pub growth: GardenGrowth,
    pub streak_count: u32,
    pub stage: GrowthStage,
    pub bonus_remaining: u32,
}

/// Garden state with everything derived for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GardenView {
    pub seed_type: SeedType,
    pub seed_variant: String,
    pub garden: GardenState,
    pub streak_count: u32,
    pub stage: GrowthStage,
    pub stage_name: &'static str,
    pub next_stage: Option<NextStageInfo>,
    pub unlocks: Vec<UnlockStatus>,
}

/// Records of `snapshot.latest` inside today's zoned range.
fn today_records<'a>(
    snapshot: &'a UserSnapshot,
    calendar: &ZonedCalendar,
    now: Instant,
) -> Vec<&'a CompletionRecord> {
    let (start, end) = calendar.today_range(now);
    snapshot
        .latest
        .iter()
        .filter(|r| r.created_at >= start && r.created_at <= end)
        .collect()
}

fn count_kind(records: &[&CompletionRecord], kind: ActionKind) -> u32 {
    records.iter().filter(|r| r.action_kind == kind).count() as u32
}

#[derive(Debug, Clone)]
pub struct GardenEngine {
    config: EngineConfig,
    streak: StreakEngine,
    selector: ActionSelector,
    progression: ProgressionRules,
}

impl Default for GardenEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GardenEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            streak: config.streak_engine(),
            selector: ActionSelector::new(config.selection_rules()),
            progression: config.progression_rules(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot bounds that cover history, insights and today in any zone.
    pub fn snapshot_query(&self, now: Instant) -> SnapshotQuery {
        let recent = self.config.selection.history_window.max(DEFAULT_INSIGHT_WINDOW);
        SnapshotQuery::around(now, recent)
    }

    pub fn calendar_for(&self, snapshot: &UserSnapshot) -> ZonedCalendar {
        ZonedCalendar::from_name_or(&snapshot.profile.timezone, &self.config.default_timezone)
    }

    fn max_bonus(&self) -> u32 {
        self.config.progression.max_bonus_per_day
    }

    /// Resolve today's core and bonus actions.
    ///
    /// The cached pick is reused for the whole civil day. A swap replaces it
    /// at most once per day and never after the core action is done.
    pub fn plan_today(
        &self,
        snapshot: &UserSnapshot,
        now: Instant,
        swap_requested: bool,
        rng: &mut impl RandomSource,
    ) -> (TodayPlan, Mutations) {
        let calendar = self.calendar_for(snapshot);
        let today = calendar.day_key(now);
        let profile = &snapshot.profile;
        let garden = &snapshot.garden;
        let cached = &snapshot.daily_pick;

        let todays = today_records(snapshot, &calendar, now);
        let core_done = count_kind(&todays, ActionKind::Core) > 0;
        let bonus_done = count_kind(&todays, ActionKind::Bonus);

        let swap_allowed = garden.last_swap_day != Some(today) && !core_done;
        let swap_applied = swap_requested && swap_allowed;
        if swap_requested && !swap_applied {
            debug!(day = %today, core_done, "swap refused");
        }

        let history = HistoryCounts::from_recent(&snapshot.recent, self.config.selection.history_window);
        let preferred = &garden.preferred_categories;

        let mut core = match cached.core_for(today) {
            Some(action) => action.definition(),
            None => self.selector.choose_core(&history, preferred, &[], now, &mut *rng),
        };
        if swap_applied {
            let previous = core.action_type;
            core = self.selector.choose_core(&history, preferred, &[previous], now, &mut *rng);
            debug!(day = %today, from = %previous, to = %core.action_type, "core action swapped");
        }

        let personalized = personalize(core, profile.seed_type, snapshot.last_mood());

        // The bonus list never offers today's core action.
        let bonus_types = match cached.bonus_for(today) {
            Some(types) if !swap_applied && !types.contains(&core.action_type) => types.to_vec(),
            _ => self.selector.bonus_candidates(core.action_type),
        };

        let mut pick = cached.clone();
        if cached.core_action_type != Some(core.action_type) || cached.pick_day != Some(today) {
            debug!(day = %today, action = %core.action_type, "daily pick recomputed");
            pick.core_action_type = Some(core.action_type);
            pick.pick_day = Some(today);
        }
        if pick.core_action_variant.as_deref() != Some(personalized.variant.as_str()) {
            pick.core_action_variant = Some(personalized.variant.clone());
        }
        if cached.bonus_day != Some(today) || cached.bonus_action_types != bonus_types {
            pick.bonus_action_types = bonus_types.clone();
            pick.bonus_day = Some(today);
        }

        let mut mutations = Mutations::none();
        if pick != *cached {
            mutations.daily_pick = Some(pick);
        }
        if swap_applied {
            let mut garden = garden.clone();
            garden.last_swap_day = Some(today);
            mutations.garden = Some(garden);
        }

        let state = profile.streak_state(&calendar);
        let plan = TodayPlan {
            day: today,
            core: personalized,
            bonus: bonus_types.iter().map(|t| t.definition()).collect(),
            core_done,
            bonus_done,
            bonus_remaining: self.max_bonus().saturating_sub(bonus_done),
            swap_applied,
            swap_available: swap_allowed && !swap_applied,
            grace_available: self.streak.grace_available(state.grace_used_at, now, &calendar),
            streak_count: profile.streak_count,
            stage: GrowthStage::for_streak(profile.streak_count),
            next_stage: next_stage_info(profile.streak_count),
        };
        (plan, mutations)
    }

    /// Validate and credit a completion.
    ///
    /// # Errors
    /// - [`EngineError::InvalidActionType`] / [`EngineError::InvalidSubmission`]
    ///   for bad input.
    /// - [`EngineError::AlreadyCompletedToday`] / [`EngineError::BonusLimitReached`]
    ///   when today's allowance is spent. Nothing is mutated in either case.
    pub fn plan_completion(
        &self,
        snapshot: &UserSnapshot,
        submission: &CompletionSubmission,
        now: Instant,
    ) -> Result<(CompletionOutcome, Mutations), EngineError> {
        let action: ActionType = submission.action_type.parse()?;
        let kind = submission.kind;
        let (mood_score, text_input) = normalize_response(action, kind, &submission.response)?;

        let calendar = self.calendar_for(snapshot);
        let today = calendar.day_key(now);
        let todays = today_records(snapshot, &calendar, now);
        let bonus_done = count_kind(&todays, ActionKind::Bonus);

        let mut mutations = Mutations::none();
        let mut profile = snapshot.profile.clone();
        let streak = match kind {
            ActionKind::Core => {
                if count_kind(&todays, ActionKind::Core) > 0 {
                    debug!(day = %today, "core already logged today");
                    return Err(EngineError::AlreadyCompletedToday);
                }
                let update = self
                    .streak
                    .apply_core_completion(&profile.streak_state(&calendar), now, &calendar)?;
                profile.apply_streak(&update);
                mutations.profile = Some(profile.clone());
                Some(update)
            }
            ActionKind::Bonus => {
                if bonus_done >= self.max_bonus() {
                    return Err(EngineError::BonusLimitReached {
                        limit: self.max_bonus(),
                    });
                }
                None
            }
        };

        let category = action.category();
        let mut garden = snapshot.garden.clone();
        let growth = self.progression.apply(&mut garden, kind, category);
        mutations.garden = Some(garden);

        // Today's core shows the variant personalized for the current mood.
        let action_variant = submission.variant.clone().or_else(|| {
            (kind == ActionKind::Core && snapshot.daily_pick.core_for(today) == Some(action)).then(|| {
                personalize(action.definition(), snapshot.profile.seed_type, snapshot.last_mood()).variant
            })
        });

        let record = CompletionRecord {
            action_type: action,
            action_kind: kind,
            category,
            action_variant,
            mood_score,
            text_input,
            created_at: now,
        };
        mutations.append = Some(record.clone());

        let bonus_after = bonus_done + u32::from(kind == ActionKind::Bonus);
        let outcome = CompletionOutcome {
            record,
            streak,
            growth,
            streak_count: profile.streak_count,
            stage: GrowthStage::for_streak(profile.streak_count),
            bonus_remaining: self.max_bonus().saturating_sub(bonus_after),
        };
        debug!(day = %today, %action, %kind, xp = outcome.growth.xp_total, "completion credited");
        Ok((outcome, mutations))
    }

    /// Replace the preferred category set.
    pub fn plan_preferences(
        &self,
        snapshot: &UserSnapshot,
        categories: &BTreeSet<ActionCategory>,
    ) -> (GardenState, Mutations) {
        let mut garden = snapshot.garden.clone();
        garden.preferred_categories = categories.clone();
        let mutations = Mutations {
            garden: (garden != snapshot.garden).then(|| garden.clone()),
            ..Mutations::none()
        };
        (garden, mutations)
    }

    /// Apply cosmetic selections if every requested item is unlocked.
    ///
    /// # Errors
    /// [`EngineError::UnknownCosmetic`] or [`EngineError::LockedCosmetic`].
    pub fn plan_customization(
        &self,
        snapshot: &UserSnapshot,
        request: &CustomizationRequest,
    ) -> Result<(Cosmetics, Mutations), EngineError> {
        let garden = &snapshot.garden;
        let cosmetics = apply_customization(
            &garden.cosmetics,
            request,
            garden.level,
            snapshot.profile.streak_count,
        )?;
        let mut next = garden.clone();
        next.cosmetics = cosmetics.clone();
        Ok((
            cosmetics,
            Mutations {
                garden: Some(next),
                ..Mutations::none()
            },
        ))
    }

    /// Feed the receiver's garden from a friend's gesture and keep it in
    /// the receiver's gesture history.
    pub fn plan_gesture(
        &self,
        receiver: &UserSnapshot,
        sender_id: &str,
        gesture: GestureKind,
        now: Instant,
    ) -> (Nutrient, Mutations) {
        let mut garden = receiver.garden.clone();
        let nutrient = gesture.apply(&mut garden);
        (
            nutrient,
            Mutations {
                garden: Some(garden),
                gesture: Some(GestureRecord {
                    sender_id: sender_id.to_string(),
                    receiver_id: receiver.profile.user_id.clone(),
                    gesture,
                    created_at: now,
                }),
                ..Mutations::none()
            },
        )
    }

    pub fn garden_view(&self, snapshot: &UserSnapshot) -> GardenView {
        let streak_count = snapshot.profile.streak_count;
        let stage = GrowthStage::for_streak(streak_count);
        GardenView {
            seed_type: snapshot.profile.seed_type,
            seed_variant: snapshot.profile.seed_variant.clone(),
            garden: snapshot.garden.clone(),
            streak_count,
            stage,
            stage_name: stage.name(),
            next_stage: next_stage_info(streak_count),
            unlocks: unlock_statuses(snapshot.garden.level, streak_count),
        }
    }

    pub fn insights(&self, snapshot: &UserSnapshot, now: Instant) -> Insights {
        compute_insights(
            &snapshot.recent,
            DEFAULT_INSIGHT_WINDOW,
            now,
            &self.calendar_for(snapshot),
        )
    }
}
