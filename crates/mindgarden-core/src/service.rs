//! Store-backed facade over [`GardenEngine`].
//!
//! Every operation is one `transact` call, so the read-modify-write of a
//! user's state is serialised and applied all-or-nothing.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::calendar::Instant;
use crate::catalog::ActionCategory;
use crate::completion::CompletionSubmission;
use crate::engine::{CompletionOutcome, GardenEngine, GardenView, TodayPlan};
use crate::error::{CoreError, EngineError, Result, StoreError, ValidationError};
use crate::garden::{
    generate_friend_code, normalize_friend_code, Cosmetics, CustomizationRequest, Friend,
    GardenState, GestureKind, GestureRecord, Nutrient,
};
use crate::insights::Insights;
use crate::onboarding::{onboard, OnboardingRequest};
use crate::profile::ProfileRecord;
use crate::random::RandomSource;
use crate::storage::{EngineConfig, GardenStore};

/// Attempts at drawing a friend code that is not taken yet.
const FRIEND_CODE_ATTEMPTS: usize = 8;

/// A delivered gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GestureReceipt {
    pub to_user: String,
    pub gesture: GestureKind,
    pub nutrient: Nutrient,
}

pub struct GardenService<S> {
    store: S,
    engine: GardenEngine,
}

impl<S: GardenStore> GardenService<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            engine: GardenEngine::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &GardenEngine {
        &self.engine
    }

    /// Create the user's profile and an empty garden.
    ///
    /// A friend code that is already taken is redrawn.
    ///
    /// # Errors
    /// Validation errors from onboarding, or [`StoreError::UserExists`].
    pub fn onboard(&self, request: &OnboardingRequest, rng: &mut impl RandomSource) -> Result<ProfileRecord> {
        let mut profile = onboard(request, &mut *rng)?;
        for attempt in 1..=FRIEND_CODE_ATTEMPTS {
            match self.store.create_user(&profile, &GardenState::default()) {
                Ok(()) => {
                    info!(user_id = %profile.user_id, "user onboarded");
                    return Ok(profile);
                }
                Err(StoreError::FriendCodeTaken(code)) => {
                    debug!(%code, attempt, "friend code taken, drawing again");
                    profile.friend_code = generate_friend_code(&mut *rng);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ValidationError::InvalidValue {
            field: "friend_code".into(),
            message: "no free friend code could be drawn".into(),
        }
        .into())
    }

    pub fn today(
        &self,
        user_id: &str,
        now: Instant,
        swap: bool,
        rng: &mut impl RandomSource,
    ) -> Result<TodayPlan> {
        self.store
            .transact(user_id, &self.engine.snapshot_query(now), |snapshot| {
                Ok::<_, CoreError>(self.engine.plan_today(snapshot, now, swap, rng))
            })
    }

    /// Log a completion and credit streak and garden.
    ///
    /// # Errors
    /// [`EngineError`] outcomes (check [`CoreError::is_noop`]) or store errors.
    pub fn complete(
        &self,
        user_id: &str,
        submission: &CompletionSubmission,
        now: Instant,
    ) -> Result<CompletionOutcome> {
        self.store
            .transact(user_id, &self.engine.snapshot_query(now), |snapshot| {
                Ok::<_, CoreError>(self.engine.plan_completion(snapshot, submission, now)?)
            })
    }

    pub fn garden(&self, user_id: &str, now: Instant) -> Result<GardenView> {
        let snapshot = self.store.snapshot(user_id, &self.engine.snapshot_query(now))?;
        Ok(self.engine.garden_view(&snapshot))
    }

    pub fn insights(&self, user_id: &str, now: Instant) -> Result<Insights> {
        let snapshot = self.store.snapshot(user_id, &self.engine.snapshot_query(now))?;
        Ok(self.engine.insights(&snapshot, now))
    }

    pub fn set_preferences(
        &self,
        user_id: &str,
        categories: &BTreeSet<ActionCategory>,
        now: Instant,
    ) -> Result<GardenState> {
        self.store
            .transact(user_id, &self.engine.snapshot_query(now), |snapshot| {
                Ok::<_, CoreError>(self.engine.plan_preferences(snapshot, categories))
            })
    }

    pub fn customize(
        &self,
        user_id: &str,
        request: &CustomizationRequest,
        now: Instant,
    ) -> Result<Cosmetics> {
        self.store
            .transact(user_id, &self.engine.snapshot_query(now), |snapshot| {
                Ok::<_, CoreError>(self.engine.plan_customization(snapshot, request)?)
            })
    }

    /// Resolve a friend code to another user id.
    fn resolve_friend(&self, user_id: &str, friend_code: &str) -> Result<(String, String)> {
        let unknown = || EngineError::UnknownFriendCode(friend_code.trim().to_string());
        let code = normalize_friend_code(friend_code).ok_or_else(unknown)?;
        let other = self.store.find_by_friend_code(&code)?.ok_or_else(unknown)?;
        if other == user_id {
            return Err(unknown().into());
        }
        Ok((other, code))
    }

    /// Befriend the owner of `friend_code`. Friendships are mutual, and adding
    /// an existing friend returns the existing entry.
    ///
    /// # Errors
    /// [`EngineError::UnknownFriendCode`] for blank, unknown or own codes.
    pub fn add_friend(&self, user_id: &str, friend_code: &str, now: Instant) -> Result<Friend> {
        let (friend_id, _) = self.resolve_friend(user_id, friend_code)?;
        let added = self.store.add_friendship(user_id, &friend_id, now)?;
        if added {
            info!(user_id, %friend_id, "friend added");
        } else {
            debug!(user_id, %friend_id, "already friends");
        }
        self.store
            .friends(user_id)?
            .into_iter()
            .find(|f| f.user_id == friend_id)
            .ok_or_else(|| StoreError::UserNotFound(friend_id).into())
    }

    pub fn friends(&self, user_id: &str) -> Result<Vec<Friend>> {
        Ok(self.store.friends(user_id)?)
    }

    /// Gestures the user has received, most recent first.
    pub fn received_gestures(&self, user_id: &str) -> Result<Vec<GestureRecord>> {
        Ok(self.store.received_gestures(user_id)?)
    }

    /// Send a gesture to the friend owning `friend_code`.
    ///
    /// # Errors
    /// [`EngineError::UnknownFriendCode`] for blank, unknown or own codes, and
    /// [`EngineError::NotAFriend`] when the code belongs to someone who is not
    /// on the sender's friend list.
    pub fn send_gesture(
        &self,
        from_user: &str,
        friend_code: &str,
        gesture: GestureKind,
        now: Instant,
    ) -> Result<GestureReceipt> {
        let (to_user, code) = self.resolve_friend(from_user, friend_code)?;
        // Also fails with UserNotFound for a missing sender.
        if !self.store.friends(from_user)?.iter().any(|f| f.user_id == to_user) {
            return Err(EngineError::NotAFriend(code).into());
        }

        let nutrient = self
            .store
            .transact(&to_user, &self.engine.snapshot_query(now), |snapshot| {
                Ok::<_, CoreError>(self.engine.plan_gesture(snapshot, from_user, gesture, now))
            })?;
        debug!(from_user, %to_user, %gesture, %nutrient, "gesture delivered");
        Ok(GestureReceipt {
            to_user,
            gesture,
            nutrient,
        })
    }
}
