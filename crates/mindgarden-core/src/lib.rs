//! # MindGarden Core Library
//!
//! Rules engine for the MindGarden habit garden: one core wellbeing action a
//! day, up to two bonus actions, a streak with a weekly grace day, and a plant
//! that grows through nutrients, XP and cosmetic unlocks.
//!
//! The engine itself ([`GardenEngine`]) is pure: it reads a [`storage::UserSnapshot`]
//! and returns the [`storage::Mutations`] to apply. [`GardenService`] ties it to a
//! [`GardenStore`] so each request is one atomic transaction.
//!
//! ## Key Components
//!
//! - [`ZonedCalendar`]: day keys and day ranges in the user's timezone
//! - [`ActionSelector`]: weighted daily pick with history damping
//! - [`StreakEngine`]: streak continuation and the grace day
//! - [`ProgressionRules`]: nutrients, XP and levels
//! - [`SqliteStore`] and [`MemoryStore`]: persistence backends

pub mod calendar;
pub mod catalog;
pub mod completion;
pub mod engine;
pub mod error;
pub mod garden;
pub mod insights;
pub mod onboarding;
pub mod personalize;
pub mod profile;
pub mod random;
pub mod selection;
pub mod service;
pub mod storage;
pub mod streak;

pub use calendar::{DayKey, Instant, ZonedCalendar};
pub use catalog::{action_label, catalog, ActionCategory, ActionDefinition, ActionType, SeedType};
pub use completion::{ActionKind, ActionResponse, CompletionRecord, CompletionSubmission};
pub use engine::{CompletionOutcome, GardenEngine, GardenView, TodayPlan};
pub use error::{ConfigError, CoreError, EngineError, Result, StoreError, ValidationError};
pub use garden::{
    Cosmetics, CustomizationRequest, Friend, GardenState, GestureKind, GestureRecord, Nutrient,
    ProgressionRules,
};
pub use insights::Insights;
pub use onboarding::OnboardingRequest;
pub use profile::ProfileRecord;
pub use random::{engine_rng, RandomSource};
pub use selection::{ActionSelector, DailyPick};
pub use service::{GardenService, GestureReceipt};
pub use storage::{EngineConfig, GardenStore, MemoryStore, SqliteStore};
pub use streak::{GrowthStage, StreakEngine, StreakUpdate};
