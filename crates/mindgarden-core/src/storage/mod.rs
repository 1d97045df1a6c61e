//! Persistence collaborators.
//!
//! The engine never talks to a database directly. A [`GardenStore`] hands it
//! a [`UserSnapshot`] and applies the [`Mutations`] it returns, all inside one
//! per-user transaction.

mod config;
pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use config::{EngineConfig, ProgressionConfig, SelectionConfig, StreakConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use chrono::Duration;

use crate::calendar::Instant;
use crate::completion::CompletionRecord;
use crate::error::StoreError;
use crate::garden::{Friend, GardenState, GestureRecord};
use crate::profile::ProfileRecord;
use crate::selection::DailyPick;

/// Returns the data directory, creating it if needed.
///
/// `MINDGARDEN_HOME` overrides the location. Otherwise it is
/// `~/.config/mindgarden[-dev]/`, where `MINDGARDEN_ENV=dev` selects the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("MINDGARDEN_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("MINDGARDEN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("mindgarden-dev")
            } else {
                base_dir.join("mindgarden")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// How much of the completion log to load with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotQuery {
    /// Most recent records to load into [`UserSnapshot::recent`].
    pub recent_limit: usize,
    /// Every record at or after this instant lands in [`UserSnapshot::latest`].
    pub since: Instant,
}

impl SnapshotQuery {
    /// A window wide enough to contain "today" in every timezone.
    pub fn around(now: Instant, recent_limit: usize) -> Self {
        Self {
            recent_limit,
            since: now - Duration::days(2),
        }
    }
}

/// Everything the engine reads for one user, loaded under the user's lock.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSnapshot {
    pub profile: ProfileRecord,
    pub garden: GardenState,
    pub daily_pick: DailyPick,
    /// Most recent first, bounded by `recent_limit`.
    pub recent: Vec<CompletionRecord>,
    /// Most recent first, every record since `since`.
    pub latest: Vec<CompletionRecord>,
}

impl UserSnapshot {
    /// Most recent non-null mood score in the loaded window.
    pub fn last_mood(&self) -> Option<u8> {
        self.recent.iter().find_map(|r| r.mood_score)
    }
}

/// Writes requested by the engine. Applied all together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mutations {
    pub profile: Option<ProfileRecord>,
    pub garden: Option<GardenState>,
    pub daily_pick: Option<DailyPick>,
    pub append: Option<CompletionRecord>,
    /// A gesture delivered to this user.
    pub gesture: Option<GestureRecord>,
}

impl Mutations {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_none()
            && self.garden.is_none()
            && self.daily_pick.is_none()
            && self.append.is_none()
            && self.gesture.is_none()
    }
}

/// Per-user transactional store.
///
/// Implementations must run `transact` closures for one user one at a time,
/// and must not persist any mutation when the closure fails.
pub trait GardenStore {
    /// Insert a new user with a fresh garden.
    ///
    /// # Errors
    /// [`StoreError::UserExists`] if the user id is taken, or
    /// [`StoreError::FriendCodeTaken`] if another profile holds the friend code.
    fn create_user(&self, profile: &ProfileRecord, garden: &GardenState) -> Result<(), StoreError>;

    /// Load the snapshot, run `f`, then apply its mutations atomically.
    fn transact<T, E, F>(&self, user_id: &str, query: &SnapshotQuery, f: F) -> Result<T, E>
    where
        F: FnOnce(&UserSnapshot) -> Result<(T, Mutations), E>,
        E: From<StoreError>;

    /// The user id that owns a (normalised) friend code.
    fn find_by_friend_code(&self, code: &str) -> Result<Option<String>, StoreError>;

    /// Record a mutual friendship. Adding an existing pair is a no-op that
    /// returns `false`.
    ///
    /// # Errors
    /// [`StoreError::UserNotFound`] if either user is missing.
    fn add_friendship(&self, user_id: &str, friend_id: &str, at: Instant) -> Result<bool, StoreError>;

    /// The user's friends, oldest friendship first.
    fn friends(&self, user_id: &str) -> Result<Vec<Friend>, StoreError>;

    /// Gestures the user has received, most recent first.
    fn received_gestures(&self, user_id: &str) -> Result<Vec<GestureRecord>, StoreError>;

    fn snapshot(&self, user_id: &str, query: &SnapshotQuery) -> Result<UserSnapshot, StoreError> {
        self.transact(user_id, query, |snapshot| {
            Ok::<_, StoreError>((snapshot.clone(), Mutations::none()))
        })
    }
}
