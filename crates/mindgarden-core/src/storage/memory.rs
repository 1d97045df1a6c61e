//! In-process store for tests and embedding.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{GardenStore, Mutations, SnapshotQuery, UserSnapshot};
use crate::calendar::Instant;
use crate::completion::CompletionRecord;
use crate::error::StoreError;
use crate::garden::{Friend, GardenState, GestureRecord};
use crate::profile::ProfileRecord;
use crate::selection::DailyPick;

#[derive(Debug, Clone)]
struct UserEntry {
    profile: ProfileRecord,
    garden: GardenState,
    daily_pick: DailyPick,
    /// Oldest first.
    log: Vec<CompletionRecord>,
    /// Friend ids with the time the friendship was made, oldest first.
    friends: Vec<(String, Instant)>,
    /// Oldest first.
    gestures: Vec<GestureRecord>,
}

/// `Mutex`-guarded map of users.
///
/// The lock is held for the whole of `transact`, so concurrent requests are
/// serialised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full log of a user, oldest first.
    pub fn log(&self, user_id: &str) -> Result<Vec<CompletionRecord>, StoreError> {
        let users = self.users.lock()?;
        users
            .get(user_id)
            .map(|entry| entry.log.clone())
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))
    }
}

impl GardenStore for MemoryStore {
    fn create_user(&self, profile: &ProfileRecord, garden: &GardenState) -> Result<(), StoreError> {
        let mut users = self.users.lock()?;
        if users.contains_key(&profile.user_id) {
            return Err(StoreError::UserExists(profile.user_id.clone()));
        }
        if users.values().any(|entry| entry.profile.friend_code == profile.friend_code) {
            return Err(StoreError::FriendCodeTaken(profile.friend_code.clone()));
        }
        users.insert(
            profile.user_id.clone(),
            UserEntry {
                profile: profile.clone(),
                garden: garden.clone(),
                daily_pick: DailyPick::default(),
                log: Vec::new(),
                friends: Vec::new(),
                gestures: Vec::new(),
            },
        );
        Ok(())
    }

    fn transact<T, E, F>(&self, user_id: &str, query: &SnapshotQuery, f: F) -> Result<T, E>
    where
        F: FnOnce(&UserSnapshot) -> Result<(T, Mutations), E>,
        E: From<StoreError>,
    {
        let mut users = self.users.lock().map_err(StoreError::from)?;
        let entry = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

        let snapshot = UserSnapshot {
            profile: entry.profile.clone(),
            garden: entry.garden.clone(),
            daily_pick: entry.daily_pick.clone(),
            recent: entry.log.iter().rev().take(query.recent_limit).cloned().collect(),
            latest: entry
                .log
                .iter()
                .rev()
                .take_while(|r| r.created_at >= query.since)
                .cloned()
                .collect(),
        };

        let (value, mutations) = f(&snapshot)?;

        if let Some(profile) = mutations.profile {
            entry.profile = profile;
        }
        if let Some(garden) = mutations.garden {
            entry.garden = garden;
        }
        if let Some(pick) = mutations.daily_pick {
            entry.daily_pick = pick;
        }
        if let Some(record) = mutations.append {
            // Keep the log ordered even if a caller supplies an out-of-order clock.
            let at = entry.log.partition_point(|r| r.created_at <= record.created_at);
            entry.log.insert(at, record);
        }
        if let Some(gesture) = mutations.gesture {
            entry.gestures.push(gesture);
        }
        Ok(value)
    }

    fn find_by_friend_code(&self, code: &str) -> Result<Option<String>, StoreError> {
        let users = self.users.lock()?;
        Ok(users
            .values()
            .find(|entry| entry.profile.friend_code == code)
            .map(|entry| entry.profile.user_id.clone()))
    }

    fn add_friendship(&self, user_id: &str, friend_id: &str, at: Instant) -> Result<bool, StoreError> {
        let mut users = self.users.lock()?;
        for id in [user_id, friend_id] {
            if !users.contains_key(id) {
                return Err(StoreError::UserNotFound(id.to_string()));
            }
        }
        let mut added = false;
        for (owner, other) in [(user_id, friend_id), (friend_id, user_id)] {
            if let Some(entry) = users.get_mut(owner) {
                if !entry.friends.iter().any(|(id, _)| id == other) {
                    entry.friends.push((other.to_string(), at));
                    added = true;
                }
            }
        }
        Ok(added)
    }

    fn friends(&self, user_id: &str) -> Result<Vec<Friend>, StoreError> {
        let users = self.users.lock()?;
        let entry = users
            .get(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;
        Ok(entry
            .friends
            .iter()
            .filter_map(|(id, since)| {
                users.get(id).map(|friend| Friend {
                    user_id: id.clone(),
                    friend_code: friend.profile.friend_code.clone(),
                    since: *since,
                })
            })
            .collect())
    }

    fn received_gestures(&self, user_id: &str) -> Result<Vec<GestureRecord>, StoreError> {
        let users = self.users.lock()?;
        users
            .get(user_id)
            .map(|entry| entry.gestures.iter().rev().cloned().collect())
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SeedType;
    use chrono::{TimeZone, Utc};

    fn profile(user_id: &str, friend_code: &str) -> ProfileRecord {
        ProfileRecord {
            user_id: user_id.into(),
            seed_type: SeedType::Calm,
            seed_variant: "mist".into(),
            timezone: "UTC".into(),
            reminder_time: None,
            streak_count: 0,
            current_stage: 0,
            last_action_day_key: None,
            grace_used_at: None,
            friend_code: friend_code.into(),
        }
    }

    #[test]
    fn test_create_user_rejects_taken_friend_code() {
        let store = MemoryStore::new();
        store.create_user(&profile("ada", "AAAAAA"), &GardenState::default()).unwrap();
        assert!(matches!(
            store.create_user(&profile("bob", "AAAAAA"), &GardenState::default()),
            Err(StoreError::FriendCodeTaken(code)) if code == "AAAAAA"
        ));
        assert!(matches!(store.log("bob"), Err(StoreError::UserNotFound(_))));
        store.create_user(&profile("bob", "BBBBBB"), &GardenState::default()).unwrap();
    }

    #[test]
    fn test_friendship_is_mutual() {
        let store = MemoryStore::new();
        store.create_user(&profile("ada", "AAAAAA"), &GardenState::default()).unwrap();
        store.create_user(&profile("bob", "BBBBBB"), &GardenState::default()).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        assert!(store.add_friendship("ada", "bob", at).unwrap());
        assert!(!store.add_friendship("bob", "ada", at).unwrap());
        let friends = store.friends("bob").unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].user_id, "ada");
        assert_eq!(friends[0].friend_code, "AAAAAA");
        assert!(matches!(store.add_friendship("ada", "cy", at), Err(StoreError::UserNotFound(_))));
        assert!(store.friends("ada").unwrap().iter().all(|f| f.user_id != "cy"));
    }
}
