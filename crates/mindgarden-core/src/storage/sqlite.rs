//! SQLite-backed store.
//!
//! Each `transact` call runs inside `BEGIN IMMEDIATE`, which takes the write
//! lock up front so two processes cannot both read "not done today".

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::warn;

use super::{data_dir, migrations, GardenStore, Mutations, SnapshotQuery, UserSnapshot};
use crate::calendar::{DayKey, Instant};
use crate::catalog::{ActionCategory, ActionType, SeedType};
use crate::completion::{ActionKind, CompletionRecord};
use crate::error::StoreError;
use crate::garden::{Cosmetics, Friend, GardenState, GestureKind, GestureRecord, Nutrients};
use crate::profile::ProfileRecord;
use crate::selection::DailyPick;

pub const DATABASE_FILE: &str = "mindgarden.db";

/// SQLite store at `<data dir>/mindgarden.db`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the database in the data directory.
    ///
    /// # Errors
    /// Returns an error if the directory or database cannot be opened.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&data_dir()?.join(DATABASE_FILE))
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Full log of a user, oldest first.
    pub fn log(&self, user_id: &str) -> Result<Vec<CompletionRecord>, StoreError> {
        let conn = self.conn.lock()?;
        query_completions(
            &conn,
            "SELECT action_type, action_kind, category, action_variant, mood_score, text_input, created_at
             FROM completions WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
            params![user_id],
        )
    }
}

fn format_instant(at: Instant) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn corrupt(table: &str, message: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        table: table.to_string(),
        message: message.into(),
    }
}

fn parse_instant(raw: &str) -> Option<Instant> {
    DateTime::parse_from_rfc3339(raw).ok().map(|at| at.with_timezone(&Utc))
}

fn user_exists(conn: &Connection, user_id: &str) -> Result<bool, StoreError> {
    Ok(conn
        .query_row("SELECT 1 FROM profiles WHERE user_id = ?1", params![user_id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn load_profile(conn: &Connection, user_id: &str) -> Result<ProfileRecord, StoreError> {
    let row = conn
        .query_row(
            "SELECT user_id, seed_type, seed_variant, timezone, reminder_time, streak_count,
                    current_stage, last_action_day_key, grace_used_at, friend_code
             FROM profiles WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, String>(9)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

    let (user_id, seed, seed_variant, timezone, reminder_time, streak_count, stage, last, grace, friend_code) = row;
    let seed_type = seed.parse::<SeedType>().map_err(|e| corrupt("profiles", e))?;
    Ok(ProfileRecord {
        user_id,
        seed_type,
        seed_variant,
        timezone,
        reminder_time,
        streak_count,
        current_stage: usize::try_from(stage).unwrap_or(0),
        last_action_day_key: last,
        grace_used_at: grace,
        friend_code,
    })
}

fn save_profile(conn: &Connection, profile: &ProfileRecord) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE profiles SET seed_type = ?2, seed_variant = ?3, timezone = ?4, reminder_time = ?5,
                streak_count = ?6, current_stage = ?7, last_action_day_key = ?8,
                grace_used_at = ?9, friend_code = ?10
         WHERE user_id = ?1",
        params![
            profile.user_id,
            profile.seed_type.as_str(),
            profile.seed_variant,
            profile.timezone,
            profile.reminder_time,
            profile.streak_count,
            profile.current_stage as i64,
            profile.last_action_day_key,
            profile.grace_used_at,
            profile.friend_code,
        ],
    )?;
    Ok(())
}

fn json_list(table: &str, column: &str, raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(table, column, error = %e, "ignoring malformed list column");
        Vec::new()
    })
}

fn to_json_list<T: AsRef<str>>(items: impl IntoIterator<Item = T>) -> Result<String, StoreError> {
    let items: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    serde_json::to_string(&items).map_err(|e| corrupt("gardens", e.to_string()))
}

struct GardenRow {
    xp_total: u32,
    level: u32,
    nutrients: Nutrients,
    preferred: String,
    background: String,
    plant_skin: String,
    decor: String,
    last_swap_day: Option<String>,
    core: Option<String>,
    variant: Option<String>,
    pick_day: Option<String>,
    bonus: String,
    bonus_day: Option<String>,
}

fn load_garden(conn: &Connection, user_id: &str) -> Result<(GardenState, DailyPick), StoreError> {
    let row = conn
        .query_row(
            "SELECT xp_total, level, water, sunlight, soil, bloom, preferred_categories,
                    background_id, plant_skin, decor_ids, last_swap_day, core_action_type,
                    core_action_variant, pick_day, bonus_action_types, bonus_day
             FROM gardens WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(GardenRow {
                    xp_total: row.get(0)?,
                    level: row.get(1)?,
                    nutrients: Nutrients {
                        water: row.get(2)?,
                        sunlight: row.get(3)?,
                        soil: row.get(4)?,
                        bloom: row.get(5)?,
                    },
                    preferred: row.get(6)?,
                    background: row.get(7)?,
                    plant_skin: row.get(8)?,
                    decor: row.get(9)?,
                    last_swap_day: row.get(10)?,
                    core: row.get(11)?,
                    variant: row.get(12)?,
                    pick_day: row.get(13)?,
                    bonus: row.get(14)?,
                    bonus_day: row.get(15)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

    let preferred_categories = json_list("gardens", "preferred_categories", &row.preferred)
        .iter()
        .filter_map(|raw| raw.parse::<ActionCategory>().ok())
        .collect();
    let last_swap_day = row.last_swap_day.as_deref().and_then(|raw| {
        let day = DayKey::parse(raw);
        if day.is_none() {
            warn!(column = "last_swap_day", value = raw, "ignoring malformed day key");
        }
        day
    });

    let garden = GardenState {
        xp_total: row.xp_total,
        level: row.level.max(1),
        nutrients: row.nutrients,
        preferred_categories,
        cosmetics: Cosmetics {
            background: row.background,
            plant_skin: row.plant_skin,
            decor: json_list("gardens", "decor_ids", &row.decor),
        },
        last_swap_day,
    };
    let pick = DailyPick::from_stored(
        row.core.as_deref(),
        row.variant.as_deref(),
        row.pick_day.as_deref(),
        &json_list("gardens", "bonus_action_types", &row.bonus),
        row.bonus_day.as_deref(),
    );
    Ok((garden, pick))
}

fn save_garden(conn: &Connection, user_id: &str, garden: &GardenState) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE gardens SET xp_total = ?2, level = ?3, water = ?4, sunlight = ?5, soil = ?6,
                bloom = ?7, preferred_categories = ?8, background_id = ?9, plant_skin = ?10,
                decor_ids = ?11, last_swap_day = ?12
         WHERE user_id = ?1",
        params![
            user_id,
            garden.xp_total,
            garden.level,
            garden.nutrients.water,
            garden.nutrients.sunlight,
            garden.nutrients.soil,
            garden.nutrients.bloom,
            to_json_list(garden.preferred_categories.iter().map(|c| c.as_str()))?,
            garden.cosmetics.background,
            garden.cosmetics.plant_skin,
            to_json_list(&garden.cosmetics.decor)?,
            garden.last_swap_day.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

fn save_pick(conn: &Connection, user_id: &str, pick: &DailyPick) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE gardens SET core_action_type = ?2, core_action_variant = ?3, pick_day = ?4,
                bonus_action_types = ?5, bonus_day = ?6
         WHERE user_id = ?1",
        params![
            user_id,
            pick.core_action_type.map(|t| t.as_str()),
            pick.core_action_variant,
            pick.pick_day.map(|d| d.to_string()),
            to_json_list(pick.bonus_action_types.iter().map(|t| t.as_str()))?,
            pick.bonus_day.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

fn decode_completion(row: &Row<'_>) -> rusqlite::Result<Option<CompletionRecord>> {
    let action_type: String = row.get(0)?;
    let kind: String = row.get(1)?;
    let category: String = row.get(2)?;
    let created_at: String = row.get(6)?;

    let parsed = (
        action_type.parse::<ActionType>().ok(),
        kind.parse::<ActionKind>().ok(),
        category.parse::<ActionCategory>().ok(),
        parse_instant(&created_at),
    );
    let (Some(action_type), Some(action_kind), Some(category), Some(created_at)) = parsed else {
        warn!(%action_type, %kind, %category, %created_at, "skipping undecodable completion row");
        return Ok(None);
    };

    Ok(Some(CompletionRecord {
        action_type,
        action_kind,
        category,
        action_variant: row.get(3)?,
        mood_score: row.get(4)?,
        text_input: row.get(5)?,
        created_at,
    }))
}

fn query_completions(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<CompletionRecord>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, decode_completion)?;
    let mut records = Vec::new();
    for row in rows {
        if let Some(record) = row? {
            records.push(record);
        }
    }
    Ok(records)
}

fn append_completion(conn: &Connection, user_id: &str, record: &CompletionRecord) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO completions
            (user_id, action_type, action_kind, category, action_variant, mood_score, text_input, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user_id,
            record.action_type.as_str(),
            record.action_kind.as_str(),
            record.category.as_str(),
            record.action_variant,
            record.mood_score,
            record.text_input,
            format_instant(record.created_at),
        ],
    )?;
    Ok(())
}

fn append_gesture(conn: &Connection, gesture: &GestureRecord) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO friend_gestures (sender_id, receiver_id, gesture_type, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            gesture.sender_id,
            gesture.receiver_id,
            gesture.gesture.as_str(),
            format_instant(gesture.created_at),
        ],
    )?;
    Ok(())
}

fn load_snapshot(conn: &Connection, user_id: &str, query: &SnapshotQuery) -> Result<UserSnapshot, StoreError> {
    let profile = load_profile(conn, user_id)?;
    let (garden, daily_pick) = load_garden(conn, user_id)?;
    let recent = query_completions(
        conn,
        "SELECT action_type, action_kind, category, action_variant, mood_score, text_input, created_at
         FROM completions WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        params![user_id, i64::try_from(query.recent_limit).unwrap_or(i64::MAX)],
    )?;
    let latest = query_completions(
        conn,
        "SELECT action_type, action_kind, category, action_variant, mood_score, text_input, created_at
         FROM completions WHERE user_id = ?1 AND created_at >= ?2 ORDER BY created_at DESC, id DESC",
        params![user_id, format_instant(query.since)],
    )?;
    Ok(UserSnapshot {
        profile,
        garden,
        daily_pick,
        recent,
        latest,
    })
}

impl GardenStore for SqliteStore {
    fn create_user(&self, profile: &ProfileRecord, garden: &GardenState) -> Result<(), StoreError> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if user_exists(&tx, &profile.user_id)? {
            return Err(StoreError::UserExists(profile.user_id.clone()));
        }
        let code_taken = tx
            .query_row(
                "SELECT 1 FROM profiles WHERE friend_code = ?1",
                params![profile.friend_code],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if code_taken {
            return Err(StoreError::FriendCodeTaken(profile.friend_code.clone()));
        }
        tx.execute(
            "INSERT INTO profiles (user_id, seed_type, seed_variant, timezone, friend_code)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                profile.user_id,
                profile.seed_type.as_str(),
                profile.seed_variant,
                profile.timezone,
                profile.friend_code,
            ],
        )?;
        tx.execute("INSERT INTO gardens (user_id) VALUES (?1)", params![profile.user_id])?;
        save_profile(&tx, profile)?;
        save_garden(&tx, &profile.user_id, garden)?;
        tx.commit()?;
        Ok(())
    }

    fn transact<T, E, F>(&self, user_id: &str, query: &SnapshotQuery, f: F) -> Result<T, E>
    where
        F: FnOnce(&UserSnapshot) -> Result<(T, Mutations), E>,
        E: From<StoreError>,
    {
        let mut conn = self.conn.lock().map_err(StoreError::from)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        let snapshot = load_snapshot(&tx, user_id, query)?;
        // Dropping `tx` on error rolls back.
        let (value, mutations) = f(&snapshot)?;

        if !mutations.is_empty() {
            if let Some(profile) = &mutations.profile {
                save_profile(&tx, profile)?;
            }
            if let Some(garden) = &mutations.garden {
                save_garden(&tx, user_id, garden)?;
            }
            if let Some(pick) = &mutations.daily_pick {
                save_pick(&tx, user_id, pick)?;
            }
            if let Some(record) = &mutations.append {
                append_completion(&tx, user_id, record)?;
            }
            if let Some(gesture) = &mutations.gesture {
                append_gesture(&tx, gesture)?;
            }
        }
        tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    fn find_by_friend_code(&self, code: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock()?;
        let found = conn
            .query_row(
                "SELECT user_id FROM profiles WHERE friend_code = ?1",
                params![code],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(found)
    }

    fn add_friendship(&self, user_id: &str, friend_id: &str, at: Instant) -> Result<bool, StoreError> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for id in [user_id, friend_id] {
            if !user_exists(&tx, id)? {
                return Err(StoreError::UserNotFound(id.to_string()));
            }
        }
        let created_at = format_instant(at);
        let mut added = 0;
        for (owner, other) in [(user_id, friend_id), (friend_id, user_id)] {
            added += tx.execute(
                "INSERT OR IGNORE INTO friends (user_id, friend_id, created_at) VALUES (?1, ?2, ?3)",
                params![owner, other, created_at],
            )?;
        }
        tx.commit()?;
        Ok(added > 0)
    }

    fn friends(&self, user_id: &str) -> Result<Vec<Friend>, StoreError> {
        let conn = self.conn.lock()?;
        if !user_exists(&conn, user_id)? {
            return Err(StoreError::UserNotFound(user_id.to_string()));
        }
        let mut stmt = conn.prepare(
            "SELECT f.friend_id, p.friend_code, f.created_at
             FROM friends f JOIN profiles p ON p.user_id = f.friend_id
             WHERE f.user_id = ?1 ORDER BY f.created_at ASC, f.friend_id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        let mut friends = Vec::new();
        for row in rows {
            let (friend_id, friend_code, created_at) = row?;
            let Some(since) = parse_instant(&created_at) else {
                warn!(%friend_id, %created_at, "skipping undecodable friend row");
                continue;
            };
            friends.push(Friend {
                user_id: friend_id,
                friend_code,
                since,
            });
        }
        Ok(friends)
    }

    fn received_gestures(&self, user_id: &str) -> Result<Vec<GestureRecord>, StoreError> {
        let conn = self.conn.lock()?;
        if !user_exists(&conn, user_id)? {
            return Err(StoreError::UserNotFound(user_id.to_string()));
        }
        let mut stmt = conn.prepare(
            "SELECT sender_id, receiver_id, gesture_type, created_at
             FROM friend_gestures WHERE receiver_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut gestures = Vec::new();
        for row in rows {
            let (sender_id, receiver_id, kind, created_at) = row?;
            let (Some(gesture), Some(created_at)) = (GestureKind::from_name(&kind), parse_instant(&created_at)) else {
                warn!(%sender_id, %kind, %created_at, "skipping undecodable gesture row");
                continue;
            };
            gestures.push(GestureRecord {
                sender_id,
                receiver_id,
                gesture,
                created_at,
            });
        }
        Ok(gestures)
    }
}
