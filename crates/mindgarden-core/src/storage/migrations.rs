//! Database schema migrations for mindgarden.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    debug!(version, "schema migrated");
    Ok(())
}

/// Migration v1: profiles, gardens (with the daily pick cache) and the
/// append-only completion log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS profiles (
            user_id             TEXT PRIMARY KEY,
            seed_type           TEXT NOT NULL,
            seed_variant        TEXT NOT NULL,
            timezone            TEXT NOT NULL DEFAULT 'UTC',
            reminder_time       TEXT,
            streak_count        INTEGER NOT NULL DEFAULT 0,
            current_stage       INTEGER NOT NULL DEFAULT 0,
            last_action_day_key TEXT,
            grace_used_at       TEXT,
            friend_code         TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS gardens (
            user_id              TEXT PRIMARY KEY REFERENCES profiles(user_id),
            xp_total             INTEGER NOT NULL DEFAULT 0,
            level                INTEGER NOT NULL DEFAULT 1,
            water                INTEGER NOT NULL DEFAULT 0,
            sunlight             INTEGER NOT NULL DEFAULT 0,
            soil                 INTEGER NOT NULL DEFAULT 0,
            bloom                INTEGER NOT NULL DEFAULT 0,
            preferred_categories TEXT NOT NULL DEFAULT '[]',
            background_id        TEXT NOT NULL DEFAULT 'dawn-haze',
            plant_skin           TEXT NOT NULL DEFAULT 'classic',
            decor_ids            TEXT NOT NULL DEFAULT '[]',
            last_swap_day        TEXT,
            core_action_type     TEXT,
            core_action_variant  TEXT,
            pick_day             TEXT,
            bonus_action_types   TEXT NOT NULL DEFAULT '[]',
            bonus_day            TEXT
        );

        CREATE TABLE IF NOT EXISTS completions (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id        TEXT NOT NULL REFERENCES profiles(user_id),
            action_type    TEXT NOT NULL,
            action_kind    TEXT NOT NULL,
            category       TEXT NOT NULL,
            action_variant TEXT,
            mood_score     INTEGER,
            text_input     TEXT,
            created_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_completions_user_time
            ON completions(user_id, created_at);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: friend codes are unique.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_profiles_friend_code ON profiles(friend_code);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: the friend graph and the received-gesture history.
///
/// Friendships are stored once per direction.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS friends (
            user_id    TEXT NOT NULL REFERENCES profiles(user_id),
            friend_id  TEXT NOT NULL REFERENCES profiles(user_id),
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, friend_id)
        );

        CREATE TABLE IF NOT EXISTS friend_gestures (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id    TEXT NOT NULL REFERENCES profiles(user_id),
            receiver_id  TEXT NOT NULL REFERENCES profiles(user_id),
            gesture_type TEXT NOT NULL,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_friend_gestures_receiver
            ON friend_gestures(receiver_id, created_at);",
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}
