//! Core error types for mindgarden-core.
//!
//! This module defines the error hierarchy using thiserror. Rules outcomes
//! ([`EngineError`]) are kept apart from persistence failures
//! ([`StoreError`]) so callers can tell a polite refusal from a broken store.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for mindgarden-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rules engine refused the request
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Persistence-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// True when the error is an idempotent rules outcome the caller should
    /// report as success-with-no-change.
    pub fn is_noop(&self) -> bool {
        matches!(self, CoreError::Engine(e) if e.is_noop())
    }
}

/// Outcomes of the rules engine that reject a request.
///
/// No state is mutated when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A core action was already credited for today's calendar day
    #[error("Core action already completed today")]
    AlreadyCompletedToday,

    /// The daily bonus allowance is spent
    #[error("Bonus limit reached: at most {limit} bonus actions per day")]
    BonusLimitReached { limit: u32 },

    /// Input references an action type that is not in the catalog
    #[error("Unknown action type: '{0}'")]
    InvalidActionType(String),

    /// The response does not satisfy the action's input requirement
    #[error("Invalid submission field '{field}': {message}")]
    InvalidSubmission { field: String, message: String },

    /// A cosmetic was selected whose requirement is not met
    #[error("Cosmetic '{id}' is still locked")]
    LockedCosmetic { id: String },

    /// A cosmetic id that does not exist in the unlock catalog (or is in the wrong slot)
    #[error("Unknown cosmetic '{id}'")]
    UnknownCosmetic { id: String },

    /// Friend code does not resolve to another user
    #[error("No friend found for code '{0}'")]
    UnknownFriendCode(String),

    /// Gestures only go to users on the sender's friend list
    #[error("'{0}' is not on your friend list")]
    NotAFriend(String),
}

impl EngineError {
    /// Idempotent outcomes: the request was already satisfied or capped.
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyCompletedToday | EngineError::BonusLimitReached { .. }
        )
    }

    pub(crate) fn submission(field: &str, message: impl Into<String>) -> Self {
        EngineError::InvalidSubmission {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Persistence-layer errors, surfaced unmodified to the caller.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Data directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No profile for this user
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A profile already exists for this user
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Another profile already holds this friend code
    #[error("Friend code already taken: {0}")]
    FriendCodeTaken(String),

    /// Stored row could not be decoded at all
    #[error("Corrupt row in '{table}': {message}")]
    Corrupt { table: String, message: String },

    /// A previous writer panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors for user-supplied profile data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not an IANA timezone name
    #[error("Unknown timezone: '{0}'")]
    UnknownTimezone(String),

    /// Reminder time is not HH:MM
    #[error("Invalid reminder time '{0}': expected HH:MM")]
    InvalidReminderTime(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
