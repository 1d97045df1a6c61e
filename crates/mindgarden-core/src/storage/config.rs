//! TOML-based engine configuration.
//!
//! Tunables for selection, progression and streak rules, plus the timezone
//! used when a profile does not name one.
//!
//! Configuration is stored at `~/.config/mindgarden/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::calendar::parse_timezone;
use crate::error::ConfigError;
use crate::garden::ProgressionRules;
use crate::selection::SelectionRules;
use crate::streak::StreakEngine;

/// Action selection tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_weight_floor")]
    pub weight_floor: f64,
    #[serde(default = "default_preferred_boost")]
    pub preferred_boost: f64,
    #[serde(default = "default_bonus_candidates")]
    pub bonus_candidates: usize,
}

/// XP and daily allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default = "default_core_xp")]
    pub core_xp: u32,
    #[serde(default = "default_bonus_xp")]
    pub bonus_xp: u32,
    #[serde(default = "default_xp_per_level")]
    pub xp_per_level: u32,
    #[serde(default = "default_max_bonus_per_day")]
    pub max_bonus_per_day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Grace is available again once more than this many days have passed.
    #[serde(default = "default_grace_cooldown_days")]
    pub grace_cooldown_days: i64,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/mindgarden/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

// Default functions
fn default_history_window() -> usize {
    30
}
fn default_weight_floor() -> f64 {
    0.4
}
fn default_preferred_boost() -> f64 {
    1.4
}
fn default_bonus_candidates() -> usize {
    3
}
fn default_core_xp() -> u32 {
    15
}
fn default_bonus_xp() -> u32 {
    7
}
fn default_xp_per_level() -> u32 {
    100
}
fn default_max_bonus_per_day() -> u32 {
    2
}
fn default_grace_cooldown_days() -> i64 {
    6
}
fn default_timezone() -> String {
    "UTC".into()
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            weight_floor: default_weight_floor(),
            preferred_boost: default_preferred_boost(),
            bonus_candidates: default_bonus_candidates(),
        }
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            core_xp: default_core_xp(),
            bonus_xp: default_bonus_xp(),
            xp_per_level: default_xp_per_level(),
            max_bonus_per_day: default_max_bonus_per_day(),
        }
    }
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            grace_cooldown_days: default_grace_cooldown_days(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            progression: ProgressionConfig::default(),
            streak: StreakConfig::default(),
            default_timezone: default_timezone(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl EngineConfig {
    pub fn selection_rules(&self) -> SelectionRules {
        SelectionRules {
            weight_floor: self.selection.weight_floor,
            preferred_boost: self.selection.preferred_boost,
            bonus_candidates: self.selection.bonus_candidates,
        }
    }

    pub fn progression_rules(&self) -> ProgressionRules {
        ProgressionRules {
            core_xp: self.progression.core_xp,
            bonus_xp: self.progression.bonus_xp,
            xp_per_level: self.progression.xp_per_level,
        }
    }

    pub fn streak_engine(&self) -> StreakEngine {
        StreakEngine::with_grace_cooldown(self.streak.grace_cooldown_days)
    }

    /// Reject values that would break the engine's guarantees.
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.selection;
        if !(s.weight_floor.is_finite() && s.weight_floor > 0.0) {
            return Err(invalid("selection.weight_floor", "must be a positive number"));
        }
        if !(s.preferred_boost.is_finite() && s.preferred_boost > 0.0) {
            return Err(invalid("selection.preferred_boost", "must be a positive number"));
        }
        if s.history_window == 0 {
            return Err(invalid("selection.history_window", "must be at least 1"));
        }
        if self.progression.xp_per_level == 0 {
            return Err(invalid("progression.xp_per_level", "must be at least 1"));
        }
        if self.streak.grace_cooldown_days < 0 {
            return Err(invalid("streak.grace_cooldown_days", "must not be negative"));
        }
        parse_timezone(&self.default_timezone)
            .map_err(|e| invalid("default_timezone", e.to_string()))?;
        Ok(())
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(key, e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(key, format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(key, format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `<data dir>/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("."),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, or return defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read, parsed
    /// or validated.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let cfg: EngineConfig = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, validating the result. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let next: EngineConfig =
            serde_json::from_value(json).map_err(|e| invalid(key, e.to_string()))?;
        next.validate()?;
        *self = next;
        Ok(())
    }
}
