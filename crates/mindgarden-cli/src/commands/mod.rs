use std::path::PathBuf;

use mindgarden_core::{
    engine_rng, CoreError, EngineConfig, EngineError, GardenService, Instant, SqliteStore,
};
use rand_pcg::Mcg128Xsl64;
use serde::Serialize;
use tracing::debug;

pub mod action;
pub mod config;
pub mod friend;
pub mod garden;
pub mod onboard;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Global options shared by every command.
pub struct Context {
    pub db: Option<PathBuf>,
    pub user: String,
    pub seed: Option<u64>,
    pub now: Option<Instant>,
}

impl Context {
    pub fn service(&self) -> Result<GardenService<SqliteStore>, Box<dyn std::error::Error>> {
        debug!(db = ?self.db, user = %self.user, "opening garden store");
        let store = match &self.db {
            Some(path) => SqliteStore::open(path)?,
            None => SqliteStore::open_default()?,
        };
        Ok(GardenService::new(store, EngineConfig::load()?))
    }

    pub fn now(&self) -> Instant {
        self.now.unwrap_or_else(chrono::Utc::now)
    }

    pub fn rng(&self) -> Mcg128Xsl64 {
        engine_rng(self.seed)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct NoopStatus {
    status: &'static str,
    reason: &'static str,
    message: String,
}

/// A rejected-but-harmless request: report it on stdout instead of failing.
pub fn print_noop(err: &CoreError) {
    let reason = match err {
        CoreError::Engine(EngineError::AlreadyCompletedToday) => "already_completed_today",
        CoreError::Engine(EngineError::BonusLimitReached { .. }) => "bonus_limit_reached",
        _ => "noop",
    };
    let status = NoopStatus {
        status: "noop",
        reason,
        message: err.to_string(),
    };
    if let Err(e) = print_json(&status) {
        eprintln!("error: {e}");
    }
}
