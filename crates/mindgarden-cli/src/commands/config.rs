use clap::Subcommand;
use mindgarden_core::EngineConfig;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Write the defaults unless a config file already exists
    Init,
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "streak.grace_cooldown_days")
        key: String,
    },
    /// Set a config value
    Set {
        key: String,
        value: String,
    },
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Show => print_json(&EngineConfig::load()?)?,
        ConfigAction::Path => println!("{}", EngineConfig::path()?.display()),
        ConfigAction::Init => {
            let path = EngineConfig::path()?;
            if !path.exists() {
                EngineConfig::default().save_to(&path)?;
            }
            println!("{}", path.display());
        }
        ConfigAction::Get { key } => {
            let config = EngineConfig::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = EngineConfig::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
    }
    Ok(())
}
