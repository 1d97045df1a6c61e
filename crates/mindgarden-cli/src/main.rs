use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mindgarden_core::{CoreError, Instant};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "mindgarden", version, about = "MindGarden habit garden CLI")]
struct Cli {
    /// SQLite database file (defaults to the data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// User id to act as
    #[arg(long, global = true, default_value = "local")]
    user: String,
    /// Seed for the random source, for reproducible picks
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Clock override (RFC 3339)
    #[arg(long, global = true, value_parser = parse_instant)]
    now: Option<Instant>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plant a seed and create the user's garden
    Onboard(commands::onboard::OnboardArgs),
    /// Show today's core and bonus actions
    Today {
        /// Redraw today's core action (once per day)
        #[arg(long)]
        swap: bool,
    },
    /// Log a completed action
    Complete(commands::action::CompleteArgs),
    /// Garden state, growth stage and unlocks
    Garden,
    /// Mood trend and category balance over recent completions
    Insights,
    /// Set preferred categories (none clears them)
    Prefs {
        categories: Vec<String>,
    },
    /// Choose background, plant skin and decor
    Customize(commands::garden::CustomizeArgs),
    /// Add and list friends
    Friend {
        #[command(subcommand)]
        action: commands::friend::FriendAction,
    },
    /// Feed a friend's garden
    Gesture {
        /// The friend's garden code
        friend_code: String,
        /// sunshine, encouragement, bloom or water
        gesture: String,
    },
    /// Engine configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn parse_instant(raw: &str) -> Result<Instant, String> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| format!("invalid RFC 3339 instant '{raw}': {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mindgarden=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context {
        db: cli.db,
        user: cli.user,
        seed: cli.seed,
        now: cli.now,
    };
    let result = match cli.command {
        Commands::Onboard(args) => commands::onboard::run(&ctx, args),
        Commands::Today { swap } => commands::action::today(&ctx, swap),
        Commands::Complete(args) => commands::action::complete(&ctx, args),
        Commands::Garden => commands::garden::show(&ctx),
        Commands::Insights => commands::garden::insights(&ctx),
        Commands::Prefs { categories } => commands::garden::prefs(&ctx, &categories),
        Commands::Customize(args) => commands::garden::customize(&ctx, args),
        Commands::Friend { action } => commands::friend::run(&ctx, action),
        Commands::Gesture {
            friend_code,
            gesture,
        } => commands::garden::gesture(&ctx, &friend_code, &gesture),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        if let Some(core) = e.downcast_ref::<CoreError>() {
            if core.is_noop() {
                commands::print_noop(core);
                return;
            }
        }
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
