//! queet - local tracker for quitting cannabis
//!
//! Wires together:
//! - Configuration loading
//! - Store initialization (SQLite, falling back to memory)
//! - The progress tracker
//! - One-shot commands and the `watch` loop

mod app;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use queet_api::Language;
use queet_config::load_config_or_default;
use queet_core::{DEFAULT_REPORT_DAYS, MAX_REPORT_DAYS};
use queet_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;

/// queet - Track your streak, hits, triggers and achievements
#[derive(Parser, Debug)]
#[command(name = "queet")]
#[command(about = "Local-only tracker for quitting cannabis", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/queet/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set QUEET_DATA_DIR env var)
    #[arg(short, long, env = "QUEET_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current streak and today's hits
    Status {
        /// Print the full progress record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log a relapse: the streak restarts and the hit is counted
    Relapse,

    /// Start over: clears streaks, hits, triggers and achievements
    Reset {
        #[arg(long)]
        yes: bool,
    },

    /// Log one hit
    Hit,

    /// Remove the last logged hit
    Unhit,

    /// Manage craving triggers
    #[command(subcommand)]
    Trigger(TriggerCommand),

    /// Log a purchase
    Purchase { amount: f64 },

    /// Manage achievements
    #[command(subcommand)]
    Achievements(AchievementsCommand),

    /// Hits per day over recent days
    Report {
        #[arg(
            long,
            default_value_t = DEFAULT_REPORT_DAYS,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_REPORT_DAYS))
        )]
        days: u32,

        #[arg(long)]
        json: bool,
    },

    /// Export all data as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Import data from an export file
    Import { file: PathBuf },

    /// Repair the stored progress record
    Repair,

    /// Check the stored data for problems
    Validate,

    /// Create the local profile
    Login { email: String },

    /// Remove the local profile
    Logout,

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Erase every piece of stored data
    DeleteAccount {
        #[arg(long)]
        yes: bool,
    },

    /// Keep running and advance the streak as days pass
    Watch,
}

#[derive(Subcommand, Debug)]
enum TriggerCommand {
    /// Log a trigger (stress, boredom, social, emotional, habit, other)
    Add {
        kind: String,

        /// 1 (mild) to 10 (overwhelming)
        #[arg(short, long, default_value_t = 5)]
        intensity: u8,

        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Delete a trigger by id
    Delete { id: String },

    /// List logged triggers
    List,
}

#[derive(Subcommand, Debug)]
enum AchievementsCommand {
    /// Remove every achievement
    Reset,

    /// Remove duplicated achievements
    Clean,

    /// List earned achievements
    List,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,

    Set {
        #[arg(long)]
        notifications: Option<bool>,

        #[arg(long)]
        dark_mode: Option<bool>,

        #[arg(long)]
        language: Option<Language>,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), "queet starting");
    if queet_util::is_mock_time_active() {
        warn!("Mock time is active; dates are not real");
    }

    let mut config = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let mut app = App::open(config, queet_util::now());
    app.run(args.command).await
}
