//! Checks a queet configuration file and prints the resolved policy

use queet_config::{ConfigError, CURRENT_CONFIG_VERSION, StreakIncrement, load_config};
use queet_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Default location: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match load_config(&config_path) {
        Ok(config) => {
            let increment = match config.tracker.streak_increment {
                StreakIncrement::ElapsedDays => "elapsed_days",
                StreakIncrement::SingleDay => "single_day",
            };

            println!("✓ Configuration is valid");
            println!();
            println!("  Data directory:       {}", config.data_dir.display());
            println!(
                "  Auto-advance every:   {}s",
                config.tracker.auto_advance_interval.as_secs()
            );
            println!("  Streak increment:     {}", increment);
            println!(
                "  Award after full day: {}",
                config.tracker.achievement_requires_full_day
            );
            println!("  First-run seed:       {:?}", config.tracker.seed);
            println!("  Backup reminder:      {} days", config.backup.reminder_days);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => eprintln!("Failed to read file: {}", io_err),
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => eprintln!(
                    "Unsupported config version: {} (expected {})",
                    ver, CURRENT_CONFIG_VERSION
                ),
            }
            ExitCode::from(1)
        }
    }
}
