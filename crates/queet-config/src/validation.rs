//! Configuration validation

use crate::policy::{SeedKind, StreakIncrement};
use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("tracker.{field}: {message}")]
    TrackerError { field: &'static str, message: String },

    #[error("backup.{field}: {message}")]
    BackupError { field: &'static str, message: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let tracker = &config.tracker;

    if tracker.auto_advance_interval_seconds == Some(0) {
        errors.push(ValidationError::TrackerError {
            field: "auto_advance_interval_seconds",
            message: "must be greater than zero".into(),
        });
    }

    if let Some(increment) = &tracker.streak_increment
        && let Err(e) = parse_streak_increment(increment)
    {
        errors.push(ValidationError::TrackerError {
            field: "streak_increment",
            message: e,
        });
    }

    if let Some(seed) = &tracker.seed
        && let Err(e) = parse_seed(seed)
    {
        errors.push(ValidationError::TrackerError {
            field: "seed",
            message: e,
        });
    }

    if config.backup.reminder_days == Some(0) {
        errors.push(ValidationError::BackupError {
            field: "reminder_days",
            message: "must be at least 1".into(),
        });
    }

    errors
}

/// Parse the streak increment policy name
pub fn parse_streak_increment(s: &str) -> Result<StreakIncrement, String> {
    match s.to_lowercase().as_str() {
        "elapsed_days" | "elapsed" => Ok(StreakIncrement::ElapsedDays),
        "single_day" | "single" => Ok(StreakIncrement::SingleDay),
        other => Err(format!("Unknown streak increment: {}", other)),
    }
}

/// Parse the first-run seed name
pub fn parse_seed(s: &str) -> Result<SeedKind, String> {
    match s.to_lowercase().as_str() {
        "empty" | "zero" => Ok(SeedKind::Empty),
        "demo" => Ok(SeedKind::Demo),
        other => Err(format!("Unknown seed: {}", other)),
    }
}
