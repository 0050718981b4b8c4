//! Validated configuration ready for use by the tracker

use crate::schema::{RawBackupConfig, RawConfig, RawTrackerConfig};
use crate::validation::{parse_seed, parse_streak_increment};
use std::path::PathBuf;
use std::time::Duration;

/// Default seconds between auto-advance checks
pub const DEFAULT_AUTO_ADVANCE_SECS: u64 = 60 * 60;

/// Default days between backup reminders
pub const DEFAULT_BACKUP_REMINDER_DAYS: u32 = 7;

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the local database
    pub data_dir: PathBuf,

    pub tracker: TrackerPolicy,

    pub backup: BackupPolicy,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let data_dir = raw
            .tracker
            .data_dir
            .clone()
            .unwrap_or_else(queet_util::default_data_dir);

        Self {
            data_dir,
            tracker: TrackerPolicy::from_raw(raw.tracker),
            backup: BackupPolicy::from_raw(raw.backup),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: queet_util::default_data_dir(),
            tracker: TrackerPolicy::default(),
            backup: BackupPolicy::default(),
        }
    }
}

/// How far the streak moves when a streak day is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakIncrement {
    /// Add every whole day elapsed since the last advance, so days the
    /// app was not opened still count
    #[default]
    ElapsedDays,
    /// Add exactly one day per advance
    SingleDay,
}

/// State written on first use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedKind {
    #[default]
    Empty,
    /// One week into an attempt, with sample triggers and achievements
    Demo,
}

/// Rules for the progress engine and the auto-advance loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerPolicy {
    pub auto_advance_interval: Duration,
    pub streak_increment: StreakIncrement,
    pub achievement_requires_full_day: bool,
    pub seed: SeedKind,
}

impl TrackerPolicy {
    fn from_raw(raw: RawTrackerConfig) -> Self {
        let defaults = Self::default();
        Self {
            auto_advance_interval: raw
                .auto_advance_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.auto_advance_interval),
            streak_increment: raw
                .streak_increment
                .and_then(|s| parse_streak_increment(&s).ok())
                .unwrap_or(defaults.streak_increment),
            achievement_requires_full_day: raw
                .achievement_requires_full_day
                .unwrap_or(defaults.achievement_requires_full_day),
            seed: raw
                .seed
                .and_then(|s| parse_seed(&s).ok())
                .unwrap_or(defaults.seed),
        }
    }
}

impl Default for TrackerPolicy {
    fn default() -> Self {
        Self {
            auto_advance_interval: Duration::from_secs(DEFAULT_AUTO_ADVANCE_SECS),
            streak_increment: StreakIncrement::ElapsedDays,
            achievement_requires_full_day: true,
            seed: SeedKind::Empty,
        }
    }
}

/// Backup reminder cadence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPolicy {
    pub reminder_days: u32,
}

impl BackupPolicy {
    fn from_raw(raw: RawBackupConfig) -> Self {
        Self {
            reminder_days: raw.reminder_days.unwrap_or(DEFAULT_BACKUP_REMINDER_DAYS),
        }
    }
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            reminder_days: DEFAULT_BACKUP_REMINDER_DAYS,
        }
    }
}
