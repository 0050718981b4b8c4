//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    #[serde(default)]
    pub tracker: RawTrackerConfig,

    #[serde(default)]
    pub backup: RawBackupConfig,
}

/// Tracker settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTrackerConfig {
    /// Directory holding the local database
    pub data_dir: Option<PathBuf>,

    /// Seconds between auto-advance checks in `watch` mode (default: 3600)
    pub auto_advance_interval_seconds: Option<u64>,

    /// "elapsed_days" (default) or "single_day"
    pub streak_increment: Option<String>,

    /// Only award milestones once a full day has passed since the last relapse
    pub achievement_requires_full_day: Option<bool>,

    /// First-run state: "empty" (default) or "demo"
    pub seed: Option<String>,
}

/// Backup reminder settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawBackupConfig {
    /// Days without an export before a reminder is shown (default: 7)
    pub reminder_days: Option<u32>,
}
