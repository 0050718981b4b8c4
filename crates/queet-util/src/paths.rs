//! Default paths for queet
//!
//! Paths are user-writable:
//! - Config: `$XDG_CONFIG_HOME/queet/config.toml` or `~/.config/queet/config.toml`
//! - Data: `$QUEET_DATA_DIR`, `$XDG_DATA_HOME/queet` or `~/.local/share/queet`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const QUEET_DATA_DIR_ENV: &str = "QUEET_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "queet";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "queet.db";

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("/tmp").join(APP_DIR).join("config.toml")
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$QUEET_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/queet` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/queet` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(QUEET_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking QUEET_DATA_DIR.
/// Used for config defaults where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
