//! User, settings and language records

use chrono::{DateTime, Local};
use queet_api::{Language, LocalSettings, LocalUser, SettingsPatch};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{KeyValueStore, StoreResult, keys, settings_from_value, user_from_value};

/// The local mock identity
#[derive(Clone)]
pub struct UserStore {
    kv: Arc<dyn KeyValueStore>,
}

impl UserStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn get(&self) -> StoreResult<Option<LocalUser>> {
        let Some(raw) = self.kv.get(keys::USER)? else {
            return Ok(None);
        };

        let user = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|value| user_from_value(&value));
        if user.is_none() {
            warn!("Stored user record is unreadable");
        }
        Ok(user)
    }

    pub fn set(&self, user: &LocalUser) -> StoreResult<()> {
        self.kv.set(keys::USER, &serde_json::to_string(user)?)
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.kv.remove(keys::USER)
    }

    /// Create and store a fresh local identity for `email`
    pub fn create_mock_user(&self, email: &str, now: DateTime<Local>) -> StoreResult<LocalUser> {
        let user = LocalUser::new(email.trim(), now);
        self.set(&user)?;
        info!(user_id = %user.id, "Local user created");
        Ok(user)
    }
}

/// User preferences; always readable, falling back to defaults
#[derive(Clone)]
pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Whether a settings record has been written
    pub fn exists(&self) -> StoreResult<bool> {
        Ok(self.kv.get(keys::SETTINGS)?.is_some())
    }

    pub fn get(&self) -> LocalSettings {
        let raw = match self.kv.get(keys::SETTINGS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LocalSettings::default(),
            Err(e) => {
                warn!(error = %e, "Error reading settings");
                return LocalSettings::default();
            }
        };

        serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|value| settings_from_value(&value))
            .unwrap_or_default()
    }

    pub fn set(&self, settings: &LocalSettings) -> StoreResult<()> {
        self.kv.set(keys::SETTINGS, &serde_json::to_string(settings)?)
    }

    pub fn update(&self, patch: SettingsPatch) -> StoreResult<LocalSettings> {
        let mut settings = self.get();
        patch.apply_to(&mut settings);
        self.set(&settings)?;
        debug!(language = %settings.language, "Settings updated");
        Ok(settings)
    }
}

/// Language preference, stored as a bare `es`/`en` string
#[derive(Clone)]
pub struct LanguageStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LanguageStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn get(&self) -> Language {
        match self.kv.get(keys::LANGUAGE) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => Language::default(),
            Err(e) => {
                warn!(error = %e, "Error reading language");
                Language::default()
            }
        }
    }

    pub fn set(&self, language: Language) -> StoreResult<()> {
        self.kv.set(keys::LANGUAGE, language.as_str())
    }
}
