//! Local user identity, settings and language preference

use chrono::{DateTime, Local};
use queet_util::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Language::Es),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

/// Mock identity created on first sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Local>,
}

impl LocalUser {
    pub fn new(email: impl Into<String>, now: DateTime<Local>) -> Self {
        Self {
            id: UserId::generate(),
            email: email.into(),
            created_at: now,
        }
    }
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSettings {
    pub notifications: bool,
    /// Stored for compatibility; no theme switching is performed
    pub dark_mode: bool,
    pub language: Language,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            dark_mode: false,
            language: Language::Es,
        }
    }
}

/// Shallow partial update of the settings record
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub language: Option<Language>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.notifications.is_none() && self.dark_mode.is_none() && self.language.is_none()
    }

    pub fn apply_to(self, settings: &mut LocalSettings) {
        if let Some(notifications) = self.notifications {
            settings.notifications = notifications;
        }
        if let Some(dark_mode) = self.dark_mode {
            settings.dark_mode = dark_mode;
        }
        if let Some(language) = self.language {
            settings.language = language;
        }
    }
}
