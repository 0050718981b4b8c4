//! Export bundle: every persisted namespace in one document

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{Language, LocalSettings, LocalUser, ProgressData};

/// Format version written by this build
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

/// Portable copy of all local data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub progress: Option<ProgressData>,
    pub user: Option<LocalUser>,
    pub settings: LocalSettings,
    pub language: Language,
    pub export_date: DateTime<Local>,
    pub version: String,
}

impl ExportBundle {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Whether a bundle written with `version` can be imported.
///
/// Any `1.x.y` bundle is accepted.
pub fn is_supported_export_version(version: &str) -> bool {
    version.split('.').next() == Some("1")
}
