//! Whole-dataset operations: export/import, reset, repair and integrity checks

use chrono::{DateTime, Local};
use queet_api::{
    EXPORT_FORMAT_VERSION, ExportBundle, Language, ProgressData, is_supported_export_version,
};
use queet_util::{date_key, is_same_day, local_date, parse_date_key};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    KeyValueStore, LanguageStore, ProgressStore, SettingsStore, StoreError, StoreResult,
    UserStore, keys, settings_from_value, user_from_value,
};

/// Which namespaces an import wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub progress: bool,
    pub user: bool,
    pub settings: bool,
    pub language: bool,
}

/// Result of [`DataManager::repair`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The record was unreadable and the last backup was restored
    RestoredFromBackup,
    /// The record was unreadable and no backup existed
    Initialized,
    /// The record was readable; daily counters re-derived from history
    Synced {
        daily_hits: u32,
        duplicates_removed: usize,
    },
}

/// Findings of [`DataManager::validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub has_progress: bool,
    pub has_user: bool,
    pub has_settings: bool,
    pub progress_size: usize,
    pub total_size: usize,
}

/// Entry point to every persisted namespace
#[derive(Clone)]
pub struct DataManager {
    kv: Arc<dyn KeyValueStore>,
    progress: ProgressStore,
    users: UserStore,
    settings: SettingsStore,
    language: LanguageStore,
}

impl DataManager {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            progress: ProgressStore::new(kv.clone()),
            users: UserStore::new(kv.clone()),
            settings: SettingsStore::new(kv.clone()),
            language: LanguageStore::new(kv.clone()),
            kv,
        }
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn language(&self) -> &LanguageStore {
        &self.language
    }

    pub fn is_healthy(&self) -> bool {
        self.kv.is_healthy()
    }

    /// Snapshot of every namespace
    pub fn export_bundle(&self, now: DateTime<Local>) -> StoreResult<ExportBundle> {
        Ok(ExportBundle {
            progress: self.progress.get()?,
            user: self.users.get()?,
            settings: self.settings.get(),
            language: self.language.get(),
            export_date: now,
            version: EXPORT_FORMAT_VERSION.to_string(),
        })
    }

    /// Pretty-printed JSON export of every namespace
    pub fn export(&self, now: DateTime<Local>) -> StoreResult<String> {
        let json = self.export_bundle(now)?.to_json_pretty()?;
        info!(bytes = json.len(), "Data exported");
        Ok(json)
    }

    /// Write every namespace present in an exported document.
    ///
    /// Nothing is written unless the document parses and carries a
    /// supported version.
    pub fn import(&self, json: &str) -> StoreResult<ImportSummary> {
        let data: Value = serde_json::from_str(json)?;
        let Some(obj) = data.as_object() else {
            return Err(StoreError::Corrupt("export is not a JSON object".into()));
        };

        if let Some(version) = obj.get("version").and_then(Value::as_str)
            && !is_supported_export_version(version)
        {
            return Err(StoreError::UnsupportedVersion(version.to_string()));
        }

        let now = queet_util::now();
        let progress = obj
            .get("progress")
            .and_then(|v| crate::progress_from_value(v, now));
        let user = obj.get("user").and_then(user_from_value);
        let settings = obj.get("settings").and_then(settings_from_value);
        let language = obj
            .get("language")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Language>().ok());

        let mut summary = ImportSummary::default();
        if let Some(progress) = &progress {
            self.progress.set(progress)?;
            summary.progress = true;
        }
        if let Some(user) = &user {
            self.users.set(user)?;
            summary.user = true;
        }
        if let Some(settings) = &settings {
            self.settings.set(settings)?;
            summary.settings = true;
        }
        if let Some(language) = language {
            self.language.set(language)?;
            summary.language = true;
        }

        info!(?summary, "Data imported");
        Ok(summary)
    }

    /// Remove the four namespaces
    pub fn clear_all(&self) -> StoreResult<()> {
        for key in [keys::PROGRESS, keys::USER, keys::SETTINGS, keys::LANGUAGE] {
            self.kv.remove(key)?;
        }
        Ok(())
    }

    /// Remove every key this application ever wrote, including backups
    pub fn complete_reset(&self) -> StoreResult<()> {
        self.clear_all()?;

        for key in self.kv.keys()? {
            if key.contains(keys::PREFIX) {
                self.kv.remove(&key)?;
            }
        }

        info!("Complete system reset performed");
        Ok(())
    }

    /// Bring the progress record back to a consistent state
    pub fn repair(&self, now: DateTime<Local>) -> StoreResult<RepairOutcome> {
        info!("Attempting to repair progress data");

        let Some(mut progress) = self.progress.get()? else {
            if let Some(backup) = self.progress.load_backup()? {
                self.progress.set(&backup)?;
                info!("Data restored from backup");
                return Ok(RepairOutcome::RestoredFromBackup);
            }

            self.progress.initialize(ProgressData::empty(now))?;
            info!("Fresh data initialized");
            return Ok(RepairOutcome::Initialized);
        };

        // Records written before history tracking carry today's count only
        // in `dailyHits`
        let today = local_date(now);
        if !progress.daily_history.contains_key(&today)
            && progress.daily_hits > 0
            && is_same_day(progress.last_hit_date, now)
        {
            progress.daily_history.insert(today, progress.daily_hits);
        }
        progress.sync_daily_hits(now);
        let duplicates_removed = progress.dedupe_achievements();

        self.progress.set(&progress)?;
        info!(
            daily_hits = progress.daily_hits,
            duplicates_removed, "Data repaired"
        );

        Ok(RepairOutcome::Synced {
            daily_hits: progress.daily_hits,
            duplicates_removed,
        })
    }

    /// List problems with the stored data without modifying it
    pub fn validate(&self, now: DateTime<Local>) -> StoreResult<ValidationReport> {
        let mut issues = Vec::new();

        match self.progress.get_raw()? {
            None => issues.push("No progress data found".to_string()),
            Some(raw) => {
                if raw.get("startDate").and_then(Value::as_str).is_none() {
                    issues.push("Missing startDate".to_string());
                }
                if !raw.get("currentStreak").is_some_and(Value::is_u64) {
                    issues.push("Invalid currentStreak".to_string());
                }
                if !raw.get("dailyHits").is_some_and(Value::is_u64) {
                    issues.push("Invalid dailyHits".to_string());
                }
                if !raw.get("dailyHistory").is_some_and(Value::is_object) {
                    issues.push("Invalid dailyHistory".to_string());
                }

                let streaks = (
                    raw.get("currentStreak").and_then(Value::as_u64),
                    raw.get("longestStreak").and_then(Value::as_u64),
                );
                if let (Some(current), Some(longest)) = streaks
                    && current > longest
                {
                    issues.push("currentStreak exceeds longestStreak".to_string());
                }

                let today = date_key(local_date(now));
                let stored_today = raw
                    .get("dailyHistory")
                    .and_then(|h| h.get(&today))
                    .and_then(Value::as_u64);
                let daily_hits = raw.get("dailyHits").and_then(Value::as_u64);
                if let Some(stored_today) = stored_today
                    && Some(stored_today) != daily_hits
                {
                    issues.push("dailyHits and dailyHistory are out of sync".to_string());
                }

                if let Some(Value::Object(history)) = raw.get("dailyHistory") {
                    let bad = history
                        .iter()
                        .filter(|(k, v)| parse_date_key(k).is_none() || !v.is_u64())
                        .count();
                    if bad > 0 {
                        issues.push(format!("{} malformed dailyHistory entries", bad));
                    }
                }
            }
        }

        if self.users.get()?.is_none() {
            issues.push("No user data found".to_string());
        }

        if !issues.is_empty() {
            warn!(issue_count = issues.len(), "Data validation found issues");
        }

        Ok(ValidationReport { issues })
    }

    /// Quick check that both progress and user exist and look sane
    pub fn check_integrity(&self) -> bool {
        let progress_ok = match self.progress.get_raw() {
            Ok(Some(raw)) => {
                raw.get("startDate").and_then(Value::as_str).is_some()
                    && raw.get("currentStreak").is_some_and(Value::is_number)
            }
            _ => false,
        };
        let user_ok = matches!(self.users.get(), Ok(Some(_)));
        progress_ok && user_ok
    }

    pub fn stats(&self) -> StoreResult<StorageStats> {
        let mut total_size = 0;
        for key in self.kv.keys()? {
            if key.starts_with(keys::PREFIX) {
                total_size += self.kv.get(&key)?.map(|v| v.len()).unwrap_or(0);
            }
        }

        Ok(StorageStats {
            has_progress: self.progress.get_raw()?.is_some(),
            has_user: self.users.get()?.is_some(),
            has_settings: self.settings.exists()?,
            progress_size: self.progress.stored_size()?,
            total_size,
        })
    }

    /// Whether `reminder_days` or more have passed since the last export
    pub fn backup_due(&self, now: DateTime<Local>, reminder_days: u32) -> StoreResult<bool> {
        let today = local_date(now);
        let last = self
            .kv
            .get(keys::LAST_BACKUP)?
            .and_then(|raw| parse_date_key(&raw));

        Ok(match last {
            None => true,
            Some(last) => (today - last).num_days() >= i64::from(reminder_days),
        })
    }

    /// Record that an export was written today
    pub fn mark_backup(&self, now: DateTime<Local>) -> StoreResult<()> {
        self.kv.set(keys::LAST_BACKUP, &date_key(local_date(now)))
    }
}
