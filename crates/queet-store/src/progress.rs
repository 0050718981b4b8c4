//! Persistent store adapter for the progress snapshot

use queet_api::{ProgressData, ProgressPatch};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{KeyValueStore, StoreResult, keys, progress_from_value};

/// Reads and writes the single progress record.
///
/// Reads never hand out a partially typed record: a stored value is either
/// coerced into a complete [`ProgressData`] or treated as absent.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the stored record.
    ///
    /// A record that is not a JSON object is removed and reported as absent.
    pub fn get(&self) -> StoreResult<Option<ProgressData>> {
        let Some(raw) = self.kv.get(keys::PROGRESS)? else {
            return Ok(None);
        };

        let parsed = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|value| progress_from_value(&value, queet_util::now()));

        match parsed {
            Some(progress) => Ok(Some(progress)),
            None => {
                warn!(bytes = raw.len(), "Invalid progress data format, clearing");
                self.kv.remove(keys::PROGRESS)?;
                Ok(None)
            }
        }
    }

    /// The stored record as parsed JSON, without coercion.
    ///
    /// Returns `None` when nothing is stored or the value is not valid JSON.
    pub fn get_raw(&self) -> StoreResult<Option<Value>> {
        Ok(self
            .kv
            .get(keys::PROGRESS)?
            .and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    /// Size in bytes of the stored record
    pub fn stored_size(&self) -> StoreResult<usize> {
        Ok(self.kv.get(keys::PROGRESS)?.map(|raw| raw.len()).unwrap_or(0))
    }

    /// Write a normalized copy of `progress`.
    ///
    /// When the write fails a backup copy is attempted under a separate key
    /// and the original error is returned.
    pub fn set(&self, progress: &ProgressData) -> StoreResult<()> {
        let mut record = progress.clone();
        record.normalize();

        let json = serde_json::to_string(&record)?;
        match self.kv.set(keys::PROGRESS, &json) {
            Ok(()) => {
                debug!(
                    current_streak = record.current_streak,
                    smoking_hits = record.smoking_hits,
                    "Progress saved"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Error saving progress");
                self.write_backup(&record, &e.to_string());
                Err(e)
            }
        }
    }

    /// Shallow-merge `patch` into the stored record.
    ///
    /// Returns `None` without writing when nothing is stored.
    pub fn update(&self, patch: ProgressPatch) -> StoreResult<Option<ProgressData>> {
        let Some(mut current) = self.get()? else {
            return Ok(None);
        };

        patch.apply_to(&mut current);
        current.normalize();
        self.set(&current)?;
        Ok(Some(current))
    }

    /// Store `seed` as the initial record
    pub fn initialize(&self, seed: ProgressData) -> StoreResult<ProgressData> {
        self.set(&seed)?;
        info!(
            current_streak = seed.current_streak,
            "Progress initialized"
        );
        Ok(seed)
    }

    /// Remove the stored record
    pub fn reset(&self) -> StoreResult<()> {
        self.kv.remove(keys::PROGRESS)
    }

    /// Load the backup written by a failed save, without its metadata
    pub fn load_backup(&self) -> StoreResult<Option<ProgressData>> {
        let Some(raw) = self.kv.get(keys::PROGRESS_BACKUP)? else {
            return Ok(None);
        };

        let Ok(mut value) = serde_json::from_str::<Value>(&raw) else {
            warn!("Progress backup is not valid JSON");
            return Ok(None);
        };

        if let Some(obj) = value.as_object_mut() {
            obj.remove("_backupDate");
            obj.remove("_error");
        }

        Ok(progress_from_value(&value, queet_util::now()))
    }

    fn write_backup(&self, record: &ProgressData, reason: &str) {
        let mut value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Failed to create backup");
                return;
            }
        };

        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "_backupDate".into(),
                Value::String(queet_util::now().to_rfc3339()),
            );
            obj.insert("_error".into(), Value::String(reason.to_string()));
        }

        match self.kv.set(keys::PROGRESS_BACKUP, &value.to_string()) {
            Ok(()) => info!("Progress backup written"),
            Err(e) => error!(error = %e, "Failed to create backup"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, StoreError};
    use chrono::{Local, TimeZone};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Medium that rejects writes to selected keys
    struct FailingStore {
        inner: MemoryStore,
        failing: Mutex<HashSet<String>>,
    }

    impl FailingStore {
        fn failing_on(keys: &[&str]) -> Self {
            Self {
                inner: MemoryStore::new(),
                failing: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
            }
        }
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            if self.failing.lock().unwrap().contains(key) {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    limit: 0,
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StoreResult<()> {
            self.inner.remove(key)
        }

        fn keys(&self) -> StoreResult<Vec<String>> {
            self.inner.keys()
        }

        fn is_healthy(&self) -> bool {
            true
        }
    }

    fn sample() -> ProgressData {
        let now = Local.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        ProgressData::demo(now)
    }

    fn memory_store() -> (Arc<MemoryStore>, ProgressStore) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), ProgressStore::new(kv))
    }

    #[test]
    fn get_missing_is_absent() {
        let (_, store) = memory_store();
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn set_then_get() {
        let (_, store) = memory_store();
        let progress = sample();
        store.set(&progress).unwrap();
        assert_eq!(store.get().unwrap(), Some(progress));
    }

    #[test]
    fn corrupt_record_is_cleared() {
        let (kv, store) = memory_store();
        kv.set(keys::PROGRESS, "{not json").unwrap();

        assert!(store.get().unwrap().is_none());
        assert!(kv.get(keys::PROGRESS).unwrap().is_none());

        kv.set(keys::PROGRESS, "42").unwrap();
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn set_enforces_streak_invariant() {
        let (_, store) = memory_store();
        let mut progress = sample();
        progress.current_streak = 12;
        progress.longest_streak = 3;
        store.set(&progress).unwrap();

        assert_eq!(store.get().unwrap().unwrap().longest_streak, 12);
    }

    #[test]
    fn update_requires_existing_record() {
        let (kv, store) = memory_store();
        let patch = ProgressPatch {
            smoking_hits: Some(3),
            ..Default::default()
        };
        assert!(store.update(patch).unwrap().is_none());
        assert!(kv.get(keys::PROGRESS).unwrap().is_none());
    }

    #[test]
    fn update_merges_fields() {
        let (_, store) = memory_store();
        store.set(&sample()).unwrap();

        let updated = store
            .update(ProgressPatch {
                smoking_hits: Some(3),
                ..Default::default()
            })
            .unwrap()
            .unwrap();

        assert_eq!(updated.smoking_hits, 3);
        assert_eq!(updated.current_streak, 7);
        assert_eq!(store.get().unwrap(), Some(updated));
    }

    #[test]
    fn failed_write_leaves_backup() {
        let kv = Arc::new(FailingStore::failing_on(&[keys::PROGRESS]));
        let store = ProgressStore::new(kv.clone());
        let progress = sample();

        let result = store.set(&progress);
        assert!(matches!(result, Err(StoreError::QuotaExceeded { .. })));

        let raw: Value =
            serde_json::from_str(&kv.get(keys::PROGRESS_BACKUP).unwrap().unwrap()).unwrap();
        assert!(raw.get("_backupDate").is_some());
        assert!(raw.get("_error").is_some());

        assert_eq!(store.load_backup().unwrap(), Some(progress));
    }

    #[test]
    fn failed_backup_is_swallowed() {
        let kv = Arc::new(FailingStore::failing_on(&[keys::PROGRESS, keys::PROGRESS_BACKUP]));
        let store = ProgressStore::new(kv.clone());

        assert!(store.set(&sample()).is_err());
        assert!(kv.get(keys::PROGRESS_BACKUP).unwrap().is_none());
    }

    #[test]
    fn reset_removes_record() {
        let (_, store) = memory_store();
        store.initialize(sample()).unwrap();
        store.reset().unwrap();
        assert!(store.get().unwrap().is_none());
    }
}
