//! Field-level coercion of stored records
//!
//! Records may have been written by older versions or edited by hand. A
//! record that is a JSON object is repaired field by field:
//! - numbers: missing, negative or non-numeric values become 0
//! - timestamps: missing or unparsable values become `now`
//! - collections: missing or mistyped values become empty; malformed items are dropped
//!
//! Anything that is not a JSON object yields `None`.

use chrono::{DateTime, Local};
use queet_api::{
    Achievement, AchievementKind, Language, LocalSettings, LocalUser, ProgressData, Trigger,
    TriggerKind, MAX_INTENSITY, MIN_INTENSITY,
};
use queet_util::{AchievementId, TriggerId, parse_date_key, parse_timestamp};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Default intensity for a trigger stored without one
const DEFAULT_INTENSITY: u8 = 5;

/// Build a fully typed progress record from a stored JSON value
pub fn progress_from_value(value: &Value, now: DateTime<Local>) -> Option<ProgressData> {
    let obj = value.as_object()?;

    let last_reset_date = timestamp(obj, "lastResetDate", now);
    let mut progress = ProgressData {
        start_date: timestamp(obj, "startDate", now),
        current_streak: count(obj.get("currentStreak")),
        longest_streak: count(obj.get("longestStreak")),
        total_days: count(obj.get("totalDays")),
        last_reset_date,
        last_advance_date: timestamp(obj, "lastAdvanceDate", last_reset_date),
        smoking_hits: count(obj.get("smokingHits")),
        daily_hits: count(obj.get("dailyHits")),
        last_hit_date: timestamp(obj, "lastHitDate", now),
        weed_purchases: count(obj.get("weedPurchases")),
        total_money_spent: money(obj.get("totalMoneySpent")),
        last_purchase_date: timestamp(obj, "lastPurchaseDate", now),
        daily_history: history(obj.get("dailyHistory")),
        triggers: list(obj.get("triggers"), |item| trigger(item, now)),
        achievements: list(obj.get("achievements"), |item| achievement(item, now)),
    };

    let duplicates = progress.dedupe_achievements();
    if duplicates > 0 {
        debug!(duplicates, "Dropped duplicate achievements while reading");
    }
    progress.normalize();

    Some(progress)
}

/// Build a settings record, using defaults for anything missing
pub fn settings_from_value(value: &Value) -> Option<LocalSettings> {
    let obj = value.as_object()?;
    let defaults = LocalSettings::default();

    Some(LocalSettings {
        notifications: obj
            .get("notifications")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.notifications),
        dark_mode: obj
            .get("darkMode")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.dark_mode),
        language: obj
            .get("language")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Language>().ok())
            .unwrap_or(defaults.language),
    })
}

/// Build a user record; the user has no safe defaults, so any missing
/// field rejects the record
pub fn user_from_value(value: &Value) -> Option<LocalUser> {
    serde_json::from_value(value.clone()).ok()
}

fn count(value: Option<&Value>) -> u32 {
    let Some(Value::Number(n)) = value else {
        return 0;
    };

    if let Some(v) = n.as_u64() {
        return u32::try_from(v).unwrap_or(u32::MAX);
    }

    match n.as_f64() {
        Some(v) if v.is_finite() && v > 0.0 => v.floor().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn money(value: Option<&Value>) -> f64 {
    match value.and_then(Value::as_f64) {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn timestamp(obj: &Map<String, Value>, key: &str, fallback: DateTime<Local>) -> DateTime<Local> {
    obj.get(key)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or(fallback)
}

fn history(value: Option<&Value>) -> BTreeMap<chrono::NaiveDate, u32> {
    let Some(Value::Object(days)) = value else {
        return BTreeMap::new();
    };

    days.iter()
        .filter_map(|(key, hits)| {
            let day = parse_date_key(key)?;
            match hits {
                Value::Number(_) => Some((day, count(Some(hits)))),
                _ => None,
            }
        })
        .collect()
}

fn list<T>(value: Option<&Value>, parse: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(parse).collect(),
        _ => Vec::new(),
    }
}

/// Ids were historically written both as strings and as numbers
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn trigger(item: &Value, now: DateTime<Local>) -> Option<Trigger> {
    let obj = item.as_object()?;

    let id = id_string(obj.get("id"))
        .map(TriggerId::from)
        .unwrap_or_else(TriggerId::generate);

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<TriggerKind>().ok())
        .unwrap_or(TriggerKind::Other);

    let intensity = match obj.get("intensity") {
        Some(v @ Value::Number(_)) => {
            count(Some(v)).clamp(MIN_INTENSITY as u32, MAX_INTENSITY as u32) as u8
        }
        _ => DEFAULT_INTENSITY,
    };

    Some(Trigger {
        id,
        date: timestamp(obj, "date", now),
        kind,
        intensity,
        notes: obj
            .get("notes")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        handled: obj.get("handled").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn achievement(item: &Value, now: DateTime<Local>) -> Option<Achievement> {
    let obj = item.as_object()?;

    let title = obj.get("title").and_then(Value::as_str)?.trim();
    if title.is_empty() {
        return None;
    }

    let kind = match obj.get("type").and_then(Value::as_str) {
        Some("milestone") => AchievementKind::Milestone,
        Some("trigger") => AchievementKind::Trigger,
        _ => AchievementKind::Streak,
    };

    let date = timestamp(obj, "date", now);
    let id = id_string(obj.get("id"))
        .map(AchievementId::new)
        .unwrap_or_else(|| AchievementId::new(format!("achievement-{}", date.timestamp_millis())));

    Some(Achievement {
        id,
        title: title.to_string(),
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        date,
        kind,
    })
}
