//! Integration tests for queet
//!
//! These tests drive the tracker and the data manager over an on-disk
//! store, the way the command line does.

use chrono::{DateTime, Duration, Local, TimeZone};
use queet_api::{Language, LocalSettings, ProgressData};
use queet_config::{SeedKind, StreakIncrement, parse_config};
use queet_core::{CoreEvent, HistoryReport, ProgressEngine, ProgressEvent, Tracker};
use queet_store::{DataManager, SqliteStore, keys};
use queet_util::DATABASE_FILENAME;
use std::path::Path;
use std::sync::Arc;

fn start() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

fn open_data(dir: &Path) -> DataManager {
    let store = SqliteStore::open(dir.join(DATABASE_FILENAME)).unwrap();
    DataManager::new(Arc::new(store))
}

fn open_tracker(data: &DataManager, config: &str, now: DateTime<Local>) -> Tracker {
    let config = parse_config(config).unwrap();
    let engine = ProgressEngine::new(config.tracker);
    Tracker::load(engine, data.progress().clone(), data.language().get(), now)
}

const DEFAULT_CONFIG: &str = "config_version = 1\n";

#[test]
fn test_config_drives_engine_policy() {
    let config = parse_config(
        r#"
config_version = 1

[tracker]
streak_increment = "single_day"
achievement_requires_full_day = false
seed = "demo"
auto_advance_interval_seconds = 60

[backup]
reminder_days = 3
"#,
    )
    .unwrap();

    assert_eq!(config.tracker.streak_increment, StreakIncrement::SingleDay);
    assert_eq!(config.tracker.seed, SeedKind::Demo);
    assert_eq!(config.backup.reminder_days, 3);

    let dir = tempfile::tempdir().unwrap();
    let data = open_data(dir.path());
    let tracker = Tracker::load(
        ProgressEngine::new(config.tracker),
        data.progress().clone(),
        Language::Es,
        start(),
    );
    assert_eq!(tracker.progress().current_streak, 7);
}

#[test]
fn test_progress_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let data = open_data(dir.path());
        let mut tracker = open_tracker(&data, DEFAULT_CONFIG, start());
        tracker.dispatch(ProgressEvent::AddHit, start());
        tracker.dispatch(
            ProgressEvent::AddTrigger {
                kind: "social".into(),
                intensity: 6,
                notes: "party".into(),
            },
            start(),
        );
        tracker.dispatch(ProgressEvent::ReportPurchase { amount: 20.0 }, start());
    }

    let data = open_data(dir.path());
    let tracker = open_tracker(&data, DEFAULT_CONFIG, start() + Duration::hours(1));
    let progress = tracker.progress();
    assert_eq!(progress.smoking_hits, 1);
    assert_eq!(progress.triggers.len(), 1);
    assert_eq!(progress.triggers[0].notes, "party");
    assert_eq!(progress.total_money_spent, 20.0);
}

#[test]
fn test_month_of_daily_checks() {
    let dir = tempfile::tempdir().unwrap();
    let data = open_data(dir.path());
    let mut tracker = open_tracker(&data, DEFAULT_CONFIG, start());

    let mut unlocked = Vec::new();
    for day in 1..=31 {
        let outcome = tracker.auto_advance(start() + Duration::days(day) + Duration::minutes(1));
        assert!(outcome.persisted);
        for event in outcome.events {
            if let CoreEvent::AchievementUnlocked { title, .. } = event {
                unlocked.push(title);
            }
        }
    }

    assert_eq!(unlocked, vec!["Primer día", "Una semana", "Un mes"]);
    let stored = data.progress().get().unwrap().unwrap();
    assert_eq!(stored.current_streak, 31);
    assert_eq!(stored.longest_streak, 31);
}

#[test]
fn test_missed_days_are_counted_on_next_check() {
    let dir = tempfile::tempdir().unwrap();
    let data = open_data(dir.path());
    let mut tracker = open_tracker(&data, DEFAULT_CONFIG, start());

    let outcome = tracker.auto_advance(start() + Duration::days(8) + Duration::hours(2));
    assert!(matches!(
        outcome.events[0],
        CoreEvent::StreakAdvanced {
            days: 8,
            current_streak: 8
        }
    ));
    assert!(tracker.progress().has_achievement("Una semana"));
}

#[test]
fn test_relapse_then_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let data = open_data(dir.path());
    let mut tracker = open_tracker(&data, DEFAULT_CONFIG, start());

    tracker.auto_advance(start() + Duration::days(3));
    assert_eq!(tracker.progress().current_streak, 3);

    let relapse_at = start() + Duration::days(3) + Duration::hours(5);
    tracker.dispatch(ProgressEvent::LogRelapse, relapse_at);
    assert_eq!(tracker.progress().current_streak, 0);
    assert_eq!(tracker.progress().longest_streak, 3);

    // Less than a day since the relapse
    assert!(tracker.auto_advance(relapse_at + Duration::hours(2)).events.is_empty());

    tracker.auto_advance(relapse_at + Duration::days(1));
    assert_eq!(tracker.progress().current_streak, 1);
    assert_eq!(tracker.progress().longest_streak, 3);
}

#[test]
fn test_watch_keeps_relapse_logged_by_another_command() {
    let dir = tempfile::tempdir().unwrap();
    let watch_data = open_data(dir.path());
    let mut watcher = open_tracker(&watch_data, DEFAULT_CONFIG, start());
    watcher.auto_advance(start() + Duration::days(3));
    assert_eq!(watcher.progress().current_streak, 3);

    // A separate `queet relapse` run against the same database
    let relapse_at = start() + Duration::days(4);
    {
        let cli_data = open_data(dir.path());
        let mut cli = open_tracker(&cli_data, DEFAULT_CONFIG, relapse_at);
        cli.dispatch(ProgressEvent::LogRelapse, relapse_at);
    }

    let tick = start() + Duration::days(5) + Duration::hours(1);
    assert!(watcher.reload(tick));
    let outcome = watcher.auto_advance(tick);
    assert!(outcome.persisted);

    let stored = watch_data.progress().get().unwrap().unwrap();
    assert_eq!(stored.smoking_hits, 1);
    assert_eq!(stored.last_reset_date, relapse_at);
    assert_eq!(stored.current_streak, 1);
    assert_eq!(stored.longest_streak, 3);
    assert_eq!(watcher.progress(), &stored);
}

#[test]
fn test_export_import_between_installs() {
    let source_dir = tempfile::tempdir().unwrap();
    let source = open_data(source_dir.path());
    let mut tracker = open_tracker(&source, DEFAULT_CONFIG, start());
    tracker.dispatch(ProgressEvent::AddHit, start());
    tracker.auto_advance(start() + Duration::days(2));
    source.users().create_mock_user("me@example.com", start()).unwrap();
    source
        .settings()
        .set(&LocalSettings {
            notifications: false,
            dark_mode: false,
            language: Language::En,
        })
        .unwrap();
    source.language().set(Language::En).unwrap();

    let json = source.export(start() + Duration::days(2)).unwrap();

    let target_dir = tempfile::tempdir().unwrap();
    let target = open_data(target_dir.path());
    target.import(&json).unwrap();

    assert_eq!(target.progress().get().unwrap(), source.progress().get().unwrap());
    assert_eq!(target.users().get().unwrap(), source.users().get().unwrap());
    assert_eq!(target.settings().get(), source.settings().get());
    assert_eq!(target.language().get(), Language::En);
}

#[test]
fn test_corrupt_record_recovers_from_backup() {
    let dir = tempfile::tempdir().unwrap();
    let data = open_data(dir.path());
    let store = SqliteStore::open(dir.path().join(DATABASE_FILENAME)).unwrap();

    let progress = ProgressData::demo(start());
    let mut backup = serde_json::to_value(&progress).unwrap();
    backup["_backupDate"] = serde_json::Value::String(start().to_rfc3339());
    queet_store::KeyValueStore::set(&store, keys::PROGRESS_BACKUP, &backup.to_string()).unwrap();
    queet_store::KeyValueStore::set(&store, keys::PROGRESS, "{{{").unwrap();

    assert!(data.progress().get().unwrap().is_none());
    data.repair(start()).unwrap();
    assert_eq!(data.progress().get().unwrap(), Some(progress));
}

#[test]
fn test_delete_account_reseeds_on_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let data = open_data(dir.path());
    let mut tracker = open_tracker(&data, DEFAULT_CONFIG, start());
    tracker.dispatch(ProgressEvent::AddHit, start());
    data.users().create_mock_user("me@example.com", start()).unwrap();
    data.mark_backup(start()).unwrap();

    data.complete_reset().unwrap();
    assert!(data.users().get().unwrap().is_none());
    assert!(data.backup_due(start(), 7).unwrap());

    let later = start() + Duration::days(1);
    let tracker = open_tracker(&data, DEFAULT_CONFIG, later);
    assert_eq!(tracker.progress(), &ProgressData::empty(later));
}

#[test]
fn test_report_over_stored_history() {
    let dir = tempfile::tempdir().unwrap();
    let data = open_data(dir.path());
    let mut tracker = open_tracker(&data, DEFAULT_CONFIG, start());
    for offset in [0, 0, 1, 3] {
        tracker.dispatch(ProgressEvent::AddHit, start() + Duration::days(offset));
    }

    let now = start() + Duration::days(3);
    let report = HistoryReport::build(tracker.progress(), now, 4);
    let hits: Vec<u32> = report.days.iter().map(|d| d.hits).collect();
    assert_eq!(hits, vec![2, 1, 0, 1]);
    assert_eq!(report.total_hits, 4);
}
