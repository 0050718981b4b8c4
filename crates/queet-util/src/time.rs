//! Time utilities for queet
//!
//! Streak arithmetic works on two notions of "day":
//! - whole elapsed days: complete 24 hour periods between two instants
//!   (used for streak length, days since start, days since last relapse)
//! - calendar days: the local date of an instant
//!   (used for per-day hit counts and day rollover)
//!
//! # Mock Time for Development
//!
//! In debug builds, the `QUEET_MOCK_TIME` environment variable overrides the
//! system time. Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`).
//! The mocked clock keeps advancing at the real rate.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "QUEET_MOCK_TIME";

/// Storage format of calendar-day keys
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)]
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => match Local.from_local_datetime(&naive_dt).single() {
                        Some(mock_dt) => {
                            let offset = mock_dt.signed_duration_since(chrono::Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        None => {
                            tracing::warn!(
                                mock_time = %mock_time_str,
                                "Failed to convert mock time to local timezone"
                            );
                        }
                    },
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)]
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Number of complete 24 hour periods from `from` to `to`.
///
/// Returns 0 when `to` is earlier than `from` (clock moved backwards).
pub fn whole_days_between(from: DateTime<Local>, to: DateTime<Local>) -> u32 {
    let secs = to.signed_duration_since(from).num_seconds();
    if secs <= 0 {
        return 0;
    }
    u32::try_from(secs / SECONDS_PER_DAY).unwrap_or(u32::MAX)
}

/// Local calendar date of an instant
pub fn local_date(dt: DateTime<Local>) -> NaiveDate {
    dt.date_naive()
}

/// Whether two instants fall on the same local calendar day
pub fn is_same_day(a: DateTime<Local>, b: DateTime<Local>) -> bool {
    local_date(a) == local_date(b)
}

/// Format a calendar day as a storage key (`YYYY-MM-DD`)
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parse a storage key back into a calendar day
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Parse an RFC 3339 timestamp into local time.
///
/// A bare `YYYY-MM-DD` day is accepted too and read as local midnight.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    parse_date_key(s)?
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(Local)
        .earliest()
}

/// Format a timestamp for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
