//! Hit history over recent days

use chrono::{DateTime, Days, Local, NaiveDate};
use queet_api::ProgressData;
use queet_util::local_date;
use serde::Serialize;

/// Default length of the report window
pub const DEFAULT_REPORT_DAYS: u32 = 7;

/// Longest report window
pub const MAX_REPORT_DAYS: u32 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayHits {
    pub date: NaiveDate,
    pub hits: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    /// One entry per day, oldest first, ending today
    pub days: Vec<DayHits>,
    pub total_hits: u32,
    pub days_with_hits: usize,
    pub average_per_day: f64,
    /// Day with the most hits; the earliest one on ties, none when clean
    pub worst_day: Option<DayHits>,
    pub purchases: u32,
    pub money_spent: f64,
}

impl HistoryReport {
    /// Build the report for the `window` days ending on the day of `now`,
    /// clamped to `1..=MAX_REPORT_DAYS`
    pub fn build(progress: &ProgressData, now: DateTime<Local>, window: u32) -> Self {
        let window = window.clamp(1, MAX_REPORT_DAYS);
        let today = local_date(now);

        let days: Vec<DayHits> = (0..window)
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
            .map(|date| DayHits {
                date,
                hits: progress.hits_on(date),
            })
            .collect();

        let total_hits = days.iter().map(|d| d.hits).sum();
        let days_with_hits = days.iter().filter(|d| d.hits > 0).count();
        let worst_day = days
            .iter()
            .filter(|d| d.hits > 0)
            .fold(None::<DayHits>, |worst, day| match worst {
                Some(w) if w.hits >= day.hits => Some(w),
                _ => Some(*day),
            });

        Self {
            average_per_day: f64::from(total_hits) / days.len().max(1) as f64,
            days,
            total_hits,
            days_with_hits,
            worst_day,
            purchases: progress.weed_purchases,
            money_spent: progress.total_money_spent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_window_ends_today() {
        let report = HistoryReport::build(&ProgressData::empty(now()), now(), 7);
        assert_eq!(report.days.len(), 7);
        assert_eq!(report.days[0].date, day(4));
        assert_eq!(report.days[6].date, day(10));
        assert_eq!(report.total_hits, 0);
        assert_eq!(report.worst_day, None);
        assert_eq!(report.average_per_day, 0.0);
    }

    #[test]
    fn test_summary() {
        let mut progress = ProgressData::empty(now());
        for _ in 0..3 {
            progress.record_hit(now() - Duration::days(2));
        }
        progress.record_hit(now());
        progress.record_hit(now() - Duration::days(5));
        progress.record_hit(now() - Duration::days(5));
        progress.record_hit(now());
        progress.record_hit(now());
        // Outside the window
        progress.record_hit(now() - Duration::days(30));
        progress.total_money_spent = 20.0;

        let report = HistoryReport::build(&progress, now(), 7);
        assert_eq!(report.total_hits, 8);
        assert_eq!(report.days_with_hits, 3);
        assert_eq!(report.worst_day, Some(DayHits { date: day(8), hits: 3 }));
        assert!((report.average_per_day - 8.0 / 7.0).abs() < 1e-9);
        assert_eq!(report.money_spent, 20.0);
    }

    #[test]
    fn test_zero_window_is_one_day() {
        let mut progress = ProgressData::empty(now());
        progress.record_hit(now());
        let report = HistoryReport::build(&progress, now(), 0);
        assert_eq!(report.days, vec![DayHits { date: day(10), hits: 1 }]);
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let report = HistoryReport::build(&ProgressData::empty(now()), now(), u32::MAX);
        assert_eq!(report.days.len(), MAX_REPORT_DAYS as usize);
        assert_eq!(report.days.last().map(|d| d.date), Some(day(10)));
    }
}
