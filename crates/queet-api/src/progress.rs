//! Progress snapshot and its nested records

use chrono::{DateTime, Duration, Local, NaiveDate};
use queet_util::{AchievementId, TriggerId, local_date};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted trigger intensity
pub const MIN_INTENSITY: u8 = 1;

/// Highest accepted trigger intensity
pub const MAX_INTENSITY: u8 = 10;

/// Complete progress state of the single local user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    /// Beginning of the current attempt
    pub start_date: DateTime<Local>,

    /// Consecutive days without a logged relapse
    pub current_streak: u32,

    /// Historical maximum of `current_streak`
    pub longest_streak: u32,

    /// Whole days elapsed since `start_date`
    pub total_days: u32,

    /// Last relapse or full reset
    pub last_reset_date: DateTime<Local>,

    /// Last instant the streak was advanced up to; never earlier than
    /// `last_reset_date`
    pub last_advance_date: DateTime<Local>,

    /// Lifetime count of logged hits
    pub smoking_hits: u32,

    /// Hits on the day of `last_hit_date`, mirrored from `daily_history`
    pub daily_hits: u32,

    pub last_hit_date: DateTime<Local>,

    pub weed_purchases: u32,

    pub total_money_spent: f64,

    pub last_purchase_date: DateTime<Local>,

    /// Hit count per calendar day (`YYYY-MM-DD`)
    pub daily_history: BTreeMap<NaiveDate, u32>,

    /// Logged triggers in chronological order
    pub triggers: Vec<Trigger>,

    /// Earned achievements, unique by title
    pub achievements: Vec<Achievement>,
}

impl ProgressData {
    /// Fresh state for a first-time user
    pub fn empty(now: DateTime<Local>) -> Self {
        Self {
            start_date: now,
            current_streak: 0,
            longest_streak: 0,
            total_days: 0,
            last_reset_date: now,
            last_advance_date: now,
            smoking_hits: 0,
            daily_hits: 0,
            last_hit_date: now,
            weed_purchases: 0,
            total_money_spent: 0.0,
            last_purchase_date: now,
            daily_history: BTreeMap::new(),
            triggers: Vec::new(),
            achievements: Vec::new(),
        }
    }

    /// Seeded state for a user one week into an attempt
    pub fn demo(now: DateTime<Local>) -> Self {
        let start = now - Duration::days(7);
        let mut progress = Self::empty(now);
        progress.start_date = start;
        progress.current_streak = 7;
        progress.longest_streak = 7;
        progress.total_days = 7;
        progress.last_reset_date = start;
        progress.triggers = vec![
            Trigger {
                id: TriggerId::new("1"),
                date: now - Duration::days(2),
                kind: TriggerKind::Stress,
                intensity: 7,
                notes: "Trabajo estresante".into(),
                handled: true,
            },
            Trigger {
                id: TriggerId::new("2"),
                date: now - Duration::days(1),
                kind: TriggerKind::Boredom,
                intensity: 4,
                notes: "Aburrido en casa".into(),
                handled: false,
            },
        ];
        progress.achievements = vec![
            Achievement {
                id: AchievementId::new("1"),
                title: "Primer día".into(),
                description: "¡Completaste tu primer día sin fumar!".into(),
                date: now - Duration::days(6),
                kind: AchievementKind::Streak,
            },
            Achievement {
                id: AchievementId::new("2"),
                title: "Una semana".into(),
                description: "¡Una semana completa sin fumar!".into(),
                date: now,
                kind: AchievementKind::Streak,
            },
        ];
        progress
    }

    /// Hits recorded for a calendar day
    pub fn hits_on(&self, date: NaiveDate) -> u32 {
        self.daily_history.get(&date).copied().unwrap_or(0)
    }

    /// Hits recorded on the calendar day of `now`
    pub fn hits_today(&self, now: DateTime<Local>) -> u32 {
        self.hits_on(local_date(now))
    }

    /// Record one hit at `now`, returning today's new count
    pub fn record_hit(&mut self, now: DateTime<Local>) -> u32 {
        let entry = self.daily_history.entry(local_date(now)).or_insert(0);
        *entry = entry.saturating_add(1);
        let today = *entry;
        self.smoking_hits = self.smoking_hits.saturating_add(1);
        self.daily_hits = today;
        self.last_hit_date = now;
        today
    }

    /// Remove one hit from today's count, returning the new count
    pub fn retract_hit(&mut self, now: DateTime<Local>) -> u32 {
        self.smoking_hits = self.smoking_hits.saturating_sub(1);
        let today = match self.daily_history.get_mut(&local_date(now)) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        self.daily_hits = today;
        today
    }

    /// Re-derive `daily_hits` from the history entry of `now`'s day
    pub fn sync_daily_hits(&mut self, now: DateTime<Local>) {
        self.daily_hits = self.hits_today(now);
    }

    /// Whether an achievement with this title was already earned
    pub fn has_achievement(&self, title: &str) -> bool {
        self.achievements.iter().any(|a| a.title == title)
    }

    /// Drop achievements whose title was already seen, keeping the first.
    /// Returns the number of records removed.
    pub fn dedupe_achievements(&mut self) -> usize {
        let before = self.achievements.len();
        let mut seen = HashSet::new();
        self.achievements.retain(|a| seen.insert(a.title.clone()));
        before - self.achievements.len()
    }

    /// Enforce the record invariants before a write
    pub fn normalize(&mut self) {
        self.longest_streak = self.longest_streak.max(self.current_streak);
        if !self.total_money_spent.is_finite() || self.total_money_spent < 0.0 {
            self.total_money_spent = 0.0;
        }
        if self.last_advance_date < self.last_reset_date {
            self.last_advance_date = self.last_reset_date;
        }
        for trigger in &mut self.triggers {
            trigger.intensity = trigger.intensity.clamp(MIN_INTENSITY, MAX_INTENSITY);
        }
        self.dedupe_achievements();
    }

    /// Find a trigger by id
    pub fn trigger(&self, id: &TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|t| &t.id == id)
    }
}

/// A logged craving trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub date: DateTime<Local>,
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    /// 1 (mild) to 10 (overwhelming)
    pub intensity: u8,
    pub notes: String,
    pub handled: bool,
}

/// Trigger categories offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Stress,
    Boredom,
    Social,
    Emotional,
    Habit,
    Other,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 6] = [
        TriggerKind::Stress,
        TriggerKind::Boredom,
        TriggerKind::Social,
        TriggerKind::Emotional,
        TriggerKind::Habit,
        TriggerKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Stress => "stress",
            TriggerKind::Boredom => "boredom",
            TriggerKind::Social => "social",
            TriggerKind::Emotional => "emotional",
            TriggerKind::Habit => "habit",
            TriggerKind::Other => "other",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        TriggerKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| s.to_string())
    }
}

/// A one-time milestone notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    pub date: DateTime<Local>,
    #[serde(rename = "type")]
    pub kind: AchievementKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    Streak,
    Milestone,
    Trigger,
}

/// Shallow partial update of a progress snapshot
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    pub start_date: Option<DateTime<Local>>,
    pub current_streak: Option<u32>,
    pub longest_streak: Option<u32>,
    pub total_days: Option<u32>,
    pub last_reset_date: Option<DateTime<Local>>,
    pub last_advance_date: Option<DateTime<Local>>,
    pub smoking_hits: Option<u32>,
    pub daily_hits: Option<u32>,
    pub last_hit_date: Option<DateTime<Local>>,
    pub weed_purchases: Option<u32>,
    pub total_money_spent: Option<f64>,
    pub last_purchase_date: Option<DateTime<Local>>,
    pub daily_history: Option<BTreeMap<NaiveDate, u32>>,
    pub triggers: Option<Vec<Trigger>>,
    pub achievements: Option<Vec<Achievement>>,
}

impl ProgressPatch {
    /// Overwrite every field present in the patch
    pub fn apply_to(self, progress: &mut ProgressData) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    progress.$field = value;
                })*
            };
        }

        merge!(
            start_date,
            current_streak,
            longest_streak,
            total_days,
            last_reset_date,
            last_advance_date,
            smoking_hits,
            daily_hits,
            last_hit_date,
            weed_purchases,
            total_money_spent,
            last_purchase_date,
            daily_history,
            triggers,
            achievements,
        );
    }
}
