//! Progress engine: state transitions for every user action

use chrono::{DateTime, Duration, Local};
use queet_api::{Language, MAX_INTENSITY, MIN_INTENSITY, ProgressData, Trigger, TriggerKind};
use queet_config::{StreakIncrement, TrackerPolicy};
use queet_util::{TriggerId, whole_days_between};
use thiserror::Error;
use tracing::{debug, info};

use crate::{AchievementEvaluator, CoreEvent, ProgressEvent};

/// Rejected actions. The snapshot is never modified when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("No hits to subtract")]
    NoHitsToSubtract,

    #[error("Trigger type is required")]
    MissingTriggerKind,

    #[error("Unknown trigger type '{0}'")]
    UnknownTriggerKind(String),

    #[error("Intensity {0} must be between 1 and 10")]
    IntensityOutOfRange(u8),

    #[error("Purchase amount must be a positive number, got {0}")]
    InvalidPurchaseAmount(f64),
}

/// Next snapshot and what happened on the way there
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub progress: ProgressData,
    pub events: Vec<CoreEvent>,
}

impl Transition {
    fn unchanged(progress: &ProgressData) -> Self {
        Self {
            progress: progress.clone(),
            events: Vec::new(),
        }
    }

    /// True when applying the event had no effect
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

/// Computes transitions; holds no progress state of its own
#[derive(Debug, Clone)]
pub struct ProgressEngine {
    policy: TrackerPolicy,
    evaluator: AchievementEvaluator,
}

impl ProgressEngine {
    pub fn new(policy: TrackerPolicy) -> Self {
        let evaluator = AchievementEvaluator::new(policy.achievement_requires_full_day);
        Self { policy, evaluator }
    }

    pub fn policy(&self) -> &TrackerPolicy {
        &self.policy
    }

    /// Apply `event` to `current` at `now`.
    ///
    /// New achievement texts use `language`.
    pub fn apply(
        &self,
        current: &ProgressData,
        event: &ProgressEvent,
        now: DateTime<Local>,
        language: Language,
    ) -> Result<Transition, EngineError> {
        let mut next = current.clone();
        let mut events = Vec::new();

        match event {
            ProgressEvent::LogRelapse => {
                next.current_streak = 0;
                next.total_days = whole_days_between(next.start_date, now);
                let hits_today = next.record_hit(now);
                next.last_reset_date = now;
                next.last_advance_date = now;

                info!(
                    longest_streak = next.longest_streak,
                    total_days = next.total_days,
                    "Relapse logged, streak restarted"
                );
                events.push(CoreEvent::RelapseLogged {
                    total_days: next.total_days,
                    hits_today,
                });
            }

            ProgressEvent::FullReset => {
                next = ProgressData {
                    weed_purchases: current.weed_purchases,
                    total_money_spent: current.total_money_spent,
                    last_purchase_date: current.last_purchase_date,
                    ..ProgressData::empty(now)
                };

                info!("Progress reset");
                events.push(CoreEvent::ProgressReset);
            }

            ProgressEvent::AddHit => {
                let hits_today = next.record_hit(now);
                debug!(hits_today, smoking_hits = next.smoking_hits, "Hit added");
                events.push(CoreEvent::HitAdded { hits_today });
            }

            ProgressEvent::SubtractHit => {
                if next.smoking_hits == 0 {
                    return Err(EngineError::NoHitsToSubtract);
                }
                let hits_today = next.retract_hit(now);
                debug!(hits_today, smoking_hits = next.smoking_hits, "Hit subtracted");
                events.push(CoreEvent::HitSubtracted { hits_today });
            }

            ProgressEvent::AddTrigger {
                kind,
                intensity,
                notes,
            } => {
                let trigger = new_trigger(kind, *intensity, notes, now)?;
                debug!(id = %trigger.id, kind = %trigger.kind, "Trigger added");
                events.push(CoreEvent::TriggerAdded {
                    id: trigger.id.clone(),
                    kind: trigger.kind,
                });
                next.triggers.push(trigger);
            }

            ProgressEvent::DeleteTrigger { id } => {
                let before = next.triggers.len();
                next.triggers.retain(|t| &t.id != id);
                if next.triggers.len() == before {
                    debug!(%id, "No trigger with this id");
                    return Ok(Transition::unchanged(current));
                }

                debug!(%id, "Trigger deleted");
                events.push(CoreEvent::TriggerDeleted { id: id.clone() });
            }

            ProgressEvent::ReportPurchase { amount } => {
                let amount = *amount;
                if !amount.is_finite() || amount <= 0.0 {
                    return Err(EngineError::InvalidPurchaseAmount(amount));
                }
                next.weed_purchases = next.weed_purchases.saturating_add(1);
                next.total_money_spent += amount;
                next.last_purchase_date = now;

                events.push(CoreEvent::PurchaseReported {
                    amount,
                    total_spent: next.total_money_spent,
                });
            }

            ProgressEvent::ResetAchievements => {
                let removed = next.achievements.len();
                next.achievements.clear();
                info!(removed, "Achievements reset");
                events.push(CoreEvent::AchievementsReset { removed });
            }

            ProgressEvent::CleanAchievements => {
                let duplicates_removed = next.dedupe_achievements();
                info!(duplicates_removed, "Achievements cleaned");
                events.push(CoreEvent::AchievementsCleaned { duplicates_removed });
            }

            ProgressEvent::AutoAdvanceDay => {
                let elapsed = whole_days_between(next.last_advance_date, now);
                if elapsed < 1 || next.hits_today(now) > 0 {
                    debug!(elapsed, "Streak not advanced");
                    return Ok(Transition::unchanged(current));
                }

                let days = match self.policy.streak_increment {
                    StreakIncrement::ElapsedDays => elapsed,
                    StreakIncrement::SingleDay => 1,
                };
                next.current_streak = next.current_streak.saturating_add(days);
                next.total_days = whole_days_between(next.start_date, now);
                // Keep the partial day so the next check still sees it
                next.last_advance_date += Duration::days(i64::from(elapsed));

                info!(
                    days,
                    current_streak = next.current_streak,
                    "Streak advanced"
                );
                events.push(CoreEvent::StreakAdvanced {
                    days,
                    current_streak: next.current_streak,
                });
            }
        }

        next.sync_daily_hits(now);
        next.longest_streak = next.longest_streak.max(next.current_streak);

        if next.current_streak != current.current_streak {
            for achievement in self.evaluator.evaluate(&mut next, now, language) {
                events.push(CoreEvent::AchievementUnlocked {
                    id: achievement.id,
                    title: achievement.title,
                    description: achievement.description,
                });
            }
        }

        Ok(Transition {
            progress: next,
            events,
        })
    }
}

fn new_trigger(
    kind: &str,
    intensity: u8,
    notes: &str,
    now: DateTime<Local>,
) -> Result<Trigger, EngineError> {
    if kind.trim().is_empty() {
        return Err(EngineError::MissingTriggerKind);
    }
    let kind = kind
        .parse::<TriggerKind>()
        .map_err(EngineError::UnknownTriggerKind)?;

    if !(MIN_INTENSITY..=MAX_INTENSITY).contains(&intensity) {
        return Err(EngineError::IntensityOutOfRange(intensity));
    }

    Ok(Trigger {
        id: TriggerId::generate(),
        date: now,
        kind,
        intensity,
        notes: notes.trim().to_string(),
        handled: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use queet_api::{Achievement, AchievementKind};
    use queet_util::AchievementId;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn engine() -> ProgressEngine {
        ProgressEngine::new(TrackerPolicy::default())
    }

    fn apply(progress: &ProgressData, event: ProgressEvent) -> Transition {
        engine().apply(progress, &event, now(), Language::Es).unwrap()
    }

    fn sample() -> ProgressData {
        let mut progress = ProgressData::demo(now());
        progress.smoking_hits = 4;
        progress.weed_purchases = 2;
        progress.total_money_spent = 35.5;
        progress.record_hit(now() - Duration::days(3));
        progress
    }

    #[test]
    fn test_relapse_restarts_streak() {
        let mut progress = sample();
        for _ in 0..3 {
            progress = apply(&progress, ProgressEvent::LogRelapse).progress;
            assert_eq!(progress.current_streak, 0);
        }

        assert_eq!(progress.longest_streak, 7);
        assert_eq!(progress.total_days, 7);
        assert_eq!(progress.daily_hits, 3);
        assert_eq!(progress.last_reset_date, now());
        assert_eq!(progress.last_advance_date, now());
        assert_eq!(progress.triggers, sample().triggers);
        assert_eq!(progress.achievements, sample().achievements);
    }

    #[test]
    fn test_full_reset() {
        let transition = apply(&sample(), ProgressEvent::FullReset);
        let progress = transition.progress;

        assert_eq!(progress.current_streak, 0);
        assert_eq!(progress.longest_streak, 0);
        assert_eq!(progress.total_days, 0);
        assert_eq!(progress.smoking_hits, 0);
        assert_eq!(progress.daily_hits, 0);
        assert!(progress.triggers.is_empty());
        assert!(progress.achievements.is_empty());
        assert!(progress.daily_history.is_empty());
        assert_eq!(progress.start_date, now());
        assert_eq!(progress.last_reset_date, now());

        // Spending history survives a reset
        assert_eq!(progress.weed_purchases, 2);
        assert_eq!(progress.total_money_spent, 35.5);
        assert_eq!(transition.events, vec![CoreEvent::ProgressReset]);
    }

    #[test]
    fn test_add_hit_same_day() {
        let mut progress = ProgressData::empty(now());
        progress.last_hit_date = now() - Duration::days(1);
        progress.daily_history.insert(
            queet_util::local_date(now() - Duration::days(1)),
            5,
        );

        let first = apply(&progress, ProgressEvent::AddHit).progress;
        assert_eq!(first.daily_hits, 1);
        assert_eq!(first.smoking_hits, 1);

        let second = apply(&first, ProgressEvent::AddHit).progress;
        assert_eq!(second.daily_hits, 2);
        assert_eq!(second.smoking_hits, 2);
        assert_eq!(second.hits_today(now()), 2);
        assert_eq!(second.last_hit_date, now());
    }

    #[test]
    fn test_subtract_hit_never_negative() {
        let progress = ProgressData::empty(now());
        let result = engine().apply(&progress, &ProgressEvent::SubtractHit, now(), Language::Es);
        assert_eq!(result, Err(EngineError::NoHitsToSubtract));

        // Lifetime hits from earlier days, none today
        let mut progress = ProgressData::empty(now());
        progress.smoking_hits = 2;
        let mut state = progress;
        for _ in 0..5 {
            if let Ok(t) = engine().apply(&state, &ProgressEvent::SubtractHit, now(), Language::Es) {
                state = t.progress;
            }
        }
        assert_eq!(state.smoking_hits, 0);
        assert_eq!(state.daily_hits, 0);
    }

    #[test]
    fn test_subtract_hit_updates_today() {
        let mut progress = ProgressData::empty(now());
        progress.record_hit(now());
        progress.record_hit(now());

        let progress = apply(&progress, ProgressEvent::SubtractHit).progress;
        assert_eq!(progress.smoking_hits, 1);
        assert_eq!(progress.daily_hits, 1);
        assert_eq!(progress.hits_today(now()), 1);
    }

    #[test]
    fn test_trigger_add_then_delete() {
        let progress = sample();
        let added = apply(
            &progress,
            ProgressEvent::AddTrigger {
                kind: "stress".into(),
                intensity: 7,
                notes: "work".into(),
            },
        );
        assert_eq!(added.progress.triggers.len(), progress.triggers.len() + 1);

        let trigger = added.progress.triggers.last().unwrap().clone();
        assert_eq!(trigger.kind, TriggerKind::Stress);
        assert_eq!(trigger.intensity, 7);
        assert_eq!(trigger.notes, "work");
        assert!(!trigger.handled);
        assert_eq!(trigger.date, now());

        let deleted = apply(&added.progress, ProgressEvent::DeleteTrigger { id: trigger.id });
        assert_eq!(deleted.progress.triggers, progress.triggers);
    }

    #[test]
    fn test_delete_unknown_trigger_is_noop() {
        let progress = sample();
        let transition = apply(
            &progress,
            ProgressEvent::DeleteTrigger {
                id: TriggerId::new("missing"),
            },
        );
        assert!(transition.is_noop());
        assert_eq!(transition.progress, progress);
    }

    #[test]
    fn test_trigger_validation() {
        let progress = sample();
        let add = |kind: &str, intensity| ProgressEvent::AddTrigger {
            kind: kind.into(),
            intensity,
            notes: String::new(),
        };
        let attempt = |event| engine().apply(&progress, &event, now(), Language::Es);

        assert_eq!(attempt(add("  ", 5)), Err(EngineError::MissingTriggerKind));
        assert_eq!(
            attempt(add("gaming", 5)),
            Err(EngineError::UnknownTriggerKind("gaming".into()))
        );
        assert_eq!(attempt(add("stress", 0)), Err(EngineError::IntensityOutOfRange(0)));
        assert_eq!(attempt(add("stress", 11)), Err(EngineError::IntensityOutOfRange(11)));
        assert!(attempt(add("Social", 10)).is_ok());
    }

    #[test]
    fn test_purchase() {
        let progress = sample();
        let transition = apply(&progress, ProgressEvent::ReportPurchase { amount: 12.5 });
        assert_eq!(transition.progress.weed_purchases, 3);
        assert_eq!(transition.progress.total_money_spent, 48.0);
        assert_eq!(transition.progress.last_purchase_date, now());

        for amount in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                engine().apply(&progress, &ProgressEvent::ReportPurchase { amount }, now(), Language::Es),
                Err(EngineError::InvalidPurchaseAmount(_))
            ));
        }
    }

    #[test]
    fn test_reset_and_clean_achievements() {
        let mut progress = sample();
        progress.achievements.push(progress.achievements[0].clone());

        let cleaned = apply(&progress, ProgressEvent::CleanAchievements);
        assert_eq!(cleaned.progress.achievements.len(), 2);
        assert_eq!(
            cleaned.events,
            vec![CoreEvent::AchievementsCleaned {
                duplicates_removed: 1
            }]
        );

        let reset = apply(&cleaned.progress, ProgressEvent::ResetAchievements);
        assert!(reset.progress.achievements.is_empty());
        assert_eq!(reset.progress.current_streak, 7);
    }

    fn six_day_streak() -> ProgressData {
        let start = now() - Duration::days(6) - Duration::hours(1);
        let mut progress = ProgressData::empty(start);
        progress.current_streak = 6;
        progress.longest_streak = 6;
        progress.last_reset_date = now() - Duration::days(1) - Duration::hours(1);
        progress.last_advance_date = progress.last_reset_date;
        progress.achievements.push(Achievement {
            id: AchievementId::new("1"),
            title: "Primer día".into(),
            description: String::new(),
            date: start,
            kind: AchievementKind::Streak,
        });
        progress
    }

    #[test]
    fn test_auto_advance_reaches_one_week() {
        let transition = apply(&six_day_streak(), ProgressEvent::AutoAdvanceDay);
        let progress = &transition.progress;

        assert_eq!(progress.current_streak, 7);
        assert_eq!(progress.longest_streak, 7);
        assert_eq!(progress.total_days, 6);
        assert_eq!(
            progress
                .achievements
                .iter()
                .filter(|a| a.title == "Una semana")
                .count(),
            1
        );
        assert!(matches!(
            transition.events.as_slice(),
            [
                CoreEvent::StreakAdvanced {
                    days: 1,
                    current_streak: 7
                },
                CoreEvent::AchievementUnlocked { .. }
            ]
        ));

        // Same day again: nothing left to advance
        let again = apply(progress, ProgressEvent::AutoAdvanceDay);
        assert!(again.is_noop());
        assert_eq!(again.progress.achievements.len(), 2);
    }

    #[test]
    fn test_auto_advance_keeps_partial_day() {
        let progress = six_day_streak();
        let transition = apply(&progress, ProgressEvent::AutoAdvanceDay);
        assert_eq!(
            transition.progress.last_advance_date,
            progress.last_advance_date + Duration::days(1)
        );
        assert_eq!(transition.progress.last_reset_date, progress.last_reset_date);
    }

    #[test]
    fn test_auto_advance_increment_policy() {
        let mut progress = six_day_streak();
        progress.last_advance_date = now() - Duration::days(3);

        let elapsed = apply(&progress, ProgressEvent::AutoAdvanceDay);
        assert_eq!(elapsed.progress.current_streak, 9);

        let single = ProgressEngine::new(TrackerPolicy {
            streak_increment: StreakIncrement::SingleDay,
            ..TrackerPolicy::default()
        })
        .apply(&progress, &ProgressEvent::AutoAdvanceDay, now(), Language::Es)
        .unwrap();
        assert_eq!(single.progress.current_streak, 7);
        assert_eq!(single.progress.last_advance_date, now());
    }

    #[test]
    fn test_auto_advance_blocked_by_hit_today() {
        let mut progress = six_day_streak();
        progress.record_hit(now() - Duration::hours(2));

        let transition = apply(&progress, ProgressEvent::AutoAdvanceDay);
        assert!(transition.is_noop());
        assert_eq!(transition.progress, progress);
    }

    #[test]
    fn test_auto_advance_before_full_day() {
        let mut progress = six_day_streak();
        progress.last_advance_date = now() - Duration::hours(23);

        assert!(apply(&progress, ProgressEvent::AutoAdvanceDay).is_noop());
    }

    #[test]
    fn test_english_milestone_titles() {
        let transition = engine()
            .apply(&six_day_streak(), &ProgressEvent::AutoAdvanceDay, now(), Language::En)
            .unwrap();
        assert!(transition.progress.has_achievement("One week"));
    }

    #[test]
    fn test_longest_streak_never_decreases() {
        let events = [
            ProgressEvent::AutoAdvanceDay,
            ProgressEvent::AddHit,
            ProgressEvent::LogRelapse,
            ProgressEvent::SubtractHit,
            ProgressEvent::ResetAchievements,
            ProgressEvent::ReportPurchase { amount: 5.0 },
            ProgressEvent::CleanAchievements,
            ProgressEvent::LogRelapse,
        ];

        let mut progress = six_day_streak();
        let mut longest = progress.longest_streak;
        let mut at = now();
        for event in events {
            at += Duration::days(2);
            if let Ok(t) = engine().apply(&progress, &event, at, Language::Es) {
                progress = t.progress;
            }
            assert!(progress.longest_streak >= longest);
            assert!(progress.current_streak <= progress.longest_streak);
            longest = progress.longest_streak;
        }
        assert_eq!(longest, 9);
    }

    #[test]
    fn test_titles_stay_unique() {
        let mut progress = six_day_streak();
        let mut at = now();
        for _ in 0..40 {
            at += Duration::days(1);
            progress = engine()
                .apply(&progress, &ProgressEvent::AutoAdvanceDay, at, Language::Es)
                .unwrap()
                .progress;
        }

        let mut titles: Vec<_> = progress.achievements.iter().map(|a| a.title.clone()).collect();
        let count = titles.len();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), count);
        assert_eq!(count, 3);
    }
}
