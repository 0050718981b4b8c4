//! Streak milestone evaluation

use chrono::{DateTime, Local};
use queet_api::{Achievement, AchievementKind, Language, ProgressData};
use queet_util::{AchievementId, whole_days_between};
use tracing::info;

/// A streak length worth celebrating, with its localized texts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub days: u32,
    title_es: &'static str,
    title_en: &'static str,
    description_es: &'static str,
    description_en: &'static str,
}

/// Milestones in ascending order
pub const MILESTONES: [Milestone; 3] = [
    Milestone {
        days: 1,
        title_es: "Primer día",
        title_en: "First day",
        description_es: "¡Completaste tu primer día sin fumar!",
        description_en: "You completed your first day without smoking!",
    },
    Milestone {
        days: 7,
        title_es: "Una semana",
        title_en: "One week",
        description_es: "¡Una semana completa sin fumar!",
        description_en: "A full week without smoking!",
    },
    Milestone {
        days: 30,
        title_es: "Un mes",
        title_en: "One month",
        description_es: "¡Un mes completo sin fumar!",
        description_en: "A whole month without smoking!",
    },
];

impl Milestone {
    pub fn title(&self, language: Language) -> &'static str {
        match language {
            Language::Es => self.title_es,
            Language::En => self.title_en,
        }
    }

    pub fn description(&self, language: Language) -> &'static str {
        match language {
            Language::Es => self.description_es,
            Language::En => self.description_en,
        }
    }

    /// Whether `progress` already holds this milestone under either title
    pub fn is_earned(&self, progress: &ProgressData) -> bool {
        progress.has_achievement(self.title_es) || progress.has_achievement(self.title_en)
    }

    fn achievement(&self, now: DateTime<Local>, language: Language) -> Achievement {
        Achievement {
            id: AchievementId::for_milestone(now, self.days),
            title: self.title(language).to_string(),
            description: self.description(language).to_string(),
            date: now,
            kind: AchievementKind::Streak,
        }
    }
}

/// Decides which milestones a snapshot has newly reached
#[derive(Debug, Clone, Copy)]
pub struct AchievementEvaluator {
    requires_full_day: bool,
}

impl AchievementEvaluator {
    /// With `requires_full_day`, nothing is awarded until a whole day has
    /// passed since the last relapse or reset
    pub fn new(requires_full_day: bool) -> Self {
        Self { requires_full_day }
    }

    /// Milestones `progress` qualifies for but does not hold yet
    pub fn pending(&self, progress: &ProgressData, now: DateTime<Local>) -> Vec<Milestone> {
        if self.requires_full_day && whole_days_between(progress.last_reset_date, now) < 1 {
            return Vec::new();
        }

        MILESTONES
            .into_iter()
            .filter(|m| progress.current_streak >= m.days && !m.is_earned(progress))
            .collect()
    }

    /// Append every pending milestone to `progress`, returning the new records.
    ///
    /// Running it again on the result adds nothing.
    pub fn evaluate(
        &self,
        progress: &mut ProgressData,
        now: DateTime<Local>,
        language: Language,
    ) -> Vec<Achievement> {
        let unlocked: Vec<Achievement> = self
            .pending(progress, now)
            .iter()
            .map(|m| m.achievement(now, language))
            .collect();

        for achievement in &unlocked {
            info!(
                id = %achievement.id,
                title = %achievement.title,
                current_streak = progress.current_streak,
                "Achievement unlocked"
            );
        }

        progress.achievements.extend(unlocked.iter().cloned());
        unlocked
    }
}

impl Default for AchievementEvaluator {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn progress_with_streak(streak: u32, days_since_reset: i64) -> ProgressData {
        let mut progress = ProgressData::empty(now() - Duration::days(days_since_reset));
        progress.current_streak = streak;
        progress.longest_streak = streak;
        progress
    }

    #[test]
    fn test_first_day() {
        let evaluator = AchievementEvaluator::default();
        let mut progress = progress_with_streak(1, 1);

        let unlocked = evaluator.evaluate(&mut progress, now(), Language::Es);
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].title, "Primer día");
        assert_eq!(unlocked[0].kind, AchievementKind::Streak);
        assert_eq!(unlocked[0].date, now());
        assert_eq!(
            unlocked[0].id.as_str(),
            format!("achievement-{}-1", now().timestamp_millis())
        );
        assert!(progress.has_achievement("Primer día"));
    }

    #[test]
    fn test_skipped_thresholds_are_caught_up_in_order() {
        let evaluator = AchievementEvaluator::default();
        let mut progress = progress_with_streak(31, 31);

        let titles: Vec<_> = evaluator
            .evaluate(&mut progress, now(), Language::En)
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["First day", "One week", "One month"]);
    }

    #[test]
    fn test_idempotent() {
        let evaluator = AchievementEvaluator::default();
        let mut progress = progress_with_streak(8, 8);

        assert_eq!(evaluator.evaluate(&mut progress, now(), Language::Es).len(), 2);
        let snapshot = progress.clone();
        assert!(evaluator.evaluate(&mut progress, now(), Language::Es).is_empty());
        assert_eq!(progress, snapshot);
    }

    #[test]
    fn test_other_language_title_counts_as_earned() {
        let evaluator = AchievementEvaluator::default();
        let mut progress = progress_with_streak(1, 1);
        evaluator.evaluate(&mut progress, now(), Language::Es);

        assert!(evaluator.evaluate(&mut progress, now(), Language::En).is_empty());
    }

    #[test]
    fn test_full_day_gate() {
        let evaluator = AchievementEvaluator::default();
        let mut progress = progress_with_streak(3, 0);
        progress.last_reset_date = now() - Duration::hours(23);

        assert!(evaluator.evaluate(&mut progress, now(), Language::Es).is_empty());

        let ungated = AchievementEvaluator::new(false);
        assert_eq!(ungated.evaluate(&mut progress, now(), Language::Es).len(), 1);
    }

    #[test]
    fn test_zero_streak_earns_nothing() {
        let evaluator = AchievementEvaluator::default();
        let mut progress = progress_with_streak(0, 5);
        assert!(evaluator.evaluate(&mut progress, now(), Language::Es).is_empty());
    }
}
