//! User actions fed to the engine and the events it emits

use queet_api::TriggerKind;
use queet_util::{AchievementId, TriggerId};

/// A user action (or the periodic day check) to apply to the progress
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A relapse: the streak restarts, the hit is counted
    LogRelapse,

    /// Start over from a blank attempt
    FullReset,

    AddHit,

    SubtractHit,

    /// Record a craving trigger. `kind` is free text from the user and is
    /// validated by the engine.
    AddTrigger {
        kind: String,
        intensity: u8,
        notes: String,
    },

    DeleteTrigger {
        id: TriggerId,
    },

    ReportPurchase {
        amount: f64,
    },

    ResetAchievements,

    /// Drop achievements whose title is repeated
    CleanAchievements,

    /// Confirm the streak days elapsed since the last check
    AutoAdvanceDay,
}

impl ProgressEvent {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::LogRelapse => "log_relapse",
            ProgressEvent::FullReset => "full_reset",
            ProgressEvent::AddHit => "add_hit",
            ProgressEvent::SubtractHit => "subtract_hit",
            ProgressEvent::AddTrigger { .. } => "add_trigger",
            ProgressEvent::DeleteTrigger { .. } => "delete_trigger",
            ProgressEvent::ReportPurchase { .. } => "report_purchase",
            ProgressEvent::ResetAchievements => "reset_achievements",
            ProgressEvent::CleanAchievements => "clean_achievements",
            ProgressEvent::AutoAdvanceDay => "auto_advance_day",
        }
    }
}

/// Events emitted by the progress engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    RelapseLogged {
        total_days: u32,
        hits_today: u32,
    },

    ProgressReset,

    HitAdded {
        hits_today: u32,
    },

    HitSubtracted {
        hits_today: u32,
    },

    TriggerAdded {
        id: TriggerId,
        kind: TriggerKind,
    },

    TriggerDeleted {
        id: TriggerId,
    },

    PurchaseReported {
        amount: f64,
        total_spent: f64,
    },

    AchievementsReset {
        removed: usize,
    },

    AchievementsCleaned {
        duplicates_removed: usize,
    },

    /// The streak grew by `days`
    StreakAdvanced {
        days: u32,
        current_streak: u32,
    },

    AchievementUnlocked {
        id: AchievementId,
        title: String,
        description: String,
    },
}
