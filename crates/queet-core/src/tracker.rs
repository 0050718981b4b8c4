//! Owner of the current progress snapshot

use chrono::{DateTime, Local};
use queet_api::{Language, ProgressData};
use queet_config::SeedKind;
use queet_store::{ProgressStore, StoreResult};
use tracing::{debug, error, info, warn};

use crate::{CoreEvent, Message, Notice, ProgressEngine, ProgressEvent};

/// Result of dispatching one action
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub events: Vec<CoreEvent>,
    pub notices: Vec<Notice>,
    /// Whether the current snapshot is saved in storage
    pub persisted: bool,
}

impl Outcome {
    /// The action was rejected and nothing changed
    pub fn is_rejected(&self) -> bool {
        self.events.is_empty() && self.notices.iter().any(Notice::is_error)
    }
}

/// Holds the single progress snapshot and routes every change through the
/// engine and then to storage.
///
/// Callers only get read access to the snapshot; [`Tracker::dispatch`] is
/// the way to change it.
pub struct Tracker {
    engine: ProgressEngine,
    store: ProgressStore,
    progress: ProgressData,
    language: Language,
    degraded: bool,
    /// The stored record has not been read yet; writing now would replace
    /// it with a seed
    unread: bool,
}

impl Tracker {
    /// Load the stored snapshot, seeding and saving one on first use.
    ///
    /// If storage cannot be read or written the tracker starts degraded,
    /// keeping the seeded snapshot in memory only. A stored record that could
    /// not be read is never overwritten; reading is retried before each action.
    pub fn load(
        engine: ProgressEngine,
        store: ProgressStore,
        language: Language,
        now: DateTime<Local>,
    ) -> Self {
        let seed = engine.policy().seed;
        let (progress, degraded, unread) = match read_or_seed(&store, seed, now) {
            Ok((progress, saved)) => (progress, !saved, false),
            Err(e) => {
                warn!(error = %e, "Progress storage unavailable, using temporary data");
                (seeded(seed, now), true, true)
            }
        };

        Self {
            engine,
            store,
            progress,
            language,
            degraded,
            unread,
        }
    }

    /// Re-read the stored snapshot, picking up changes written by other
    /// processes since it was loaded.
    ///
    /// Returns false and keeps the current snapshot when storage can't be read.
    pub fn reload(&mut self, now: DateTime<Local>) -> bool {
        match read_or_seed(&self.store, self.engine.policy().seed, now) {
            Ok((progress, saved)) => {
                if self.unread {
                    info!("Progress storage readable again");
                }
                debug!(current_streak = progress.current_streak, "Progress reloaded");
                self.progress = progress;
                self.degraded = !saved;
                self.unread = false;
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not reload progress, keeping current snapshot");
                false
            }
        }
    }

    /// The current snapshot as last saved
    pub fn progress(&self) -> &ProgressData {
        &self.progress
    }

    /// The current snapshot with `daily_hits` counted for the day of `now`
    pub fn snapshot(&self, now: DateTime<Local>) -> ProgressData {
        let mut progress = self.progress.clone();
        progress.sync_daily_hits(now);
        progress
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// True while changes live only in memory
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Apply a user action and save the result
    pub fn dispatch(&mut self, event: ProgressEvent, now: DateTime<Local>) -> Outcome {
        if self.unread {
            self.reload(now);
        }

        let transition = match self
            .engine
            .apply(&self.progress, &event, now, self.language)
        {
            Ok(transition) => transition,
            Err(e) => {
                warn!(event = event.name(), error = %e, "Action rejected");
                return Outcome {
                    events: Vec::new(),
                    notices: vec![Notice::for_error(&e, self.language)],
                    persisted: !self.degraded,
                };
            }
        };

        if transition.is_noop() {
            return Outcome {
                events: Vec::new(),
                notices: Vec::new(),
                persisted: !self.degraded,
            };
        }

        self.progress = transition.progress;
        let persisted = self.persist();

        let mut notices: Vec<Notice> = transition
            .events
            .iter()
            .map(|e| Notice::for_event(e, self.language))
            .collect();
        if !persisted {
            notices.push(Notice::for_message(Message::StorageDegraded, self.language));
        }

        Outcome {
            events: transition.events,
            notices,
            persisted,
        }
    }

    /// Run the periodic streak check
    pub fn auto_advance(&mut self, now: DateTime<Local>) -> Outcome {
        self.dispatch(ProgressEvent::AutoAdvanceDay, now)
    }

    /// Adopt a snapshot that was written to storage directly, as after an
    /// import or repair
    pub fn replace(&mut self, progress: ProgressData) {
        info!(current_streak = progress.current_streak, "Progress replaced");
        self.progress = progress;
    }

    fn persist(&mut self) -> bool {
        if self.unread {
            warn!("Stored progress not read yet, keeping changes in memory");
            self.degraded = true;
            return false;
        }

        match self.store.set(&self.progress) {
            Ok(()) => {
                if self.degraded {
                    info!("Progress storage recovered");
                }
                self.degraded = false;
                true
            }
            Err(e) => {
                error!(error = %e, "Progress not saved, continuing in memory");
                self.degraded = true;
                false
            }
        }
    }
}

/// The stored snapshot, or a fresh seed when nothing is stored. The flag
/// tells whether the result is saved.
fn read_or_seed(
    store: &ProgressStore,
    seed: SeedKind,
    now: DateTime<Local>,
) -> StoreResult<(ProgressData, bool)> {
    match store.get()? {
        Some(mut progress) => {
            let duplicates = progress.dedupe_achievements();
            if duplicates > 0 {
                info!(duplicates, "Dropped duplicate achievements on load");
            }
            debug!(current_streak = progress.current_streak, "Progress loaded");
            Ok((progress, true))
        }
        None => {
            let progress = seeded(seed, now);
            match store.initialize(progress.clone()) {
                Ok(progress) => Ok((progress, true)),
                Err(e) => {
                    error!(error = %e, "Could not save initial progress");
                    Ok((progress, false))
                }
            }
        }
    }
}

fn seeded(seed: SeedKind, now: DateTime<Local>) -> ProgressData {
    match seed {
        SeedKind::Empty => ProgressData::empty(now),
        SeedKind::Demo => ProgressData::demo(now),
    }
}
