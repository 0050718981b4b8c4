//! Command handling on top of the tracker and the data manager

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use queet_api::SettingsPatch;
use queet_config::Config;
use queet_core::{HistoryReport, Message, Notice, Outcome, ProgressEngine, ProgressEvent, Tracker};
use queet_store::{DataManager, KeyValueStore, MemoryStore, RepairOutcome, SqliteStore};
use queet_util::{DATABASE_FILENAME, TriggerId};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, warn};

use crate::render;
use crate::{AchievementsCommand, Command, SettingsCommand, TriggerCommand};

/// Application root: owns the tracker and every store
pub struct App {
    config: Config,
    data: DataManager,
    tracker: Tracker,
    startup_notices: Vec<Notice>,
}

impl App {
    /// Open storage under the configured data directory and load progress.
    ///
    /// When the database cannot be opened the session runs on an in-memory
    /// store and a warning is queued.
    pub fn open(config: Config, now: DateTime<Local>) -> Self {
        let (kv, persistent) = open_store(&config);
        Self::with_store(config, kv, persistent, now)
    }

    fn with_store(
        config: Config,
        kv: Arc<dyn KeyValueStore>,
        persistent: bool,
        now: DateTime<Local>,
    ) -> Self {
        let data = DataManager::new(kv);
        let language = data.language().get();
        let engine = ProgressEngine::new(config.tracker.clone());
        let tracker = Tracker::load(engine, data.progress().clone(), language, now);

        let mut startup_notices = Vec::new();
        if !persistent || tracker.is_degraded() {
            startup_notices.push(Notice::for_message(Message::StorageUnavailable, language));
        }

        Self {
            config,
            data,
            tracker,
            startup_notices,
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<ExitCode> {
        render::notices(&std::mem::take(&mut self.startup_notices));
        let now = queet_util::now();

        match command {
            Command::Status { json } => self.status(now, json)?,
            Command::Relapse => return Ok(self.dispatch(ProgressEvent::LogRelapse, now)),
            Command::Reset { yes } => {
                if !yes {
                    bail!("Resetting erases your streak, hits, triggers and achievements; pass --yes to confirm");
                }
                return Ok(self.dispatch(ProgressEvent::FullReset, now));
            }
            Command::Hit => return Ok(self.dispatch(ProgressEvent::AddHit, now)),
            Command::Unhit => return Ok(self.dispatch(ProgressEvent::SubtractHit, now)),
            Command::Trigger(cmd) => return self.trigger(cmd, now),
            Command::Purchase { amount } => {
                return Ok(self.dispatch(ProgressEvent::ReportPurchase { amount }, now));
            }
            Command::Achievements(cmd) => return Ok(self.achievements(cmd, now)),
            Command::Report { days, json } => {
                let report = HistoryReport::build(self.tracker.progress(), now, days);
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    render::report(&report);
                }
            }
            Command::Export { out } => return self.export(out, now),
            Command::Import { file } => return self.import(file),
            Command::Repair => self.repair(now)?,
            Command::Validate => return self.validate(now),
            Command::Login { email } => self.login(&email, now)?,
            Command::Logout => {
                self.data.users().clear()?;
                self.notice(Message::SignedOut);
            }
            Command::Settings(cmd) => self.settings(cmd)?,
            Command::DeleteAccount { yes } => {
                if !yes {
                    bail!("Deleting the account erases all stored data; pass --yes to confirm");
                }
                self.data.complete_reset()?;
                self.notice(Message::AccountDeleted);
            }
            Command::Watch => self.watch().await?,
        }

        Ok(ExitCode::SUCCESS)
    }

    fn dispatch(&mut self, event: ProgressEvent, now: DateTime<Local>) -> ExitCode {
        let outcome = self.tracker.dispatch(event, now);
        self.report_outcome(&outcome)
    }

    fn report_outcome(&self, outcome: &Outcome) -> ExitCode {
        render::notices(&outcome.notices);
        if outcome.is_rejected() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    fn notice(&self, message: Message) {
        render::notices(&[Notice::for_message(message, self.tracker.language())]);
    }

    fn status(&self, now: DateTime<Local>, json: bool) -> Result<()> {
        let snapshot = self.tracker.snapshot(now);
        if json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            return Ok(());
        }

        render::status(&snapshot, now);
        if self
            .data
            .backup_due(now, self.config.backup.reminder_days)?
        {
            self.notice(Message::BackupDue);
        }
        Ok(())
    }

    fn trigger(&mut self, cmd: TriggerCommand, now: DateTime<Local>) -> Result<ExitCode> {
        let event = match cmd {
            TriggerCommand::Add {
                kind,
                intensity,
                notes,
            } => ProgressEvent::AddTrigger {
                kind,
                intensity,
                notes,
            },
            TriggerCommand::Delete { id } => ProgressEvent::DeleteTrigger {
                id: TriggerId::from(id),
            },
            TriggerCommand::List => {
                render::triggers(&self.tracker.progress().triggers);
                return Ok(ExitCode::SUCCESS);
            }
        };

        let outcome = self.tracker.dispatch(event, now);
        if outcome.events.is_empty() && !outcome.is_rejected() {
            warn!("No trigger with that id");
        }
        Ok(self.report_outcome(&outcome))
    }

    fn achievements(&mut self, cmd: AchievementsCommand, now: DateTime<Local>) -> ExitCode {
        let event = match cmd {
            AchievementsCommand::Reset => ProgressEvent::ResetAchievements,
            AchievementsCommand::Clean => ProgressEvent::CleanAchievements,
            AchievementsCommand::List => {
                render::achievements(&self.tracker.progress().achievements);
                return ExitCode::SUCCESS;
            }
        };
        self.dispatch(event, now)
    }

    fn export(&self, out: Option<std::path::PathBuf>, now: DateTime<Local>) -> Result<ExitCode> {
        let json = match self.data.export(now) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Export failed");
                self.notice(Message::ExportFailed);
                return Ok(ExitCode::FAILURE);
            }
        };

        match out {
            Some(path) => {
                std::fs::write(&path, &json)
                    .with_context(|| format!("Failed to write export to {:?}", path))?;
                info!(path = %path.display(), "Export written");
                self.notice(Message::Exported);
            }
            None => println!("{}", json),
        }

        self.data.mark_backup(now)?;
        Ok(ExitCode::SUCCESS)
    }

    fn import(&mut self, file: std::path::PathBuf) -> Result<ExitCode> {
        let json = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {:?}", file))?;

        let summary = match self.data.import(&json) {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Import failed");
                self.notice(Message::ImportFailed);
                return Ok(ExitCode::FAILURE);
            }
        };

        if summary.progress
            && let Some(progress) = self.data.progress().get()?
        {
            self.tracker.replace(progress);
        }
        if summary.language {
            self.tracker.set_language(self.data.language().get());
        }

        debug!(?summary, "Import applied");
        self.notice(Message::Imported);
        Ok(ExitCode::SUCCESS)
    }

    fn repair(&mut self, now: DateTime<Local>) -> Result<()> {
        let outcome = self.data.repair(now)?;
        if let Some(progress) = self.data.progress().get()? {
            self.tracker.replace(progress);
        }

        match outcome {
            RepairOutcome::RestoredFromBackup => println!("Progress restored from backup"),
            RepairOutcome::Initialized => println!("No progress found; started fresh"),
            RepairOutcome::Synced {
                daily_hits,
                duplicates_removed,
            } => println!(
                "Hits today: {}, duplicate achievements removed: {}",
                daily_hits, duplicates_removed
            ),
        }
        self.notice(Message::Repaired);
        Ok(())
    }

    fn validate(&self, now: DateTime<Local>) -> Result<ExitCode> {
        let report = self.data.validate(now)?;
        let stats = self.data.stats()?;
        render::validation(&report, &stats, self.data.check_integrity());

        Ok(if report.is_valid() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    fn login(&self, email: &str, now: DateTime<Local>) -> Result<()> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            bail!("'{}' is not an email address", email);
        }

        match self.data.users().get()? {
            Some(user) if user.email == email => {
                debug!(user_id = %user.id, "Existing profile");
            }
            _ => {
                self.data.users().create_mock_user(email, now)?;
            }
        }

        self.notice(Message::SignedIn);
        Ok(())
    }

    fn settings(&mut self, cmd: SettingsCommand) -> Result<()> {
        match cmd {
            SettingsCommand::Show => {
                render::settings(&self.data.settings().get(), self.data.users().get()?.as_ref());
            }
            SettingsCommand::Set {
                notifications,
                dark_mode,
                language,
            } => {
                let patch = SettingsPatch {
                    notifications,
                    dark_mode,
                    language,
                };
                if patch.is_empty() {
                    bail!("Nothing to change; pass --notifications, --dark-mode or --language");
                }

                self.data.settings().update(patch)?;
                if let Some(language) = language {
                    self.data.language().set(language)?;
                    self.tracker.set_language(language);
                    self.notice(Message::LanguageChanged(language));
                }
                if let Some(enabled) = notifications {
                    self.notice(Message::NotificationsToggled(enabled));
                }
            }
        }
        Ok(())
    }

    /// Check the streak now and then once per configured interval until
    /// interrupted
    async fn watch(&mut self) -> Result<()> {
        let period = self.config.tracker.auto_advance_interval.max(Duration::from_secs(1));
        let mut timer = tokio::time::interval(period);

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        info!(interval_secs = period.as_secs(), "Watching streak");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, stopping");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, stopping");
                    break;
                }
                _ = timer.tick() => {
                    // Other commands write to the same store while this loop runs
                    let now = queet_util::now();
                    self.tracker.reload(now);
                    let outcome = self.tracker.auto_advance(now);
                    if self.data.settings().get().notifications {
                        render::notices(&outcome.notices);
                    } else if !outcome.persisted {
                        warn!("Progress could not be saved");
                    }
                }
            }
        }

        Ok(())
    }
}

fn open_store(config: &Config) -> (Arc<dyn KeyValueStore>, bool) {
    let db_path = config.data_dir.join(DATABASE_FILENAME);

    let opened = std::fs::create_dir_all(&config.data_dir)
        .map_err(queet_store::StoreError::from)
        .and_then(|()| SqliteStore::open(&db_path));

    match opened {
        Ok(store) => {
            debug!(db_path = %db_path.display(), "Store opened");
            (Arc::new(store), true)
        }
        Err(e) => {
            warn!(
                db_path = %db_path.display(),
                error = %e,
                "Could not open database, using temporary storage"
            );
            (Arc::new(MemoryStore::new()), false)
        }
    }
}
