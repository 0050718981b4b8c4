//! Short localized messages shown to the user after an action

use queet_api::Language;
use std::fmt;

use crate::{CoreEvent, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A user-facing status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Outcomes reported outside the progress engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Exported,
    ExportFailed,
    Imported,
    ImportFailed,
    LanguageChanged(Language),
    NotificationsToggled(bool),
    SignedIn,
    SignedOut,
    AccountDeleted,
    Repaired,
    BackupDue,
    /// Progress could not be saved; the session continues in memory
    StorageDegraded,
    /// Storage could not be opened at startup
    StorageUnavailable,
}

fn pick(language: Language, es: &str, en: &str) -> String {
    match language {
        Language::Es => es.to_string(),
        Language::En => en.to_string(),
    }
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Confirmation for an engine event
    pub fn for_event(event: &CoreEvent, language: Language) -> Self {
        let l = language;
        match event {
            CoreEvent::RelapseLogged { .. } => Self::success(pick(
                l,
                "Incidente registrado - Streak reiniciado",
                "Incident logged - streak restarted",
            )),
            CoreEvent::ProgressReset => {
                Self::success(pick(l, "Progreso reiniciado", "Progress reset"))
            }
            CoreEvent::HitAdded { .. } => Self::success(pick(l, "Hit registrado", "Hit logged")),
            CoreEvent::HitSubtracted { .. } => {
                Self::success(pick(l, "Fumada restada", "Hit removed"))
            }
            CoreEvent::TriggerAdded { .. } => {
                Self::success(pick(l, "Trigger registrado", "Trigger logged"))
            }
            CoreEvent::TriggerDeleted { .. } => {
                Self::success(pick(l, "Trigger eliminado", "Trigger deleted"))
            }
            CoreEvent::PurchaseReported { amount, .. } => Self::success(match l {
                Language::Es => format!("Compra registrada: {:.2}", amount),
                Language::En => format!("Purchase logged: {:.2}", amount),
            }),
            CoreEvent::AchievementsReset { .. } => {
                Self::success(pick(l, "Logros reiniciados", "Achievements reset"))
            }
            CoreEvent::AchievementsCleaned {
                duplicates_removed: 0,
            } => Self::success(pick(
                l,
                "No hay logros duplicados para limpiar",
                "No duplicate achievements to clean",
            )),
            CoreEvent::AchievementsCleaned { duplicates_removed } => Self::success(match l {
                Language::Es => format!(
                    "Logros limpiados: {} duplicados eliminados",
                    duplicates_removed
                ),
                Language::En => format!(
                    "Achievements cleaned: {} duplicates removed",
                    duplicates_removed
                ),
            }),
            CoreEvent::StreakAdvanced { current_streak, .. } => Self::success(match l {
                Language::Es => format!("Racha actual: {} días", current_streak),
                Language::En => format!("Current streak: {} days", current_streak),
            }),
            CoreEvent::AchievementUnlocked {
                title, description, ..
            } => Self::success(format!("🎉 {}: {}", title, description)),
        }
    }

    /// Explanation for a rejected action
    pub fn for_error(error: &EngineError, language: Language) -> Self {
        let l = language;
        Self::error(match error {
            EngineError::NoHitsToSubtract => {
                pick(l, "No hay fumadas para restar", "There are no hits to subtract")
            }
            EngineError::MissingTriggerKind => {
                pick(l, "Selecciona un tipo de trigger", "Choose a trigger type")
            }
            EngineError::UnknownTriggerKind(kind) => match l {
                Language::Es => format!("Tipo de trigger desconocido: {}", kind),
                Language::En => format!("Unknown trigger type: {}", kind),
            },
            EngineError::IntensityOutOfRange(_) => pick(
                l,
                "La intensidad debe estar entre 1 y 10",
                "Intensity must be between 1 and 10",
            ),
            EngineError::InvalidPurchaseAmount(_) => pick(
                l,
                "El importe debe ser un número positivo",
                "The amount must be a positive number",
            ),
        })
    }

    pub fn for_message(message: Message, language: Language) -> Self {
        let l = language;
        match message {
            Message::Exported => {
                Self::success(pick(l, "Datos exportados exitosamente", "Data exported"))
            }
            Message::ExportFailed => {
                Self::error(pick(l, "Error al exportar datos", "Could not export data"))
            }
            Message::Imported => {
                Self::success(pick(l, "Datos importados exitosamente", "Data imported"))
            }
            Message::ImportFailed => {
                Self::error(pick(l, "Error al importar datos", "Could not import data"))
            }
            Message::LanguageChanged(Language::Es) => {
                Self::success(pick(l, "Idioma cambiado a Español", "Language set to Español"))
            }
            Message::LanguageChanged(Language::En) => {
                Self::success(pick(l, "Idioma cambiado a English", "Language set to English"))
            }
            Message::NotificationsToggled(true) => Self::success(pick(
                l,
                "Notificaciones activadas",
                "Notifications enabled",
            )),
            Message::NotificationsToggled(false) => Self::success(pick(
                l,
                "Notificaciones desactivadas",
                "Notifications disabled",
            )),
            Message::SignedIn => Self::success(pick(l, "¡Bienvenido de vuelta!", "Welcome back!")),
            Message::SignedOut => Self::success(pick(l, "Sesión cerrada", "Signed out")),
            Message::AccountDeleted => Self::success(pick(l, "Cuenta eliminada", "Account deleted")),
            Message::Repaired => Self::success(pick(l, "Datos reparados", "Data repaired")),
            Message::BackupDue => Self::warning(pick(
                l,
                "Hace tiempo que no exportas tus datos",
                "It has been a while since your last export",
            )),
            Message::StorageDegraded => Self::warning(pick(
                l,
                "No se pudo guardar el progreso; los cambios se perderán al salir",
                "Progress could not be saved; changes will be lost on exit",
            )),
            Message::StorageUnavailable => Self::warning(pick(
                l,
                "Almacenamiento no disponible; usando datos temporales",
                "Storage unavailable; using temporary data",
            )),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
