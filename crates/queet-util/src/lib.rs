//! Shared utilities for queet
//!
//! This crate provides:
//! - ID types (TriggerId, AchievementId, UserId)
//! - Time utilities (mock-able clock, calendar-day arithmetic)
//! - Default paths for config and data directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
