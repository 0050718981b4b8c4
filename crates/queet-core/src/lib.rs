//! Progress engine and tracker for queet
//!
//! This crate is the heart of queet, containing:
//! - The progress engine: pure transitions from a snapshot and a user action
//!   to the next snapshot
//! - Streak milestone evaluation
//! - The tracker owning the current snapshot and its persistence
//! - Localized notices and the hit history report

mod achievements;
mod engine;
mod events;
mod notice;
mod report;
mod tracker;

pub use achievements::*;
pub use engine::*;
pub use events::*;
pub use notice::*;
pub use report::*;
pub use tracker::*;
