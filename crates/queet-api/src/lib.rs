//! Data model for queet
//!
//! This crate defines the records shared between the store, the engine and
//! the command line:
//! - Progress snapshot with triggers, achievements and daily history
//! - Local user, settings and language preference
//! - Export bundle and its format version

mod account;
mod bundle;
mod progress;

pub use account::*;
pub use bundle::*;
pub use progress::*;
