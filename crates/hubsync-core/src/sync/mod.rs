//! Orchestration of a full sync: classify, prepare, commit, push.
//!
//! One [`SyncEngine`] serves both entry points; [`SyncOptions`] selects the
//! mode and carries the settings that differ between calls.

mod engine;
mod guard;
mod options;

pub use engine::SyncEngine;
pub use guard::{InFlight, InFlightGuard};
pub use options::{SyncMode, SyncOptions};
