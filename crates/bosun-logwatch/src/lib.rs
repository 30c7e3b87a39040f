//! Incremental tailing of the game client's rotated netlogs.
//!
//! The game appends to `netlog.*.log` files and starts a new one every
//! session. [`LogTailer`] remembers how far into each file it has read,
//! picks up only newly appended complete lines, and runs every line
//! through a short rule pipeline that recognises:
//!
//! - **star-system arrivals** (`System:<id>(<name>...`)
//! - **docking permission** (`Dock Permission Received on`)
//! - **commander identity** (`FindBestIsland` lines)
//!
//! # Modules
//!
//! - [`position`] -- per-file byte offsets with a bounded history.
//! - [`rules`] -- the ordered line-matching rules.
//! - [`state`] -- player state derived from the log.
//! - [`tailer`] -- the [`LogTailer`] itself.
//!
//! Nothing in this crate is async or thread-aware; callers serialize
//! access to a [`LogTailer`] themselves.

pub mod error;
pub mod position;
pub mod rules;
pub mod state;
pub mod tailer;

pub use error::LogWatchError;
pub use position::LogPosition;
pub use rules::{LineMatch, LineRules};
pub use state::{PlayerState, StarSystem};
pub use tailer::{LogEvent, LogTailer, TailerConfig};
