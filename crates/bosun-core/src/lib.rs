//! Core of the Bosun agent: everything between the log tailer and the
//! REST front end.
//!
//! # Modules
//!
//! - [`aggregator`] -- [`StateAggregator`], which drives the
//!   [`LogTailer`](bosun_logwatch::LogTailer) on a fixed cadence, turns
//!   its events into [`Notice`]s and fires the change signal.
//! - [`config`] -- `bosun-config.yaml` loading into typed structs.
//! - [`directory`] -- the [`SystemDirectory`] seam and the EDDB client.
//! - [`resolver`] -- [`IdentifierResolver`], the name to id cache with
//!   its skip-on-contention lock policy.
//! - [`signal`] -- [`ChangeSignal`], a broadcast-and-rearm wake-up.
//!
//! [`StateAggregator`]: aggregator::StateAggregator
//! [`Notice`]: aggregator::Notice
//! [`SystemDirectory`]: directory::SystemDirectory
//! [`IdentifierResolver`]: resolver::IdentifierResolver
//! [`ChangeSignal`]: signal::ChangeSignal

pub mod aggregator;
pub mod config;
pub mod directory;
pub mod resolver;
pub mod signal;

pub use aggregator::{AggregatorError, Notice, NoticeEvent, StateAggregator};
pub use config::{BosunConfig, ConfigError, DuplicateMatch};
pub use directory::{DirectoryEntry, DirectoryError, EddbDirectory, SystemDirectory};
pub use resolver::{IdentifierResolver, ResolvedSystem};
pub use signal::ChangeSignal;
