//! The state aggregator ("first mate").
//!
//! [`StateAggregator`] owns the [`LogTailer`] and the identifier cache.
//! A background task wakes every poll interval, runs one tailer pass on
//! the blocking pool, publishes the resulting player state, and then
//! handles each event in log order:
//!
//! - commander found / docking granted are announced as-is;
//! - a system arrival is announced only if the system resolves in the
//!   directory, carrying the id and URL.
//!
//! Every handled event fires the [`ChangeSignal`], whether or not an
//! announcement went out.
//!
//! # Failure policy
//!
//! A failed pass (log folder gone, file unreadable) is logged and the
//! loop simply tries again at its next wake; there is no backoff. A
//! failed directory lookup drops the enriched announcement for that
//! arrival; it is never retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bosun_logwatch::{LogEvent, LogTailer, LogWatchError, PlayerState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::directory::DirectoryError;
use crate::resolver::{IdentifierResolver, ResolvedSystem};
use crate::signal::ChangeSignal;

/// Capacity of the notice broadcast channel.
const NOTICE_CAPACITY: usize = 64;

/// Errors from a tailer pass.
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// Reading the logs failed.
    #[error("log watch error: {source}")]
    LogWatch {
        /// The underlying tailer error.
        #[from]
        source: LogWatchError,
    },

    /// The blocking tailer task did not complete.
    #[error("tailer task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// A previous pass panicked while holding the tailer.
    #[error("tailer lock poisoned: {0}")]
    Poisoned(String),
}

/// What an announcement is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoticeEvent {
    /// The commander's name was found in the log.
    CommanderFound {
        /// Commander display name.
        name: String,
    },
    /// Docking permission was granted.
    DockingGranted,
    /// The player entered a system that resolved in the directory.
    SystemEntered(ResolvedSystem),
}

/// An announcement published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// When the aggregator handled the event.
    pub observed_at: DateTime<Utc>,
    /// The event itself.
    #[serde(flatten)]
    pub event: NoticeEvent,
}

/// Drives the tailer and publishes player state.
pub struct StateAggregator {
    tailer: Arc<Mutex<LogTailer>>,
    snapshot: RwLock<PlayerState>,
    resolver: IdentifierResolver,
    signal: ChangeSignal,
    notices: broadcast::Sender<Notice>,
    poll_interval: Duration,
    stop_requested: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StateAggregator {
    /// Create an aggregator. Nothing is read until [`refresh`](Self::refresh)
    /// or [`start`](Self::start).
    pub fn new(tailer: LogTailer, resolver: IdentifierResolver, poll_interval: Duration) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            tailer: Arc::new(Mutex::new(tailer)),
            snapshot: RwLock::new(PlayerState::default()),
            resolver,
            signal: ChangeSignal::new(),
            notices,
            poll_interval,
            stop_requested: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Spawn the background poll loop.
    ///
    /// Does nothing if a loop is already alive, apart from cancelling a
    /// pending [`stop`](Self::stop). Returns `true` if a loop was spawned.
    /// Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut task = self
            .task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.stop_requested.store(false, Ordering::Release);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }
        *task = Some(tokio::spawn(Arc::clone(self).run()));
        info!(interval_ms = self.poll_interval.as_millis(), "Log watch started");
        true
    }

    /// Ask the poll loop to exit. It leaves at its next wake.
    pub fn stop(&self) {
        let _task = self
            .task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a poll loop task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn run(self: Arc<Self>) {
        let mut failing = false;
        loop {
            tokio::time::sleep(self.poll_interval).await;
            if self.stop_requested.load(Ordering::Acquire) {
                info!("Log watch stopped");
                break;
            }
            match self.refresh().await {
                Ok(_) if failing => {
                    info!("Log watch recovered");
                    failing = false;
                }
                Ok(_) => {}
                Err(e) if failing => debug!(error = %e, "Log pass still failing"),
                Err(e) => {
                    warn!(error = %e, "Log pass failed, retrying on next wake");
                    failing = true;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Passes
    // -----------------------------------------------------------------------

    /// Run one tailer pass and handle its events.
    ///
    /// Returns the number of events handled.
    pub async fn refresh(&self) -> Result<usize, AggregatorError> {
        let tailer = Arc::clone(&self.tailer);
        let (events, state) = tokio::task::spawn_blocking(move || {
            let mut tailer = tailer
                .lock()
                .map_err(|e| AggregatorError::Poisoned(e.to_string()))?;
            let events = tailer.update()?;
            Ok::<_, AggregatorError>((events, tailer.state().clone()))
        })
        .await??;

        Ok(self.publish(events, state).await)
    }

    /// Apply `lines` as if they had just been read from the log.
    pub async fn ingest<I, S>(&self, lines: I) -> Result<usize, AggregatorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (events, state) = {
            let mut tailer = self
                .tailer
                .lock()
                .map_err(|e| AggregatorError::Poisoned(e.to_string()))?;
            let events = tailer.parse(lines);
            (events, tailer.state().clone())
        };
        Ok(self.publish(events, state).await)
    }

    async fn publish(&self, events: Vec<LogEvent>, state: PlayerState) -> usize {
        *self.snapshot.write().await = state;
        let count = events.len();
        for event in events {
            self.handle_event(event).await;
        }
        count
    }

    async fn handle_event(&self, event: LogEvent) {
        match event {
            LogEvent::CommanderFound { name } => {
                info!(commander = %name, "Commander found");
                self.announce(NoticeEvent::CommanderFound { name });
            }
            LogEvent::DockingStarted => {
                info!("Docking permission granted");
                self.announce(NoticeEvent::DockingGranted);
            }
            LogEvent::SystemEntered { id, name } => {
                info!(system = %name, client_id = id, "Entered system");
                match self.resolver.resolve(&name).await {
                    Ok(Some(resolved)) => {
                        self.announce(NoticeEvent::SystemEntered(resolved));
                    }
                    Ok(None) => debug!(system = %name, "System not resolved, no announcement"),
                    Err(e) => warn!(system = %name, error = %e, "System lookup failed"),
                }
            }
        }
        self.signal.notify();
    }

    fn announce(&self, event: NoticeEvent) {
        let notice = Notice {
            observed_at: Utc::now(),
            event,
        };
        // send fails only when nobody is subscribed.
        let receivers = self.notices.send(notice).unwrap_or(0);
        debug!(receivers, "Notice published");
    }

    // -----------------------------------------------------------------------
    // Readers
    // -----------------------------------------------------------------------

    /// Subscribe to announcements.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// The change signal fired after every handled event.
    pub const fn signal(&self) -> &ChangeSignal {
        &self.signal
    }

    /// Wait until the next change.
    pub async fn wait(&self) {
        self.signal.wait().await;
    }

    /// The most recently published player state.
    pub async fn player(&self) -> PlayerState {
        self.snapshot.read().await.clone()
    }

    /// The commander's name, once known.
    pub async fn commander_name(&self) -> Option<String> {
        self.snapshot.read().await.commander.clone()
    }

    /// Name of the last system entered, if any.
    pub async fn last_system_name(&self) -> Option<String> {
        self.snapshot
            .read()
            .await
            .last_system_name()
            .map(ToOwned::to_owned)
    }

    /// Whether docking was granted since the last arrival.
    pub async fn docking(&self) -> bool {
        self.snapshot.read().await.recently_near_station
    }

    /// Directory id for `name` (see [`IdentifierResolver::lookup`]).
    pub async fn lookup_system_id(&self, name: &str) -> Result<Option<i64>, DirectoryError> {
        self.resolver.lookup(name).await
    }

    /// Directory page URL for `name`.
    pub async fn system_url(&self, name: &str) -> Result<Option<String>, DirectoryError> {
        self.resolver.system_url(name).await
    }

    /// Directory id and URL for `name`.
    pub async fn resolve_system(
        &self,
        name: &str,
    ) -> Result<Option<ResolvedSystem>, DirectoryError> {
        self.resolver.resolve(name).await
    }
}

impl std::fmt::Debug for StateAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateAggregator")
            .field("poll_interval", &self.poll_interval)
            .field("generation", &self.signal.generation())
            .finish_non_exhaustive()
    }
}
