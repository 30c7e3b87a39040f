//! Shared application state for the watch keeper.

use std::sync::Arc;
use std::time::Duration;

use bosun_core::StateAggregator;
use tokio::sync::watch;

use crate::dispatch::DispatchTable;

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The player state aggregator the API reads from.
    pub mate: Arc<StateAggregator>,
    /// Method dispatch table, built once.
    pub routes: DispatchTable,
    /// Upper bound on a single long poll. `None` waits indefinitely.
    pub long_poll_timeout: Option<Duration>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Create state over `mate` with no long-poll bound.
    pub fn new(mate: Arc<StateAggregator>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            mate,
            routes: DispatchTable::new(),
            long_poll_timeout: None,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Bound every long poll to `timeout`.
    #[must_use]
    pub fn with_long_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.long_poll_timeout = timeout;
        self
    }

    /// Ask the server to shut down and release pending long polls.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether a shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolve once a shutdown has been requested.
    pub async fn shutdown_requested(&self) {
        let mut rx = self.shutdown.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|stopping| *stopping).await;
    }
}

