//! Combined lifecycle for the background poll loop and the HTTP server.
//!
//! [`Watch::start`] starts the aggregator's poll loop and spawns the
//! server on a background Tokio task; [`Watch::stop`] stops the loop and
//! shuts the server down gracefully, releasing pending long polls with
//! the current state. Both are idempotent and serialized by one lock.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bosun_watchkeeper::{ServerConfig, Watch};
//!
//! let watch = Watch::new(mate, ServerConfig::default(), None);
//! let addr = watch.start().await?;
//! // ... until shutdown ...
//! watch.stop().await;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bosun_core::StateAggregator;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when starting the watch.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// How long [`Watch::stop`] waits for in-flight requests before aborting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A running server task, its shared state and where it listens.
#[derive(Debug)]
struct RunningServer {
    handle: JoinHandle<()>,
    state: Arc<AppState>,
    addr: SocketAddr,
}

/// Owns the poll loop and server lifecycle.
#[derive(Debug)]
pub struct Watch {
    mate: Arc<StateAggregator>,
    config: ServerConfig,
    long_poll_timeout: Option<Duration>,
    server: Mutex<Option<RunningServer>>,
}

impl Watch {
    /// Create a stopped watch.
    pub fn new(
        mate: Arc<StateAggregator>,
        config: ServerConfig,
        long_poll_timeout: Option<Duration>,
    ) -> Self {
        Self {
            mate,
            config,
            long_poll_timeout,
            server: Mutex::new(None),
        }
    }

    /// Start the poll loop and the server.
    ///
    /// Binds eagerly so address problems are reported here rather than
    /// from the background task. Calling `start` while already running
    /// leaves the server alone and returns its address.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Server`] if the listener cannot bind.
    pub async fn start(&self) -> Result<SocketAddr, StartupError> {
        let mut server = self.server.lock().await;
        self.mate.start();

        if let Some(running) = server.as_ref().filter(|r| !r.handle.is_finished()) {
            return Ok(running.addr);
        }

        let listener = server::bind(&self.config).await?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

        let state = Arc::new(
            AppState::new(Arc::clone(&self.mate)).with_long_poll_timeout(self.long_poll_timeout),
        );
        let serve_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            if let Err(e) = server::serve(listener, serve_state).await {
                error!(error = %e, "Watch keeper exited with error");
            }
        });

        info!(%addr, "Watch keeper spawned on background task");
        *server = Some(RunningServer {
            handle,
            state,
            addr,
        });
        Ok(addr)
    }

    /// Stop the poll loop and shut the server down.
    ///
    /// Pending long polls answer with the current state and the listener
    /// closes. A server that is still draining after the grace period is
    /// aborted.
    pub async fn stop(&self) {
        let mut server = self.server.lock().await;
        self.mate.stop();
        let Some(mut running) = server.take() else {
            return;
        };

        running.state.request_shutdown();
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut running.handle)
            .await
            .is_err()
        {
            warn!(
                addr = %running.addr,
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "Watch keeper did not drain in time, aborting"
            );
            running.handle.abort();
        }
        info!(addr = %running.addr, "Watch keeper stopped");
    }

    /// Address of the running server, if any.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.server
            .lock()
            .await
            .as_ref()
            .filter(|r| !r.handle.is_finished())
            .map(|r| r.addr)
    }

    /// The aggregator this watch drives.
    pub const fn mate(&self) -> &Arc<StateAggregator> {
        &self.mate
    }
}
