//! Bosun console: tails the game's netlogs and serves the player's
//! location over a small JSON API.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Parse arguments and load configuration from `bosun-config.yaml`
//! 3. Load the settings blob (`bosun.json`)
//! 4. Wait for the log folder to exist
//! 5. Build the tailer, directory client, resolver and aggregator
//! 6. Run one pass and report what is already known
//! 7. Start the poll loop and the watch keeper
//! 8. Log notices until `Ctrl-C`, then stop and save settings

mod cli;
mod error;
mod settings;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bosun_core::{
    BosunConfig, EddbDirectory, IdentifierResolver, Notice, NoticeEvent, StateAggregator,
};
use bosun_logwatch::LogTailer;
use bosun_watchkeeper::{ServerConfig, Watch};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::error::ConsoleError;
use crate::settings::{LAST_SYSTEM_KEY, Settings};

/// Application entry point for the Bosun console.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), ConsoleError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // 2. Arguments and configuration.
    let args = Args::from_env();
    info!("Bosun starting up");
    let config = load_config(&args.config)?;

    // 3. Settings from the previous session.
    let mut settings = Settings::load(&args.settings)?;
    if let Some(system) = settings.get(LAST_SYSTEM_KEY) {
        info!(system, "Previous session ended here");
    }

    // 4. Log folder.
    let log_dir = cli::log_folder(config.logs.directory.as_deref(), args.game_folder.as_deref())
        .ok_or(ConsoleError::NoLogFolder)?;
    if !wait_for_folder(&log_dir, config.watch.folder_wait()).await? {
        info!("Interrupted before the game started");
        return Ok(());
    }
    info!(folder = %log_dir.display(), "Using folder for logs");

    // 5. Core components.
    let tailer = LogTailer::new(config.logs.tailer_config(&log_dir))?;
    let directory = EddbDirectory::new(
        &config.directory.base_url,
        config.directory.request_timeout(),
    )?;
    let resolver = IdentifierResolver::new(Arc::new(directory), config.directory.duplicate_match);
    info!("Appointing first mate");
    let mate = Arc::new(StateAggregator::new(
        tailer,
        resolver,
        config.watch.poll_interval(),
    ));

    // 6. Initial pass and report.
    if let Err(e) = mate.refresh().await {
        warn!(error = %e, "Initial log pass failed");
    }
    report_startup(&mate).await;

    // 7. Poll loop and watch keeper.
    let notice_logger = spawn_notice_logger(mate.subscribe());
    let watch = Watch::new(
        Arc::clone(&mate),
        ServerConfig::from(&config.server),
        config.server.long_poll_timeout(),
    );
    let addr = watch.start().await?;
    info!(port = addr.port(), "First mate has appointed a watch keeper");

    // 8. Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(ConsoleError::Signal)?;
    info!("Shutting down");

    watch.stop().await;
    notice_logger.abort();

    if let Some(system) = mate.last_system_name().await {
        settings.set(LAST_SYSTEM_KEY, system);
    }
    if let Err(e) = settings.save() {
        warn!(error = %e, "Failed to save settings");
    }

    info!("Bosun stopped");
    Ok(())
}

/// Load configuration from `path`, falling back to defaults.
fn load_config(path: &Path) -> Result<BosunConfig, ConsoleError> {
    if path.exists() {
        let config = BosunConfig::from_file(path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        let mut config = BosunConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}

/// Wait until `dir` exists, re-checking every `every`.
///
/// Returns `false` if interrupted first.
async fn wait_for_folder(dir: &Path, every: Duration) -> Result<bool, ConsoleError> {
    if dir.is_dir() {
        return Ok(true);
    }
    info!(folder = %dir.display(), "Waiting for the game to start");
    loop {
        tokio::select! {
            () = tokio::time::sleep(every) => {}
            result = tokio::signal::ctrl_c() => {
                result.map_err(ConsoleError::Signal)?;
                return Ok(false);
            }
        }
        if dir.is_dir() {
            return Ok(true);
        }
    }
}

/// Greet the commander and report the last known system.
async fn report_startup(mate: &StateAggregator) {
    if let Some(name) = mate.commander_name().await {
        info!("Hello CMDR {name}");
    }

    let Some(system) = mate.last_system_name().await else {
        info!("Bosun ready, no system recorded yet");
        return;
    };
    info!(system, "Bosun ready, last recorded system");

    match mate.resolve_system(&system).await {
        Ok(Some(resolved)) => info!(url = resolved.eddb_url, "EDDB: {system}"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, system, "Directory lookup failed"),
    }
}

/// Log every notice until the aggregator goes away.
fn spawn_notice_logger(mut notices: broadcast::Receiver<Notice>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => log_notice(&notice),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Notice logger fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_notice(notice: &Notice) {
    match &notice.event {
        NoticeEvent::CommanderFound { name } => info!("Hello CMDR {name}"),
        NoticeEvent::DockingGranted => info!("Docking"),
        NoticeEvent::SystemEntered(system) => {
            info!(system = system.name, "Arrived");
            info!(url = system.eddb_url, "EDDB: {}", system.name);
        }
    }
}
