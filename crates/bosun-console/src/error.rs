//! Error types for the Bosun console binary.

use std::path::PathBuf;

/// Top-level error for the console binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: bosun_core::ConfigError,
    },

    /// The log tailer could not be built.
    #[error("log watch error: {source}")]
    LogWatch {
        /// The underlying tailer error.
        #[from]
        source: bosun_logwatch::LogWatchError,
    },

    /// The directory client could not be built.
    #[error("directory error: {source}")]
    Directory {
        /// The underlying directory error.
        #[from]
        source: bosun_core::DirectoryError,
    },

    /// The watch keeper failed to start.
    #[error("watch keeper error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: bosun_watchkeeper::startup::StartupError,
    },

    /// The settings blob could not be read or written.
    #[error("settings error at {}: {message}", path.display())]
    Settings {
        /// The settings file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Neither a game folder nor a log folder was given.
    #[error("no log folder configured; pass the game folder or set logs.directory")]
    NoLogFolder,

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {0}")]
    Signal(std::io::Error),
}
