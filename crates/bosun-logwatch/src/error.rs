//! Error types for log tailing.

use std::path::PathBuf;

/// Errors raised while listing or reading netlog files.
///
/// Line parsing never fails; only file system access and pattern
/// compilation can.
#[derive(Debug, thiserror::Error)]
pub enum LogWatchError {
    /// The log folder could not be listed.
    #[error("cannot list log folder {}: {source}", .path.display())]
    Folder {
        /// The folder that was being listed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A log file could not be opened, seeked or read.
    #[error("cannot read log file {}: {source}", .path.display())]
    Read {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A line-matching pattern failed to compile.
    #[error("invalid line pattern: {source}")]
    Pattern {
        /// The underlying regex error.
        #[from]
        source: regex::Error,
    },
}

impl LogWatchError {
    /// Whether the error means the log folder itself is gone.
    pub fn is_missing_folder(&self) -> bool {
        matches!(self, Self::Folder { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
