//! Per-file read offsets.
//!
//! [`LogPosition`] maps each log file that has ever been read to the
//! number of bytes already consumed from it. The map only grows while
//! the game keeps rotating logs, so it is capped: once more than
//! `max_tracked` files are known, everything except the most recently
//! read file is forgotten.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default number of files tracked before the history is dropped.
pub const DEFAULT_MAX_TRACKED_FILES: usize = 100;

/// Byte offsets already consumed, keyed by log file path.
#[derive(Debug, Clone)]
pub struct LogPosition {
    offsets: HashMap<PathBuf, u64>,
    max_tracked: usize,
}

impl LogPosition {
    /// Create an empty position map that keeps at most `max_tracked` files.
    pub fn new(max_tracked: usize) -> Self {
        Self {
            offsets: HashMap::new(),
            max_tracked,
        }
    }

    /// Offset to resume reading `path` from (0 for unseen files).
    pub fn offset(&self, path: &Path) -> u64 {
        self.offsets.get(path).copied().unwrap_or(0)
    }

    /// Record that `path` has been consumed up to `offset`.
    ///
    /// Offsets never move backwards through this call; use
    /// [`rewind`](Self::rewind) when a file was recreated.
    pub fn advance(&mut self, path: &Path, offset: u64) {
        let slot = self.offsets.entry(path.to_path_buf()).or_insert(0);
        *slot = (*slot).max(offset);
    }

    /// Forget the offset for `path` so it is read from the start again.
    pub fn rewind(&mut self, path: &Path) {
        self.offsets.remove(path);
    }

    /// Drop all history except `latest` once the cap is exceeded.
    ///
    /// Returns `true` if the map was reset.
    pub fn enforce_limit(&mut self, latest: &Path) -> bool {
        if self.offsets.len() <= self.max_tracked {
            return false;
        }
        let kept = self.offset(latest);
        self.offsets.clear();
        self.offsets.insert(latest.to_path_buf(), kept);
        true
    }

    /// Number of files currently tracked.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether no file has been read yet.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Whether `path` has a recorded offset.
    pub fn contains(&self, path: &Path) -> bool {
        self.offsets.contains_key(path)
    }
}

impl Default for LogPosition {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACKED_FILES)
    }
}
