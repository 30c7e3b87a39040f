//! Incremental reader over the rotated netlog files.
//!
//! Each call to [`LogTailer::update`] lists the newest logs, reads the
//! complete lines appended since the previous call, and turns them into
//! [`LogEvent`]s. The first call looks at the last few files so a
//! session already in progress is picked up; later calls only follow
//! the newest file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::error::LogWatchError;
use crate::position::{DEFAULT_MAX_TRACKED_FILES, LogPosition};
use crate::rules::{LineMatch, LineRules};
use crate::state::PlayerState;

/// Where the logs live and how many of them to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailerConfig {
    /// Folder holding the rotated logs.
    pub directory: PathBuf,
    /// File name prefix of a log (`netlog`).
    pub file_prefix: String,
    /// File extension of a log, without the dot (`log`).
    pub file_extension: String,
    /// Number of newest files read on the first update.
    pub bootstrap_files: usize,
    /// Number of newest files read on every later update.
    pub steady_files: usize,
    /// Number of files tracked before offset history is dropped.
    pub max_tracked_files: usize,
}

impl TailerConfig {
    /// Defaults for the game's `netlog.*.log` files in `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            file_prefix: String::from("netlog"),
            file_extension: String::from("log"),
            bootstrap_files: 3,
            steady_files: 1,
            max_tracked_files: DEFAULT_MAX_TRACKED_FILES,
        }
    }

    fn is_log_name(&self, name: &str) -> bool {
        name.starts_with(&self.file_prefix)
            && Path::new(name)
                .extension()
                .is_some_and(|ext| ext == self.file_extension.as_str())
    }
}

/// A state transition found in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// The player arrived in a different star system.
    SystemEntered {
        /// Client-side system id.
        id: i64,
        /// System display name.
        name: String,
    },
    /// Docking permission was granted.
    DockingStarted,
    /// The commander's name was found.
    CommanderFound {
        /// Commander display name.
        name: String,
    },
}

/// New lines read from one file, not yet committed to the position map.
struct PendingRead {
    path: PathBuf,
    offset: u64,
    restarted: bool,
    lines: Vec<String>,
}

/// Tails the netlogs and tracks player state.
#[derive(Debug)]
pub struct LogTailer {
    config: TailerConfig,
    positions: LogPosition,
    rules: LineRules,
    state: PlayerState,
    bootstrapped: bool,
}

impl LogTailer {
    /// Create a tailer that has not read anything yet.
    pub fn new(config: TailerConfig) -> Result<Self, LogWatchError> {
        let positions = LogPosition::new(config.max_tracked_files);
        Ok(Self {
            config,
            positions,
            rules: LineRules::new()?,
            state: PlayerState::default(),
            bootstrapped: false,
        })
    }

    /// Current player state.
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Offsets consumed so far.
    pub const fn positions(&self) -> &LogPosition {
        &self.positions
    }

    /// List the logs to read on this pass, oldest first.
    ///
    /// Up to `bootstrap_files` files until a pass has been committed, then
    /// up to `steady_files`.
    pub fn list_logs(&self) -> Result<Vec<PathBuf>, LogWatchError> {
        let dir = &self.config.directory;
        let entries = std::fs::read_dir(dir).map_err(|source| LogWatchError::Folder {
            path: dir.clone(),
            source,
        })?;

        let mut logs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| self.config.is_log_name(name))
            })
            .map(|entry| entry.path())
            .collect();
        // Log names embed a timestamp, so name order is age order.
        logs.sort();

        let take = if self.bootstrapped {
            self.config.steady_files
        } else {
            self.config.bootstrap_files
        };

        let skip = logs.len().saturating_sub(take);
        Ok(logs.split_off(skip))
    }

    /// Read new lines from the newest logs and apply them.
    ///
    /// Lines are applied oldest file first, in append order. Offsets are
    /// only committed when every selected file was read, so a failed
    /// pass is retried in full on the next call, including the wider
    /// first-pass selection.
    pub fn update(&mut self) -> Result<Vec<LogEvent>, LogWatchError> {
        let logs = self.list_logs()?;

        let mut pending = Vec::with_capacity(logs.len());
        for path in logs {
            pending.push(self.read_new_lines(path)?);
        }

        let mut lines = Vec::new();
        let mut latest = None;
        for read in pending {
            if read.restarted {
                self.positions.rewind(&read.path);
            }
            self.positions.advance(&read.path, read.offset);
            lines.extend(read.lines);
            latest = Some(read.path);
        }
        self.bootstrapped = true;

        if let Some(latest) = latest {
            if self.positions.enforce_limit(&latest) {
                debug!(
                    latest = %latest.display(),
                    "Log position history reset after too many files"
                );
            }
        }

        Ok(self.parse(lines))
    }

    /// Apply `lines` in order and return the events they produced.
    pub fn parse<I, S>(&mut self, lines: I) -> Vec<LogEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| self.parse_line(line.as_ref()))
            .collect()
    }

    /// Apply a single line to the player state.
    ///
    /// Returns an event when the line changed something observable. A
    /// system line for the system already recorded is consumed silently.
    pub fn parse_line(&mut self, line: &str) -> Option<LogEvent> {
        trace!(line, "netlog line");
        match self.rules.classify(line)? {
            LineMatch::System { id, name } => {
                if id == self.state.system.id {
                    return None;
                }
                self.state.system.id = id;
                self.state.system.name.clone_from(&name);
                self.state.recently_near_station = false;
                Some(LogEvent::SystemEntered { id, name })
            }
            LineMatch::DockingStarted => {
                self.state.recently_near_station = true;
                Some(LogEvent::DockingStarted)
            }
            LineMatch::Commander { name } => {
                self.state.commander = Some(name.clone());
                Some(LogEvent::CommanderFound { name })
            }
        }
    }

    fn read_new_lines(&self, path: PathBuf) -> Result<PendingRead, LogWatchError> {
        let read_err = |source| LogWatchError::Read {
            path: path.clone(),
            source,
        };

        let mut file = File::open(&path).map_err(read_err)?;
        let len = file.metadata().map_err(read_err)?.len();

        let mut start = self.positions.offset(&path);
        let restarted = len < start;
        if restarted {
            warn!(
                path = %path.display(),
                offset = start,
                len,
                "Log file shrank, reading it again from the start"
            );
            start = 0;
        }

        file.seek(SeekFrom::Start(start)).map_err(read_err)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(read_err)?;

        // Hold back a trailing partial line until its terminator arrives.
        let complete = bytes
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |pos| pos.saturating_add(1));
        bytes.truncate(complete);

        let lines = String::from_utf8_lossy(&bytes)
            .lines()
            .map(ToOwned::to_owned)
            .collect();
        let consumed = u64::try_from(complete).unwrap_or(u64::MAX);

        Ok(PendingRead {
            offset: start.saturating_add(consumed),
            restarted,
            path,
            lines,
        })
    }
}
