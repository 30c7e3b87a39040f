//! Configuration loading and typed config structures.
//!
//! The configuration lives in `bosun-config.yaml` next to the working
//! directory. Every field has a default, so a missing file or a partial
//! file is fine. A handful of environment variables override the file:
//!
//! - `BOSUN_LOG_DIR` overrides `logs.directory`
//! - `BOSUN_PORT` overrides `server.port`
//! - `BOSUN_DIRECTORY_URL` overrides `directory.base_url`

use std::path::{Path, PathBuf};
use std::time::Duration;

use bosun_logwatch::TailerConfig;
use bosun_logwatch::position::DEFAULT_MAX_TRACKED_FILES;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value for {name}: {message}")]
    Override {
        /// The environment variable.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Bosun configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BosunConfig {
    /// Where the netlogs are and how to read them.
    #[serde(default)]
    pub logs: LogsConfig,

    /// Background polling cadence.
    #[serde(default)]
    pub watch: WatchConfig,

    /// External system directory.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// REST server settings.
    #[serde(default)]
    pub server: ServerSettings,
}

impl BosunConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Override`] if an override is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply environment overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `BOSUN_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup("BOSUN_LOG_DIR") {
            self.logs.directory = Some(PathBuf::from(dir));
        }
        if let Some(port) = lookup("BOSUN_PORT") {
            self.server.port = port.parse().map_err(|e| ConfigError::Override {
                name: "BOSUN_PORT",
                message: format!("{e}"),
            })?;
        }
        if let Some(url) = lookup("BOSUN_DIRECTORY_URL") {
            self.directory.base_url = url;
        }
        Ok(())
    }
}

/// Netlog location and file selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogsConfig {
    /// Explicit log folder. When absent the folder is `<game>/Logs`.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Log file name prefix.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Log file extension, without the dot.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Newest files scanned on the first pass.
    #[serde(default = "default_bootstrap_files")]
    pub bootstrap_files: usize,

    /// Newest files scanned on every later pass.
    #[serde(default = "default_steady_files")]
    pub steady_files: usize,

    /// Files tracked before offset history is dropped.
    #[serde(default = "default_max_tracked_files")]
    pub max_tracked_files: usize,
}

impl LogsConfig {
    /// Build the tailer configuration for logs in `directory`.
    pub fn tailer_config(&self, directory: &Path) -> TailerConfig {
        TailerConfig {
            directory: directory.to_path_buf(),
            file_prefix: self.file_prefix.clone(),
            file_extension: self.file_extension.clone(),
            bootstrap_files: self.bootstrap_files,
            steady_files: self.steady_files,
            max_tracked_files: self.max_tracked_files,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            bootstrap_files: default_bootstrap_files(),
            steady_files: default_steady_files(),
            max_tracked_files: default_max_tracked_files(),
        }
    }
}

/// Background loop timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchConfig {
    /// Milliseconds between log passes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Milliseconds between checks while the log folder does not exist.
    #[serde(default = "default_folder_wait_ms")]
    pub folder_wait_ms: u64,
}

impl WatchConfig {
    /// Interval between log passes.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Interval between log folder checks.
    pub const fn folder_wait(&self) -> Duration {
        Duration::from_millis(self.folder_wait_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            folder_wait_ms: default_folder_wait_ms(),
        }
    }
}

/// Which exact-name match wins when a search returns several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateMatch {
    /// Keep the first entry whose name matches.
    FirstWins,
    /// Keep the last entry whose name matches.
    #[default]
    LastWins,
}

/// External directory service settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the directory (no trailing slash).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Policy for repeated exact matches in one response.
    #[serde(default)]
    pub duplicate_match: DuplicateMatch,
}

impl DirectoryConfig {
    /// Per-request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            duplicate_match: DuplicateMatch::default(),
        }
    }
}

/// REST server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for `/api/poll` in milliseconds. Unbounded when absent.
    #[serde(default)]
    pub long_poll_timeout_ms: Option<u64>,
}

impl ServerSettings {
    /// Long-poll bound, if configured.
    pub fn long_poll_timeout(&self) -> Option<Duration> {
        self.long_poll_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            long_poll_timeout_ms: None,
        }
    }
}

fn default_file_prefix() -> String {
    String::from("netlog")
}

fn default_file_extension() -> String {
    String::from("log")
}

const fn default_bootstrap_files() -> usize {
    3
}

const fn default_steady_files() -> usize {
    1
}

const fn default_max_tracked_files() -> usize {
    DEFAULT_MAX_TRACKED_FILES
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_folder_wait_ms() -> u64 {
    5000
}

fn default_base_url() -> String {
    String::from("https://eddb.io")
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse_without_env(yaml: &str) -> BosunConfig {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn default_config_matches_game_layout() {
        let config = BosunConfig::default();
        assert_eq!(config.logs.file_prefix, "netlog");
        assert_eq!(config.logs.bootstrap_files, 3);
        assert_eq!(config.logs.steady_files, 1);
        assert_eq!(config.logs.max_tracked_files, 100);
        assert_eq!(config.watch.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.directory.duplicate_match, DuplicateMatch::LastWins);
        assert_eq!(config.server.long_poll_timeout(), None);
    }

    #[test]
    fn parse_partial_yaml() {
        let config = parse_without_env(
            r#"
logs:
  directory: "/games/elite/Logs"
watch:
  poll_interval_ms: 250
directory:
  base_url: "http://localhost:9000"
  duplicate_match: first_wins
server:
  port: 9090
  long_poll_timeout_ms: 30000
"#,
        );
        assert_eq!(
            config.logs.directory.as_deref(),
            Some(Path::new("/games/elite/Logs"))
        );
        assert_eq!(config.logs.file_extension, "log");
        assert_eq!(config.watch.poll_interval_ms, 250);
        assert_eq!(config.directory.duplicate_match, DuplicateMatch::FirstWins);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.server.long_poll_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = parse_without_env("{}");
        assert_eq!(config, BosunConfig::default());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = BosunConfig::default();
        config
            .apply_overrides(|name| match name {
                "BOSUN_LOG_DIR" => Some(String::from("/tmp/logs")),
                "BOSUN_PORT" => Some(String::from("7000")),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.logs.directory, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.directory.base_url, "https://eddb.io");
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = BosunConfig::default();
        let err = config
            .apply_overrides(|name| (name == "BOSUN_PORT").then(|| String::from("port")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Override { name: "BOSUN_PORT", .. }));
    }

    #[test]
    fn tailer_config_carries_selection() {
        let config = BosunConfig::default();
        let tailer = config.logs.tailer_config(Path::new("/logs"));
        assert_eq!(tailer.directory, PathBuf::from("/logs"));
        assert_eq!(tailer.bootstrap_files, 3);
        assert_eq!(tailer.max_tracked_files, 100);
    }
}
