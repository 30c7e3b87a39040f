//! Command-line arguments.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::settings::SETTINGS_FILE;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "bosun-config.yaml";

/// Subfolder of the game folder that holds the netlogs.
pub const LOGS_SUBFOLDER: &str = "Logs";

/// Bosun console arguments.
#[derive(Debug, Parser)]
#[command(name = "bosun")]
#[command(about = "Tail the game's netlogs and serve the player's location over HTTP", long_about = None)]
#[command(override_usage = "bosun PATH_TO_ED_FOLDER")]
#[command(version)]
pub struct Args {
    /// Game folder; logs are read from its `Logs` subfolder
    #[arg(value_name = "PATH_TO_ED_FOLDER")]
    pub game_folder: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Settings blob remembered between sessions
    #[arg(long, value_name = "FILE", default_value = SETTINGS_FILE)]
    pub settings: PathBuf,
}

impl Args {
    /// Parse the process arguments, accepting `/?` and `/help` as help flags.
    pub fn from_env() -> Self {
        Self::parse_from(normalize_help(std::env::args_os()))
    }
}

/// Rewrite the slash-style help flags to `--help`.
pub fn normalize_help<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            if arg == "/?" || arg == "/help" {
                OsString::from("--help")
            } else {
                arg
            }
        })
        .collect()
}

/// Pick the log folder: an explicit folder wins over `<game>/Logs`.
pub fn log_folder(configured: Option<&Path>, game_folder: Option<&Path>) -> Option<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .or_else(|| game_folder.map(|game| game.join(LOGS_SUBFOLDER)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn slash_help_flags_become_long_help() {
        let args = normalize_help(os(&["bosun", "/?"]));
        assert_eq!(args, os(&["bosun", "--help"]));
        let args = normalize_help(os(&["bosun", "/help"]));
        assert_eq!(args, os(&["bosun", "--help"]));
    }

    #[test]
    fn help_flags_stop_parsing() {
        for flag in ["-h", "--help", "/?", "/help"] {
            let err = Args::try_parse_from(normalize_help(os(&["bosun", flag]))).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp, "{flag}");
        }
    }

    #[test]
    fn game_folder_is_positional() {
        let args = Args::try_parse_from(os(&["bosun", "/games/ED"])).unwrap();
        assert_eq!(args.game_folder, Some(PathBuf::from("/games/ED")));
        assert_eq!(args.config, PathBuf::from(CONFIG_FILE));
        assert_eq!(args.settings, PathBuf::from(SETTINGS_FILE));
    }

    #[test]
    fn configured_folder_wins() {
        let picked = log_folder(Some(Path::new("/logs")), Some(Path::new("/games/ED")));
        assert_eq!(picked, Some(PathBuf::from("/logs")));

        let picked = log_folder(None, Some(Path::new("/games/ED")));
        assert_eq!(picked, Some(Path::new("/games/ED").join("Logs")));

        assert_eq!(log_folder(None, None), None);
    }
}
