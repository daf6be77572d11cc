use std::path::PathBuf;

use clap::{Parser, Subcommand};

use liftsync_core::documents::DEFAULT_USER_ID;
use liftsync_core::sync::AUTO_SYNC_INTERVAL_SECS;

#[derive(Parser, Debug)]
#[command(name = "liftsync")]
#[command(about = "Sync a local workout log with a LiftSync server", version)]
pub struct Cli {
    /// Action endpoint, e.g. https://example.com/api
    #[arg(long, env = "LIFTSYNC_URL", global = true)]
    pub server: Option<String>,

    #[arg(long, env = "LIFTSYNC_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "LIFTSYNC_USER", global = true, default_value = DEFAULT_USER_ID)]
    pub user: String,

    /// Local dataset file
    #[arg(long, env = "LIFTSYNC_DATA", global = true, default_value = "liftsync-data.json")]
    pub data: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Check that the server answers and accepts the key
    Test,
    /// Replace the local dataset with the server copy
    Pull,
    /// Upload the local dataset
    Push,
    /// Push, then pull back the server copy
    Sync,
    /// Replace the local dataset from a JSON file, save it, then push
    Import { file: PathBuf },
    /// Session totals per user
    Stats,
    /// Download the whole server document
    Backup {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Keep pushing on a timer until interrupted
    Watch {
        /// Seconds between pushes
        #[arg(long, default_value_t = AUTO_SYNC_INTERVAL_SECS)]
        interval: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "liftsync",
            "import",
            "export.json",
            "--server",
            "http://localhost:8080/api",
            "--user",
            "anna",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Import {
                file: PathBuf::from("export.json")
            }
        );
        assert_eq!(cli.server.as_deref(), Some("http://localhost:8080/api"));
        assert_eq!(cli.user, "anna");
    }

    #[test]
    fn watch_interval_defaults_to_auto_sync_cadence() {
        let cli = Cli::try_parse_from(["liftsync", "watch"]).unwrap();
        assert_eq!(cli.command, Commands::Watch { interval: 300 });
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["liftsync", "delete"]).is_err());
    }
}
