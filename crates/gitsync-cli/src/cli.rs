use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "gitsync")]
#[command(about = "GitSync - webhook-triggered git repository synchronization", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file
    #[arg(long, short, env = "GITSYNC_CONFIG", default_value = "gitsync.toml")]
    pub config: PathBuf,

    /// Log output format
    #[arg(long, env = "GITSYNC_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook server
    Serve {
        /// Address to listen on, overrides server.listen
        #[arg(long)]
        listen: Option<String>,
    },

    /// Validate the configuration and exit
    Check,

    /// Update one repository and exit
    Update {
        /// Repository name
        repository: String,
    },
}
