use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use deed_types::Action;

/// Journal used when `--data` is not given.
pub const DEFAULT_JOURNAL: &str = "deed.journal";

#[derive(Parser)]
#[command(
    name = "deed",
    about = "Deed Ledger: tamper-evident land ownership records",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Journal file holding the ledger
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Deadline for each ledger operation, in milliseconds
    #[arg(long, global = true, default_value_t = 5_000)]
    pub timeout_ms: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn data_path(&self) -> PathBuf {
        self.data.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_JOURNAL))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Append a record to a property's chain
    Append(AppendArgs),
    /// Verify the hash chain of a property
    Verify(VerifyArgs),
    /// List a property's records, or a survey's with --survey
    History(HistoryArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct AppendArgs {
    #[arg(long)]
    pub survey: String,
    /// Property number; also the chain key
    #[arg(long)]
    pub property: String,
    #[arg(long)]
    pub owner: String,
    #[arg(long)]
    pub land_type: String,
    /// AwardDeclared, OwnershipUpdated, Compensated, or Other
    #[arg(long)]
    pub action: Action,
    #[arg(long, default_value = "")]
    pub details: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Property number of the chain
    pub property: String,
    /// List every violation, not only the first
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Property number, or survey number with --survey
    pub key: String,
    #[arg(long)]
    pub survey: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML server configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Keep records in memory, ignoring --data and the config file
    #[arg(long)]
    pub in_memory: bool,
}
