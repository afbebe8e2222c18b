// NOTE: Command Organization Rationale
//
// kmo never opens a connection. Every command answers "what would be sent, and
// would it be allowed" for a given engine version, which keeps it usable from CI
// and from machines without network access to the server.

use crate::types::{LogLevel, OutputFormat};
use clap::{Args, Parser, Subcommand};
use kmo_types::OperationId;

#[derive(Parser)]
#[command(name = "kmo")]
#[command(about = "Compose and inspect SQL Server diagnostic queries", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to $KMO_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List diagnostic operations and their version requirements")]
    Catalog {
        /// Mark which operations are available on this engine version (e.g. 10.50)
        #[arg(long = "engine-version")]
        engine_version: Option<String>,
    },

    #[command(about = "Print the SQL and bound parameters for one operation")]
    Compose {
        /// Operation id, e.g. wait_statistics or top-queries
        operation: OperationId,

        #[arg(long = "engine-version", default_value = "13.0")]
        engine_version: String,

        /// Assume 'Ole Automation Procedures' is enabled on the server
        #[arg(long)]
        ole_automation: bool,

        #[command(flatten)]
        options: OptionArgs,
    },

    #[command(about = "Map an engine version (e.g. 10.50.6000.34) to its product name")]
    VersionName {
        version: String,
    },

    #[command(about = "Inspect or create the configuration file")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Show the effective defaults after applying the config file")]
    Show,

    #[command(about = "Print the resolved config file path")]
    Path,

    #[command(about = "Write a config file spelling out every built-in default")]
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Per-operation option flags. Flags that do not apply to the chosen operation are rejected.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionArgs {
    // live sessions
    #[arg(long, help_heading = "Live sessions")]
    pub include_system_sessions: bool,

    #[arg(long, help_heading = "Live sessions")]
    pub include_execution_plan: bool,

    // file map
    #[arg(long, help_heading = "File map")]
    pub min_size_mb: Option<i64>,

    #[arg(long, help_heading = "File map")]
    pub max_size_mb: Option<i64>,

    #[arg(long, help_heading = "File map", help = "Leave data files out")]
    pub no_data: bool,

    #[arg(long, help_heading = "File map", help = "Leave log files out")]
    pub no_log: bool,

    // error log / failed logins
    #[arg(long, help_heading = "Error log", help = "YYYY-MM-DD[ HH:MM:SS]")]
    pub start_time: Option<String>,

    #[arg(long, help_heading = "Error log", help = "YYYY-MM-DD[ HH:MM:SS]")]
    pub end_time: Option<String>,

    #[arg(long, help_heading = "Error log")]
    pub log_file_number: Option<i32>,

    #[arg(long, help_heading = "Error log")]
    pub include_informational: bool,

    #[arg(
        long,
        help_heading = "Error log",
        help = "Drop informational messages even if the config keeps them",
        conflicts_with = "include_informational"
    )]
    pub suppress_informational: bool,

    // top procedures / top queries
    #[arg(long, help_heading = "Top N", help = "Result column to rank by, e.g. \"Average CPU\"")]
    pub order_by: Option<String>,

    #[arg(long, help_heading = "Top N")]
    pub row_limit: Option<u32>,

    // wait statistics
    #[arg(
        long = "exclude-wait-type",
        help_heading = "Wait statistics",
        help = "Replace the default ignore list (repeatable)"
    )]
    pub exclude_wait_types: Vec<String>,

    #[arg(
        long,
        help_heading = "Wait statistics",
        help = "Do not exclude any wait type",
        conflicts_with = "exclude_wait_types"
    )]
    pub no_wait_exclusion: bool,
}
