use clap::{Parser, Subcommand};

/// Diagnostic log storage engine
#[derive(Debug, Parser)]
#[command(name = "logvault", version, about = "Diagnostic log storage engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the storage server
    Serve,
    /// Search stored log records
    Search(SearchArgs),
    /// Show recently updated application statuses
    Statuses(StatusesArgs),
    /// Run partition maintenance once and exit
    Maintain(MaintainArgs),
    /// Configuration inspection
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Print version information
    Version,
}

#[derive(Debug, Clone, Parser)]
pub struct SearchArgs {
    /// Application path; omit to search across all applications
    #[arg(short, long)]
    pub application: Option<String>,

    /// Acceptable levels (repeatable), e.g. --level error --level fatal
    #[arg(short, long)]
    pub level: Vec<String>,

    /// Filter by server name
    #[arg(short, long)]
    pub server: Option<String>,

    /// Exact match on the stored url field
    #[arg(long)]
    pub url: Option<String>,

    /// Substring match on the message field
    #[arg(short, long)]
    pub grep: Option<String>,

    /// Search this many minutes back from now
    #[arg(long, default_value = "60")]
    pub since_minutes: i64,

    /// Maximum number of results
    #[arg(long, default_value = "100")]
    pub limit: usize,

    /// Result offset for pagination
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Clone, Parser)]
pub struct StatusesArgs {
    /// Show statuses updated within this many minutes
    #[arg(long, default_value = "5")]
    pub since_minutes: i64,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Clone, Parser)]
pub struct MaintainArgs {
    /// Override the configured retention in days (0 = retain forever)
    #[arg(long)]
    pub keep_days: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Validate the configuration and exit
    Validate,
}
