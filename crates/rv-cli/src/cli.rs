//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Revchain - ordered, reversible schema migrations
#[derive(Parser, Debug)]
#[command(name = "rv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override target (database connection)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new Revchain project
    Init(InitArgs),

    /// Create a new empty step on top of the current head
    Revision(RevisionArgs),

    /// Upgrade the database to a target revision
    Migrate(MigrateArgs),

    /// Downgrade the database to an earlier revision
    Rollback(RollbackArgs),

    /// Show the revision currently applied
    Current,

    /// List revisions from root to head
    History(HistoryArgs),

    /// Record a revision as applied without running its edits
    Stamp(StampArgs),

    /// Verify every step's downgrade undoes its upgrade
    Check,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name (also the directory created)
    pub name: String,

    /// Database file path written to the new config
    #[arg(long, default_value = "revchain.duckdb")]
    pub database_path: String,
}

/// Arguments for the revision command
#[derive(Args, Debug)]
pub struct RevisionArgs {
    /// Short description of the change
    #[arg(short, long)]
    pub message: String,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Target revision: head, an id, a unique prefix, or +N
    #[arg(id = "revision_target", value_name = "TARGET", default_value = "head")]
    pub target: String,

    /// Print the SQL instead of running it
    #[arg(long)]
    pub sql: bool,

    /// Revision an offline script starts from (default: base)
    #[arg(long, requires = "sql")]
    pub from: Option<String>,
}

/// Arguments for the rollback command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Target revision: base, an id, a unique prefix, or -N
    #[arg(id = "revision_target", value_name = "TARGET", allow_hyphen_values = true)]
    pub target: String,

    /// Print the SQL instead of running it
    #[arg(long)]
    pub sql: bool,

    /// Revision an offline script starts from (default: head)
    #[arg(long, requires = "sql")]
    pub from: Option<String>,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: HistoryOutput,
}

/// History output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the stamp command
#[derive(Args, Debug)]
pub struct StampArgs {
    /// Revision to record: base, head, an id, or a unique prefix
    #[arg(id = "revision_target", value_name = "TARGET")]
    pub target: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
