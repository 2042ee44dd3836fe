//! Revchain CLI - apply and roll back ordered, reversible schema migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::{check, current, history, init, migrate, revision, rollback, stamp};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match &cli.command {
        cli::Commands::Init(args) => init::execute(args),
        cli::Commands::Revision(args) => revision::execute(args, &cli.global),
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global),
        cli::Commands::Rollback(args) => rollback::execute(args, &cli.global),
        cli::Commands::Current => current::execute(&cli.global),
        cli::Commands::History(args) => history::execute(args, &cli.global),
        cli::Commands::Stamp(args) => stamp::execute(args, &cli.global),
        cli::Commands::Check => check::execute(&cli.global),
    }
}
