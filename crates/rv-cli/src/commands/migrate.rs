//! Migrate command implementation

use anyhow::Result;
use rv_core::Direction;

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{run_offline, run_online};

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    if args.sql {
        let from = args.from.as_deref().unwrap_or("base");
        run_offline(global, from, &args.target, Direction::Upgrade)
    } else {
        run_online(global, &args.target, Direction::Upgrade)
    }
}
