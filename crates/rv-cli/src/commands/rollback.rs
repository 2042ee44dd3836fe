//! Rollback command implementation

use anyhow::Result;
use rv_core::Direction;

use crate::cli::{GlobalArgs, RollbackArgs};
use crate::commands::common::{run_offline, run_online};

/// Execute the rollback command
pub(crate) fn execute(args: &RollbackArgs, global: &GlobalArgs) -> Result<()> {
    if args.sql {
        let from = args.from.as_deref().unwrap_or("head");
        run_offline(global, from, &args.target, Direction::Downgrade)
    } else {
        run_online(global, &args.target, Direction::Downgrade)
    }
}
