//! Stamp command implementation

use anyhow::{Context, Result};
use rv_core::{display_revision, ChainStateStore};

use crate::cli::{GlobalArgs, StampArgs};
use crate::context::RuntimeContext;

/// Execute the stamp command
pub(crate) fn execute(args: &StampArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let chain = &ctx.project.chain;
    let mut store = ctx.state_store()?;

    let current = store
        .current()
        .context("Failed to read the current revision")?;
    let target = chain.resolve_target(&args.target, current.as_ref())?;
    chain.stamp(target.as_ref(), &mut store)?;

    println!(
        "Stamped {} -> {}",
        display_revision(current.as_ref()),
        display_revision(target.as_ref())
    );
    Ok(())
}
