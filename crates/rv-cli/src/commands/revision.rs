//! Revision command implementation - scaffolds a new step file

use anyhow::{Context, Result};
use rv_core::loader::scaffold_step;

use crate::cli::{GlobalArgs, RevisionArgs};
use crate::context::load_project;

/// Execute the revision command
pub(crate) fn execute(args: &RevisionArgs, global: &GlobalArgs) -> Result<()> {
    if args.message.trim().is_empty() {
        anyhow::bail!("Revision message must not be empty");
    }

    let project = load_project(global)?;
    let head = project.chain.head().map(|step| step.revision().clone());
    let created = chrono::Local::now().naive_local();

    let (path, step) = scaffold_step(&project.versions_dir(), &args.message, head.as_ref(), created)
        .context("Failed to write step file")?;

    println!("Generating {} ... done", path.display());
    log::debug!(
        "New revision {} on top of {}",
        step.revision(),
        rv_core::display_revision(step.down_revision())
    );
    Ok(())
}
