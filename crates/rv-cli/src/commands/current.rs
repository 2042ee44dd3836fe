//! Current command implementation

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the current command
pub(crate) fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let current = ctx.current_revision()?;

    let Some(revision) = current else {
        println!("base");
        return Ok(());
    };

    let chain = &ctx.project.chain;
    match chain.get(&revision) {
        Some(step) => {
            let is_head = chain
                .head()
                .is_some_and(|head| head.revision() == step.revision());
            println!(
                "{}{} {}",
                revision,
                if is_head { " (head)" } else { "" },
                step.message()
            );
        }
        None => {
            anyhow::bail!(
                "Database is at revision {} which is not in {}",
                revision,
                ctx.project.versions_dir().display()
            );
        }
    }
    Ok(())
}
