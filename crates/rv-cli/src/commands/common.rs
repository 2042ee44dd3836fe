//! Shared helpers for the migrate and rollback commands.

use anyhow::{Context, Result};
use rv_core::{display_revision, ChainStateStore, Direction, MigrationChain, Revision};
use rv_db::SqlScript;

use crate::cli::GlobalArgs;
use crate::context::{load_project, RuntimeContext};

/// Refuse a non-empty path that goes the wrong way for the command.
fn ensure_direction(
    chain: &MigrationChain,
    from: Option<&Revision>,
    to: Option<&Revision>,
    expected: Direction,
) -> Result<bool> {
    let path = chain.resolve_path(from, to)?;
    if path.is_empty() {
        return Ok(false);
    }
    if path.direction != expected {
        let hint = match expected {
            Direction::Upgrade => "use `rv rollback` to move back",
            Direction::Downgrade => "use `rv migrate` to move forward",
        };
        anyhow::bail!(
            "Target {} is a {} from {}; {}",
            display_revision(to),
            path.direction,
            display_revision(from),
            hint
        );
    }
    Ok(true)
}

/// Move the live database to `target_spec`.
pub(crate) fn run_online(global: &GlobalArgs, target_spec: &str, expected: Direction) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let chain = &ctx.project.chain;
    let mut store = ctx.state_store()?;

    let current = store
        .current()
        .context("Failed to read the current revision")?;
    let target = chain.resolve_target(target_spec, current.as_ref())?;

    if !ensure_direction(chain, current.as_ref(), target.as_ref(), expected)? {
        println!("Already at {}", display_revision(current.as_ref()));
        return Ok(());
    }

    let mut executor = ctx.db.executor();
    let report = chain
        .migrate(current.as_ref(), target.as_ref(), &mut executor, &mut store)
        .with_context(|| {
            format!(
                "Failed to {} {} -> {}",
                expected,
                display_revision(current.as_ref()),
                display_revision(target.as_ref())
            )
        })?;

    println!(
        "{} {} step(s); now at {}",
        match report.direction {
            Direction::Upgrade => "Applied",
            Direction::Downgrade => "Reverted",
        },
        report.completed.len(),
        display_revision(report.reached.as_ref())
    );
    Ok(())
}

/// Print the SQL that would move the schema from `from_spec` to
/// `target_spec`, without connecting to the database.
pub(crate) fn run_offline(
    global: &GlobalArgs,
    from_spec: &str,
    target_spec: &str,
    expected: Direction,
) -> Result<()> {
    let project = load_project(global)?;
    let chain = &project.chain;

    let from = chain.resolve_target(from_spec, None)?;
    let target = chain.resolve_target(target_spec, from.as_ref())?;
    if !ensure_direction(chain, from.as_ref(), target.as_ref(), expected)? {
        return Ok(());
    }

    let script = SqlScript::new(project.config.dialect, project.config.version_table.clone());
    script.comment(&format!(
        "{} {} -> {} ({})",
        expected,
        display_revision(from.as_ref()),
        display_revision(target.as_ref()),
        script.dialect()
    ));
    let mut store = script.state_store(from.clone());
    let mut executor = script.executor();
    chain.migrate(from.as_ref(), target.as_ref(), &mut executor, &mut store)?;

    print!("{}", script.to_sql());
    Ok(())
}
