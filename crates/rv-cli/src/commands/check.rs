//! Check command implementation
//!
//! Replays the chain on an in-memory [`Catalog`]: every step is applied,
//! then reverted on a copy, and the copy must match the schema from before
//! the step.

use anyhow::{Context, Result};
use rv_core::{Catalog, MemoryStateStore, MigrationChain};

use crate::cli::GlobalArgs;
use crate::context::load_project;

/// Outcome for one step
#[derive(Debug)]
pub(crate) struct StepCheck {
    pub revision: String,
    pub problem: Option<String>,
}

/// Replay every step up and back down, stopping only if an upgrade fails.
pub(crate) fn check_chain(chain: &MigrationChain) -> Result<Vec<StepCheck>> {
    let mut catalog = Catalog::new();
    let mut state = MemoryStateStore::new();
    let mut results = Vec::with_capacity(chain.len());

    for step in chain.history() {
        let before = catalog.clone();
        chain
            .apply(step, &mut catalog, &mut state)
            .with_context(|| format!("Upgrade of {} does not apply", step.revision()))?;

        let mut scratch = catalog.clone();
        let mut scratch_state = MemoryStateStore::at(Some(step.revision().clone()));
        let problem = match chain.revert(step, &mut scratch, &mut scratch_state) {
            Err(err) => Some(format!("downgrade fails: {err}")),
            Ok(()) if scratch != before => {
                Some("downgrade does not restore the previous schema".to_string())
            }
            Ok(()) => None,
        };
        results.push(StepCheck {
            revision: step.revision().to_string(),
            problem,
        });
    }
    Ok(results)
}

/// Execute the check command
pub(crate) fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let results = check_chain(&project.chain)?;

    let mut failures = 0;
    for result in &results {
        match &result.problem {
            None => println!("  ok      {}", result.revision),
            Some(problem) => {
                failures += 1;
                println!("  FAILED  {}: {}", result.revision, problem);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} step(s) are not reversible", failures, results.len());
    }
    println!("\nAll {} step(s) reversible", results.len());
    Ok(())
}

#[cfg(test)]
#[path = "check_test.rs"]
mod tests;
