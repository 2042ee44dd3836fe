//! History command implementation

use anyhow::Result;
use rv_core::{display_revision, MigrationStep, Revision};

use crate::cli::{GlobalArgs, HistoryArgs, HistoryOutput};
use crate::context::RuntimeContext;

/// One row of history output
#[derive(Debug, serde::Serialize)]
struct StepInfo {
    revision: String,
    down_revision: Option<String>,
    message: String,
    create_date: Option<String>,
    current: bool,
    head: bool,
}

impl StepInfo {
    fn from_step(step: &MigrationStep, current: Option<&Revision>, head: bool) -> Self {
        Self {
            revision: step.revision().to_string(),
            down_revision: step.down_revision().map(|r| r.to_string()),
            message: step.message().to_string(),
            create_date: step
                .create_date()
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
            current: current == Some(step.revision()),
            head,
        }
    }
}

/// Execute the history command
pub(crate) fn execute(args: &HistoryArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let current = ctx.current_revision()?;

    let history = ctx.project.chain.history();
    let last = history.len().saturating_sub(1);
    let rows: Vec<StepInfo> = history
        .iter()
        .enumerate()
        .map(|(i, step)| StepInfo::from_step(step, current.as_ref(), i == last))
        .collect();

    match args.output {
        HistoryOutput::Table => print_table(&rows, current.as_ref()),
        HistoryOutput::Json => {
            let json = serde_json::to_string_pretty(&rows)?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Print steps in table format, root first
fn print_table(rows: &[StepInfo], current: Option<&Revision>) {
    if rows.is_empty() {
        println!("No revisions found.");
        return;
    }

    let rev_width = rows
        .iter()
        .map(|r| r.revision.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let date_width = 19;

    println!(
        "  {:<rev_width$}  {:<rev_width$}  {:<date_width$}  MESSAGE",
        "REVISION", "PARENT", "CREATED",
    );
    println!(
        "  {:-<rev_width$}  {:-<rev_width$}  {:-<date_width$}  {}",
        "",
        "",
        "",
        "-".repeat(40),
    );

    for row in rows {
        let marker = if row.current { "*" } else { " " };
        let parent = row.down_revision.as_deref().unwrap_or("base");
        let date = row.create_date.as_deref().unwrap_or("-");
        let head = if row.head { " (head)" } else { "" };
        println!(
            "{marker} {:<rev_width$}  {:<rev_width$}  {:<date_width$}  {}{head}",
            row.revision, parent, date, row.message,
        );
    }

    println!();
    println!(
        "{} revision(s); current: {}",
        rows.len(),
        display_revision(current)
    );
}
