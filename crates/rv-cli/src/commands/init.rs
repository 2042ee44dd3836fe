//! Init command implementation - scaffolds a new Revchain project

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cli::InitArgs;

/// Execute the init command
pub(crate) fn execute(args: &InitArgs) -> Result<()> {
    // Reject names that could cause path traversal or confusing directory names
    if args.name.contains('/')
        || args.name.contains('\\')
        || args.name.contains("..")
        || args.name.starts_with('.')
        || args.name.starts_with('-')
    {
        anyhow::bail!(
            "Invalid project name '{}': must not contain '/', '\\', '..', or start with '.' or '-'",
            args.name
        );
    }

    let project_dir = Path::new(&args.name);

    if project_dir.exists() {
        anyhow::bail!(
            "Directory '{}' already exists. Choose a different project name.",
            args.name
        );
    }

    println!("Creating new Revchain project: {}\n", args.name);

    let versions_dir = project_dir.join("versions");
    fs::create_dir_all(&versions_dir)
        .with_context(|| format!("Failed to create directory: {}", versions_dir.display()))?;

    // Escape YAML special characters in interpolated values
    let safe_name = args.name.replace('"', "\\\"");
    let safe_db_path = args.database_path.replace('"', "\\\"");
    let config_content = format!(
        r#"name: "{name}"

versions_path: versions
version_table: rv_version
dialect: duckdb

database:
  path: "{db_path}"

# targets:
#   prod:
#     database:
#       path: "/var/lib/app/prod.duckdb"
"#,
        name = safe_name,
        db_path = safe_db_path,
    );
    fs::write(project_dir.join("revchain.yml"), config_content)
        .context("Failed to write revchain.yml")?;

    println!("  revchain.yml");
    println!("  versions/");
    println!("\nNext: cd {} && rv revision -m \"create first table\"", args.name);
    Ok(())
}
