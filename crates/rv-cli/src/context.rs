//! Runtime context for CLI commands

use anyhow::{Context, Result};
use rv_core::{ChainStateStore, Config, Project, Revision};
use rv_db::{DuckDbBackend, DuckDbStateStore};
use std::path::Path;

use crate::cli::GlobalArgs;

/// Load the project, honouring `--config` when given.
pub(crate) fn load_project(args: &GlobalArgs) -> Result<Project> {
    let project_path = Path::new(&args.project_dir);
    match &args.config {
        Some(config_path) => {
            let config =
                Config::load(Path::new(config_path)).context("Failed to load configuration file")?;
            Project::with_config(project_path, config).context("Failed to load project")
        }
        None => Project::load(project_path).context("Failed to load project"),
    }
}

/// Runtime context containing loaded project and database connection
pub(crate) struct RuntimeContext {
    /// The loaded project
    pub project: Project,

    /// Database connection
    pub db: DuckDbBackend,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let project = load_project(args)?;

        let target = Config::resolve_target(args.target.as_deref());
        let db_config = project
            .config
            .get_database_config(target.as_deref())
            .context("Failed to resolve database target")?;
        log::debug!(
            "Connecting to {} (target: {})",
            db_config.path,
            target.as_deref().unwrap_or("default")
        );

        let db_path = if db_config.path == ":memory:" || Path::new(&db_config.path).is_absolute()
        {
            db_config.path.clone()
        } else {
            project.root.join(&db_config.path).display().to_string()
        };
        let db = DuckDbBackend::new(&db_path).context("Failed to connect to database")?;

        Ok(Self { project, db })
    }

    /// Open the version table
    pub fn state_store(&self) -> Result<DuckDbStateStore<'_>> {
        self.db
            .state_store(&self.project.config.version_table)
            .context("Failed to open version table")
    }

    /// Read the applied revision without creating the version table.
    ///
    /// A database that was never migrated reads as base.
    pub fn current_revision(&self) -> Result<Option<Revision>> {
        let store = self
            .db
            .existing_state_store(&self.project.config.version_table)
            .context("Failed to open version table")?;
        match store {
            Some(store) => store
                .current()
                .context("Failed to read the current revision"),
            None => Ok(None),
        }
    }
}
