//! Configuration types and parsing for revchain.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file names searched for in a project directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["revchain.yml", "revchain.yaml"];

/// Environment variable naming the active target
pub const TARGET_ENV_VAR: &str = "REVCHAIN_TARGET";

/// Main project configuration from revchain.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory holding step files
    #[serde(default = "default_versions_path")]
    pub versions_path: String,

    /// Table that records the current revision
    #[serde(default = "default_version_table")]
    pub version_table: String,

    /// SQL dialect used when rendering offline (`--sql`) scripts
    #[serde(default)]
    pub dialect: Dialect,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// DuckDB SQL dialect
    #[default]
    DuckDb,
    /// PostgreSQL dialect
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_versions_path() -> String {
    "versions".to_string()
}

fn default_version_table() -> String {
    "rv_version".to_string()
}

impl Config {
    /// Minimal configuration with every default applied
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions_path: default_versions_path(),
            version_table: default_version_table(),
            dialect: Dialect::default(),
            database: DatabaseConfig::default(),
            targets: HashMap::new(),
        }
    }

    /// Read, parse, and validate a config file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `revchain.yml` (or `revchain.yaml`) from a project directory
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Path of the config file in `dir`, if one exists
    pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.versions_path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "versions_path cannot be empty".to_string(),
            });
        }

        let table_ok = self.version_table.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !table_ok {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "version_table '{}' must be an identifier, optionally schema-qualified",
                    self.version_table
                ),
            });
        }

        Ok(())
    }

    /// Get absolute versions path relative to a project root
    pub fn versions_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.versions_path)
    }

    /// Target names, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Database settings for `target`, or the top-level `database` block
    /// when no target is selected or the target does not override it.
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        let Some(name) = target else {
            return Ok(self.database.clone());
        };
        let Some(target_config) = self.targets.get(name) else {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "Target '{}' not found. Available targets: {}",
                    name,
                    self.available_targets().join(", ")
                ),
            });
        };
        Ok(target_config
            .database
            .as_ref()
            .unwrap_or(&self.database)
            .clone())
    }

    /// Resolve target from CLI flag or REVCHAIN_TARGET environment variable
    ///
    /// Priority: CLI flag > REVCHAIN_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
