//! Project loading: configuration plus the migration chain it points at.

use crate::chain::MigrationChain;
use crate::config::Config;
use crate::error::CoreResult;
use crate::loader::load_chain;
use std::path::{Path, PathBuf};

/// A loaded Revchain project
#[derive(Debug)]
pub struct Project {
    /// Project root directory
    pub root: PathBuf,

    /// Project configuration
    pub config: Config,

    /// Registered migration steps
    pub chain: MigrationChain,
}

impl Project {
    /// Load a project from a directory containing revchain.yml
    pub fn load(root: &Path) -> CoreResult<Self> {
        let config = Config::load_from_dir(root)?;
        Self::with_config(root, config)
    }

    /// Load a project using an already-parsed configuration
    pub fn with_config(root: &Path, config: Config) -> CoreResult<Self> {
        let versions_dir = config.versions_path_absolute(root);
        let chain = load_chain(&versions_dir)?;
        log::debug!(
            "Loaded project '{}' with {} revision(s) from {}",
            config.name,
            chain.len(),
            versions_dir.display()
        );
        Ok(Self {
            root: root.to_path_buf(),
            config,
            chain,
        })
    }

    /// Absolute path of the versions directory
    pub fn versions_dir(&self) -> PathBuf {
        self.config.versions_path_absolute(&self.root)
    }
}
