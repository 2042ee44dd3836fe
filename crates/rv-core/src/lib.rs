//! rv-core - Core library for Revchain
//!
//! This crate provides revision identifiers, schema edits, migration steps,
//! the migration chain engine, the executor and chain-state seams, an
//! in-memory schema catalog, configuration parsing, and step-file loading.

pub mod catalog;
pub mod chain;
pub mod config;
pub mod edit;
pub mod error;
pub mod executor;
pub mod loader;
pub mod project;
pub mod revision;
pub mod state;
pub mod step;

pub use catalog::Catalog;
pub use chain::{Direction, MigrationChain, MigrationPath, MigrationReport};
pub use config::{Config, Dialect};
pub use edit::{ColumnSpec, ColumnType, OnDelete, SchemaEdit};
pub use error::{ChainError, CoreError, ExecutorError, StateError, StepError};
pub use executor::SchemaExecutor;
pub use project::Project;
pub use revision::{display_revision, Revision};
pub use state::{ChainStateStore, MemoryStateStore};
pub use step::{MigrationStep, StepDefinition};
