//! Error types for rv-core

use crate::revision::{display_opt, Revision};
use thiserror::Error;

/// Errors raised while loading a project: configuration and step files.
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Versions directory not found
    #[error("[E003] Versions directory not found: {path}")]
    VersionsDirNotFound { path: String },

    /// E004: Step file could not be parsed
    #[error("[E004] Failed to parse step file {path}: {details}")]
    StepFileParse { path: String, details: String },

    /// E005: Step file parsed but the step is invalid
    #[error("[E005] Invalid step in {path}")]
    InvalidStep {
        path: String,
        #[source]
        source: StepError,
    },

    /// E006: Two step files declare the same revision
    #[error("[E006] Duplicate revision '{revision}' in {path1} and {path2}")]
    DuplicateStepFile {
        revision: String,
        path1: String,
        path2: String,
    },

    /// E007: Steps could not be linked into a chain
    #[error("[E007] Failed to build migration chain from {path}")]
    Registration {
        path: String,
        #[source]
        source: ChainError,
    },

    /// E008: Refusing to overwrite an existing step file
    #[error("[E008] Step file already exists: {path}")]
    StepFileExists { path: String },

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E015: YAML parse error
    #[error("[E015] YAML error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while constructing a [`crate::MigrationStep`] or one of
/// its edits, before it ever reaches the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// S001: Revision id is empty
    #[error("[S001] Revision id must not be empty")]
    EmptyRevision,

    /// S002: Step points at itself
    #[error("[S002] Revision {revision} lists itself as its down_revision")]
    SelfReference { revision: String },

    /// S003: NOT NULL column added without a default
    #[error("[S003] Column {table}.{column} is NOT NULL but has no default")]
    MissingDefault { table: String, column: String },

    /// S004: No downgrade given and an upgrade edit has no inverse
    #[error("[S004] Step {revision} has no downgrade and upgrade edit #{index} ({edit}) cannot be inverted")]
    Irreversible {
        revision: String,
        index: usize,
        edit: String,
    },

    /// S005: Downgrade drops a foreign key the upgrade never created
    #[error("[S005] Step {revision} drops foreign key '{dropped}' on {table}, but its upgrade creates {created}")]
    ConstraintNameMismatch {
        revision: String,
        table: String,
        dropped: String,
        created: String,
    },

    /// S006: Table created without columns
    #[error("[S006] Table {table} must have at least one column")]
    EmptyTable { table: String },

    /// S007: Column listed twice in one table definition
    #[error("[S007] Column {column} appears more than once in table {table}")]
    DuplicateColumn { table: String, column: String },
}

/// Failure reported by a [`crate::SchemaExecutor`].
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// X001: The edit is inconsistent with the current schema
    #[error("[X001] Edit rejected: {0}")]
    Rejected(String),

    /// X002: Backend failure with preserved source chain
    #[error("[X002] Executor backend failed: {message}")]
    Backend {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Failure reported by a [`crate::ChainStateStore`].
#[derive(Error, Debug)]
pub enum StateError {
    /// C001: Reading the current revision failed
    #[error("[C001] Failed to read chain state: {0}")]
    Read(String),

    /// C002: Persisting the current revision failed
    #[error("[C002] Failed to write chain state: {0}")]
    Write(String),

    /// C003: The store holds more than one current revision
    #[error("[C003] Chain state holds {count} revisions; expected at most one")]
    Corrupt { count: usize },
}

/// Result type alias for StateError
pub type StateResult<T> = Result<T, StateError>;

/// Errors raised by the [`crate::MigrationChain`] engine.
#[derive(Error, Debug)]
pub enum ChainError {
    /// R001: Revision registered twice
    #[error("[R001] Duplicate revision: {revision}")]
    DuplicateRevision { revision: Revision },

    /// R002: down_revision points at a revision that is not registered
    #[error("[R002] Revision {revision} references unknown down_revision {down_revision}")]
    DanglingReference {
        revision: Revision,
        down_revision: Revision,
    },

    /// R003: The two revisions are not on the same chain
    #[error("[R003] No path from {} to {}", display_opt(.from), display_opt(.to))]
    NoPath {
        from: Option<Revision>,
        to: Option<Revision>,
    },

    /// R004: An upgrade edit failed
    #[error("[R004] Failed to apply revision {revision}")]
    ApplyFailed {
        revision: Revision,
        #[source]
        source: ExecutorError,
    },

    /// R005: A downgrade edit failed
    #[error("[R005] Failed to revert revision {revision}")]
    RevertFailed {
        revision: Revision,
        #[source]
        source: ExecutorError,
    },

    /// R006: A second root was registered
    #[error("[R006] Revision {revision} is a second root; {existing} is already the root")]
    MultipleRoots {
        revision: Revision,
        existing: Revision,
    },

    /// R007: A parent would gain a second child
    #[error("[R007] Revision {revision} branches from {down_revision}, which already has child {existing_child}")]
    BranchedChain {
        revision: Revision,
        down_revision: Revision,
        existing_child: Revision,
    },

    /// R008: Chain state does not match what the operation expects
    #[error("[R008] Chain state is at {}, expected {}", display_opt(.found), display_opt(.expected))]
    OutOfOrder {
        expected: Option<Revision>,
        found: Option<Revision>,
    },

    /// R009: Target does not name any registered revision
    #[error("[R009] Unknown revision: {spec}")]
    UnknownRevision { spec: String },

    /// R010: Revision prefix matches more than one revision
    #[error("[R010] Revision prefix '{spec}' is ambiguous: {candidates}")]
    AmbiguousRevision { spec: String, candidates: String },

    /// R011: Relative target walks past base or head
    #[error("[R011] Relative target '{spec}' is out of range from {}", display_opt(.current))]
    RelativeOutOfRange {
        spec: String,
        current: Option<Revision>,
    },

    /// R012: Chain state store failed
    #[error("[R012] Chain state store failed")]
    State(#[from] StateError),

    /// R013: A migration stopped part-way; `reached` is what the store holds
    #[error("[R013] Migration halted after {completed} step(s); database is at revision {}", display_opt(.reached))]
    MigrationHalted {
        reached: Option<Revision>,
        completed: usize,
        #[source]
        source: Box<ChainError>,
    },
}

/// Result type alias for ChainError
pub type ChainResult<T> = Result<T, ChainError>;
