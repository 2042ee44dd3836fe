//! The schema-edit executor seam.

use crate::edit::SchemaEdit;
use crate::error::ExecutorError;

/// Applies one [`SchemaEdit`] to a live (or simulated) schema.
///
/// Owns whatever connection or transaction handling the backend needs, and
/// any timeouts. Executors are driven one edit at a time and must report a
/// failure instead of silently skipping an edit.
pub trait SchemaExecutor {
    /// Execute a single edit.
    fn execute(&mut self, edit: &SchemaEdit) -> Result<(), ExecutorError>;

    /// Executor type identifier for logging
    fn executor_type(&self) -> &'static str;
}
