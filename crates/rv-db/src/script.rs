//! Offline mode: collect the SQL a migration would run instead of running it.
//!
//! [`SqlScript`] hands out an executor and a state store that both append to
//! the same buffer, so the version-table updates land between the DDL of the
//! steps they record.

use crate::ddl::{quote_ident, quote_literal, render};
use rv_core::error::StateResult;
use rv_core::{
    display_revision, ChainStateStore, Dialect, ExecutorError, Revision, SchemaEdit,
    SchemaExecutor,
};
use std::cell::RefCell;

/// Buffer of rendered statements
#[derive(Debug)]
pub struct SqlScript {
    dialect: Dialect,
    version_table: String,
    statements: RefCell<Vec<String>>,
}

impl SqlScript {
    /// Empty script for `dialect`, recording state in `version_table`.
    pub fn new(dialect: Dialect, version_table: impl Into<String>) -> Self {
        Self {
            dialect,
            version_table: version_table.into(),
            statements: RefCell::new(Vec::new()),
        }
    }

    /// Dialect the script is rendered in
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Append a `--` comment line.
    pub fn comment(&self, text: &str) {
        self.statements.borrow_mut().push(format!("-- {text}"));
    }

    /// Executor that renders edits into this script.
    pub fn executor(&self) -> ScriptExecutor<'_> {
        ScriptExecutor { script: self }
    }

    /// State store that starts at `current` and renders every write.
    ///
    /// Emits the version table's CREATE statement first.
    pub fn state_store(&self, current: Option<Revision>) -> ScriptStateStore<'_> {
        self.push(format!(
            "CREATE TABLE IF NOT EXISTS {} (version_num VARCHAR NOT NULL)",
            quote_ident(&self.version_table)
        ));
        ScriptStateStore {
            script: self,
            current,
        }
    }

    /// Statements collected so far
    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    /// The whole script, one statement per line, each `;`-terminated.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for stmt in self.statements.borrow().iter() {
            out.push_str(stmt);
            if !stmt.starts_with("--") {
                out.push(';');
            }
            out.push('\n');
        }
        out
    }

    fn push(&self, statement: String) {
        self.statements.borrow_mut().push(statement);
    }
}

/// Renders edits into a [`SqlScript`]; never fails.
pub struct ScriptExecutor<'a> {
    script: &'a SqlScript,
}

impl SchemaExecutor for ScriptExecutor<'_> {
    fn execute(&mut self, edit: &SchemaEdit) -> Result<(), ExecutorError> {
        self.script.comment(&edit.to_string());
        for sql in render(edit, self.script.dialect) {
            self.script.push(sql);
        }
        Ok(())
    }

    fn executor_type(&self) -> &'static str {
        "sql-script"
    }
}

/// Tracks the state in memory and renders each write as SQL.
pub struct ScriptStateStore<'a> {
    script: &'a SqlScript,
    current: Option<Revision>,
}

impl ChainStateStore for ScriptStateStore<'_> {
    fn current(&self) -> StateResult<Option<Revision>> {
        Ok(self.current.clone())
    }

    fn set(&mut self, revision: Option<&Revision>) -> StateResult<()> {
        let table = quote_ident(&self.script.version_table);
        self.script
            .comment(&format!("state -> {}", display_revision(revision)));
        self.script.push(format!("DELETE FROM {table}"));
        if let Some(revision) = revision {
            self.script.push(format!(
                "INSERT INTO {table} (version_num) VALUES ({})",
                quote_literal(revision.as_str())
            ));
        }
        self.current = revision.cloned();
        Ok(())
    }
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
