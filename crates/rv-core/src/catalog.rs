//! In-memory schema model.
//!
//! [`Catalog`] tracks tables, columns, and foreign keys and applies
//! [`SchemaEdit`]s with the checks a real database would make. It backs
//! `rv check` and the round-trip tests: two catalogs compare equal when they
//! describe the same logical schema, regardless of column order.

use crate::edit::{ColumnSpec, OnDelete, SchemaEdit};
use crate::error::ExecutorError;
use crate::executor::SchemaExecutor;
use std::collections::BTreeMap;

/// A foreign key as recorded in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// Referencing column on the owning table
    pub column: String,
    /// Referenced table
    pub referenced_table: String,
    /// Referenced column
    pub referenced_column: String,
    /// Delete action
    pub on_delete: OnDelete,
}

/// One table: columns and foreign keys, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDef {
    /// Columns by name
    pub columns: BTreeMap<String, ColumnSpec>,
    /// Foreign keys by constraint name
    pub foreign_keys: BTreeMap<String, ForeignKeyDef>,
}

/// In-memory schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    tables: BTreeMap<String, TableDef>,
}

fn rejected(msg: String) -> ExecutorError {
    ExecutorError::Rejected(msg)
}

impl Catalog {
    /// Empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a table
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Whether `table.column` exists
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|t| t.columns.contains_key(column))
    }

    /// Whether a foreign key named `name` exists on `table`
    pub fn has_foreign_key(&self, table: &str, name: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|t| t.foreign_keys.contains_key(name))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut TableDef, ExecutorError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| rejected(format!("table {name} does not exist")))
    }

    /// Foreign keys on other tables that point at `table` (optionally at one column).
    fn inbound_references(&self, table: &str, column: Option<&str>) -> Option<String> {
        self.tables.iter().find_map(|(owner, def)| {
            def.foreign_keys.iter().find_map(|(name, fk)| {
                let hit = fk.referenced_table == table
                    && column.map_or(true, |c| fk.referenced_column == c)
                    && !(owner == table && column.is_none());
                hit.then(|| format!("{owner}.{name}"))
            })
        })
    }

    /// Apply one edit, rejecting anything inconsistent with the current schema.
    pub fn apply(&mut self, edit: &SchemaEdit) -> Result<(), ExecutorError> {
        match edit {
            SchemaEdit::CreateTable { table, columns } => {
                if self.tables.contains_key(table) {
                    return Err(rejected(format!("table {table} already exists")));
                }
                let mut def = TableDef::default();
                for column in columns {
                    if def
                        .columns
                        .insert(column.name.clone(), column.clone())
                        .is_some()
                    {
                        return Err(rejected(format!(
                            "column {} listed twice in table {table}",
                            column.name
                        )));
                    }
                }
                self.tables.insert(table.clone(), def);
            }
            SchemaEdit::DropTable { table } => {
                if !self.tables.contains_key(table) {
                    return Err(rejected(format!("table {table} does not exist")));
                }
                if let Some(fk) = self.inbound_references(table, None) {
                    return Err(rejected(format!(
                        "table {table} is referenced by foreign key {fk}"
                    )));
                }
                self.tables.remove(table);
            }
            SchemaEdit::AddColumn { table, column } => {
                let def = self.table_mut(table)?;
                if def.columns.contains_key(&column.name) {
                    return Err(rejected(format!(
                        "column {table}.{} already exists",
                        column.name
                    )));
                }
                def.columns.insert(column.name.clone(), column.clone());
            }
            SchemaEdit::DropColumn { table, column } => {
                if let Some(fk) = self.inbound_references(table, Some(column.as_str())) {
                    return Err(rejected(format!(
                        "column {table}.{column} is referenced by foreign key {fk}"
                    )));
                }
                let def = self.table_mut(table)?;
                if let Some(name) = def
                    .foreign_keys
                    .iter()
                    .find_map(|(name, fk)| (fk.column == *column).then_some(name))
                {
                    return Err(rejected(format!(
                        "column {table}.{column} is used by foreign key {name}"
                    )));
                }
                if def.columns.remove(column).is_none() {
                    return Err(rejected(format!("column {table}.{column} does not exist")));
                }
            }
            SchemaEdit::AddForeignKey {
                name,
                table,
                column,
                referenced_table,
                referenced_column,
                on_delete,
            } => {
                if !self.has_column(referenced_table, referenced_column) {
                    return Err(rejected(format!(
                        "referenced column {referenced_table}.{referenced_column} does not exist"
                    )));
                }
                let def = self.table_mut(table)?;
                if !def.columns.contains_key(column) {
                    return Err(rejected(format!("column {table}.{column} does not exist")));
                }
                if def.foreign_keys.contains_key(name) {
                    return Err(rejected(format!(
                        "constraint {name} already exists on {table}"
                    )));
                }
                def.foreign_keys.insert(
                    name.clone(),
                    ForeignKeyDef {
                        column: column.clone(),
                        referenced_table: referenced_table.clone(),
                        referenced_column: referenced_column.clone(),
                        on_delete: *on_delete,
                    },
                );
            }
            SchemaEdit::DropForeignKey { name, table } => {
                let def = self.table_mut(table)?;
                if def.foreign_keys.remove(name).is_none() {
                    return Err(rejected(format!(
                        "constraint {name} does not exist on {table}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl SchemaExecutor for Catalog {
    fn execute(&mut self, edit: &SchemaEdit) -> Result<(), ExecutorError> {
        self.apply(edit)
    }

    fn executor_type(&self) -> &'static str {
        "catalog"
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
