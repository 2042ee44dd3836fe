//! Schema edits: the individual operations a migration step performs.

use crate::error::StepError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInteger,
    /// Variable-length string
    String,
    /// Unbounded text
    Text,
    /// Boolean
    Boolean,
    /// Double-precision float
    Float,
    /// Calendar date
    Date,
    /// Timestamp without time zone
    Timestamp,
    /// Timestamp with time zone
    #[serde(alias = "timestamp_tz")]
    Timestamptz,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "big_integer",
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Timestamptz => "timestamptz",
        };
        f.write_str(name)
    }
}

/// Referential action taken when a referenced row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Delete dependent rows
    Cascade,
    /// Null out the referencing column
    SetNull,
    /// Reset the referencing column to its default
    SetDefault,
    /// Refuse the delete
    Restrict,
    /// Database default behaviour (default)
    #[default]
    NoAction,
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sql = match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::SetDefault => "SET DEFAULT",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::NoAction => "NO ACTION",
        };
        f.write_str(sql)
    }
}

/// Definition of a single column.
///
/// `default` is an opaque SQL expression (`'TRUE'`, `now()`, `0`) handed to
/// the executor untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,

    /// Column data type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether NULL values are allowed (default: true)
    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Server-side default expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Whether the column is (part of) the primary key
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
}

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ColumnSpec {
    /// A nullable column without a default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
            primary_key: false,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the server default expression.
    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Mark the column as primary key (implies NOT NULL).
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
}

/// One schema change.
///
/// Serialized externally tagged with snake_case names, e.g.
/// `add_column: { table: posts, column: { name: content, type: text } }`.
/// serde_yaml reads plain enums as YAML tags, so YAML callers go through
/// `serde_yaml::with::singleton_map_recursive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum SchemaEdit {
    /// Create a table with the given columns
    CreateTable {
        table: String,
        columns: Vec<ColumnSpec>,
    },

    /// Drop a table
    DropTable { table: String },

    /// Add a column to an existing table
    AddColumn { table: String, column: ColumnSpec },

    /// Drop a column
    DropColumn { table: String, column: String },

    /// Add a named foreign key constraint
    AddForeignKey {
        name: String,
        table: String,
        column: String,
        referenced_table: String,
        referenced_column: String,
        #[serde(default)]
        on_delete: OnDelete,
    },

    /// Drop a named foreign key constraint
    DropForeignKey { name: String, table: String },
}

impl SchemaEdit {
    /// Build a validated `AddColumn` edit.
    pub fn add_column(table: impl Into<String>, column: ColumnSpec) -> Result<Self, StepError> {
        let edit = SchemaEdit::AddColumn {
            table: table.into(),
            column,
        };
        edit.validate()?;
        Ok(edit)
    }

    /// Build a validated `CreateTable` edit.
    pub fn create_table(
        table: impl Into<String>,
        columns: Vec<ColumnSpec>,
    ) -> Result<Self, StepError> {
        let edit = SchemaEdit::CreateTable {
            table: table.into(),
            columns,
        };
        edit.validate()?;
        Ok(edit)
    }

    /// Table the edit targets.
    pub fn table(&self) -> &str {
        match self {
            SchemaEdit::CreateTable { table, .. }
            | SchemaEdit::DropTable { table }
            | SchemaEdit::AddColumn { table, .. }
            | SchemaEdit::DropColumn { table, .. }
            | SchemaEdit::AddForeignKey { table, .. }
            | SchemaEdit::DropForeignKey { table, .. } => table,
        }
    }

    /// Structural checks that do not depend on the live schema.
    ///
    /// A NOT NULL column added to an existing table needs a default, since
    /// the table may already hold rows.
    pub fn validate(&self) -> Result<(), StepError> {
        match self {
            SchemaEdit::AddColumn { table, column } => {
                if !column.nullable && column.default.is_none() {
                    return Err(StepError::MissingDefault {
                        table: table.clone(),
                        column: column.name.clone(),
                    });
                }
                Ok(())
            }
            SchemaEdit::CreateTable { table, columns } => {
                if columns.is_empty() {
                    return Err(StepError::EmptyTable {
                        table: table.clone(),
                    });
                }
                let mut seen = HashSet::new();
                for column in columns {
                    if !seen.insert(column.name.as_str()) {
                        return Err(StepError::DuplicateColumn {
                            table: table.clone(),
                            column: column.name.clone(),
                        });
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The edit that exactly undoes this one, if it can be derived.
    ///
    /// Drops carry no definition of what they remove, so they have no
    /// inverse.
    pub fn inverse(&self) -> Option<SchemaEdit> {
        match self {
            SchemaEdit::CreateTable { table, .. } => Some(SchemaEdit::DropTable {
                table: table.clone(),
            }),
            SchemaEdit::AddColumn { table, column } => Some(SchemaEdit::DropColumn {
                table: table.clone(),
                column: column.name.clone(),
            }),
            SchemaEdit::AddForeignKey { name, table, .. } => Some(SchemaEdit::DropForeignKey {
                name: name.clone(),
                table: table.clone(),
            }),
            SchemaEdit::DropTable { .. }
            | SchemaEdit::DropColumn { .. }
            | SchemaEdit::DropForeignKey { .. } => None,
        }
    }
}

impl fmt::Display for SchemaEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaEdit::CreateTable { table, columns } => {
                write!(f, "create table {} ({} columns)", table, columns.len())
            }
            SchemaEdit::DropTable { table } => write!(f, "drop table {}", table),
            SchemaEdit::AddColumn { table, column } => {
                write!(f, "add column {}.{}", table, column.name)
            }
            SchemaEdit::DropColumn { table, column } => {
                write!(f, "drop column {}.{}", table, column)
            }
            SchemaEdit::AddForeignKey {
                name,
                table,
                column,
                referenced_table,
                referenced_column,
                ..
            } => write!(
                f,
                "add foreign key {} ({}.{} -> {}.{})",
                name, table, column, referenced_table, referenced_column
            ),
            SchemaEdit::DropForeignKey { name, table } => {
                write!(f, "drop foreign key {} on {}", name, table)
            }
        }
    }
}

#[cfg(test)]
#[path = "edit_test.rs"]
mod tests;
