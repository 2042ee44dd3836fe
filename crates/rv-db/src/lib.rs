//! rv-db - Database layer for Revchain
//!
//! This crate renders schema edits as DDL and provides the DuckDB
//! executor and version-table state store, plus an offline SQL-script
//! executor for `--sql` runs.

pub mod ddl;
pub mod duckdb;
pub mod error;
pub mod script;

pub use self::duckdb::{DuckDbBackend, DuckDbExecutor, DuckDbStateStore};
pub use error::{DbError, DbResult};
pub use script::{ScriptExecutor, ScriptStateStore, SqlScript};
