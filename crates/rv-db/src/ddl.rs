//! Rendering of schema edits as DDL statements.

use rv_core::{ColumnSpec, ColumnType, Dialect, OnDelete, SchemaEdit};

/// Quote an identifier, quoting each part of a dotted name separately.
pub fn quote_ident(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// SQL type name for a column type in the given dialect
pub fn column_type_sql(column_type: ColumnType, dialect: Dialect) -> &'static str {
    match (column_type, dialect) {
        (ColumnType::Integer, _) => "INTEGER",
        (ColumnType::BigInteger, _) => "BIGINT",
        (ColumnType::String, _) => "VARCHAR",
        (ColumnType::Text, _) => "TEXT",
        (ColumnType::Boolean, _) => "BOOLEAN",
        (ColumnType::Float, Dialect::DuckDb) => "DOUBLE",
        (ColumnType::Float, Dialect::Postgres) => "DOUBLE PRECISION",
        (ColumnType::Date, _) => "DATE",
        (ColumnType::Timestamp, _) => "TIMESTAMP",
        (ColumnType::Timestamptz, Dialect::DuckDb) => "TIMESTAMPTZ",
        (ColumnType::Timestamptz, Dialect::Postgres) => "TIMESTAMP WITH TIME ZONE",
    }
}

/// Column definition as it appears inside CREATE TABLE.
///
/// Primary keys are emitted as a table constraint, so they are skipped here.
fn column_def(column: &ColumnSpec, dialect: Dialect) -> String {
    let mut sql = format!(
        "{} {}",
        quote_ident(&column.name),
        column_type_sql(column.column_type, dialect)
    );
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }
    if !column.nullable && !column.primary_key {
        sql.push_str(" NOT NULL");
    }
    sql
}

fn render_create_table(table: &str, columns: &[ColumnSpec], dialect: Dialect) -> String {
    let mut parts: Vec<String> = columns.iter().map(|c| column_def(c, dialect)).collect();
    let keys: Vec<String> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| quote_ident(&c.name))
        .collect();
    if !keys.is_empty() {
        parts.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }
    format!(
        "CREATE TABLE {} (\n    {}\n)",
        quote_ident(table),
        parts.join(",\n    ")
    )
}

fn render_add_column(table: &str, column: &ColumnSpec, dialect: Dialect) -> Vec<String> {
    let table = quote_ident(table);
    let name = quote_ident(&column.name);
    let ty = column_type_sql(column.column_type, dialect);
    let default = column
        .default
        .as_deref()
        .map(|d| format!(" DEFAULT {d}"))
        .unwrap_or_default();

    match dialect {
        Dialect::Postgres => {
            let not_null = if column.nullable { "" } else { " NOT NULL" };
            vec![format!(
                "ALTER TABLE {table} ADD COLUMN {name} {ty}{default}{not_null}"
            )]
        }
        // DuckDB refuses constraints on ADD COLUMN; the NOT NULL goes on
        // afterwards, once the default has filled existing rows.
        Dialect::DuckDb => {
            let mut stmts = vec![format!("ALTER TABLE {table} ADD COLUMN {name} {ty}{default}")];
            if !column.nullable {
                stmts.push(format!("ALTER TABLE {table} ALTER COLUMN {name} SET NOT NULL"));
            }
            stmts
        }
    }
}

/// Render one edit as the statements that perform it, in order.
pub fn render(edit: &SchemaEdit, dialect: Dialect) -> Vec<String> {
    match edit {
        SchemaEdit::CreateTable { table, columns } => {
            vec![render_create_table(table, columns, dialect)]
        }
        SchemaEdit::DropTable { table } => vec![format!("DROP TABLE {}", quote_ident(table))],
        SchemaEdit::AddColumn { table, column } => render_add_column(table, column, dialect),
        SchemaEdit::DropColumn { table, column } => vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(table),
            quote_ident(column)
        )],
        SchemaEdit::AddForeignKey {
            name,
            table,
            column,
            referenced_table,
            referenced_column,
            on_delete,
        } => {
            let mut sql = format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_ident(table),
                quote_ident(name),
                quote_ident(column),
                quote_ident(referenced_table),
                quote_ident(referenced_column)
            );
            if *on_delete != OnDelete::NoAction {
                sql.push_str(&format!(" ON DELETE {on_delete}"));
            }
            vec![sql]
        }
        SchemaEdit::DropForeignKey { name, table } => vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            quote_ident(table),
            quote_ident(name)
        )],
    }
}

#[cfg(test)]
#[path = "ddl_test.rs"]
mod tests;
