use super::*;
use rv_core::{ColumnSpec, ColumnType};

fn posts_table() -> SchemaEdit {
    SchemaEdit::CreateTable {
        table: "posts".to_string(),
        columns: vec![
            ColumnSpec::new("id", ColumnType::Integer).primary_key(),
            ColumnSpec::new("title", ColumnType::String).not_null(),
        ],
    }
}

#[test]
fn test_in_memory() {
    let db = DuckDbBackend::new(":memory:").unwrap();
    assert_eq!(db.executor().executor_type(), "duckdb");
    assert!(!db.relation_exists("posts").unwrap());
}

#[test]
fn test_executor_creates_and_alters_tables() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut exec = db.executor();

    exec.execute(&posts_table()).unwrap();
    assert!(db.relation_exists("posts").unwrap());

    exec.execute(&SchemaEdit::AddColumn {
        table: "posts".to_string(),
        column: ColumnSpec::new("content", ColumnType::Text),
    })
    .unwrap();
    assert_eq!(db.column_names("posts").unwrap(), vec!["id", "title", "content"]);

    exec.execute(&SchemaEdit::DropColumn {
        table: "posts".to_string(),
        column: "content".to_string(),
    })
    .unwrap();
    assert_eq!(db.column_names("posts").unwrap(), vec!["id", "title"]);

    exec.execute(&SchemaEdit::DropTable {
        table: "posts".to_string(),
    })
    .unwrap();
    assert!(!db.relation_exists("posts").unwrap());
}

#[test]
fn test_executor_reports_backend_failure() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut exec = db.executor();
    exec.execute(&posts_table()).unwrap();

    let err = exec
        .execute(&SchemaEdit::DropColumn {
            table: "posts".to_string(),
            column: "missing".to_string(),
        })
        .unwrap_err();
    match err {
        ExecutorError::Backend { source, .. } => {
            assert!(source.to_string().contains("DROP COLUMN"));
        }
        other => panic!("expected Backend error, got {other:?}"),
    }
}

#[test]
fn test_not_null_add_fills_existing_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut exec = db.executor();
    exec.execute(&posts_table()).unwrap();
    db.conn()
        .execute_batch("INSERT INTO posts VALUES (1, 'first'), (2, 'second')")
        .unwrap();

    exec.execute(&SchemaEdit::AddColumn {
        table: "posts".to_string(),
        column: ColumnSpec::new("published", ColumnType::Boolean)
            .not_null()
            .with_default("false"),
    })
    .unwrap();

    let unpublished: i64 = db
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM posts WHERE published = false",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(unpublished, 2);

    let err = db
        .conn()
        .execute_batch("INSERT INTO posts (id, title, published) VALUES (3, 'third', NULL)");
    assert!(err.is_err());
}

#[test]
fn test_failed_not_null_add_leaves_no_column() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut exec = db.executor();
    exec.execute(&posts_table()).unwrap();
    db.conn()
        .execute_batch("INSERT INTO posts VALUES (1, 'first')")
        .unwrap();

    // The column is added, then SET NOT NULL trips over the NULL default.
    let edit = SchemaEdit::AddColumn {
        table: "posts".to_string(),
        column: ColumnSpec::new("flag", ColumnType::Boolean)
            .not_null()
            .with_default("NULL"),
    };
    let first = exec.execute(&edit).unwrap_err();
    assert!(matches!(first, ExecutorError::Backend { .. }));
    assert_eq!(db.column_names("posts").unwrap(), vec!["id", "title"]);

    let retry = exec.execute(&edit).unwrap_err();
    match retry {
        ExecutorError::Backend { source, .. } => {
            assert!(!source.to_string().contains("already exists"), "{source}");
        }
        other => panic!("expected Backend error, got {other:?}"),
    }
    assert_eq!(db.column_names("posts").unwrap(), vec!["id", "title"]);
}

#[test]
fn test_existing_state_store_does_not_create_table() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(db.existing_state_store("rv_version").unwrap().is_none());
    assert!(!db.relation_exists("rv_version").unwrap());

    let mut store = db.state_store("rv_version").unwrap();
    store.set(Some(&Revision::new("a1"))).unwrap();
    let existing = db.existing_state_store("rv_version").unwrap().unwrap();
    assert_eq!(existing.current().unwrap(), Some(Revision::new("a1")));
}

#[test]
fn test_state_store_starts_at_base() {
    let db = DuckDbBackend::in_memory().unwrap();
    let store = db.state_store("rv_version").unwrap();
    assert!(db.relation_exists("rv_version").unwrap());
    assert_eq!(store.current().unwrap(), None);
}

#[test]
fn test_state_store_set_replaces_row() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut store = db.state_store("rv_version").unwrap();

    store.set(Some(&Revision::new("fa8d6eac1730"))).unwrap();
    store.set(Some(&Revision::new("134d9a43f339"))).unwrap();
    assert_eq!(
        store.current().unwrap(),
        Some(Revision::new("134d9a43f339"))
    );

    let rows: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM rv_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    store.set(None).unwrap();
    assert_eq!(store.current().unwrap(), None);
}

#[test]
fn test_state_store_is_idempotent_to_open() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.state_store("rv_version")
        .unwrap()
        .set(Some(&Revision::new("abc")))
        .unwrap();

    let reopened = db.state_store("rv_version").unwrap();
    assert_eq!(reopened.current().unwrap(), Some(Revision::new("abc")));
}

#[test]
fn test_state_store_schema_qualified_table() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut store = db.state_store("meta.rv_version").unwrap();
    assert_eq!(store.table(), "meta.rv_version");
    assert!(db.relation_exists("meta.rv_version").unwrap());

    store.set(Some(&Revision::new("abc"))).unwrap();
    assert_eq!(store.current().unwrap(), Some(Revision::new("abc")));
}

#[test]
fn test_state_store_detects_corruption() {
    let db = DuckDbBackend::in_memory().unwrap();
    let store = db.state_store("rv_version").unwrap();
    db.conn()
        .execute_batch("INSERT INTO rv_version VALUES ('a'), ('b');")
        .unwrap();

    assert!(matches!(
        store.current(),
        Err(StateError::Corrupt { count: 2 })
    ));
}

#[test]
fn test_state_survives_reopen_on_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("app.duckdb");

    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        db.state_store("rv_version")
            .unwrap()
            .set(Some(&Revision::new("fa8d6eac1730")))
            .unwrap();
    }

    let db = DuckDbBackend::new(path.to_str().unwrap()).unwrap();
    let store = db.state_store("rv_version").unwrap();
    assert_eq!(
        store.current().unwrap(),
        Some(Revision::new("fa8d6eac1730"))
    );
}
