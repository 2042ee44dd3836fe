use super::*;
use crate::catalog::Catalog;
use crate::edit::{ColumnSpec, ColumnType, OnDelete};
use crate::state::MemoryStateStore;
use crate::step::StepDefinition;

// ── Helpers ────────────────────────────────────────────────────────────

fn rev(id: &str) -> Revision {
    Revision::new(id)
}

fn r1() -> MigrationStep {
    StepDefinition::new("r1", None)
        .with_message("create users and posts")
        .with_upgrade(vec![
            SchemaEdit::CreateTable {
                table: "users".to_string(),
                columns: vec![ColumnSpec::new("id", ColumnType::Integer).primary_key()],
            },
            SchemaEdit::CreateTable {
                table: "posts".to_string(),
                columns: vec![
                    ColumnSpec::new("id", ColumnType::Integer).primary_key(),
                    ColumnSpec::new("title", ColumnType::String).not_null(),
                ],
            },
        ])
        .build()
        .unwrap()
}

fn r2() -> MigrationStep {
    StepDefinition::new("r2", Some("r1"))
        .with_message("add content column to posts table")
        .with_upgrade(vec![SchemaEdit::AddColumn {
            table: "posts".to_string(),
            column: ColumnSpec::new("content", ColumnType::String)
                .not_null()
                .with_default("''"),
        }])
        .build()
        .unwrap()
}

fn r3() -> MigrationStep {
    StepDefinition::new("r3", Some("r2"))
        .with_message("add foreign-key to posts table")
        .with_upgrade(vec![
            SchemaEdit::AddColumn {
                table: "posts".to_string(),
                column: ColumnSpec::new("owner_id", ColumnType::Integer),
            },
            SchemaEdit::AddForeignKey {
                name: "post_user_fk".to_string(),
                table: "posts".to_string(),
                column: "owner_id".to_string(),
                referenced_table: "users".to_string(),
                referenced_column: "id".to_string(),
                on_delete: OnDelete::Cascade,
            },
        ])
        .build()
        .unwrap()
}

fn posts_chain() -> MigrationChain {
    let mut chain = MigrationChain::new();
    chain.register(r1()).unwrap();
    chain.register(r2()).unwrap();
    chain.register(r3()).unwrap();
    chain
}

fn linear_chain(len: usize) -> MigrationChain {
    let mut chain = MigrationChain::new();
    for i in 0..len {
        let down = (i > 0).then(|| format!("s{}", i - 1));
        let step = StepDefinition::new(format!("s{i}"), down.as_deref())
            .build()
            .unwrap();
        chain.register(step).unwrap();
    }
    chain
}

/// Catalog that fails on the first edit matching `fail_on`.
struct FailingExecutor {
    catalog: Catalog,
    fail_on: fn(&SchemaEdit) -> bool,
    executed: Vec<String>,
}

impl SchemaExecutor for FailingExecutor {
    fn execute(&mut self, edit: &SchemaEdit) -> Result<(), ExecutorError> {
        if (self.fail_on)(edit) {
            return Err(ExecutorError::Rejected(format!("injected failure: {edit}")));
        }
        self.catalog.apply(edit)?;
        self.executed.push(edit.to_string());
        Ok(())
    }

    fn executor_type(&self) -> &'static str {
        "failing"
    }
}

fn revisions(path: &MigrationPath<'_>) -> Vec<String> {
    path.steps.iter().map(|s| s.revision().to_string()).collect()
}

// ── Registration ───────────────────────────────────────────────────────

#[test]
fn test_register_duplicate_revision_fails() {
    for size in [1, 2, 5, 20] {
        let mut chain = linear_chain(size);
        let dup = StepDefinition::new(format!("s{}", size - 1), None)
            .build()
            .unwrap();
        let err = chain.register(dup).unwrap_err();
        assert!(
            matches!(err, ChainError::DuplicateRevision { .. }),
            "size {size}: {err}"
        );
        assert_eq!(chain.len(), size);
    }
}

#[test]
fn test_register_dangling_reference_fails() {
    let mut chain = MigrationChain::new();
    chain.register(r1()).unwrap();
    let err = chain.register(r3()).unwrap_err();
    match err {
        ChainError::DanglingReference {
            revision,
            down_revision,
        } => {
            assert_eq!(revision, "r3");
            assert_eq!(down_revision, "r2");
        }
        other => panic!("expected DanglingReference, got {other}"),
    }
    assert_eq!(chain.len(), 1);
}

#[test]
fn test_register_second_root_fails() {
    let mut chain = posts_chain();
    let err = chain
        .register(StepDefinition::new("other_root", None).build().unwrap())
        .unwrap_err();
    assert!(matches!(err, ChainError::MultipleRoots { .. }));
}

#[test]
fn test_register_branch_fails() {
    let mut chain = posts_chain();
    let err = chain
        .register(StepDefinition::new("r2b", Some("r1")).build().unwrap())
        .unwrap_err();
    match err {
        ChainError::BranchedChain { existing_child, .. } => assert_eq!(existing_child, "r2"),
        other => panic!("expected BranchedChain, got {other}"),
    }
    assert!(!chain.contains("r2b"));
}

#[test]
fn test_from_steps_orders_by_linkage() {
    let chain = MigrationChain::from_steps(vec![r3(), r1(), r2()]).unwrap();
    let order: Vec<_> = chain
        .history()
        .iter()
        .map(|s| s.revision().to_string())
        .collect();
    assert_eq!(order, vec!["r1", "r2", "r3"]);
    assert_eq!(chain.root().unwrap().revision(), "r1");
    assert_eq!(chain.head().unwrap().revision(), "r3");
}

#[test]
fn test_from_steps_rejects_whole_set() {
    assert!(matches!(
        MigrationChain::from_steps(vec![r1(), r2(), r2()]),
        Err(ChainError::DuplicateRevision { .. })
    ));
    assert!(matches!(
        MigrationChain::from_steps(vec![r1(), r3()]),
        Err(ChainError::DanglingReference { .. })
    ));

    // A two-step cycle has no root and so never links up.
    let a = StepDefinition::new("a", Some("b")).build().unwrap();
    let b = StepDefinition::new("b", Some("a")).build().unwrap();
    assert!(matches!(
        MigrationChain::from_steps(vec![a, b]),
        Err(ChainError::DanglingReference { .. })
    ));
}

// ── Path resolution ────────────────────────────────────────────────────

#[test]
fn test_resolve_path_upgrade_from_base() {
    let chain = posts_chain();
    let path = chain.resolve_path(None, Some(&rev("r3"))).unwrap();
    assert_eq!(path.direction, Direction::Upgrade);
    assert_eq!(revisions(&path), vec!["r1", "r2", "r3"]);
}

#[test]
fn test_resolve_path_downgrade_excludes_target() {
    let chain = posts_chain();
    let path = chain.resolve_path(Some(&rev("r3")), Some(&rev("r1"))).unwrap();
    assert_eq!(path.direction, Direction::Downgrade);
    assert_eq!(revisions(&path), vec!["r3", "r2"]);

    let path = chain.resolve_path(Some(&rev("r3")), None).unwrap();
    assert_eq!(revisions(&path), vec!["r3", "r2", "r1"]);
}

#[test]
fn test_resolve_path_same_revision_is_empty() {
    let chain = posts_chain();
    assert!(chain
        .resolve_path(Some(&rev("r2")), Some(&rev("r2")))
        .unwrap()
        .is_empty());
    assert!(chain.resolve_path(None, None).unwrap().is_empty());
}

#[test]
fn test_resolve_path_unknown_revision_is_no_path() {
    let chain = posts_chain();
    for (from, to) in [
        (Some(rev("r1")), Some(rev("zz"))),
        (Some(rev("zz")), Some(rev("r1"))),
        (None, Some(rev("nope"))),
    ] {
        let err = chain.resolve_path(from.as_ref(), to.as_ref()).unwrap_err();
        assert!(matches!(err, ChainError::NoPath { .. }), "{err}");
    }
}

// ── Execution ──────────────────────────────────────────────────────────

#[test]
fn test_migrate_scenario() {
    let chain = posts_chain();
    let mut catalog = Catalog::new();
    let mut state = MemoryStateStore::new();

    let report = chain
        .migrate(None, Some(&rev("r3")), &mut catalog, &mut state)
        .unwrap();
    assert_eq!(report.direction, Direction::Upgrade);
    assert_eq!(report.completed, vec![rev("r1"), rev("r2"), rev("r3")]);
    assert_eq!(state.current().unwrap(), Some(rev("r3")));
    assert_eq!(
        state.writes(),
        &[Some(rev("r1")), Some(rev("r2")), Some(rev("r3"))]
    );
    assert!(catalog.has_foreign_key("posts", "post_user_fk"));

    let report = chain
        .migrate(Some(&rev("r3")), Some(&rev("r1")), &mut catalog, &mut state)
        .unwrap();
    assert_eq!(report.direction, Direction::Downgrade);
    assert_eq!(report.completed, vec![rev("r3"), rev("r2")]);
    assert_eq!(report.reached, Some(rev("r1")));
    assert_eq!(state.current().unwrap(), Some(rev("r1")));

    // Only R1's effects remain.
    assert!(catalog.has_column("posts", "title"));
    assert!(!catalog.has_column("posts", "content"));
    assert!(!catalog.has_column("posts", "owner_id"));
    assert!(!catalog.has_foreign_key("posts", "post_user_fk"));
}

#[test]
fn test_round_trip_restores_schema() {
    let chain = posts_chain();
    let targets = [None, Some(rev("r1")), Some(rev("r2")), Some(rev("r3"))];

    for a in 0..targets.len() {
        for b in a..targets.len() {
            let (from, to) = (targets[a].as_ref(), targets[b].as_ref());
            let mut catalog = Catalog::new();
            let mut state = MemoryStateStore::new();
            chain.migrate(None, from, &mut catalog, &mut state).unwrap();
            let before = catalog.clone();

            chain.migrate(from, to, &mut catalog, &mut state).unwrap();
            chain.migrate(to, from, &mut catalog, &mut state).unwrap();

            assert_eq!(catalog, before, "round trip {from:?} -> {to:?}");
            assert_eq!(state.current().unwrap(), from.cloned());
        }
    }
}

#[test]
fn test_partial_failure_keeps_completed_steps() {
    let chain = posts_chain();
    let mut executor = FailingExecutor {
        catalog: Catalog::new(),
        fail_on: |edit| matches!(edit, SchemaEdit::AddForeignKey { .. }),
        executed: Vec::new(),
    };
    let mut state = MemoryStateStore::new();

    let err = chain
        .migrate(None, Some(&rev("r3")), &mut executor, &mut state)
        .unwrap_err();

    match err {
        ChainError::MigrationHalted {
            reached,
            completed,
            source,
        } => {
            assert_eq!(reached, Some(rev("r2")));
            assert_eq!(completed, 2);
            assert!(matches!(
                *source,
                ChainError::ApplyFailed { ref revision, .. } if revision == "r3"
            ));
        }
        other => panic!("expected MigrationHalted, got {other}"),
    }

    assert_eq!(state.current().unwrap(), Some(rev("r2")));
    // R3's first edit ran and was not rolled back.
    assert!(executor.catalog.has_column("posts", "owner_id"));
    assert_eq!(
        executor.executed.last().map(String::as_str),
        Some("add column posts.owner_id")
    );
}

#[test]
fn test_revert_failure_reports_revert_failed() {
    let chain = posts_chain();
    let mut executor = FailingExecutor {
        catalog: Catalog::new(),
        fail_on: |edit| matches!(edit, SchemaEdit::DropColumn { column, .. } if column == "content"),
        executed: Vec::new(),
    };
    let mut state = MemoryStateStore::new();
    chain
        .migrate(None, Some(&rev("r3")), &mut executor, &mut state)
        .unwrap();

    let err = chain
        .migrate(Some(&rev("r3")), None, &mut executor, &mut state)
        .unwrap_err();
    match err {
        ChainError::MigrationHalted { reached, source, .. } => {
            assert_eq!(reached, Some(rev("r2")));
            assert!(matches!(*source, ChainError::RevertFailed { .. }));
        }
        other => panic!("expected MigrationHalted, got {other}"),
    }
}

#[test]
fn test_apply_checks_chain_state() {
    let chain = posts_chain();
    let mut catalog = Catalog::new();
    let mut state = MemoryStateStore::new();

    let err = chain
        .apply(chain.get("r2").unwrap(), &mut catalog, &mut state)
        .unwrap_err();
    assert!(matches!(err, ChainError::OutOfOrder { .. }));
    assert!(state.writes().is_empty());

    chain
        .apply(chain.get("r1").unwrap(), &mut catalog, &mut state)
        .unwrap();
    let err = chain
        .revert(chain.get("r2").unwrap(), &mut catalog, &mut state)
        .unwrap_err();
    assert!(matches!(err, ChainError::OutOfOrder { .. }));
}

#[test]
fn test_migrate_rejects_mismatched_from() {
    let chain = posts_chain();
    let mut catalog = Catalog::new();
    let mut state = MemoryStateStore::at(Some(rev("r1")));
    let err = chain
        .migrate(None, Some(&rev("r3")), &mut catalog, &mut state)
        .unwrap_err();
    assert!(matches!(err, ChainError::OutOfOrder { .. }));
}

#[test]
fn test_stamp_sets_state_without_edits() {
    let chain = posts_chain();
    let mut state = MemoryStateStore::new();
    chain.stamp(Some(&rev("r2")), &mut state).unwrap();
    assert_eq!(state.current().unwrap(), Some(rev("r2")));

    assert!(matches!(
        chain.stamp(Some(&rev("zz")), &mut state),
        Err(ChainError::UnknownRevision { .. })
    ));
    assert_eq!(state.current().unwrap(), Some(rev("r2")));
}

// ── Target resolution ──────────────────────────────────────────────────

#[test]
fn test_resolve_target_symbols_and_prefixes() {
    let mut chain = MigrationChain::new();
    for (id, down) in [
        ("fa8d6eac1730", None),
        ("134d9a43f339", Some("fa8d6eac1730")),
        ("13ffee000000", Some("134d9a43f339")),
    ] {
        chain
            .register(StepDefinition::new(id, down).build().unwrap())
            .unwrap();
    }

    assert_eq!(chain.resolve_target("base", None).unwrap(), None);
    assert_eq!(
        chain.resolve_target("head", None).unwrap(),
        Some(rev("13ffee000000"))
    );
    assert_eq!(
        chain.resolve_target("fa8d", None).unwrap(),
        Some(rev("fa8d6eac1730"))
    );
    assert_eq!(
        chain.resolve_target("134d9a43f339", None).unwrap(),
        Some(rev("134d9a43f339"))
    );
    assert!(matches!(
        chain.resolve_target("13", None),
        Err(ChainError::AmbiguousRevision { .. })
    ));
    assert!(matches!(
        chain.resolve_target("ffff", None),
        Err(ChainError::UnknownRevision { .. })
    ));
}

#[test]
fn test_resolve_target_rejects_empty_spec() {
    // A lone step would otherwise match the empty prefix.
    let chain = linear_chain(1);
    assert!(matches!(
        chain.resolve_target("", None),
        Err(ChainError::UnknownRevision { .. })
    ));
}

#[test]
fn test_resolve_target_relative() {
    let chain = linear_chain(4);
    let s1 = rev("s1");

    assert_eq!(chain.resolve_target("+1", None).unwrap(), Some(rev("s0")));
    assert_eq!(chain.resolve_target("+2", Some(&s1)).unwrap(), Some(rev("s3")));
    assert_eq!(chain.resolve_target("-1", Some(&s1)).unwrap(), Some(rev("s0")));
    assert_eq!(chain.resolve_target("-2", Some(&s1)).unwrap(), None);
    assert!(matches!(
        chain.resolve_target("-3", Some(&s1)),
        Err(ChainError::RelativeOutOfRange { .. })
    ));
    assert!(matches!(
        chain.resolve_target("+5", None),
        Err(ChainError::RelativeOutOfRange { .. })
    ));
}

#[test]
fn test_empty_chain() {
    let chain = MigrationChain::new();
    assert!(chain.is_empty());
    assert!(chain.head().is_none());
    assert_eq!(chain.resolve_target("head", None).unwrap(), None);
    assert!(chain.history().is_empty());
}
