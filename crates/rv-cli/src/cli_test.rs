use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_migrate_defaults_to_head() {
    let cli = Cli::try_parse_from(["rv", "migrate"]).unwrap();
    match cli.command {
        Commands::Migrate(args) => {
            assert_eq!(args.target, "head");
            assert!(!args.sql);
            assert!(args.from.is_none());
        }
        other => panic!("expected migrate, got {other:?}"),
    }
}

#[test]
fn test_rollback_accepts_relative_target() {
    let cli = Cli::try_parse_from(["rv", "rollback", "-1"]).unwrap();
    match cli.command {
        Commands::Rollback(args) => assert_eq!(args.target, "-1"),
        other => panic!("expected rollback, got {other:?}"),
    }
}

#[test]
fn test_from_requires_sql() {
    assert!(Cli::try_parse_from(["rv", "migrate", "--from", "abc"]).is_err());
    assert!(Cli::try_parse_from(["rv", "migrate", "--sql", "--from", "abc"]).is_ok());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["rv", "current", "-p", "proj", "--target", "prod"]).unwrap();
    assert_eq!(cli.global.project_dir, "proj");
    assert_eq!(cli.global.target.as_deref(), Some("prod"));
}

#[test]
fn test_revision_target_separate_from_database_target() {
    let cli = Cli::try_parse_from(["rv", "migrate", "abc", "-t", "scratch"]).unwrap();
    assert_eq!(cli.global.target.as_deref(), Some("scratch"));
    match cli.command {
        Commands::Migrate(args) => assert_eq!(args.target, "abc"),
        other => panic!("expected migrate, got {other:?}"),
    }

    let cli = Cli::try_parse_from(["rv", "stamp", "head"]).unwrap();
    assert!(cli.global.target.is_none());
    match cli.command {
        Commands::Stamp(args) => assert_eq!(args.target, "head"),
        other => panic!("expected stamp, got {other:?}"),
    }

    let cli = Cli::try_parse_from(["rv", "--target", "prod", "rollback", "-1"]).unwrap();
    assert_eq!(cli.global.target.as_deref(), Some("prod"));
    match cli.command {
        Commands::Rollback(args) => assert_eq!(args.target, "-1"),
        other => panic!("expected rollback, got {other:?}"),
    }
}

#[test]
fn test_migrate_default_leaves_database_target_unset() {
    let cli = Cli::try_parse_from(["rv", "migrate"]).unwrap();
    assert!(cli.global.target.is_none());
}
