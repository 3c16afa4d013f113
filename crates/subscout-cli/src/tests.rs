//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use clap::Parser;
use subscout_core::{BillingCycle, Config, Database, LogoConfig};
use tempfile::NamedTempFile;

use crate::cli::{Cli, Commands};
use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

/// Config that never reaches the network for logos
fn offline_config() -> Config {
    Config {
        logo: LogoConfig {
            enabled: false,
            ..LogoConfig::default()
        },
        ..Config::default()
    }
}

fn write_batch(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

const ENVELOPE: &str = r#"{"transactions": [
    {"id": 2, "date": "2024-02-04", "simplified_wording": "SPOTIFY PARIS", "value": -9.99},
    {"id": 1, "date": "2024-01-05", "simplified_wording": "SPOTIFY PARIS", "value": -9.99},
    {"id": 0, "date": "2024-01-20", "simplified_wording": "SNCF", "value": -45.00}
]}"#;

const BARE_LIST: &str = r#"[
    {"id": 1, "date": "2024-01-12", "original_wording": "CB NETFLIX.COM", "value": "-13.49"},
    {"id": 2, "date": "2024-02-12", "original_wording": "CB NETFLIX.COM", "value": "-13.49"}
]"#;

// ========== Argument Parsing Tests ==========

#[test]
fn test_cli_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "subscout",
        "detect",
        "--user",
        "alice",
        "--dry-run",
        "--no-encrypt",
        "--db",
        "/tmp/x.db",
    ])
    .unwrap();

    assert!(cli.no_encrypt);
    assert_eq!(cli.db.to_str(), Some("/tmp/x.db"));
    match cli.command {
        Commands::Detect {
            user,
            file,
            dry_run,
        } => {
            assert_eq!(user, "alice");
            assert!(file.is_none());
            assert!(dry_run);
        }
        _ => panic!("expected detect"),
    }
}

#[test]
fn test_cli_connect_requires_token() {
    assert!(Cli::try_parse_from(["subscout", "connect", "--user", "a", "--powens-id", "1"]).is_err());
}

// ========== Core Command Tests ==========

#[test]
fn test_open_db_unencrypted_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cli.db");

    let db = commands::open_db(&path, true).unwrap();
    assert!(!db.is_encrypted());
    assert!(path.exists());
}

#[test]
fn test_cmd_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("init.db");

    assert!(commands::cmd_init(&path, true).is_ok());
    assert!(path.exists());
}

#[test]
fn test_cmd_connect_stores_connection() {
    let db = setup_test_db();
    commands::cmd_connect(&db, "alice", 4242, "secret").unwrap();

    let connection = db.get_bank_connection("alice").unwrap().unwrap();
    assert_eq!(connection.powens_user_id, 4242);
    assert_eq!(connection.access_token, "secret");
}

#[test]
fn test_load_config_from_file() {
    let file = write_batch("[detection]\nmax_anchor_gap_days = 40\n");
    let config = commands::load_config(Some(file.path())).unwrap();
    assert_eq!(config.detection.max_anchor_gap_days, 40);
}

// ========== Detect Command Tests ==========

#[test]
fn test_read_batch_accepts_envelope_and_list() {
    let envelope = write_batch(ENVELOPE);
    let list = write_batch(BARE_LIST);

    assert_eq!(commands::read_batch(envelope.path()).unwrap().len(), 3);
    assert_eq!(commands::read_batch(list.path()).unwrap().len(), 2);
}

#[test]
fn test_read_batch_rejects_garbage() {
    let file = write_batch("{\"nope\": true}");
    assert!(commands::read_batch(file.path()).is_err());
}

#[test]
fn test_read_batch_rejects_misspelled_envelope() {
    let file = write_batch(&ENVELOPE.replacen("\"transactions\"", "\"transaction\"", 1));
    assert!(commands::read_batch(file.path()).is_err());
}

#[test]
fn test_read_batch_accepts_empty_envelope() {
    let file = write_batch("{\"transactions\": [], \"first_date\": null}");
    assert!(commands::read_batch(file.path()).unwrap().is_empty());
}

#[tokio::test]
async fn test_cmd_detect_rejects_object_without_transactions() {
    let db = setup_test_db();
    let file = write_batch("{\"nope\": true}");

    let result =
        commands::cmd_detect(&db, &offline_config(), "alice", Some(file.path()), false).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_detect_from_file() {
    let db = setup_test_db();
    let file = write_batch(ENVELOPE);

    commands::cmd_detect(&db, &offline_config(), "alice", Some(file.path()), false)
        .await
        .unwrap();

    let subs = db.list_subscriptions("alice").unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].provider_name, "Spotify");
    assert_eq!(subs[0].billing_cycle, BillingCycle::Monthly);
    assert!(subs[0].logo_url.is_none());
}

#[tokio::test]
async fn test_cmd_detect_dry_run_records_nothing() {
    let db = setup_test_db();
    let file = write_batch(BARE_LIST);

    commands::cmd_detect(&db, &offline_config(), "alice", Some(file.path()), true)
        .await
        .unwrap();

    assert!(db.list_subscriptions("alice").unwrap().is_empty());
}

#[tokio::test]
async fn test_cmd_detect_without_connection_fails() {
    let db = setup_test_db();
    let result = commands::cmd_detect(&db, &offline_config(), "nobody", None, false).await;
    assert!(result.is_err());
}

// ========== Subscriptions Command Tests ==========

#[tokio::test]
async fn test_cmd_subscriptions_list_and_rollup() {
    let db = setup_test_db();
    assert!(commands::cmd_subscriptions_list(&db, "alice", false).is_ok());
    assert!(commands::cmd_subscriptions_by_category(&db, "alice", false).is_ok());

    let file = write_batch(BARE_LIST);
    commands::cmd_detect(&db, &offline_config(), "alice", Some(file.path()), false)
        .await
        .unwrap();

    assert!(commands::cmd_subscriptions_list(&db, "alice", false).is_ok());
    assert!(commands::cmd_subscriptions_list(&db, "alice", true).is_ok());
    assert!(commands::cmd_subscriptions_by_category(&db, "alice", false).is_ok());
    assert!(commands::cmd_subscriptions_by_category(&db, "alice", true).is_ok());
}

// ========== Catalog Command Tests ==========

#[test]
fn test_cmd_catalog_list() {
    assert!(commands::cmd_catalog_list(None).is_ok());
    assert!(commands::cmd_catalog_list(Some("streaming musique")).is_ok());
    assert!(commands::cmd_catalog_list(Some("No Such Category")).is_ok());
}

#[test]
fn test_cmd_catalog_check_builtin_is_ordered() {
    assert!(commands::cmd_catalog_check().is_ok());
}

#[test]
fn test_cmd_catalog_test() {
    let config = Config::default();
    assert!(commands::cmd_catalog_test(&config, "CB SPOTIFY P1A2").is_ok());
    assert!(commands::cmd_catalog_test(&config, "BOULANGERIE DUPONT").is_ok());
}

// ========== Watch Command Tests ==========

#[tokio::test]
async fn test_cmd_watch_once_without_connections() {
    let db = setup_test_db();
    assert!(commands::cmd_watch(db, &offline_config(), true).await.is_ok());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Netflix", 20), "Netflix");
    assert_eq!(truncate("Amazon Prime Video Channels", 10), "Amazon ...");
    assert_eq!(truncate("Streaming Vidéo", 12), "Streaming...");
}
