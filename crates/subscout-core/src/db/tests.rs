//! Database tests

use super::*;
use crate::models::*;

use chrono::NaiveDate;
use rust_decimal::Decimal;

fn candidate(user: &str, provider: &str, price: Decimal, start: &str) -> DetectedSubscription {
    DetectedSubscription {
        user_id: user.to_string(),
        provider_name: provider.to_string(),
        category: "Streaming Musique".to_string(),
        price,
        start_date: NaiveDate::parse_from_str(start, DATE_FORMAT).unwrap(),
        billing_cycle: BillingCycle::Monthly,
        logo_url: None,
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.list_subscriptions("u1").unwrap().is_empty());
    assert!(db.list_bank_connections().unwrap().is_empty());
    assert!(!db.is_encrypted());
}

#[test]
fn test_migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscout.db");
    let path = path.to_str().unwrap();

    let db = Database::new_unencrypted(path).unwrap();
    db.create_subscription(&candidate("u1", "Spotify", Decimal::new(999, 2), "2024-01-05"))
        .unwrap();
    drop(db);

    let reopened = Database::new_unencrypted(path).unwrap();
    assert_eq!(reopened.list_subscriptions("u1").unwrap().len(), 1);
}

#[test]
fn test_encrypted_db_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secret.db");
    let path = path.to_str().unwrap();

    let db = Database::new_with_key(path, Some("correct horse")).unwrap();
    assert!(db.is_encrypted());
    db.upsert_bank_connection("u1", 42, "tok").unwrap();
    drop(db);

    let reopened = Database::new_with_key(path, Some("correct horse")).unwrap();
    assert_eq!(reopened.get_bank_connection("u1").unwrap().unwrap().powens_user_id, 42);
    drop(reopened);

    assert!(Database::new_with_key(path, Some("wrong")).is_err());
}

#[test]
fn test_create_then_exists() {
    let db = Database::in_memory().unwrap();
    let spotify = candidate("u1", "Spotify", Decimal::new(999, 2), "2024-01-05");

    assert!(!db
        .subscription_exists("u1", "Spotify", spotify.price, spotify.start_date)
        .unwrap());

    let outcome = db.create_subscription(&spotify).unwrap();
    assert!(matches!(outcome, CreateOutcome::Created(id) if id > 0));

    assert!(db
        .subscription_exists("u1", "Spotify", spotify.price, spotify.start_date)
        .unwrap());
    // Same identity under another user is a different subscription
    assert!(!db
        .subscription_exists("u2", "Spotify", spotify.price, spotify.start_date)
        .unwrap());
}

#[test]
fn test_price_identity_ignores_decimal_scale() {
    let db = Database::in_memory().unwrap();
    db.create_subscription(&candidate("u1", "Deezer", Decimal::new(1090, 2), "2024-03-01"))
        .unwrap();

    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert!(db
        .subscription_exists("u1", "Deezer", Decimal::new(109, 1), start)
        .unwrap());
    assert!(!db
        .subscription_exists("u1", "Deezer", Decimal::new(1099, 2), start)
        .unwrap());
}

#[test]
fn test_create_is_insert_or_ignore() {
    let db = Database::in_memory().unwrap();
    let spotify = candidate("u1", "Spotify", Decimal::new(999, 2), "2024-01-05");

    assert!(matches!(
        db.create_subscription(&spotify).unwrap(),
        CreateOutcome::Created(_)
    ));
    assert_eq!(
        db.create_subscription(&spotify).unwrap(),
        CreateOutcome::AlreadyRecorded
    );
    assert_eq!(db.list_subscriptions("u1").unwrap().len(), 1);
}

#[test]
fn test_list_subscriptions_reads_back_fields() {
    let db = Database::in_memory().unwrap();
    let mut netflix = candidate("u1", "Netflix", Decimal::new(1349, 2), "2024-01-12");
    netflix.category = "Streaming Vidéo".to_string();
    netflix.logo_url = Some("https://svgl.app/library/netflix.svg".to_string());
    db.create_subscription(&netflix).unwrap();

    let subs = db.list_subscriptions("u1").unwrap();
    assert_eq!(subs.len(), 1);
    let sub = &subs[0];
    assert_eq!(sub.provider_name, "Netflix");
    assert_eq!(sub.category, "Streaming Vidéo");
    assert_eq!(sub.price, Decimal::new(1349, 2));
    assert_eq!(sub.start_date, NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
    assert_eq!(sub.billing_cycle, BillingCycle::Monthly);
    assert_eq!(sub.logo_url.as_deref(), Some("https://svgl.app/library/netflix.svg"));
    assert!(sub.active);
}

#[test]
fn test_schema_accepts_every_billing_cycle() {
    let db = Database::in_memory().unwrap();
    let cycles = [
        BillingCycle::Monthly,
        BillingCycle::Quarterly,
        BillingCycle::SemiAnnual,
        BillingCycle::Annual,
        BillingCycle::OneTime,
    ];
    for (i, cycle) in cycles.iter().enumerate() {
        let mut sub = candidate("u1", &format!("Provider {}", i), Decimal::ONE, "2024-01-01");
        sub.billing_cycle = *cycle;
        db.create_subscription(&sub).unwrap();
    }

    let stored: Vec<BillingCycle> = db
        .list_subscriptions("u1")
        .unwrap()
        .into_iter()
        .map(|s| s.billing_cycle)
        .collect();
    assert_eq!(stored, cycles);

    let conn = db.conn().unwrap();
    let bad = conn.execute(
        "INSERT INTO subscriptions (user_id, provider_name, category, price, start_date, billing_cycle) VALUES ('u1', 'X', 'Y', '1', '2024-01-01', 'weekly')",
        [],
    );
    assert!(bad.is_err());
}

#[test]
fn test_subscriptions_by_category() {
    let db = Database::in_memory().unwrap();

    let mut spotify = candidate("u1", "Spotify", Decimal::new(999, 2), "2024-01-05");
    spotify.category = "Streaming Musique".to_string();
    let mut deezer = candidate("u1", "Deezer", Decimal::new(1199, 2), "2024-01-07");
    deezer.category = "Streaming Musique".to_string();
    let mut dropbox = candidate("u1", "Dropbox", Decimal::new(11988, 2), "2023-06-01");
    dropbox.category = "Stockage Cloud".to_string();
    dropbox.billing_cycle = BillingCycle::Annual;
    let other_user = candidate("u2", "Netflix", Decimal::new(1349, 2), "2024-01-12");

    for sub in [&spotify, &deezer, &dropbox, &other_user] {
        db.create_subscription(sub).unwrap();
    }

    let summary = db.subscriptions_by_category("u1").unwrap();
    assert_eq!(summary.len(), 2);

    assert_eq!(summary[0].category, "Stockage Cloud");
    assert_eq!(summary[0].count, 1);
    assert_eq!(summary[0].monthly_total, Decimal::new(999, 2));

    assert_eq!(summary[1].category, "Streaming Musique");
    assert_eq!(summary[1].count, 2);
    assert_eq!(summary[1].monthly_total, Decimal::new(2198, 2));
    let names: Vec<&str> = summary[1]
        .subscriptions
        .iter()
        .map(|s| s.provider_name.as_str())
        .collect();
    assert_eq!(names, vec!["Deezer", "Spotify"]);
}

#[test]
fn test_bank_connection_upsert() {
    let db = Database::in_memory().unwrap();
    assert!(db.get_bank_connection("u1").unwrap().is_none());

    db.upsert_bank_connection("u1", 100, "first-token").unwrap();
    db.upsert_bank_connection("u2", 200, "other-token").unwrap();
    db.upsert_bank_connection("u1", 101, "second-token").unwrap();

    let conn = db.get_bank_connection("u1").unwrap().unwrap();
    assert_eq!(conn.powens_user_id, 101);
    assert_eq!(conn.access_token, "second-token");

    let all = db.list_bank_connections().unwrap();
    let users: Vec<&str> = all.iter().map(|c| c.user_id.as_str()).collect();
    assert_eq!(users, vec!["u1", "u2"]);
}

#[test]
fn test_access_token_is_not_serialized() {
    let db = Database::in_memory().unwrap();
    db.upsert_bank_connection("u1", 100, "secret-token").unwrap();
    let conn = db.get_bank_connection("u1").unwrap().unwrap();

    let json = serde_json::to_string(&conn).unwrap();
    assert!(!json.contains("secret-token"));
}
