//! Detection command

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use subscout_core::{
    logo, Config, Database, DetectedSubscription, PowensClient, PowensSource,
    SubscriptionDetector, Transaction, TransactionSource,
};

use super::truncate;

/// Aggregator listing saved to a file; `transactions` is required
#[derive(Deserialize)]
struct Envelope {
    transactions: Vec<Transaction>,
}

/// Shapes accepted by `detect --file`
#[derive(Deserialize)]
#[serde(untagged)]
enum TransactionBatch {
    Envelope(Envelope),
    List(Vec<Transaction>),
}

/// Read a transaction batch from a JSON file
pub fn read_batch(path: &Path) -> Result<Vec<Transaction>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let batch: TransactionBatch = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transactions in {}", path.display()))?;

    Ok(match batch {
        TransactionBatch::Envelope(envelope) => envelope.transactions,
        TransactionBatch::List(transactions) => transactions,
    })
}

pub async fn cmd_detect(
    db: &Database,
    config: &Config,
    user_id: &str,
    file: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    println!("🔍 Detecting subscriptions for {}...", user_id);

    let transactions = match file {
        Some(path) => read_batch(path)?,
        None => {
            let client = PowensClient::new(&config.powens).context("Failed to build Powens client")?;
            PowensSource::new(client, db.clone())
                .fetch_transactions(user_id)
                .await
                .context("Failed to fetch transactions (run `subscout connect` first?)")?
        }
    };
    println!("   {} transactions", transactions.len());

    if dry_run {
        let detector = SubscriptionDetector::new(db).with_config(config.detection.clone());
        let candidates = detector.candidates(user_id, &transactions);
        println!();
        println!("📋 {} candidates (dry run, nothing recorded):", candidates.len());
        print_candidates(&candidates);
        return Ok(());
    }

    let logos = logo::from_config(&config.logo).context("Failed to build logo client")?;
    let detector = SubscriptionDetector::new(db)
        .with_config(config.detection.clone())
        .with_logos(logos.as_ref(), config.logo.timeout());

    let results = detector
        .detect(user_id, &transactions)
        .await
        .context("Detection failed")?;

    println!();
    println!(
        "   {} clusters, {} recurring, {} matched",
        results.clusters, results.recurring, results.matched
    );
    if results.already_recorded > 0 {
        println!("   {} already recorded", results.already_recorded);
    }
    if results.failed > 0 {
        println!("   ⚠️  {} could not be recorded (see logs)", results.failed);
    }

    if results.created.is_empty() {
        println!("✅ No new subscriptions");
    } else {
        println!("✅ {} new subscriptions:", results.created.len());
        print_candidates(&results.created);
    }

    Ok(())
}

fn print_candidates(candidates: &[DetectedSubscription]) {
    for c in candidates {
        println!(
            "   {:20} │ {:>8} │ {:<9} │ {:20} │ since {}",
            truncate(&c.provider_name, 20),
            format!("{:.2}", c.price),
            c.billing_cycle.as_str(),
            truncate(&c.category, 20),
            c.start_date
        );
    }
}
