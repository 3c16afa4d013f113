//! Subscription command implementations

use anyhow::{Context, Result};
use subscout_core::Database;

use super::truncate;

pub fn cmd_subscriptions_list(db: &Database, user_id: &str, json: bool) -> Result<()> {
    let subscriptions = db
        .list_subscriptions(user_id)
        .context("Failed to list subscriptions")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&subscriptions)?);
        return Ok(());
    }

    if subscriptions.is_empty() {
        println!("No subscriptions detected yet. Run:");
        println!("  subscout detect --user {}", user_id);
        return Ok(());
    }

    println!();
    println!("📋 Subscriptions for {}", user_id);
    println!("   ─────────────────────────────────────────────────────────────");

    for sub in subscriptions {
        let status_icon = if sub.active { "✅" } else { "❌" };

        println!(
            "   {} {:20} │ {:>8}/{:<9} │ {:20} │ since {}",
            status_icon,
            truncate(&sub.provider_name, 20),
            format!("{:.2}", sub.price),
            sub.billing_cycle.as_str(),
            truncate(&sub.category, 20),
            sub.start_date
        );
    }

    Ok(())
}

pub fn cmd_subscriptions_by_category(db: &Database, user_id: &str, json: bool) -> Result<()> {
    let summary = db
        .subscriptions_by_category(user_id)
        .context("Failed to summarize subscriptions")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.is_empty() {
        println!("No active subscriptions for {}", user_id);
        return Ok(());
    }

    println!();
    println!("📊 Monthly spend by category for {}", user_id);
    println!("   ─────────────────────────────────────────────────────────────");

    for category in &summary {
        println!(
            "   {:24} {:>2} × │ {:>8}/month",
            truncate(&category.category, 24),
            category.count,
            format!("{:.2}", category.monthly_total)
        );
        for sub in &category.subscriptions {
            println!("      • {}", sub.provider_name);
        }
    }

    let total: rust_decimal::Decimal = summary.iter().map(|c| c.monthly_total).sum();
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:29} │ {:>8}/month", "Total", format!("{:.2}", total));

    Ok(())
}
