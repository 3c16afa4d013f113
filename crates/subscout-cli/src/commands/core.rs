//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Shared utility to resolve the detector config
//! - `cmd_init` - Initialize the database
//! - `cmd_connect` - Store a user's aggregator credentials

use std::path::Path;

use anyhow::{Context, Result};
use subscout_core::config::default_config_path;
use subscout_core::{Catalog, Config, Database};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Resolve the detector config: --config, then the user override, then built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load_from(path).context("Failed to load configuration")
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    if db.is_encrypted() {
        println!("   🔒 Encryption: ENABLED");
    } else {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    }

    println!("   📚 Catalog: {} providers", Catalog::builtin().len());
    if let Some(path) = default_config_path() {
        println!("   ⚙️  Config override: {}", path.display());
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Link a bank: subscout connect --user <id> --powens-id <n> --token <t>");
    println!("  2. Find subscriptions: subscout detect --user <id>");

    Ok(())
}

pub fn cmd_connect(db: &Database, user_id: &str, powens_user_id: i64, token: &str) -> Result<()> {
    db.upsert_bank_connection(user_id, powens_user_id, token)
        .context("Failed to store bank connection")?;

    println!(
        "🔗 Linked user {} to Powens user {}",
        user_id, powens_user_id
    );

    Ok(())
}
