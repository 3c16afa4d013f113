//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Subscout - Find the subscriptions hiding in your bank statements
#[derive(Parser)]
#[command(name = "subscout")]
#[command(about = "Recurring-charge detector for bank transaction histories", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "subscout.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SUBSCOUT_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Config file (defaults to ~/.local/share/subscout/config/subscout.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Store a user's Powens aggregator credentials
    Connect {
        /// Application user id
        #[arg(short, long)]
        user: String,

        /// Powens user id
        #[arg(long)]
        powens_id: i64,

        /// Powens access token
        #[arg(long)]
        token: String,
    },

    /// Detect subscriptions for one user
    Detect {
        /// Application user id
        #[arg(short, long)]
        user: String,

        /// Read transactions from a JSON file instead of the aggregator
        ///
        /// Accepts the aggregator's `{"transactions": [...]}` envelope or a bare array.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Show candidates without recording anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List a user's subscriptions
    Subscriptions {
        /// Application user id
        #[arg(short, long)]
        user: String,

        /// Group by category with monthly totals
        #[arg(long)]
        by_category: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the provider catalog
    Catalog {
        /// Only entries of this category
        #[arg(short, long)]
        category: Option<String>,

        /// Fail if an entry captures a later entry's name
        #[arg(long)]
        check: bool,

        /// Show which provider a bank wording resolves to
        #[arg(long, value_name = "WORDING")]
        test: Option<String>,
    },

    /// Run detection for every connected user on a schedule
    Watch {
        /// Run one pass and exit
        #[arg(long)]
        once: bool,
    },
}
