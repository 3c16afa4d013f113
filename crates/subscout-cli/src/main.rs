//! Subscout CLI - Recurring-charge detector
//!
//! Usage:
//!   subscout init                              Initialize database
//!   subscout connect --user U --powens-id N --token T
//!   subscout detect --user U [--file tx.json]  Detect subscriptions
//!   subscout subscriptions --user U            List what was found
//!   subscout watch                             Detect for all users periodically

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Connect {
            user,
            powens_id,
            token,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_connect(&db, &user, powens_id, &token)
        }
        Commands::Detect {
            user,
            file,
            dry_run,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_detect(&db, &config, &user, file.as_deref(), dry_run).await
        }
        Commands::Subscriptions {
            user,
            by_category,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            if by_category {
                commands::cmd_subscriptions_by_category(&db, &user, json)
            } else {
                commands::cmd_subscriptions_list(&db, &user, json)
            }
        }
        Commands::Catalog {
            category,
            check,
            test,
        } => {
            if check {
                commands::cmd_catalog_check()
            } else if let Some(wording) = test {
                let config = commands::load_config(cli.config.as_deref())?;
                commands::cmd_catalog_test(&config, &wording)
            } else {
                commands::cmd_catalog_list(category.as_deref())
            }
        }
        Commands::Watch { once } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_watch(db, &config, once).await
        }
    }
}
