//! Subscout Core Library
//!
//! Recurring-charge detection over raw bank transaction histories:
//! - Wording normalization and (wording, amount) clustering
//! - Recurrence and billing-cycle inference from the first two charges
//! - Provider resolution against an ordered catalog (regex, then edit distance)
//! - Encrypted SQLite store with an idempotent dedup gate
//! - Powens aggregator and svgl logo clients
//! - Periodic multi-user scheduler

pub mod bank;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod logo;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod scheduler;
pub mod store;

/// Test utilities including mock Powens and logo servers
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bank::{PowensClient, PowensSource, TransactionSource};
pub use catalog::{Catalog, CatalogEntry, Shadowing};
pub use cluster::{classify_billing_cycle, cycle_anchor, group, is_recurring, TransactionCluster};
pub use config::{Config, DetectionConfig, LogoConfig, PowensConfig, SchedulerConfig};
pub use db::Database;
pub use detect::{DetectionResults, SubscriptionDetector};
pub use error::{Error, Result};
pub use logo::{LogoLookup, NoLogo, SvglLogoClient};
pub use matcher::{resolve, MatchStage, Resolution};
pub use models::*;
pub use normalize::normalize;
pub use scheduler::{start_detection_scheduler, DetectionScheduler, ScheduledRun};
pub use store::SubscriptionStore;
