//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `catalog` - Provider catalog listing, ordering check, wording test
//! - `core` - Core commands (init, connect) and shared utilities (open_db, load_config)
//! - `detect` - One-user detection from the aggregator or a batch file
//! - `subscriptions` - Subscription listing and category rollup
//! - `watch` - Periodic detection for every connected user

pub mod catalog;
pub mod core;
pub mod detect;
pub mod subscriptions;
pub mod watch;

// Re-export command functions for main.rs
pub use catalog::*;
pub use core::*;
pub use detect::*;
pub use subscriptions::*;
pub use watch::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
