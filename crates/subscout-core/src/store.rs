//! Durable subscription store seam
//!
//! The detector only asks two questions of its store: does this
//! subscription already exist, and please record this one. [`crate::Database`]
//! is the production implementation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{CreateOutcome, DetectedSubscription};

pub trait SubscriptionStore: Send + Sync {
    /// Whether a subscription with this identity is already recorded
    fn subscription_exists(
        &self,
        user_id: &str,
        provider_name: &str,
        price: Decimal,
        start_date: NaiveDate,
    ) -> Result<bool>;

    /// Record a candidate; an identical existing row yields `AlreadyRecorded`
    fn create_subscription(&self, candidate: &DetectedSubscription) -> Result<CreateOutcome>;
}
