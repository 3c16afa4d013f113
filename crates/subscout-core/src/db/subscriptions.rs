//! Subscription operations

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::{params, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{
    BillingCycle, CategorySummary, CreateOutcome, DetectedSubscription, Subscription, DATE_FORMAT,
};
use crate::store::SubscriptionStore;

/// Canonical text form of a price, so 9.9 and 9.90 compare equal in SQL
fn price_key(price: Decimal) -> String {
    price.normalize().to_string()
}

fn row_to_subscription(row: &Row) -> rusqlite::Result<Subscription> {
    let price_str: String = row.get(4)?;
    let start_str: String = row.get(5)?;
    let cycle_str: String = row.get(6)?;
    let created_at_str: String = row.get(9)?;

    let price = price_str.parse::<Decimal>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let start_date = NaiveDate::parse_from_str(&start_str, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let billing_cycle = cycle_str.parse::<BillingCycle>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider_name: row.get(2)?,
        category: row.get(3)?,
        price,
        start_date,
        billing_cycle,
        logo_url: row.get(7)?,
        active: row.get(8)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Dedup gate: exact match on user, provider, price and start date
    pub fn subscription_exists(
        &self,
        user_id: &str,
        provider_name: &str,
        price: Decimal,
        start_date: NaiveDate,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM subscriptions
                WHERE user_id = ? AND provider_name = ? AND price = ? AND start_date = ?
            )
            "#,
            params![
                user_id,
                provider_name,
                price_key(price),
                start_date.format(DATE_FORMAT).to_string()
            ],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert a detected subscription unless its identity is already stored
    pub fn create_subscription(&self, candidate: &DetectedSubscription) -> Result<CreateOutcome> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO subscriptions
                (user_id, provider_name, category, price, start_date, billing_cycle, logo_url, active)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT(user_id, provider_name, price, start_date) DO NOTHING
            "#,
            params![
                candidate.user_id,
                candidate.provider_name,
                candidate.category,
                price_key(candidate.price),
                candidate.start_date.format(DATE_FORMAT).to_string(),
                candidate.billing_cycle.as_str(),
                candidate.logo_url,
            ],
        )?;

        if inserted == 0 {
            Ok(CreateOutcome::AlreadyRecorded)
        } else {
            Ok(CreateOutcome::Created(conn.last_insert_rowid()))
        }
    }

    /// All of a user's subscriptions, by category then provider
    pub fn list_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, provider_name, category, price, start_date, billing_cycle,
                   logo_url, active, created_at
            FROM subscriptions
            WHERE user_id = ?
            ORDER BY category, provider_name, start_date
            "#,
        )?;

        let subscriptions = stmt
            .query_map(params![user_id], row_to_subscription)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subscriptions)
    }

    /// A user's active subscriptions grouped by category with monthly totals
    pub fn subscriptions_by_category(&self, user_id: &str) -> Result<Vec<CategorySummary>> {
        let mut by_category: BTreeMap<String, Vec<Subscription>> = BTreeMap::new();
        for sub in self.list_subscriptions(user_id)? {
            if sub.active {
                by_category.entry(sub.category.clone()).or_default().push(sub);
            }
        }

        Ok(by_category
            .into_iter()
            .map(|(category, subscriptions)| CategorySummary {
                count: subscriptions.len(),
                monthly_total: subscriptions
                    .iter()
                    .map(Subscription::monthly_cost)
                    .sum::<Decimal>()
                    .round_dp(2),
                category,
                subscriptions,
            })
            .collect())
    }
}

impl SubscriptionStore for Database {
    fn subscription_exists(
        &self,
        user_id: &str,
        provider_name: &str,
        price: Decimal,
        start_date: NaiveDate,
    ) -> Result<bool> {
        Database::subscription_exists(self, user_id, provider_name, price, start_date)
    }

    fn create_subscription(&self, candidate: &DetectedSubscription) -> Result<CreateOutcome> {
        Database::create_subscription(self, candidate)
    }
}
