//! Transaction grouping, recurrence and billing cadence
//!
//! A cluster is every transaction of one user sharing the same normalized
//! wording and the same absolute amount. Only the two earliest occurrences
//! of a cluster (its anchor) are used to judge recurrence and cadence.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::models::{BillingCycle, Transaction};
use crate::normalize::normalize;

/// Transactions sharing one (normalized wording, absolute amount) key
#[derive(Debug, Clone)]
pub struct TransactionCluster {
    pub normalized_wording: String,
    pub abs_amount: Decimal,
    /// Ascending by date; same-day transactions keep their input order
    pub occurrences: Vec<Transaction>,
}

impl TransactionCluster {
    pub fn earliest(&self) -> Option<&Transaction> {
        self.occurrences.first()
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

/// Partition a transaction set into clusters, in key order
///
/// Transactions whose date does not parse are dropped.
pub fn group(transactions: &[Transaction]) -> Vec<TransactionCluster> {
    let mut buckets: BTreeMap<(String, Decimal), Vec<(NaiveDate, &Transaction)>> = BTreeMap::new();

    for tx in transactions {
        let Some(date) = tx.parsed_date() else {
            debug!("Dropping transaction {} with malformed date '{}'", tx.id, tx.date);
            continue;
        };
        let key = (normalize(tx.wording()), tx.abs_amount().normalize());
        buckets.entry(key).or_default().push((date, tx));
    }

    buckets
        .into_iter()
        .map(|((normalized_wording, abs_amount), mut dated)| {
            dated.sort_by_key(|(date, _)| *date);
            TransactionCluster {
                normalized_wording,
                abs_amount,
                occurrences: dated.into_iter().map(|(_, tx)| tx.clone()).collect(),
            }
        })
        .collect()
}

/// Dates of the two earliest occurrences
///
/// None for clusters with fewer than two occurrences or an unparseable
/// anchor date.
pub fn cycle_anchor(cluster: &TransactionCluster) -> Option<(NaiveDate, NaiveDate)> {
    let first = cluster.occurrences.first()?.parsed_date()?;
    let second = cluster.occurrences.get(1)?.parsed_date()?;
    Some((first, second))
}

/// Whether the anchor occurrences are close enough to be a recurring charge
pub fn is_recurring(cluster: &TransactionCluster, config: &DetectionConfig) -> bool {
    match cycle_anchor(cluster) {
        Some((first, second)) => {
            gap_hours(first, second) <= days_to_hours(config.max_anchor_gap_days)
        }
        None => false,
    }
}

/// Cadence from the gap between the anchor dates
///
/// Gaps past the annual bound fall back to `Quarterly`, which keeps the
/// boundaries stored subscriptions were classified with.
pub fn classify_billing_cycle(
    first: NaiveDate,
    second: NaiveDate,
    config: &DetectionConfig,
) -> BillingCycle {
    let hours = gap_hours(first, second);
    if hours <= days_to_hours(config.monthly_max_days) {
        BillingCycle::Monthly
    } else if hours <= days_to_hours(config.annual_max_days) {
        BillingCycle::Annual
    } else {
        BillingCycle::Quarterly
    }
}

fn gap_hours(first: NaiveDate, second: NaiveDate) -> i64 {
    (second - first).num_hours()
}

fn days_to_hours(days: i64) -> i64 {
    days.saturating_mul(24)
}
