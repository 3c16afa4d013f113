//! Domain models for Subscout

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Date format used by the aggregator and the store
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A bank transaction as delivered by the aggregator
///
/// Read-only input to the detection engine. `date` stays a string because
/// upstream data is not trusted to be well formed; see [`Transaction::parsed_date`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "id_account", default)]
    pub account_id: i64,
    pub date: String,
    #[serde(default)]
    pub original_wording: String,
    #[serde(default)]
    pub simplified_wording: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Signed amount, negative for debits
    pub value: Decimal,
    #[serde(default)]
    pub formatted_value: String,
}

impl Transaction {
    /// The descriptor used for matching: simplified wording, or the original
    /// wording when the aggregator left the simplified one blank.
    pub fn wording(&self) -> &str {
        if self.simplified_wording.trim().is_empty() {
            &self.original_wording
        } else {
            &self.simplified_wording
        }
    }

    /// Calendar date, or None if the aggregator sent something unparseable
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok()
    }

    pub fn abs_amount(&self) -> Decimal {
        self.value.abs()
    }
}

/// Aggregator response envelope for a transaction listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionsResponse {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Billing cadence of a subscription
///
/// The store accepts all five values. Detection only ever produces
/// `Monthly`, `Quarterly` and `Annual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
    OneTime,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SemiAnnual => "semi_annual",
            Self::Annual => "annual",
            Self::OneTime => "one_time",
        }
    }

    /// Number of billing periods per year, used for monthly-equivalent costs
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Self::Monthly => 12,
            Self::Quarterly => 4,
            Self::SemiAnnual => 2,
            Self::Annual => 1,
            Self::OneTime => 0,
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semi_annual" | "semiannual" => Ok(Self::SemiAnnual),
            "annual" | "yearly" => Ok(Self::Annual),
            "one_time" | "onetime" => Ok(Self::OneTime),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subscription inferred from a user's transactions, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSubscription {
    pub user_id: String,
    pub provider_name: String,
    pub category: String,
    /// Always positive
    pub price: Decimal,
    pub start_date: NaiveDate,
    pub billing_cycle: BillingCycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// A durable subscription record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: String,
    pub provider_name: String,
    pub category: String,
    pub price: Decimal,
    pub start_date: NaiveDate,
    pub billing_cycle: BillingCycle,
    pub logo_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Price spread over one month; one-time purchases cost nothing monthly
    pub fn monthly_cost(&self) -> Decimal {
        let periods = self.billing_cycle.periods_per_year();
        self.price * Decimal::from(periods) / Decimal::from(12)
    }
}

/// Outcome of persisting a detected subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(i64),
    /// A row with the same (user, provider, price, start date) already exists
    AlreadyRecorded,
}

/// Aggregator credentials for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConnection {
    pub user_id: String,
    pub powens_user_id: i64,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscriptions of one category with their combined cost
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    /// Sum of [`Subscription::monthly_cost`], rounded to cents
    pub monthly_total: Decimal,
    pub subscriptions: Vec<Subscription>,
}
