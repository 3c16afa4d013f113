//! Subscription detection
//!
//! One pass over a single user's transactions:
//! - Group by normalized wording and absolute amount
//! - Keep clusters whose two earliest charges are close enough to recur
//! - Resolve each cluster to a known provider (pattern, then fuzzy)
//! - Classify the billing cycle from the anchor gap
//! - Skip subscriptions already recorded, look up a logo, persist
//!
//! A failure on one candidate never aborts the others.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bank::TransactionSource;
use crate::catalog::Catalog;
use crate::cluster::{classify_billing_cycle, cycle_anchor, group, is_recurring};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::logo::LogoLookup;
use crate::matcher::{resolve, MatchStage};
use crate::models::{CreateOutcome, DetectedSubscription, Transaction};
use crate::store::SubscriptionStore;

/// Default bound on a single logo lookup
const DEFAULT_LOGO_TIMEOUT: Duration = Duration::from_secs(5);

/// Results of running detection for one user
#[derive(Debug, Default)]
pub struct DetectionResults {
    /// Subscriptions persisted by this run
    pub created: Vec<DetectedSubscription>,
    pub clusters: usize,
    pub recurring: usize,
    pub matched: usize,
    /// Candidates skipped because the store already had them
    pub already_recorded: usize,
    /// Candidates dropped after a store error
    pub failed: usize,
}

/// Candidates plus the counters of the pure stages
struct Analysis {
    candidates: Vec<DetectedSubscription>,
    clusters: usize,
    recurring: usize,
}

/// Runs the detection pipeline against a store
///
/// Holds only shared references, so one detector can serve any number of
/// users and runs for different users can proceed concurrently.
pub struct SubscriptionDetector<'a> {
    store: &'a dyn SubscriptionStore,
    catalog: &'a Catalog,
    config: DetectionConfig,
    logos: Option<&'a dyn LogoLookup>,
    logo_timeout: Duration,
}

impl<'a> SubscriptionDetector<'a> {
    /// Detector over the builtin catalog with default thresholds and no logos
    pub fn new(store: &'a dyn SubscriptionStore) -> Self {
        Self {
            store,
            catalog: Catalog::builtin(),
            config: DetectionConfig::default(),
            logos: None,
            logo_timeout: DEFAULT_LOGO_TIMEOUT,
        }
    }

    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_catalog(mut self, catalog: &'a Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Enrich candidates with logos; each lookup is bounded by `timeout`
    pub fn with_logos(mut self, logos: &'a dyn LogoLookup, timeout: Duration) -> Self {
        self.logos = Some(logos);
        self.logo_timeout = timeout;
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Fetch a user's batch from `source`, then [`detect`](Self::detect)
    ///
    /// A failed fetch fails the run; there is nothing to process.
    pub async fn detect_for_user(
        &self,
        user_id: &str,
        source: &dyn TransactionSource,
    ) -> Result<DetectionResults> {
        let transactions = source.fetch_transactions(user_id).await?;
        self.detect(user_id, &transactions).await
    }

    /// Detect and persist new subscriptions in a transaction batch
    pub async fn detect(
        &self,
        user_id: &str,
        transactions: &[Transaction],
    ) -> Result<DetectionResults> {
        let analysis = self.analyze(user_id, transactions);
        let mut results = DetectionResults {
            clusters: analysis.clusters,
            recurring: analysis.recurring,
            matched: analysis.candidates.len(),
            ..Default::default()
        };

        for mut candidate in analysis.candidates {
            match self.store.subscription_exists(
                user_id,
                &candidate.provider_name,
                candidate.price,
                candidate.start_date,
            ) {
                Ok(true) => {
                    debug!(
                        provider = %candidate.provider_name,
                        "Subscription already recorded, skipping"
                    );
                    results.already_recorded += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        user_id,
                        provider = %candidate.provider_name,
                        error = %e,
                        "Subscription lookup failed, skipping candidate"
                    );
                    results.failed += 1;
                    continue;
                }
            }

            candidate.logo_url = self.find_logo(&candidate.provider_name).await;

            match self.store.create_subscription(&candidate) {
                Ok(CreateOutcome::Created(id)) => {
                    debug!(id, provider = %candidate.provider_name, "Subscription recorded");
                    results.created.push(candidate);
                }
                Ok(CreateOutcome::AlreadyRecorded) => {
                    results.already_recorded += 1;
                }
                Err(e) => {
                    warn!(
                        user_id,
                        provider = %candidate.provider_name,
                        error = %e,
                        "Failed to record subscription"
                    );
                    results.failed += 1;
                }
            }
        }

        info!(
            user_id,
            "Detection complete: {} clusters, {} recurring, {} matched, {} created, {} already recorded, {} failed",
            results.clusters,
            results.recurring,
            results.matched,
            results.created.len(),
            results.already_recorded,
            results.failed
        );

        Ok(results)
    }

    /// Candidates the batch yields, without consulting or touching the store
    pub fn candidates(&self, user_id: &str, transactions: &[Transaction]) -> Vec<DetectedSubscription> {
        self.analyze(user_id, transactions).candidates
    }

    fn analyze(&self, user_id: &str, transactions: &[Transaction]) -> Analysis {
        let clusters = group(transactions);
        let mut analysis = Analysis {
            candidates: Vec::new(),
            clusters: clusters.len(),
            recurring: 0,
        };

        for cluster in &clusters {
            if !is_recurring(cluster, &self.config) {
                continue;
            }
            analysis.recurring += 1;

            let (Some((first, second)), Some(earliest)) = (cycle_anchor(cluster), cluster.earliest())
            else {
                continue;
            };

            let Some(resolution) = resolve(cluster, self.catalog, &self.config) else {
                debug!(
                    wording = %cluster.normalized_wording,
                    "Recurring charge matches no known provider"
                );
                continue;
            };

            if let MatchStage::Fuzzy { distance } = resolution.stage {
                debug!(
                    wording = %cluster.normalized_wording,
                    provider = %resolution.entry.display_name,
                    distance,
                    "Resolved by edit distance"
                );
            }

            analysis.candidates.push(DetectedSubscription {
                user_id: user_id.to_string(),
                provider_name: resolution.entry.display_name.clone(),
                category: resolution.entry.category.clone(),
                price: earliest.abs_amount(),
                start_date: first,
                billing_cycle: classify_billing_cycle(first, second, &self.config),
                logo_url: None,
            });
        }

        analysis
    }

    async fn find_logo(&self, provider_name: &str) -> Option<String> {
        let logos = self.logos?;
        match tokio::time::timeout(self.logo_timeout, logos.lookup(provider_name)).await {
            Ok(Ok(url)) => Some(url),
            Ok(Err(e)) => {
                debug!(provider = %provider_name, error = %e, "No logo");
                None
            }
            Err(_) => {
                debug!(provider = %provider_name, "Logo lookup timed out");
                None
            }
        }
    }
}
