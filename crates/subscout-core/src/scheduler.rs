//! Periodic detection for every connected user
//!
//! Each tick runs one detection pass per stored bank connection. Users run
//! concurrently, at most `scheduler.max_concurrent_users` at a time, and each
//! pass is bounded by `scheduler.run_timeout_secs`. A failed or timed out
//! user is logged and does not affect the others; the next tick retries it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::interval;
use tracing::{error, info};

use crate::bank::TransactionSource;
use crate::config::{Config, DetectionConfig, SchedulerConfig};
use crate::db::Database;
use crate::detect::SubscriptionDetector;
use crate::error::{Error, Result};
use crate::logo::LogoLookup;

/// Outcome of one scheduled pass over all users
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub users: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Subscriptions created across all users
    pub created: usize,
}

/// Runs detection for every user with a stored bank connection
#[derive(Clone)]
pub struct DetectionScheduler {
    db: Database,
    source: Arc<dyn TransactionSource>,
    logos: Arc<dyn LogoLookup>,
    detection: DetectionConfig,
    logo_timeout: Duration,
    schedule: SchedulerConfig,
}

impl DetectionScheduler {
    pub fn new(
        db: Database,
        source: Arc<dyn TransactionSource>,
        logos: Arc<dyn LogoLookup>,
        config: &Config,
    ) -> Self {
        Self {
            db,
            source,
            logos,
            detection: config.detection.clone(),
            logo_timeout: config.logo.timeout(),
            schedule: config.scheduler.clone(),
        }
    }

    /// One pass over every connected user
    pub async fn run_once(&self) -> Result<ScheduledRun> {
        let connections = self.db.list_bank_connections()?;
        let semaphore = Arc::new(Semaphore::new(self.schedule.max_concurrent_users.max(1)));
        let run_timeout = self.schedule.run_timeout();
        let mut tasks = JoinSet::new();

        let mut run = ScheduledRun {
            users: connections.len(),
            ..Default::default()
        };

        for connection in connections {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::InvalidData(format!("Scheduler semaphore closed: {}", e)))?;

            let db = self.db.clone();
            let source = Arc::clone(&self.source);
            let logos = Arc::clone(&self.logos);
            let detection = self.detection.clone();
            let logo_timeout = self.logo_timeout;
            let user_id = connection.user_id;

            tasks.spawn(async move {
                let _permit = permit;
                let detector = SubscriptionDetector::new(&db)
                    .with_config(detection)
                    .with_logos(logos.as_ref(), logo_timeout);
                let outcome = tokio::time::timeout(
                    run_timeout,
                    detector.detect_for_user(&user_id, source.as_ref()),
                )
                .await;
                (user_id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(Ok(results)))) => {
                    run.succeeded += 1;
                    run.created += results.created.len();
                }
                Ok((user_id, Ok(Err(e)))) => {
                    error!(user_id = %user_id, error = %e, "Scheduled detection failed");
                    run.failed += 1;
                }
                Ok((user_id, Err(_))) => {
                    error!(
                        user_id = %user_id,
                        "Scheduled detection timed out after {}s",
                        run_timeout.as_secs()
                    );
                    run.timed_out += 1;
                }
                Err(e) => {
                    error!("Scheduled detection task aborted: {}", e);
                    run.failed += 1;
                }
            }
        }

        info!(
            "Scheduled detection complete: {} users, {} succeeded, {} failed, {} timed out, {} subscriptions created",
            run.users, run.succeeded, run.failed, run.timed_out, run.created
        );

        Ok(run)
    }
}

/// Start the detection scheduler as a background task
///
/// Runs every `scheduler.interval_hours`; the first pass happens one
/// interval after startup.
pub fn start_detection_scheduler(scheduler: DetectionScheduler) -> JoinHandle<()> {
    info!(
        "Starting detection scheduler: every {} hours, {} users at a time",
        scheduler.schedule.interval_hours, scheduler.schedule.max_concurrent_users
    );

    tokio::spawn(async move {
        let mut ticker = interval(scheduler.schedule.interval());

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            info!("Running scheduled detection...");
            if let Err(e) = scheduler.run_once().await {
                error!("Scheduled detection failed: {}", e);
            }
        }
    })
}
