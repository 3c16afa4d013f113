//! Scheduled detection command

use std::sync::Arc;

use anyhow::{Context, Result};
use subscout_core::{
    logo, start_detection_scheduler, Config, Database, DetectionScheduler, LogoLookup,
    PowensClient, PowensSource,
};

pub async fn cmd_watch(db: Database, config: &Config, once: bool) -> Result<()> {
    let client = PowensClient::new(&config.powens).context("Failed to build Powens client")?;
    let source = Arc::new(PowensSource::new(client, db.clone()));
    let logos: Arc<dyn LogoLookup> =
        Arc::from(logo::from_config(&config.logo).context("Failed to build logo client")?);
    let scheduler = DetectionScheduler::new(db, source, logos, config);

    if once {
        println!("🔍 Running detection for every connected user...");
        let run = scheduler.run_once().await.context("Scheduled detection failed")?;
        println!(
            "✅ {} users: {} succeeded, {} failed, {} timed out, {} new subscriptions",
            run.users, run.succeeded, run.failed, run.timed_out, run.created
        );
        return Ok(());
    }

    println!(
        "⏰ Detecting every {} hours (Ctrl-C to stop)",
        config.scheduler.interval_hours
    );
    let handle = start_detection_scheduler(scheduler);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    handle.abort();
    println!("👋 Scheduler stopped");

    Ok(())
}
