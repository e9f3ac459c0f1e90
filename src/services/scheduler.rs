use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::ImportService;

pub struct Scheduler {
    imports: Arc<dyn ImportService>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(imports: Arc<dyn ImportService>, config: SchedulerConfig) -> Self {
        Self {
            imports,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Runs the nightly jobs until [`Scheduler::stop`] is called.
    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let mut sched = JobScheduler::new().await?;

        let imports = Arc::clone(&self.imports);
        let running = Arc::clone(&self.running);
        let streak_job = Job::new_async(self.config.streak_cron.as_str(), move |_uuid, _lock| {
            let imports = Arc::clone(&imports);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_streak_job(imports.as_ref(), Local::now().date_naive()).await;
            })
        })?;

        let job_id = sched.add(streak_job).await?;
        sched.start().await?;
        info!(job_id = %job_id, cron = %self.config.streak_cron, "Streak update scheduled");

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }
}

async fn run_streak_job(imports: &dyn ImportService, date: NaiveDate) {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "update_streaks", date = %date, "Starting scheduled streak update");

    match imports.update_video_streaks(date).await {
        Ok(summary) => info!(
            event = "job_finished",
            job_name = "update_streaks",
            evaluated = summary.evaluated,
            reset = summary.reset,
            graduated = summary.graduated,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Scheduled streak update finished"
        ),
        Err(e) => {
            error!(event = "job_failed", job_name = "update_streaks", error = %e, "Scheduled streak update failed");
        }
    }
}
