//! Scheduled job loop.

use chrono::Utc;
use std::future::Future;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cron_schedule::CronSchedule;

/// Spawn a task that runs `job` at every fire time of `schedule`.
///
/// The loop exits when `shutdown` receives a message (or its sender is
/// dropped). A job already in progress is allowed to finish.
pub fn spawn_job<F, Fut>(
    name: impl Into<String>,
    schedule: CronSchedule,
    job: F,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let name = name.into();

    tokio::spawn(async move {
        info!(job = %name, schedule = %schedule.expression(), "Scheduled job started");
        loop {
            let Some(wait) = schedule.until_next(Utc::now()) else {
                warn!(job = %name, "Schedule has no upcoming fire time, stopping");
                break;
            };
            debug!(job = %name, wait_secs = wait.as_secs(), "Waiting for next fire time");

            tokio::select! {
                _ = shutdown.recv() => {
                    info!(job = %name, "Scheduled job received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    debug!(job = %name, "Running scheduled job");
                    job().await;
                }
            }
        }
        info!(job = %name, "Scheduled job stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_job_fires_until_shutdown() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let handle = spawn_job(
            "every-second",
            CronSchedule::parse("* * * * * *").unwrap(),
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            },
            shutdown_rx,
        );

        tokio::time::sleep(Duration::from_millis(2300)).await;
        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        let fired = runs.load(Ordering::SeqCst);
        assert!(fired >= 1, "job fired {} times", fired);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), fired);
    }

    #[tokio::test]
    async fn test_job_stops_when_sender_dropped() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let handle = spawn_job(
            "daily",
            CronSchedule::parse("0 0 6 * * *").unwrap(),
            || async {},
            shutdown_rx,
        );

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
