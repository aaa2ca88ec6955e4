use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct JobSpec {
    pub name: String,
    pub interval: Duration,
    /// Fire once at start instead of waiting a full interval.
    pub run_immediately: bool,
}

/// Handle to a running periodic job. Dropping it leaves the job running;
/// call [`ScheduleHandle::stop`] or cancel the token to end it.
pub struct ScheduleHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl ScheduleHandle {
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop issuing ticks. Runs already spawned finish on their own.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "scheduler task ended abnormally");
        }
    }
}

/// Spawn `job` on every tick. Each run gets its own task, so a run that
/// outlives the interval overlaps with the next one.
pub fn start<F, Fut>(spec: JobSpec, job: F) -> ScheduleHandle
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let join = tokio::spawn(async move {
        let now = Instant::now();
        let start_at = if spec.run_immediately {
            now
        } else {
            now.checked_add(spec.interval).unwrap_or_else(|| {
                tracing::warn!(job = %spec.name, "interval overflows the clock, firing now");
                now
            })
        };
        let mut interval = tokio::time::interval_at(start_at, spec.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::info!(job = %spec.name, "scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    tracing::debug!(job = %spec.name, "scheduler tick");
                    tokio::spawn(job());
                }
            }
        }
    });

    ScheduleHandle { cancel, join }
}
