use std::sync::Arc;
use std::thread;

use chrono::Utc;
use cron::Schedule;
use tokio::time::Duration;
use tracing::Span;

use crate::common::{run_snapshot, AppState, Error, SchedulerConfig, SnapshotOutcome};

async fn scheduler_loop(state: Arc<AppState>, schedule: Schedule, timezone: chrono_tz::Tz) {
    let upcoming = schedule.upcoming(timezone);

    for next in upcoming {
        let now = Utc::now().with_timezone(&timezone);
        let duration = next - now;
        let sleep_duration = duration.to_std().unwrap_or(Duration::from_secs(0));
        tracing::info!("Next run at {} ({} seconds)", next, sleep_duration.as_secs());

        tokio::time::sleep(sleep_duration).await;
        scheduled_snapshot(Arc::clone(&state)).await;
    }
}

async fn scheduled_snapshot(state: Arc<AppState>) {
    state
        .metrics()
        .metadata
        .run_snapshot_counter
        .with_label_values(&["scheduler"])
        .inc();
    match run_snapshot(&state, false).await {
        Ok(SnapshotOutcome::Taken { file, holders, .. }) => {
            tracing::info!(file, holders, "Saved shares image")
        }
        Ok(SnapshotOutcome::NoNewReport { .. }) => {}
        Err(Error::AlreadyRunning) => tracing::warn!("Already running - skipping scheduled run"),
        Err(Error::SnapshotError(underlying)) => tracing::error!("Failed to run: {underlying:?}"),
    }
}

pub fn launch(
    state: Arc<AppState>,
    config: Option<SchedulerConfig>,
    parent_span: Span,
) -> anyhow::Result<Option<thread::JoinHandle<()>>> {
    let Some(SchedulerConfig { schedule, timezone }) = config else {
        tracing::info!("Scheduler disabled");
        return Ok(None);
    };

    tracing::info!("Scheduler enabled. Using timezone {} and schedule: {}", timezone, schedule);

    let runtime = tokio::runtime::Runtime::new()?;
    let join_handle = thread::Builder::new().name("scheduler".into()).spawn(move || {
        let _enter = parent_span.enter();
        runtime.block_on(scheduler_loop(state, schedule, timezone));
    })?;
    Ok(Some(join_handle))
}
