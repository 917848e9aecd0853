use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use catalist_ops_scripts::env::{self, EnvError};
use catalist_ops_scripts::prometheus_metrics::{self, Metrics, Registar};
use catalist_ops_scripts::scripts::{self, shares_image};
use cron::Schedule;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;

pub const DEFAULT_NAMESPACE: &str = "catalist_snapshot";
pub const DEFAULT_SCHEDULE: &str = "0 0 * * * *";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub schedule: Schedule,
    pub timezone: chrono_tz::Tz,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_to: SocketAddr,
    pub scheduler: Option<SchedulerConfig>,
    pub namespace: String,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, EnvError> {
        let bind_to = env::SERVICE_BIND_TO_ADDR
            .default(SocketAddr::from(([0, 0, 0, 0], 8080)))?
            .value;
        let scheduler = if env::INTERNAL_SCHEDULER.default(false)?.value {
            Some(SchedulerConfig {
                schedule: match env::INTERNAL_SCHEDULER_CRON.optional::<Schedule>()?.value {
                    Some(schedule) => schedule,
                    None => DEFAULT_SCHEDULE.parse().map_err(|_e| EnvError::Invalid {
                        key: env::INTERNAL_SCHEDULER_CRON.key,
                        value: DEFAULT_SCHEDULE.to_owned(),
                    })?,
                },
                timezone: env::INTERNAL_SCHEDULER_TZ.default(chrono_tz::UTC)?.value,
            })
        } else {
            None
        };
        let namespace = env::PROMETHEUS_NAMESPACE
            .default(DEFAULT_NAMESPACE.to_owned())?
            .value;
        Ok(Self {
            bind_to,
            scheduler,
            namespace,
        })
    }
}

pub struct AppState {
    pub registry: Registry,
    pub script_runtime: scripts::prelude::ScriptRuntime,
    pub snapshot_dir: PathBuf,
    pub run_lock: Arc<tokio::sync::Mutex<()>>,
    /// `TokenRebased` count seen by the last run; zero until the first run.
    pub last_rebase_count: AtomicU64,
}

impl AppState {
    pub fn new(registry: Registry, script_runtime: scripts::prelude::ScriptRuntime) -> Self {
        let snapshot_dir = script_runtime.config.shares_image_dir.clone();
        Self {
            registry,
            script_runtime,
            snapshot_dir,
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
            last_rebase_count: AtomicU64::new(0),
        }
    }

    pub fn log_config(&self) {
        tracing::info!(
            config = ?self.script_runtime.config,
            snapshot_dir = ?self.snapshot_dir,
            "Runtime config",
        );
    }

    pub fn metrics(&self) -> &Metrics {
        &self.script_runtime.metrics
    }

    pub fn report_metrics(&self) -> Result<(Vec<u8>, String), prometheus::Error> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buffer)?;
        Ok((buffer, encoder.format_type().to_owned()))
    }
}

pub fn setup_prometheus(namespace: &str) -> prometheus::Result<(Registry, Arc<Metrics>)> {
    let registry = Registry::new();
    let metrics = Metrics::new(namespace)?;
    metrics.register_on(&registry)?;
    metrics
        .metadata
        .app_build_info
        .with_label_values(&[env!("CARGO_PKG_VERSION"), std::env::consts::ARCH])
        .set(1.0);
    Ok((registry, Arc::new(metrics)))
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Already running shares image snapshot")]
    AlreadyRunning,
    #[error(transparent)]
    SnapshotError(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOutcome {
    Taken {
        file: String,
        holders: usize,
        block_number: u64,
        rebase_count: u64,
    },
    NoNewReport {
        rebase_count: u64,
    },
}

/// A snapshot is due when an oracle report landed since the previous run, or when forced.
pub fn should_snapshot(previous_rebase_count: u64, current_rebase_count: u64, force: bool) -> bool {
    force || current_rebase_count > previous_rebase_count
}

pub async fn run_snapshot(state: &AppState, force: bool) -> Result<SnapshotOutcome, Error> {
    match state.run_lock.try_lock() {
        Ok(_guard) => {
            let started = std::time::Instant::now();
            let result = run_snapshot_impl(state, force).await;
            state
                .metrics()
                .execution
                .execution_time_seconds
                .set(started.elapsed().as_secs_f64());
            let outcome = match &result {
                Ok(SnapshotOutcome::Taken { .. }) => prometheus_metrics::outcome::SUCCESS,
                Ok(SnapshotOutcome::NoNewReport { .. }) => prometheus_metrics::outcome::SKIPPED,
                Err(_) => prometheus_metrics::outcome::FAILURE,
            };
            state.metrics().execution.outcome.with_label_values(&[outcome]).inc();
            result
        }
        Err(e) => {
            tracing::debug!("Failed to acquire mutex lock - already running: {e:?}");
            Err(Error::AlreadyRunning)
        }
    }
}

async fn run_snapshot_impl(state: &AppState, force: bool) -> Result<SnapshotOutcome, Error> {
    let runtime = &state.script_runtime;
    let rebase_count = shares_image::rebase_count(runtime).await?;
    let previous = state.last_rebase_count.load(Ordering::SeqCst);

    if !should_snapshot(previous, rebase_count, force) {
        tracing::info!(rebase_count, "No report submitted");
        return Ok(SnapshotOutcome::NoNewReport { rebase_count });
    }
    tracing::info!(previous, rebase_count, force, "New report submitted, taking shares image");

    let snapshot = shares_image::take_snapshot(runtime, &state.snapshot_dir)
        .await
        .inspect_err(|e| tracing::error!("Failed to take shares image {e:?}"))?;
    state.last_rebase_count.store(rebase_count, Ordering::SeqCst);

    Ok(SnapshotOutcome::Taken {
        file: snapshot.path.display().to_string(),
        holders: snapshot.image.holders_count(),
        block_number: snapshot.block_number,
        rebase_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_only_after_new_reports() {
        assert!(!should_snapshot(0, 0, false));
        assert!(should_snapshot(0, 1, false));
        assert!(!should_snapshot(3, 3, false));
        assert!(should_snapshot(3, 3, true));
        // A reorg can shrink the count; wait for it to grow past what was seen.
        assert!(!should_snapshot(3, 2, false));
    }

    #[test]
    fn prometheus_exposes_build_info() {
        let (registry, _metrics) = setup_prometheus("catalist_service_test").unwrap();
        let names: Vec<String> = registry.gather().iter().map(|mf| mf.get_name().to_owned()).collect();
        assert!(names.contains(&"catalist_service_test_metadata__app_build_info".to_owned()));
    }

    #[test]
    fn outcome_serializes_with_snake_case_tag() {
        let json = serde_json::to_value(SnapshotOutcome::NoNewReport { rebase_count: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"no_new_report": {"rebase_count": 4}}));
    }
}
