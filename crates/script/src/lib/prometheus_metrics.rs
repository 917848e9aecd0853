use std::fmt::Debug;
use std::future::Future;

use prometheus::{Gauge, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

pub trait Registar {
    fn register_on(&self, registry: &Registry) -> prometheus::Result<()>;
}

pub struct Metrics {
    pub metadata: Metadata,
    pub snapshot: Snapshot,
    pub services: Services,
    pub execution: Execution,
}

impl Registar for Metrics {
    fn register_on(&self, registry: &Registry) -> prometheus::Result<()> {
        self.metadata.register_on(registry)?;
        self.snapshot.register_on(registry)?;
        self.services.register_on(registry)?;
        self.execution.register_on(registry)?;
        Ok(())
    }
}

pub struct Metadata {
    pub network_chain: GaugeVec,
    pub app_build_info: GaugeVec,
    pub run_snapshot_counter: IntCounterVec,
}

impl Registar for Metadata {
    fn register_on(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.network_chain.clone()))?;
        registry.register(Box::new(self.app_build_info.clone()))?;
        registry.register(Box::new(self.run_snapshot_counter.clone()))?;
        Ok(())
    }
}

pub struct Snapshot {
    pub holders_count: IntGauge,
    pub total_pooled_ace: Gauge,
    pub total_shares: Gauge,
    pub rebase_count: IntGauge,
    pub timestamp: Gauge,
}

impl Registar for Snapshot {
    fn register_on(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.holders_count.clone()))?;
        registry.register(Box::new(self.total_pooled_ace.clone()))?;
        registry.register(Box::new(self.total_shares.clone()))?;
        registry.register(Box::new(self.rebase_count.clone()))?;
        registry.register(Box::new(self.timestamp.clone()))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Service {
    pub call_count: IntCounterVec,
    pub error_count: IntCounterVec,
    pub execution_time_seconds: HistogramVec,
}

impl Registar for Service {
    fn register_on(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.call_count.clone()))?;
        registry.register(Box::new(self.error_count.clone()))?;
        registry.register(Box::new(self.execution_time_seconds.clone()))?;
        Ok(())
    }
}

impl Service {
    pub async fn run_with_metrics_and_logs_async<T, E, F, Fut>(&self, operation: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Debug,
    {
        self.call_count.with_label_values(&[operation]).inc();
        let timer = self.execution_time_seconds.with_label_values(&[operation]).start_timer();
        let result = f().await;
        let elapsed = timer.stop_and_record();
        match &result {
            Ok(_) => tracing::debug!(operation, elapsed, "Call succeeded"),
            Err(e) => {
                self.error_count.with_label_values(&[operation]).inc();
                tracing::warn!(operation, elapsed, "Call failed: {e:?}");
            }
        }
        result
    }
}

pub struct Services {
    pub eth_client: Service,
    pub contracts: Service,
}

impl Registar for Services {
    fn register_on(&self, registry: &Registry) -> prometheus::Result<()> {
        self.eth_client.register_on(registry)?;
        self.contracts.register_on(registry)?;
        Ok(())
    }
}

pub struct Execution {
    pub execution_time_seconds: Gauge,
    pub outcome: GaugeVec,
}

impl Registar for Execution {
    fn register_on(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.execution_time_seconds.clone()))?;
        registry.register(Box::new(self.outcome.clone()))?;
        Ok(())
    }
}

pub mod services {
    pub mod eth_client {
        pub const GET_LATEST_BLOCK: &str = "get_latest_block";
        pub const GET_LOGS: &str = "get_logs";
        pub const DEPLOY: &str = "deploy";
    }

    pub mod contracts {
        pub const CALL: &str = "call";
        pub const SEND: &str = "send";
    }
}

pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const SKIPPED: &str = "skipped";
    pub const FAILURE: &str = "failure";
}

pub fn register_int_counter_vec(
    namespace: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> prometheus::Result<IntCounterVec> {
    let opts = Opts::new(name, help).namespace(namespace.to_string());
    IntCounterVec::new(opts, labels)
}

pub fn register_gauge(namespace: &str, name: &str, help: &str) -> prometheus::Result<Gauge> {
    let opts = Opts::new(name, help).namespace(namespace.to_string());
    Gauge::with_opts(opts)
}

pub fn register_int_gauge(namespace: &str, name: &str, help: &str) -> prometheus::Result<IntGauge> {
    let opts = Opts::new(name, help).namespace(namespace.to_string());
    IntGauge::with_opts(opts)
}

pub fn register_gauge_vec(namespace: &str, name: &str, help: &str, labels: &[&str]) -> prometheus::Result<GaugeVec> {
    let opts = Opts::new(name, help).namespace(namespace.to_string());
    GaugeVec::new(opts, labels)
}

pub fn register_histogram_vec(
    namespace: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> prometheus::Result<HistogramVec> {
    let opts = HistogramOpts::new(name, help).namespace(namespace.to_string());
    HistogramVec::new(opts, labels)
}

impl Metrics {
    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        let metadata = Metadata {
            network_chain: register_gauge_vec(
                namespace,
                "metadata__network_chain",
                "Network Chain ID",
                &["chain_id"],
            )?,
            app_build_info: register_gauge_vec(
                namespace,
                "metadata__app_build_info",
                "Application Build Info",
                &["version", "target"],
            )?,
            run_snapshot_counter: register_int_counter_vec(
                namespace,
                "metadata__snapshot_runs",
                "Number of shares image runs",
                &["caller"],
            )?,
        };

        let snapshot = Snapshot {
            holders_count: register_int_gauge(namespace, "snapshot__holders_count", "bACE holders in the last image")?,
            total_pooled_ace: register_gauge(namespace, "snapshot__total_pooled_ace", "Total pooled ACE, in ACE")?,
            total_shares: register_gauge(namespace, "snapshot__total_shares", "Total shares, in 1e18 units")?,
            rebase_count: register_int_gauge(namespace, "snapshot__rebase_count", "Observed TokenRebased events")?,
            timestamp: register_gauge(namespace, "snapshot__timestamp", "Unix timestamp of the last image")?,
        };

        fn build_service_metrics(namespace: &str, component: &str) -> prometheus::Result<Service> {
            Ok(Service {
                call_count: register_int_counter_vec(
                    namespace,
                    &format!("external__{component}__call_count"),
                    "Total call count",
                    &["operation"],
                )?,
                error_count: register_int_counter_vec(
                    namespace,
                    &format!("external__{component}__error_count"),
                    "Failed call count",
                    &["operation"],
                )?,
                execution_time_seconds: register_histogram_vec(
                    namespace,
                    &format!("{component}_execution_time_seconds"),
                    "Execution time in seconds",
                    &["operation"],
                )?,
            })
        }

        let services = Services {
            eth_client: build_service_metrics(namespace, "eth_client")?,
            contracts: build_service_metrics(namespace, "contracts")?,
        };

        let execution = Execution {
            execution_time_seconds: register_gauge(
                namespace,
                "execution__execution_time_seconds",
                "Total execution time",
            )?,
            outcome: register_gauge_vec(
                namespace,
                "execution__execution_outcome",
                "Execution outcome",
                &["outcome"],
            )?,
        };

        Ok(Metrics {
            metadata,
            snapshot,
            services,
            execution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_metric_once() {
        let registry = Registry::new();
        let metrics = Metrics::new("catalist_test").unwrap();
        metrics.register_on(&registry).unwrap();
        metrics.snapshot.holders_count.set(3);
        metrics.metadata.run_snapshot_counter.with_label_values(&["http"]).inc();

        let names: Vec<String> = registry.gather().iter().map(|mf| mf.get_name().to_owned()).collect();
        assert!(names.contains(&"catalist_test_snapshot__holders_count".to_owned()));
        assert!(names.contains(&"catalist_test_metadata__snapshot_runs".to_owned()));

        assert!(metrics.register_on(&registry).is_err());
    }

    #[tokio::test]
    async fn service_wrapper_counts_failures() {
        let metrics = Metrics::new("catalist_wrapper_test").unwrap();
        let service = &metrics.services.eth_client;

        let ok: Result<u32, String> = service.run_with_metrics_and_logs_async("op", || async { Ok(1) }).await;
        let err: Result<u32, String> = service
            .run_with_metrics_and_logs_async("op", || async { Err("boom".to_owned()) })
            .await;

        assert_eq!(ok, Ok(1));
        assert!(err.is_err());
        assert_eq!(service.call_count.with_label_values(&["op"]).get(), 2);
        assert_eq!(service.error_count.with_label_values(&["op"]).get(), 1);
    }
}
