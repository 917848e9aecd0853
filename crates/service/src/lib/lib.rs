use std::sync::Arc;

use alloy::providers::Provider;
use catalist_ops_scripts::env;
use catalist_ops_scripts::scripts::prelude::ScriptRuntime;
use catalist_ops_scripts::tracing as tracing_config;
use common::{setup_prometheus, AppState, ServiceConfig};

pub mod common;
pub mod scheduler;
pub mod server;

pub async fn service_main() -> anyhow::Result<()> {
    tracing_config::setup_logger(
        tracing_config::LoggingConfig::default()
            .with_thread_names(true)
            .use_format(env::LOG_FORMAT.default(tracing_config::LogFormat::Plain)?.value),
    );

    let config = ServiceConfig::from_env()?;
    let (registry, metrics) = setup_prometheus(&config.namespace)?;
    let script_runtime = ScriptRuntime::init_from_env(metrics)?;

    match script_runtime.provider.get_chain_id().await {
        Ok(chain_id) => script_runtime
            .metrics
            .metadata
            .network_chain
            .with_label_values(&[chain_id.to_string().as_str()])
            .set(1.0),
        Err(e) => tracing::warn!("Failed to read chain id: {e:?}"),
    }

    let state = AppState::new(registry, script_runtime);

    // Everything on this span will be appended to all messages
    let main_span = tracing::info_span!(
        "span:main",
        manifest = ?state.script_runtime.config.manifest_path,
        scheduler = config.scheduler.is_some(),
    );
    let scheduler_span = main_span.clone();
    let service_span = main_span.clone();
    let _entered = main_span.entered();

    state.log_config();
    let shared_state = Arc::new(state);

    let maybe_scheduler_thread = scheduler::launch(Arc::clone(&shared_state), config.scheduler, scheduler_span)?;
    let server_thread = server::launch(Arc::clone(&shared_state), config.bind_to, service_span)?;

    if let Some(scheduler_thread) = maybe_scheduler_thread {
        scheduler_thread
            .join()
            .map_err(|_e| anyhow::anyhow!("Scheduler thread panicked"))?;
    }
    server_thread
        .join()
        .map_err(|_e| anyhow::anyhow!("Server thread panicked"))?;
    Ok(())
}
