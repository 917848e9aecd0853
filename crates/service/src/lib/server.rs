use std::any::type_name_of_val;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use axum::{
    extract::{Json, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{Instrument, Span};

use crate::common::{run_snapshot, AppState, Error, SnapshotOutcome};

#[derive(Deserialize)]
struct RunSnapshotParams {
    /// Defaults to true: an explicit request wants a fresh image even without a new report.
    force: Option<bool>,
}

pub fn launch(state: Arc<AppState>, bind_to: SocketAddr, parent_span: Span) -> anyhow::Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let join_handle = thread::Builder::new().name("server".into()).spawn(move || {
        if let Err(e) = runtime.block_on(run_server(state, bind_to, parent_span)) {
            tracing::error!("Server stopped: {e:?}");
        }
    })?;
    Ok(join_handle)
}

pub fn router(state: Arc<AppState>, parent_span: Span) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/run-snapshot", post(run_snapshot_handler))
        .layer(Extension(parent_span))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn run_server(state: Arc<AppState>, bind_to: SocketAddr, parent_span: Span) -> anyhow::Result<()> {
    let app = router(state, parent_span);
    let listener = tokio::net::TcpListener::bind(bind_to).await?;
    tracing::info!("Starting service at {:?}", bind_to);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_handler(state: axum::extract::State<Arc<AppState>>) -> impl IntoResponse {
    match state.report_metrics() {
        Ok((buffer, format)) => Response::builder()
            .header("Content-Type", format)
            .body(buffer.into())
            .map(|response| (StatusCode::OK, response))
            .unwrap_or_else(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create response for metrics".into_response(),
                )
            }),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to collect metrics".into_response(),
        ),
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum RunSnapshotResponse {
    Success { outcome: serde_json::Value },
    Error { kind: String, message: String },
}

fn error_response(e: Error) -> (StatusCode, RunSnapshotResponse) {
    let (kind, message, status_code) = match e {
        Error::AlreadyRunning => (
            type_name_of_val(&e).to_string(),
            e.to_string(),
            StatusCode::TOO_MANY_REQUESTS,
        ),
        Error::SnapshotError(underlying) => (
            type_name_of_val(&underlying).to_string(),
            format!("{underlying:#}"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    };
    (status_code, RunSnapshotResponse::Error { kind, message })
}

fn success_response(outcome: &SnapshotOutcome) -> (StatusCode, RunSnapshotResponse) {
    match serde_json::to_value(outcome) {
        Ok(outcome) => (StatusCode::OK, RunSnapshotResponse::Success { outcome }),
        Err(e) => error_response(Error::SnapshotError(e.into())),
    }
}

async fn run_snapshot_handler(
    state: axum::extract::State<Arc<AppState>>,
    Query(params): Query<RunSnapshotParams>,
    Extension(parent_span): Extension<Span>,
) -> (StatusCode, Json<RunSnapshotResponse>) {
    async {
        state
            .metrics()
            .metadata
            .run_snapshot_counter
            .with_label_values(&["http"])
            .inc();

        let (status_code, body) = match run_snapshot(&state, params.force.unwrap_or(true)).await {
            Ok(outcome) => success_response(&outcome),
            Err(e) => error_response(e),
        };
        (status_code, Json(body))
    }
    .instrument(parent_span)
    .await
}
