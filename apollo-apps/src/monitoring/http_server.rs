//! HTTP server for exposing dashboard data using Axum

use super::{
    dashboard::{StatusInfo, ThroughputInfo},
    prometheus_metrics::{sync_counter, PrometheusMetrics},
    snapshot_cache::SnapshotCache,
};
use crate::message::AlertRecord;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use std::{
    future::Future,
    net::SocketAddr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::net::TcpListener;
use tracing::info;

/// Shared state for all HTTP handlers
#[derive(Clone)]
struct ServerState {
    cache: Arc<SnapshotCache>,
    start_time: u64,
    metrics: PrometheusMetrics,
}

const DEFAULT_LIMIT: usize = 25;
const MAX_LIMIT: usize = 100;

#[derive(Deserialize)]
struct Pagination {
    /// Offset for pagination (default: 0)
    #[serde(default)]
    offset: usize,
    /// Limit for pagination (default: 25, max: 100)
    #[serde(default)]
    limit: Option<usize>,
}

impl Pagination {
    fn effective_limit(&self) -> usize {
        self.limit
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }
}

fn paginate<T: Clone>(items: &[T], params: &Pagination) -> (usize, Vec<T>) {
    let total = items.len();
    let limit = params.effective_limit();
    let offset = params.offset.min(total);
    let sliced = items
        .iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect::<Vec<_>>();
    (total, sliced)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// HTTP server that exposes the dashboard snapshot as JSON
pub struct MonitoringServer {
    bind_address: SocketAddr,
    state: ServerState,
}

impl MonitoringServer {
    /// Create a new monitoring server reading from `cache`.
    ///
    /// The server never refreshes the cache itself; whoever owns the dashboard state does.
    pub fn new(
        bind_address: SocketAddr,
        cache: Arc<SnapshotCache>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let metrics = PrometheusMetrics::new()?;

        Ok(Self {
            bind_address,
            state: ServerState {
                cache,
                start_time: now_secs(),
                metrics,
            },
        })
    }

    /// Build the router. Exposed for in-process tests.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Run the monitoring server until the shutdown signal completes
    ///
    /// Exposes the JSON API under `/api/v1` and Prometheus metrics at `/metrics`.
    pub async fn run(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Starting monitoring server on http://{}", self.bind_address);
        info!(
            "Cache refresh interval: {:?}",
            self.state.cache.refresh_interval()
        );

        let app = build_router(self.state);
        let listener = TcpListener::bind(self.bind_address).await?;

        info!(
            "Prometheus metrics available at http://{}/metrics",
            self.bind_address
        );

        let server_handle = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_signal.await;
            info!("Monitoring server received shutdown signal, stopping...");
        });

        let result = server_handle.await;

        info!("Monitoring server stopped");
        result.map_err(|e| e.into())
    }
}

fn build_router(state: ServerState) -> Router {
    // Versioned JSON API under /api/v1
    let api_v1 = Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/throughput", get(handle_throughput))
        .route("/alerts", get(handle_alerts));

    Router::new()
        .route("/", get(handle_root))
        .nest("/api/v1", api_v1)
        .route("/metrics", get(handle_prometheus_metrics))
        .with_state(state)
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    timestamp: u64,
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(serde::Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    status: StatusInfo,
    uptime_secs: u64,
    snapshot_age_ms: Option<u128>,
}

#[derive(serde::Serialize)]
struct AlertsResponse {
    offset: usize,
    limit: usize,
    total: usize,
    items: Vec<AlertRecord>,
}

/// Root endpoint - lists all available APIs
async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "Apollo Command Panel Monitoring API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/": "This endpoint - API listing",
            "/api/v1/health": "Health check",
            "/api/v1/status": "Backend link status and frame counters",
            "/api/v1/throughput": "Throughput window (labels and Kbps values)",
            "/api/v1/alerts": "Security alert log, newest first (paginated)",
            "/metrics": "Prometheus metrics"
        }
    }))
}

/// Health check endpoint
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: now_secs(),
    })
}

/// Backend link status and counters
async fn handle_status(State(state): State<ServerState>) -> Response {
    let snapshot = state.cache.get_snapshot();
    let snapshot_age_ms = snapshot.age().map(|a| a.as_millis());

    match snapshot.status {
        Some(status) => Json(StatusResponse {
            status,
            uptime_secs: now_secs().saturating_sub(state.start_time),
            snapshot_age_ms,
        })
        .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Dashboard snapshot not available yet".to_string(),
            }),
        )
            .into_response(),
    }
}

/// Throughput window
async fn handle_throughput(State(state): State<ServerState>) -> Json<ThroughputInfo> {
    let snapshot = state.cache.get_snapshot();
    Json(ThroughputInfo::from_samples(&snapshot.throughput))
}

/// Alert log, newest first
async fn handle_alerts(
    Query(params): Query<Pagination>,
    State(state): State<ServerState>,
) -> Json<AlertsResponse> {
    let snapshot = state.cache.get_snapshot();
    let (total, items) = paginate(&snapshot.alerts, &params);

    Json(AlertsResponse {
        offset: params.offset,
        limit: params.effective_limit(),
        total,
        items,
    })
}

/// Handler for Prometheus metrics endpoint
async fn handle_prometheus_metrics(State(state): State<ServerState>) -> Response {
    let snapshot = state.cache.get_snapshot();

    state
        .metrics
        .panel_uptime_seconds
        .set(now_secs().saturating_sub(state.start_time) as f64);

    let throughput = ThroughputInfo::from_samples(&snapshot.throughput);
    state
        .metrics
        .panel_throughput_kbps
        .set(throughput.latest_kbps.unwrap_or(0.0));
    state
        .metrics
        .panel_throughput_peak_kbps
        .set(throughput.peak_kbps);
    state
        .metrics
        .panel_throughput_samples
        .set(snapshot.throughput.len() as f64);
    state
        .metrics
        .panel_alerts_buffered
        .set(snapshot.alerts.len() as f64);

    if let Some(ref status) = snapshot.status {
        state
            .metrics
            .panel_backend_connected
            .set(if status.connection.is_connected() { 1.0 } else { 0.0 });

        let counters = status.counters;
        for (outcome, value) in [
            ("throughput", counters.throughput_frames),
            ("alert", counters.alert_frames),
            ("ignored", counters.ignored_frames),
            ("malformed", counters.malformed_frames),
        ] {
            sync_counter(
                &state
                    .metrics
                    .panel_frames_total
                    .with_label_values(&[outcome]),
                value,
            );
        }
        sync_counter(
            &state.metrics.panel_reconnects_total,
            counters.reconnects_scheduled,
        );
    }

    // Encode and return metrics
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => match String::from_utf8(buffer) {
            Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("UTF-8 error: {}", e),
                }),
            )
                .into_response(),
        },
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Encoding error: {}", e),
            }),
        )
            .into_response(),
    }
}
