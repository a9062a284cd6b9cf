//! HTTP handlers for Prometheus metrics and liveness
//!
//! Mounted on the webhook router:
//! - /metrics - Prometheus metrics in text format
//! - /health  - Health check with uptime

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// State shared by the observability routes
#[derive(Clone)]
pub struct ObservabilityState {
    start_time: Instant,
}

impl ObservabilityState {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

impl Default for ObservabilityState {
    fn default() -> Self {
        Self::new()
    }
}

/// Router with `/metrics` and `/health`
pub fn observability_router() -> Router {
    Router::new()
        .route("/metrics", axum::routing::get(metrics_handler))
        .route("/health", axum::routing::get(health_handler))
        .with_state(Arc::new(ObservabilityState::new()))
}

/// Handler for /metrics endpoint
///
/// Returns Prometheus metrics in text exposition format
async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for /health endpoint
///
/// Returns a simple health check response with uptime
async fn health_handler(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed();

    let health_status = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": uptime.as_secs(),
        "uptime_human": format_duration(uptime),
        "service": "pointsbot",
        "version": env!("CARGO_PKG_VERSION"),
    });

    (StatusCode::OK, axum::Json(health_status))
}

/// Format duration as human-readable string
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
