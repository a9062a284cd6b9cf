//! Webhook HTTP endpoint
//!
//! Every path other than `/health` and `/metrics` accepts Telegram deliveries.
//! A delivery must carry `?token=<secret>`; anything else is answered 403
//! without touching the store. Authenticated deliveries always get 200 `OK`
//! so Telegram never redelivers.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    Router,
};
use subtle::ConstantTimeEq;

use crate::core::metrics;
use crate::core::metrics_server::observability_router;
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::update::InboundEvent;

/// Shared state of the webhook router
#[derive(Clone)]
pub struct AppState {
    pub deps: HandlerDeps,
    pub secret: String,
}

impl AppState {
    pub fn new(deps: HandlerDeps, secret: impl Into<String>) -> Self {
        Self {
            deps,
            secret: secret.into(),
        }
    }

    fn is_authorized(&self, query: Option<&str>) -> bool {
        let Some(token) = query.and_then(token_param) else {
            return false;
        };
        !self.secret.is_empty() && bool::from(token.as_bytes().ct_eq(self.secret.as_bytes()))
    }
}

/// Value of the first `token` query parameter
fn token_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

async fn handle_webhook(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if !state.is_authorized(query.as_deref()) {
        log::warn!("Rejected webhook delivery with missing or invalid token");
        metrics::WEBHOOK_REQUESTS_TOTAL.with_label_values(&["forbidden"]).inc();
        return (StatusCode::FORBIDDEN, "Access denied");
    }

    match InboundEvent::from_json(&body) {
        Some(event) => {
            log::debug!("Webhook event from chat {}", event.chat_id());
            metrics::WEBHOOK_REQUESTS_TOTAL.with_label_values(&["processed"]).inc();
            state.deps.process_update(&event).await;
        }
        None => {
            metrics::WEBHOOK_REQUESTS_TOTAL.with_label_values(&["ignored"]).inc();
        }
    }

    (StatusCode::OK, "OK")
}

/// Webhook fallback plus the observability routes
pub fn webhook_router(state: AppState) -> Router {
    Router::new()
        .fallback(handle_webhook)
        .with_state(state)
        .merge(observability_router())
}

/// Binds `0.0.0.0:port` and serves until the process is stopped
pub async fn run_webhook_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("Webhook server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, webhook_router(state)).await?;
    Ok(())
}
