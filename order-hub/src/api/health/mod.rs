//! Health route
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /health | GET | Liveness plus log and topic counters |
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "uptime_seconds": 42,
//!   "total_events": 1280,
//!   "topics": 3
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// healthy | degraded
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    /// Events across all orders; absent when the database could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    total_events: Option<u64>,
    /// Live realtime topics
    topics: usize,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let orders = state.orders.clone();
    let total_events = match tokio::task::spawn_blocking(move || orders.storage().total_events()).await {
        Ok(Ok(count)) => Some(count),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Health check could not read the event log");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check task failed");
            None
        }
    };

    Json(HealthResponse {
        status: if total_events.is_some() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        total_events,
        topics: state.broadcaster.topic_count(),
    })
}
