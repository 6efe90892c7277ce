//! HTTP and WebSocket routes
//!
//! # Structure
//!
//! - [`health`] - liveness and counters
//! - [`orders`] - order commands, snapshots, event feed
//! - [`tickets`] - station ticket moves
//! - [`ws`] - realtime snapshot channels

pub mod health;
pub mod orders;
pub mod tickets;
pub mod ws;

mod extract;

pub use extract::RequestMeta;

use std::time::Duration;

use axum::Router;
use http::{HeaderName, HeaderValue, StatusCode};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;
use crate::orders::{ManagerError, OrdersManager};
use crate::utils::AppResult;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Run a manager call on the blocking pool
///
/// The manager is synchronous (redb + parking_lot locks).
pub(crate) async fn blocking<T, F>(state: &ServerState, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&OrdersManager) -> Result<T, ManagerError> + Send + 'static,
{
    let orders = state.orders.clone();
    let result = tokio::task::spawn_blocking(move || f(&orders)).await?;
    Ok(result?)
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(tickets::router())
        .merge(ws::router())
}

/// Build the fully configured application
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    build_router()
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        // ========== Request ID ==========
        // Set wraps Propagate so the id exists before it is copied back
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}
