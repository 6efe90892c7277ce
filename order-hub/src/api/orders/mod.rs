//! Order API Module
//!
//! Commands accept `Idempotency-Key` and `X-Event-Source` headers.
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/orders | POST | Open an order on a table |
//! | /api/orders/{id} | GET | Current aggregate |
//! | /api/orders/{id}/items | POST | Add a line |
//! | /api/orders/{id}/items/{line_key} | DELETE | Remove a line |
//! | /api/orders/{id}/submit | POST | Send open lines to their stations |
//! | /api/orders/{id}/status | POST | Explicit status change |
//! | /api/orders/{id}/bill | POST | Request the bill |
//! | /api/orders/{id}/tip | POST | Add a tip |
//! | /api/orders/{id}/participants | POST | Join as staff or customer |
//! | /api/orders/{id}/state | GET | Snapshot for one session |
//! | /api/orders/{id}/events | GET | Event feed, newest first |

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub use handler::{
    AddItemRequest, AddTipRequest, ChangeStatusRequest, JoinRequest, OpenOrderRequest,
    RemoveItemRequest, RequestBillRequest, StateQuery,
};

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::open))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/items", post(handler::add_item))
        .route("/{id}/items/{line_key}", delete(handler::remove_item))
        .route("/{id}/submit", post(handler::submit))
        .route("/{id}/status", post(handler::change_status))
        .route("/{id}/bill", post(handler::request_bill))
        .route("/{id}/tip", post(handler::add_tip))
        .route("/{id}/participants", post(handler::join))
        .route("/{id}/state", get(handler::get_state))
        .route("/{id}/events", get(handler::events))
}
