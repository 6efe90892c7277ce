//! Station ticket routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/tickets/{id}/advance | POST | Move a ticket one stage forward |
//!
//! Tickets advance strictly `ordered -> preparing -> ready -> collected`.
//! The order follows once every ticket has reached a stage.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde::{Deserialize, Serialize};
use shared::error::ApiResponse;
use shared::order::{OrderAggregate, StationTicket, TicketStatus};

use crate::api::{RequestMeta, blocking};
use crate::core::ServerState;
use crate::utils::{AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/tickets/{id}/advance", post(advance))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceTicketRequest {
    pub to: TicketStatus,
}

#[derive(Debug, Serialize)]
pub struct AdvanceTicketResponse {
    pub ticket: StationTicket,
    pub order: OrderAggregate,
    pub duplicate: bool,
}

pub async fn advance(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<AdvanceTicketRequest>,
) -> AppResult<Json<ApiResponse<AdvanceTicketResponse>>> {
    let (ticket, outcome) =
        blocking(&state, move |orders| orders.advance_ticket(&id, payload.to, &meta)).await?;
    Ok(ok(AdvanceTicketResponse {
        ticket,
        order: outcome.order,
        duplicate: outcome.duplicate,
    }))
}
