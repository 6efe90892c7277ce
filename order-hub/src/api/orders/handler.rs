//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::ApiResponse;
use shared::order::{OrderAggregate, OrderStatus, Participant, ParticipantRole, Session, StateSnapshot};
use validator::Validate;

use crate::api::{RequestMeta, blocking};
use crate::core::ServerState;
use crate::orders::{CommandOutcome, EventPage, EventQuery};
use crate::utils::{AppResult, ok};

type Reply<T> = AppResult<Json<ApiResponse<T>>>;

// ========== Request bodies ==========

#[derive(Debug, Deserialize, Validate)]
pub struct OpenOrderRequest {
    /// Client-chosen id; makes a retried open land on the same order
    #[validate(length(min = 1, max = 64))]
    pub order_id: Option<String>,
    #[validate(range(min = 1))]
    pub restaurant_id: i64,
    #[validate(range(min = 1))]
    pub table_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate(length(min = 1, max = 64))]
    pub line_key: String,
    pub menu_item_id: i64,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RemoveItemRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RequestBillRequest {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddTipRequest {
    #[validate(range(min = 0.0))]
    pub amount: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    pub role: ParticipantRole,
    #[validate(length(min = 2, max = 16))]
    pub locale: Option<String>,
}

/// Query of `GET /api/orders/{id}/state`
#[derive(Debug, Deserialize, Validate)]
pub struct StateQuery {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[serde(default = "default_role")]
    pub role: ParticipantRole,
    pub locale: Option<String>,
}

fn default_role() -> ParticipantRole {
    ParticipantRole::Customer
}

// ========== Handlers ==========

/// Open an order
pub async fn open(
    State(state): State<ServerState>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<OpenOrderRequest>,
) -> Reply<CommandOutcome> {
    payload.validate()?;
    let outcome = blocking(&state, move |orders| {
        orders.open_order(
            payload.order_id,
            payload.restaurant_id,
            payload.table_id,
            &meta,
        )
    })
    .await?;
    Ok(ok(outcome))
}

/// Get the current aggregate
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Reply<OrderAggregate> {
    let order = blocking(&state, move |orders| orders.get_order(&id)).await?;
    Ok(ok(order))
}

pub async fn add_item(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<AddItemRequest>,
) -> Reply<CommandOutcome> {
    payload.validate()?;
    let outcome = blocking(&state, move |orders| {
        orders.add_item(
            &id,
            payload.line_key,
            payload.menu_item_id,
            payload.quantity,
            &meta,
        )
    })
    .await?;
    Ok(ok(outcome))
}

/// Remove a line; the body is optional
pub async fn remove_item(
    State(state): State<ServerState>,
    Path((id, line_key)): Path<(String, String)>,
    RequestMeta(meta): RequestMeta,
    payload: Option<Json<RemoveItemRequest>>,
) -> Reply<CommandOutcome> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let outcome = blocking(&state, move |orders| {
        orders.remove_item(&id, line_key, payload.reason, &meta)
    })
    .await?;
    Ok(ok(outcome))
}

pub async fn submit(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    RequestMeta(meta): RequestMeta,
) -> Reply<CommandOutcome> {
    let outcome = blocking(&state, move |orders| orders.submit_order(&id, &meta)).await?;
    Ok(ok(outcome))
}

/// Explicit status change; `from` must match the current status
pub async fn change_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<ChangeStatusRequest>,
) -> Reply<CommandOutcome> {
    let outcome = blocking(&state, move |orders| {
        orders.change_status(&id, payload.from, payload.to, &meta)
    })
    .await?;
    Ok(ok(outcome))
}

pub async fn request_bill(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    RequestMeta(meta): RequestMeta,
    payload: Option<Json<RequestBillRequest>>,
) -> Reply<CommandOutcome> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let outcome = blocking(&state, move |orders| {
        orders.request_bill(&id, payload.note, &meta)
    })
    .await?;
    Ok(ok(outcome))
}

pub async fn add_tip(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<AddTipRequest>,
) -> Reply<CommandOutcome> {
    payload.validate()?;
    let outcome = blocking(&state, move |orders| orders.add_tip(&id, payload.amount, &meta)).await?;
    Ok(ok(outcome))
}

/// Join an order as a participant
pub async fn join(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<JoinRequest>,
) -> Reply<Participant> {
    payload.validate()?;
    let participant = blocking(&state, move |orders| {
        orders.join(&id, &payload.session_id, payload.role, payload.locale)
    })
    .await?;
    Ok(ok(participant))
}

/// Snapshot for one viewer session
pub async fn get_state(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<StateQuery>,
) -> Reply<StateSnapshot> {
    query.validate()?;
    let session = Session {
        session_id: query.session_id,
        role: query.role,
        locale: query.locale,
    };
    let snapshot = blocking(&state, move |orders| orders.snapshot(&id, &session)).await?;
    Ok(ok(snapshot))
}

/// Event feed, newest first
pub async fn events(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<EventQuery>,
) -> Reply<EventPage> {
    let page = blocking(&state, move |orders| {
        orders.get_order(&id)?;
        orders.events(&id, &query)
    })
    .await?;
    Ok(ok(page))
}

