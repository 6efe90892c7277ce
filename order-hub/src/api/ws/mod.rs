//! Realtime snapshot channels
//!
//! | Path | Topic | View |
//! |------|-------|------|
//! | GET /ws/orders/{id}?session_id= | `order:{id}` | staff |
//! | GET /ws/smartmenu/{slug}?session_id= | `smartmenu:{slug}` | customer |
//!
//! Protocol (server -> client only):
//! - On connect: `{ "state": <snapshot> }` rendered for the connecting session
//! - On every committed change: `{ "state": <snapshot> }` from the topic
//! - After falling behind: a fresh snapshot replaces the missed messages
//!
//! Client frames other than Close are ignored.

use axum::{
    Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::order::{ChannelMessage, ParticipantRole, Session};
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::api::blocking;
use crate::core::ServerState;
use crate::realtime;
use crate::utils::AppResult;

/// Keep-alive ping period
const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/ws/orders/{id}", get(order_ws))
        .route("/ws/smartmenu/{slug}", get(smartmenu_ws))
}

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    /// Viewer session; defaults to a per-connection id
    pub session_id: Option<String>,
    pub locale: Option<String>,
}

/// Where a connection listens and how its snapshots are rendered
struct Channel {
    topic: String,
    order_id: String,
    /// Set for guest channels; resync re-resolves the slug's current order
    slug: Option<String>,
    session: Session,
}

/// GET /ws/orders/{id}
pub async fn order_ws(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<impl IntoResponse> {
    let lookup = order_id.clone();
    blocking(&state, move |orders| orders.get_order(&lookup)).await?;

    let channel = Channel {
        topic: realtime::order_topic(&order_id),
        session: session_for(query, ParticipantRole::Staff),
        order_id,
        slug: None,
    };
    Ok(ws.on_upgrade(move |socket| ws_session(socket, state, channel)))
}

/// GET /ws/smartmenu/{slug}
pub async fn smartmenu_ws(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<impl IntoResponse> {
    let lookup = slug.clone();
    let order_id = blocking(&state, move |orders| orders.order_for_smartmenu(&lookup)).await?;

    let channel = Channel {
        topic: realtime::smartmenu_topic(&slug),
        session: session_for(query, ParticipantRole::Customer),
        order_id,
        slug: Some(slug),
    };
    Ok(ws.on_upgrade(move |socket| ws_session(socket, state, channel)))
}

fn session_for(query: WsQuery, role: ParticipantRole) -> Session {
    Session {
        session_id: query
            .session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(shared::util::new_id),
        role,
        locale: query.locale,
    }
}

async fn ws_session(socket: WebSocket, state: ServerState, channel: Channel) {
    let (mut sink, mut stream) = socket.split();
    let Channel {
        topic,
        mut order_id,
        slug,
        session,
    } = channel;

    // Subscribe before rendering so no change slips between the two
    let mut rx = state.broadcaster.subscribe(&topic);
    tracing::info!(topic = %topic, session_id = %session.session_id, "WS connected");

    if send_snapshot(&mut sink, &state, &order_id, &session).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            msg = rx.recv() => {
                match msg {
                    Ok(payload) => {
                        if sink.send(Message::Text(payload.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(topic = %topic, lagged = n, "WS subscriber lagged, resending snapshot");
                        rx = rx.resubscribe();
                        if let Some(slug) = &slug {
                            match current_order(&state, slug).await {
                                Some(current) => order_id = current,
                                None => break,
                            }
                        }
                        if send_snapshot(&mut sink, &state, &order_id, &session).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    drop(rx);
    state.broadcaster.remove_if_idle(&topic);
    tracing::info!(topic = %topic, session_id = %session.session_id, "WS disconnected");
}

/// Order the slug resolves to now
async fn current_order(state: &ServerState, slug: &str) -> Option<String> {
    let lookup = slug.to_string();
    match blocking(state, move |orders| orders.order_for_smartmenu(&lookup)).await {
        Ok(order_id) => Some(order_id),
        Err(e) => {
            tracing::warn!(slug, error = %e, "Smartmenu lookup for WS resync failed");
            None
        }
    }
}

/// Render and send a snapshot for this connection's session
async fn send_snapshot(
    sink: &mut SplitSink<WebSocket, Message>,
    state: &ServerState,
    order_id: &str,
    session: &Session,
) -> Result<(), ()> {
    let order_id = order_id.to_string();
    let viewer = session.clone();
    let snapshot = match blocking(state, move |orders| orders.snapshot(&order_id, &viewer)).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(session_id = %session.session_id, error = %e, "Snapshot for WS client failed");
            return Err(());
        }
    };

    let text = match serde_json::to_string(&ChannelMessage::new(snapshot)) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize snapshot");
            return Err(());
        }
    };
    sink.send(Message::Text(text.into())).await.map_err(|_| ())
}
