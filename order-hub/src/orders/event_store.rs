//! Order event store
//!
//! Appends immutable events to an order's log and serves the paginated
//! event feed.
//!
//! Emission runs inside a write transaction owned by the caller, who must
//! hold the order's lock (see [`super::locks`]). Within that unit the next
//! sequence is `max(sequence) + 1`; a key that is already taken is reported
//! as a conflict and the caller retries the whole unit.

use redb::WriteTransaction;
use serde::{Deserialize, Serialize};
use shared::order::{EventPayload, EventSource, OrderEvent, OrderEventType};

use super::storage::{OrderStorage, StorageResult};
use super::traits::OrderError;

/// Default page size of the event feed
pub const DEFAULT_FEED_LIMIT: usize = 200;
/// Maximum page size of the event feed
pub const MAX_FEED_LIMIT: usize = 1000;

/// An event about to be appended
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub order_id: String,
    pub source: EventSource,
    pub idempotency_key: Option<String>,
    pub payload: EventPayload,
}

/// Result of an emit
#[derive(Debug, Clone)]
pub enum Emitted {
    /// A new event was appended
    Appended(OrderEvent),
    /// The idempotency key was seen before; this is the original event
    Duplicate(OrderEvent),
}

impl Emitted {
    pub fn event(&self) -> &OrderEvent {
        match self {
            Emitted::Appended(event) | Emitted::Duplicate(event) => event,
        }
    }

    pub fn into_event(self) -> OrderEvent {
        match self {
            Emitted::Appended(event) | Emitted::Duplicate(event) => event,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Emitted::Duplicate(_))
    }
}

/// Append one event to an order's log
///
/// - A known `(order_id, idempotency_key)` returns the stored event and
///   consumes no sequence, whatever the new payload says.
/// - The payload is validated before anything is written.
/// - `order_opened` must be the first event of its order; every other event
///   needs an existing order.
pub fn emit(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    new: NewEvent,
) -> Result<Emitted, OrderError> {
    if let Some(key) = new.idempotency_key.as_deref() {
        if let Some(sequence) = storage.find_idempotent_txn(txn, &new.order_id, key)? {
            let event = storage
                .get_event_txn(txn, &new.order_id, sequence)?
                .ok_or_else(|| {
                    OrderError::Validation(format!(
                        "idempotency key {key} points at missing event {sequence}"
                    ))
                })?;
            tracing::debug!(
                order_id = %new.order_id,
                sequence,
                idempotency_key = key,
                "Duplicate emit, returning stored event"
            );
            return Ok(Emitted::Duplicate(event));
        }
    }

    new.payload.validate().map_err(OrderError::Validation)?;

    let last = storage.last_sequence_txn(txn, &new.order_id)?;
    match (&new.payload, last) {
        (EventPayload::OrderOpened { .. }, 0) => {}
        (EventPayload::OrderOpened { .. }, _) => {
            return Err(OrderError::Validation(format!(
                "order {} is already open",
                new.order_id
            )));
        }
        (_, 0) => return Err(OrderError::OrderNotFound(new.order_id)),
        _ => {}
    }

    let sequence = last + 1;
    let event = OrderEvent::new(
        new.order_id,
        sequence,
        new.source,
        new.idempotency_key,
        new.payload,
    );
    storage.append_event(txn, &event)?;
    if let Some(key) = event.idempotency_key.as_deref() {
        storage.store_idempotency_key(txn, &event.order_id, key, sequence)?;
    }

    tracing::debug!(
        order_id = %event.order_id,
        sequence,
        event_type = %event.event_type,
        source = %event.source,
        "Event appended"
    );
    Ok(Emitted::Appended(event))
}

// ========== Event Feed ==========

/// Event feed query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    /// Only events that occurred after this timestamp (ms, exclusive)
    pub since: Option<i64>,
    /// Only events with a lower sequence (exclusive cursor)
    pub before_id: Option<u64>,
    pub event_type: Option<OrderEventType>,
    pub source: Option<EventSource>,
    /// Page size, clamped to [1, 1000], default 200
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_FEED_LIMIT)
            .clamp(1, MAX_FEED_LIMIT)
    }

    fn matches(&self, event: &OrderEvent) -> bool {
        self.since.is_none_or(|since| event.occurred_at > since)
            && self.event_type.is_none_or(|t| event.event_type == t)
            && self.source.is_none_or(|s| event.source == s)
    }
}

/// One page of the event feed, newest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventPage {
    pub events: Vec<OrderEvent>,
    /// Cursor for the next (older) page; set when the page is full
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_before_id: Option<u64>,
}

/// Read a page of an order's event feed
pub fn feed(storage: &OrderStorage, order_id: &str, query: &EventQuery) -> StorageResult<EventPage> {
    let limit = query.effective_limit();
    let mut events = Vec::with_capacity(limit.min(64));

    storage.scan_events_desc(order_id, query.before_id, |event| {
        if query.matches(&event) {
            events.push(event);
        }
        events.len() < limit
    })?;

    let next_before_id = if events.len() == limit {
        events.last().map(|e| e.sequence)
    } else {
        None
    };
    Ok(EventPage {
        events,
        next_before_id,
    })
}
