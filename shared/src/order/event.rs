//! Order events - immutable facts appended to an order's log

use super::aggregate::OrderStatus;
use super::types::{EntityType, EventSource, TicketStatus};
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Order this event belongs to
    pub order_id: String,
    /// Per-order sequence, starts at 1, gapless
    /// This is the AUTHORITATIVE ordering mechanism for state evolution
    pub sequence: u64,
    /// Event type (always derived from the payload)
    pub event_type: OrderEventType,
    /// What the event concerns
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Who produced the event
    pub source: EventSource,
    /// Caller-supplied retry token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Server timestamp (Unix milliseconds)
    pub occurred_at: i64,
    /// Event payload
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventType {
    OrderOpened,
    ItemAdded,
    ItemRemoved,
    StatusChanged,
    TicketCreated,
    TicketAdvanced,
    BillRequested,
    TipAdded,
    /// Written by a newer server; skipped on projection
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderOpened => write!(f, "order_opened"),
            OrderEventType::ItemAdded => write!(f, "item_added"),
            OrderEventType::ItemRemoved => write!(f, "item_removed"),
            OrderEventType::StatusChanged => write!(f, "status_changed"),
            OrderEventType::TicketCreated => write!(f, "ticket_created"),
            OrderEventType::TicketAdvanced => write!(f, "ticket_advanced"),
            OrderEventType::BillRequested => write!(f, "bill_requested"),
            OrderEventType::TipAdded => write!(f, "tip_added"),
            OrderEventType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    /// First event of every order. Rates are snapshotted here so the log
    /// alone is enough to rebuild totals.
    OrderOpened {
        restaurant_id: i64,
        table_id: i64,
        table_name: String,
        smartmenu_slug: String,
        tax_rate: f64,
        #[serde(default)]
        service_rate: f64,
    },

    StatusChanged {
        from: OrderStatus,
        to: OrderStatus,
    },

    BillRequested {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    TipAdded {
        amount: f64,
    },

    // ========== Items ==========
    ItemAdded {
        line_key: String,
        menu_item_id: i64,
        name: String,
        station: String,
        price: f64,
        quantity: u32,
    },

    ItemRemoved {
        line_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Station Tickets ==========
    TicketCreated {
        ticket_id: String,
        station: String,
        line_keys: Vec<String>,
    },

    TicketAdvanced {
        ticket_id: String,
        from: TicketStatus,
        to: TicketStatus,
    },

    #[serde(other)]
    Unknown,
}

impl EventPayload {
    /// Event type for this payload
    pub fn event_type(&self) -> OrderEventType {
        match self {
            EventPayload::OrderOpened { .. } => OrderEventType::OrderOpened,
            EventPayload::StatusChanged { .. } => OrderEventType::StatusChanged,
            EventPayload::BillRequested { .. } => OrderEventType::BillRequested,
            EventPayload::TipAdded { .. } => OrderEventType::TipAdded,
            EventPayload::ItemAdded { .. } => OrderEventType::ItemAdded,
            EventPayload::ItemRemoved { .. } => OrderEventType::ItemRemoved,
            EventPayload::TicketCreated { .. } => OrderEventType::TicketCreated,
            EventPayload::TicketAdvanced { .. } => OrderEventType::TicketAdvanced,
            EventPayload::Unknown => OrderEventType::Unknown,
        }
    }

    /// Entity the payload concerns
    pub fn entity(&self) -> (EntityType, Option<String>) {
        match self {
            EventPayload::ItemAdded { line_key, .. } | EventPayload::ItemRemoved { line_key, .. } => {
                (EntityType::LineItem, Some(line_key.clone()))
            }
            EventPayload::TicketCreated { ticket_id, .. }
            | EventPayload::TicketAdvanced { ticket_id, .. } => {
                (EntityType::Ticket, Some(ticket_id.clone()))
            }
            _ => (EntityType::Order, None),
        }
    }

    /// Shape validation performed at emission time
    pub fn validate(&self) -> Result<(), String> {
        fn money(value: f64, field: &str) -> Result<(), String> {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{field} must be a finite non-negative number, got {value}"));
            }
            Ok(())
        }
        fn not_blank(value: &str, field: &str) -> Result<(), String> {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
            Ok(())
        }

        match self {
            EventPayload::OrderOpened {
                smartmenu_slug,
                tax_rate,
                service_rate,
                ..
            } => {
                not_blank(smartmenu_slug, "smartmenu_slug")?;
                money(*tax_rate, "tax_rate")?;
                money(*service_rate, "service_rate")
            }
            EventPayload::StatusChanged { from, to } => {
                if from == to {
                    return Err(format!("status_changed from and to are both {from}"));
                }
                Ok(())
            }
            EventPayload::BillRequested { .. } => Ok(()),
            EventPayload::TipAdded { amount } => money(*amount, "tip amount"),
            EventPayload::ItemAdded {
                line_key,
                station,
                price,
                quantity,
                ..
            } => {
                not_blank(line_key, "line_key")?;
                not_blank(station, "station")?;
                money(*price, "price")?;
                if *quantity == 0 {
                    return Err("quantity must be positive".to_string());
                }
                Ok(())
            }
            EventPayload::ItemRemoved { line_key, .. } => not_blank(line_key, "line_key"),
            EventPayload::TicketCreated {
                ticket_id,
                station,
                line_keys,
            } => {
                not_blank(ticket_id, "ticket_id")?;
                not_blank(station, "station")?;
                if line_keys.is_empty() {
                    return Err("ticket must group at least one line".to_string());
                }
                Ok(())
            }
            EventPayload::TicketAdvanced { ticket_id, .. } => not_blank(ticket_id, "ticket_id"),
            EventPayload::Unknown => Err("unknown event payload cannot be emitted".to_string()),
        }
    }
}

impl OrderEvent {
    /// Create a new event
    ///
    /// The event type and entity are taken from the payload so they can never
    /// disagree with it.
    pub fn new(
        order_id: String,
        sequence: u64,
        source: EventSource,
        idempotency_key: Option<String>,
        payload: EventPayload,
    ) -> Self {
        let (entity_type, entity_id) = payload.entity();
        Self {
            event_id: crate::util::new_id(),
            order_id,
            sequence,
            event_type: payload.event_type(),
            entity_type,
            entity_id,
            source,
            idempotency_key,
            occurred_at: crate::util::now_millis(),
            payload,
        }
    }
}
