//! Realtime state snapshot
//!
//! The full, viewer-scoped view of one order pushed to every subscriber.
//! Every broadcast is a full-state replace, so a client that missed a message
//! heals on the next one.

use super::aggregate::{OrderStatus, OrderTotals};
use super::types::{LineItemStatus, ParticipantRole, TicketStatus};
use serde::{Deserialize, Serialize};

/// Viewer-scoped snapshot of menu + order + participant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateSnapshot {
    pub order: OrderView,
    pub participant: ParticipantView,
    /// Menu in display order, localized for the participant
    pub menu: Vec<MenuItemView>,
    pub flags: AvailabilityFlags,
}

/// Order as seen by a viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderView {
    pub order_id: String,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub currency: String,
    pub table_id: i64,
    pub table_name: String,
    pub smartmenu_slug: String,
    pub status: OrderStatus,
    /// Lines in the order they were added
    pub items: Vec<LineItemView>,
    /// Station tickets (staff views only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<TicketView>,
    pub totals: OrderTotals,
    /// Sequence of the last event reflected in this view
    pub last_sequence: u64,
    pub opened_at: i64,
    pub updated_at: i64,
}

/// Line item with locale-resolved text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemView {
    pub line_key: String,
    pub menu_item_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub station: String,
    pub price: f64,
    pub quantity: u32,
    /// price × quantity
    pub line_total: f64,
    pub status: LineItemStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketView {
    pub ticket_id: String,
    pub station: String,
    pub status: TicketStatus,
    pub line_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantView {
    pub session_id: String,
    pub role: ParticipantRole,
    /// Locale the snapshot was rendered in
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItemView {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub station: String,
    /// Listed as available and not out of stock
    pub available: bool,
}

/// What the viewer may do next
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AvailabilityFlags {
    pub can_add_items: bool,
    pub can_submit: bool,
    pub can_request_bill: bool,
    pub can_add_tip: bool,
    pub is_closed: bool,
}

/// Message published on realtime topics: `{ "state": <snapshot> }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelMessage {
    pub state: StateSnapshot,
}

impl ChannelMessage {
    pub fn new(state: StateSnapshot) -> Self {
        Self { state }
    }
}
