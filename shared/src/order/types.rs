//! Shared types for order event sourcing

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Event Metadata
// ============================================================================

/// Who produced an event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Staff,
    Guest,
    Voice,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Staff => write!(f, "staff"),
            EventSource::Guest => write!(f, "guest"),
            EventSource::Voice => write!(f, "voice"),
        }
    }
}

impl std::str::FromStr for EventSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(EventSource::Staff),
            "guest" => Ok(EventSource::Guest),
            "voice" => Ok(EventSource::Voice),
            other => Err(format!("unknown event source: {other}")),
        }
    }
}

/// What an event concerns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Order,
    LineItem,
    Ticket,
}

// ============================================================================
// Line Items
// ============================================================================

/// Stage of a live (not removed) line item
///
/// Ordered so that `a < b` means `a` comes earlier in the kitchen flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemStage {
    Opened,
    Ordered,
    Preparing,
    Ready,
    Delivered,
}

/// Line item status
///
/// `Removed` is terminal. Stage updates only reach `Live` items, so a removed
/// line can never be moved back into the kitchen flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ItemStatusCode", from = "ItemStatusCode")]
pub enum LineItemStatus {
    Live(ItemStage),
    Removed,
}

/// Flat wire representation of [`LineItemStatus`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ItemStatusCode {
    Opened,
    Ordered,
    Preparing,
    Ready,
    Delivered,
    Removed,
}

impl From<LineItemStatus> for ItemStatusCode {
    fn from(status: LineItemStatus) -> Self {
        match status {
            LineItemStatus::Live(ItemStage::Opened) => ItemStatusCode::Opened,
            LineItemStatus::Live(ItemStage::Ordered) => ItemStatusCode::Ordered,
            LineItemStatus::Live(ItemStage::Preparing) => ItemStatusCode::Preparing,
            LineItemStatus::Live(ItemStage::Ready) => ItemStatusCode::Ready,
            LineItemStatus::Live(ItemStage::Delivered) => ItemStatusCode::Delivered,
            LineItemStatus::Removed => ItemStatusCode::Removed,
        }
    }
}

impl From<ItemStatusCode> for LineItemStatus {
    fn from(code: ItemStatusCode) -> Self {
        match code {
            ItemStatusCode::Opened => LineItemStatus::Live(ItemStage::Opened),
            ItemStatusCode::Ordered => LineItemStatus::Live(ItemStage::Ordered),
            ItemStatusCode::Preparing => LineItemStatus::Live(ItemStage::Preparing),
            ItemStatusCode::Ready => LineItemStatus::Live(ItemStage::Ready),
            ItemStatusCode::Delivered => LineItemStatus::Live(ItemStage::Delivered),
            ItemStatusCode::Removed => LineItemStatus::Removed,
        }
    }
}

/// Line item - one menu item on an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Caller-generated identity, unique per order, never reused
    pub line_key: String,
    pub menu_item_id: i64,
    /// Name snapshot at the time the item was added
    pub name: String,
    /// Preparation station
    pub station: String,
    /// Price snapshot at the time the item was added
    pub price: f64,
    pub quantity: u32,
    pub status: LineItemStatus,
    /// Ticket this line was submitted on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub added_at: i64,
    pub updated_at: i64,
}

impl LineItem {
    /// Whether the line still counts towards the order
    pub fn is_live(&self) -> bool {
        matches!(self.status, LineItemStatus::Live(_))
    }

    /// Current stage, `None` once removed
    pub fn stage(&self) -> Option<ItemStage> {
        match self.status {
            LineItemStatus::Live(stage) => Some(stage),
            LineItemStatus::Removed => None,
        }
    }

    /// Move a live line to `stage`. Returns false for removed lines.
    pub fn set_stage(&mut self, stage: ItemStage, at: i64) -> bool {
        match self.status {
            LineItemStatus::Live(_) => {
                self.status = LineItemStatus::Live(stage);
                self.updated_at = at;
                true
            }
            LineItemStatus::Removed => false,
        }
    }

    /// Soft-delete the line. Returns false if it was already removed.
    pub fn remove(&mut self, at: i64) -> bool {
        match self.status {
            LineItemStatus::Live(_) => {
                self.status = LineItemStatus::Removed;
                self.updated_at = at;
                true
            }
            LineItemStatus::Removed => false,
        }
    }
}

// ============================================================================
// Station Tickets
// ============================================================================

/// Station ticket status: ordered -> preparing -> ready -> collected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Ordered,
    Preparing,
    Ready,
    Collected,
}

impl TicketStatus {
    /// The only status this one may move to
    pub const fn next(self) -> Option<TicketStatus> {
        match self {
            TicketStatus::Ordered => Some(TicketStatus::Preparing),
            TicketStatus::Preparing => Some(TicketStatus::Ready),
            TicketStatus::Ready => Some(TicketStatus::Collected),
            TicketStatus::Collected => None,
        }
    }

    pub fn can_advance_to(self, target: TicketStatus) -> bool {
        self.next() == Some(target)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Collected)
    }

    /// Item stage that mirrors this kitchen stage
    pub const fn item_stage(self) -> ItemStage {
        match self {
            TicketStatus::Ordered => ItemStage::Ordered,
            TicketStatus::Preparing => ItemStage::Preparing,
            TicketStatus::Ready => ItemStage::Ready,
            TicketStatus::Collected => ItemStage::Delivered,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Ordered => write!(f, "ordered"),
            TicketStatus::Preparing => write!(f, "preparing"),
            TicketStatus::Ready => write!(f, "ready"),
            TicketStatus::Collected => write!(f, "collected"),
        }
    }
}

/// Station ticket - the lines of one submission routed to one station
///
/// Never deleted; collected tickets stay on the order for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationTicket {
    pub ticket_id: String,
    pub station: String,
    pub line_keys: Vec<String>,
    pub status: TicketStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// Participants
// ============================================================================

/// Role a session plays on an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Staff,
    Customer,
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRole::Staff => write!(f, "staff"),
            ParticipantRole::Customer => write!(f, "customer"),
        }
    }
}

/// One row per (order, session, role)
///
/// Only scopes snapshot rendering; never part of order truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub order_id: String,
    pub session_id: String,
    pub role: ParticipantRole,
    pub locale: String,
    pub joined_at: i64,
}

/// Viewer session requesting a snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub session_id: String,
    /// Role assumed when the session has not joined as a participant
    pub role: ParticipantRole,
    /// Locale hint from the device, used when no participant preference exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> LineItem {
        LineItem {
            line_key: "a1".to_string(),
            menu_item_id: 5,
            name: "Burger".to_string(),
            station: "kitchen".to_string(),
            price: 9.5,
            quantity: 1,
            status: LineItemStatus::Live(ItemStage::Opened),
            ticket_id: None,
            added_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn test_removed_line_ignores_stage_updates() {
        let mut item = line();
        assert!(item.remove(2));
        assert!(!item.set_stage(ItemStage::Preparing, 3));
        assert_eq!(item.status, LineItemStatus::Removed);
        assert_eq!(item.updated_at, 2);
        assert!(!item.remove(4));
    }

    #[test]
    fn test_line_status_wire_format() {
        let mut item = line();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "opened");

        item.remove(2);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "removed");

        let back: LineItem = serde_json::from_value(json).unwrap();
        assert_eq!(back.status, LineItemStatus::Removed);
    }

    #[test]
    fn test_ticket_transitions_are_single_step_forward() {
        assert!(TicketStatus::Ordered.can_advance_to(TicketStatus::Preparing));
        assert!(TicketStatus::Ready.can_advance_to(TicketStatus::Collected));
        assert!(!TicketStatus::Ready.can_advance_to(TicketStatus::Ordered));
        assert!(!TicketStatus::Ordered.can_advance_to(TicketStatus::Ready));
        assert!(!TicketStatus::Preparing.can_advance_to(TicketStatus::Preparing));
        assert!(TicketStatus::Collected.next().is_none());
        assert!(TicketStatus::Collected.is_terminal());
    }

    #[test]
    fn test_ticket_stage_mapping() {
        assert_eq!(TicketStatus::Preparing.item_stage(), ItemStage::Preparing);
        assert_eq!(TicketStatus::Collected.item_stage(), ItemStage::Delivered);
    }
}
