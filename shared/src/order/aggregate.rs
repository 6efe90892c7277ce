//! Order aggregate - materialized state folded from the event stream
//!
//! Owned by the projector. Everything else reads it and changes it only by
//! emitting events.

use super::types::{ItemStage, LineItem, StationTicket, TicketStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status
///
/// opened -> ordered -> preparing -> ready -> delivered -> bill_requested -> paid -> closed
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Opened,
    Ordered,
    Preparing,
    Ready,
    Delivered,
    BillRequested,
    Paid,
    Closed,
}

impl OrderStatus {
    /// Items may still be added or removed
    pub fn is_editable(self) -> bool {
        self < OrderStatus::BillRequested
    }

    /// Status in the kitchen part of the chain (ordered..=delivered)
    pub fn is_in_service(self) -> bool {
        (OrderStatus::Ordered..=OrderStatus::Delivered).contains(&self)
    }

    /// Order status the kitchen flow has reached when every ticket is at `status`
    pub const fn from_ticket(status: TicketStatus) -> OrderStatus {
        match status {
            TicketStatus::Ordered => OrderStatus::Ordered,
            TicketStatus::Preparing => OrderStatus::Preparing,
            TicketStatus::Ready => OrderStatus::Ready,
            TicketStatus::Collected => OrderStatus::Delivered,
        }
    }

    /// Stage given to newly added lines while the order has this status
    pub fn initial_item_stage(self) -> ItemStage {
        if self == OrderStatus::Opened {
            ItemStage::Opened
        } else {
            ItemStage::Ordered
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Opened => "opened",
            OrderStatus::Ordered => "ordered",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::BillRequested => "bill_requested",
            OrderStatus::Paid => "paid",
            OrderStatus::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// Derived financial totals. Never hand-edited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderTotals {
    /// Sum of live line prices × quantities
    pub net: f64,
    pub tax: f64,
    pub service: f64,
    pub tip: f64,
    /// net + tax + service + tip
    pub gross: f64,
}

/// Order aggregate - computed from the event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderAggregate {
    pub order_id: String,
    pub restaurant_id: i64,
    pub table_id: i64,
    pub table_name: String,
    /// Shared slug guest devices subscribe to
    pub smartmenu_slug: String,
    pub status: OrderStatus,
    /// All lines ever added, including removed ones
    pub items: Vec<LineItem>,
    pub tickets: Vec<StationTicket>,
    /// Tax rate snapshot in percentage
    pub tax_rate: f64,
    /// Service charge snapshot in percentage
    pub service_rate: f64,
    pub totals: OrderTotals,
    /// Set once the bill is requested; net/tax/service stop changing
    #[serde(default)]
    pub totals_frozen: bool,
    pub opened_at: i64,
    pub updated_at: i64,
    /// Projection cursor
    pub last_applied_sequence: u64,
}

impl OrderAggregate {
    /// Create an empty aggregate, ready for the first event to be applied
    pub fn new(order_id: String) -> Self {
        Self {
            order_id,
            restaurant_id: 0,
            table_id: 0,
            table_name: String::new(),
            smartmenu_slug: String::new(),
            status: OrderStatus::Opened,
            items: Vec::new(),
            tickets: Vec::new(),
            tax_rate: 0.0,
            service_rate: 0.0,
            totals: OrderTotals::default(),
            totals_frozen: false,
            opened_at: 0,
            updated_at: 0,
            last_applied_sequence: 0,
        }
    }

    pub fn item(&self, line_key: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.line_key == line_key)
    }

    pub fn item_mut(&mut self, line_key: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.line_key == line_key)
    }

    pub fn ticket(&self, ticket_id: &str) -> Option<&StationTicket> {
        self.tickets.iter().find(|t| t.ticket_id == ticket_id)
    }

    pub fn ticket_mut(&mut self, ticket_id: &str) -> Option<&mut StationTicket> {
        self.tickets.iter_mut().find(|t| t.ticket_id == ticket_id)
    }

    /// Lines that have not been removed
    pub fn live_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|i| i.is_live())
    }

    /// Live lines that have not been submitted to a station yet
    pub fn unsubmitted_items(&self) -> impl Iterator<Item = &LineItem> {
        self.live_items()
            .filter(|i| i.stage() == Some(ItemStage::Opened))
    }

    pub fn has_unsubmitted_items(&self) -> bool {
        self.unsubmitted_items().next().is_some()
    }

    /// Least advanced ticket status, `None` when the order has no tickets
    pub fn slowest_ticket_status(&self) -> Option<TicketStatus> {
        self.tickets.iter().map(|t| t.status).min()
    }
}

impl Default for OrderAggregate {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::types::LineItemStatus;

    fn line(key: &str, stage: ItemStage) -> LineItem {
        LineItem {
            line_key: key.to_string(),
            menu_item_id: 1,
            name: "Soup".to_string(),
            station: "kitchen".to_string(),
            price: 4.0,
            quantity: 1,
            status: LineItemStatus::Live(stage),
            ticket_id: None,
            added_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_status_chain_order() {
        assert!(OrderStatus::Opened < OrderStatus::Ordered);
        assert!(OrderStatus::Delivered < OrderStatus::BillRequested);
        assert!(OrderStatus::Delivered.is_editable());
        assert!(!OrderStatus::BillRequested.is_editable());
        assert!(OrderStatus::Preparing.is_in_service());
        assert!(!OrderStatus::Opened.is_in_service());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::BillRequested).unwrap();
        assert_eq!(json, "\"bill_requested\"");
        assert_eq!(OrderStatus::BillRequested.to_string(), "bill_requested");
    }

    #[test]
    fn test_unsubmitted_items_skip_removed_lines() {
        let mut order = OrderAggregate::new("o-1".to_string());
        order.items.push(line("a", ItemStage::Opened));
        order.items.push(line("b", ItemStage::Ordered));
        assert!(order.has_unsubmitted_items());

        order.item_mut("a").unwrap().remove(1);
        assert!(!order.has_unsubmitted_items());
        assert_eq!(order.live_items().count(), 1);
    }
}
