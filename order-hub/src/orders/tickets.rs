//! Station ticket workflow
//!
//! ```text
//! ordered -> preparing -> ready -> collected
//! ```
//!
//! Strictly forward, one step at a time, terminal at `collected`. A legal
//! advance cascades the kitchen stage onto the ticket's lines (see the
//! `ticket_advanced` applier) and may promote the order status once every
//! ticket has caught up.

use std::collections::BTreeMap;

use shared::order::{LineItem, OrderAggregate, OrderStatus, StationTicket, TicketStatus};

use super::traits::OrderError;

/// Check a ticket move before anything is emitted
pub fn check_transition(ticket: &StationTicket, to: TicketStatus) -> Result<(), OrderError> {
    if ticket.status.can_advance_to(to) {
        return Ok(());
    }
    let reason = match ticket.status.next() {
        None => format!("ticket {} is already {}", ticket.ticket_id, ticket.status),
        Some(next) => format!("ticket {} can only move to {}", ticket.ticket_id, next),
    };
    Err(OrderError::invalid_transition("ticket", ticket.status, to, reason))
}

/// Group lines by preparation station
///
/// Stations come out in name order and lines keep their order on the
/// aggregate, so the same lines always yield the same tickets.
pub fn group_by_station<'a>(
    items: impl IntoIterator<Item = &'a LineItem>,
) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in items {
        groups
            .entry(item.station.clone())
            .or_default()
            .push(item.line_key.clone());
    }
    groups
}

/// Order status the kitchen flow has reached, if it is ahead of the order
///
/// Only orders in service are promoted; the slowest ticket decides.
pub fn promoted_status(aggregate: &OrderAggregate) -> Option<OrderStatus> {
    if !aggregate.status.is_in_service() {
        return None;
    }
    let reached = OrderStatus::from_ticket(aggregate.slowest_ticket_status()?);
    (reached > aggregate.status).then_some(reached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{ItemStage, LineItemStatus};

    fn ticket(id: &str, status: TicketStatus) -> StationTicket {
        StationTicket {
            ticket_id: id.to_string(),
            station: "kitchen".to_string(),
            line_keys: vec!["a1".to_string()],
            status,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn line(key: &str, station: &str) -> LineItem {
        LineItem {
            line_key: key.to_string(),
            menu_item_id: 1,
            name: key.to_string(),
            station: station.to_string(),
            price: 1.0,
            quantity: 1,
            status: LineItemStatus::Live(ItemStage::Opened),
            ticket_id: None,
            added_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_forward_step_is_allowed() {
        assert!(check_transition(&ticket("t1", TicketStatus::Ready), TicketStatus::Collected).is_ok());
    }

    #[test]
    fn test_backward_and_skipping_moves_are_rejected() {
        let err = check_transition(&ticket("t1", TicketStatus::Ready), TicketStatus::Ordered)
            .unwrap_err();
        match err {
            OrderError::InvalidTransition { entity, from, to, .. } => {
                assert_eq!(entity, "ticket");
                assert_eq!(from, "ready");
                assert_eq!(to, "ordered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(
            check_transition(&ticket("t1", TicketStatus::Ordered), TicketStatus::Ready).is_err()
        );
        assert!(
            check_transition(&ticket("t1", TicketStatus::Collected), TicketStatus::Collected)
                .is_err()
        );
    }

    #[test]
    fn test_group_by_station_is_deterministic() {
        let lines = [line("a1", "kitchen"), line("b1", "bar"), line("a2", "kitchen")];
        let groups = group_by_station(&lines);
        let stations: Vec<&String> = groups.keys().collect();
        assert_eq!(stations, vec!["bar", "kitchen"]);
        assert_eq!(groups["kitchen"], vec!["a1", "a2"]);
    }

    #[test]
    fn test_promotion_follows_slowest_ticket() {
        let mut order = OrderAggregate::new("o-1".to_string());
        order.status = OrderStatus::Ordered;
        order.tickets.push(ticket("t1", TicketStatus::Preparing));
        order.tickets.push(ticket("t2", TicketStatus::Ordered));
        assert_eq!(promoted_status(&order), None);

        order.ticket_mut("t2").unwrap().status = TicketStatus::Ready;
        assert_eq!(promoted_status(&order), Some(OrderStatus::Preparing));

        order.status = OrderStatus::Preparing;
        order.ticket_mut("t1").unwrap().status = TicketStatus::Collected;
        order.ticket_mut("t2").unwrap().status = TicketStatus::Collected;
        assert_eq!(promoted_status(&order), Some(OrderStatus::Delivered));
    }

    #[test]
    fn test_no_promotion_outside_service() {
        let mut order = OrderAggregate::new("o-1".to_string());
        order.tickets.push(ticket("t1", TicketStatus::Collected));
        assert_eq!(promoted_status(&order), None);

        order.status = OrderStatus::BillRequested;
        assert_eq!(promoted_status(&order), None);
    }
}
