//! TicketCreated event applier
//!
//! Groups submitted lines under a new station ticket and moves them to
//! `ordered`. Lines that are removed or already on another ticket are left
//! out of the ticket.

use crate::orders::traits::EventApplier;
use shared::order::{
    EventPayload, ItemStage, OrderAggregate, OrderEvent, StationTicket, TicketStatus,
};

/// TicketCreated applier
pub struct TicketCreatedApplier;

impl EventApplier for TicketCreatedApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent) {
        if let EventPayload::TicketCreated {
            ticket_id,
            station,
            line_keys,
        } = &event.payload
        {
            if aggregate.ticket(ticket_id).is_some() {
                return;
            }

            let mut grouped = Vec::with_capacity(line_keys.len());
            for line_key in line_keys {
                let Some(item) = aggregate.item_mut(line_key) else {
                    continue;
                };
                if !item.is_live() || item.ticket_id.is_some() {
                    continue;
                }
                item.set_stage(ItemStage::Ordered, event.occurred_at);
                item.ticket_id = Some(ticket_id.clone());
                grouped.push(line_key.clone());
            }
            if grouped.is_empty() {
                return;
            }

            aggregate.tickets.push(StationTicket {
                ticket_id: ticket_id.clone(),
                station: station.clone(),
                line_keys: grouped,
                status: TicketStatus::Ordered,
                created_at: event.occurred_at,
                updated_at: event.occurred_at,
            });
            aggregate.updated_at = event.occurred_at;
        }
    }
}
