//! TicketAdvanced event applier
//!
//! Moves a station ticket one step forward and cascades the matching
//! kitchen stage onto every live line grouped under it.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderAggregate, OrderEvent};

/// TicketAdvanced applier
pub struct TicketAdvancedApplier;

impl EventApplier for TicketAdvancedApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent) {
        if let EventPayload::TicketAdvanced {
            ticket_id,
            from,
            to,
        } = &event.payload
        {
            let Some(ticket) = aggregate.ticket_mut(ticket_id) else {
                return;
            };
            if ticket.status != *from || !from.can_advance_to(*to) {
                return;
            }
            ticket.status = *to;
            ticket.updated_at = event.occurred_at;
            let line_keys = ticket.line_keys.clone();

            let stage = to.item_stage();
            for line_key in &line_keys {
                if let Some(item) = aggregate.item_mut(line_key) {
                    // Removed lines refuse the stage update
                    item.set_stage(stage, event.occurred_at);
                }
            }
            aggregate.updated_at = event.occurred_at;
        }
    }
}
