//! AdvanceTicket command handler
//!
//! Moves a station ticket one step forward. The `ticket_advanced` applier
//! cascades the stage onto the ticket's lines; afterwards, if every ticket
//! has caught up, the order status is promoted in the same unit.

use crate::orders::tickets;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderStatus, TicketStatus};

/// AdvanceTicket action
#[derive(Debug, Clone)]
pub struct AdvanceTicketAction {
    pub ticket_id: String,
    pub to: TicketStatus,
}

impl CommandHandler for AdvanceTicketAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        let order = ctx.require_aggregate()?;
        if order.status == OrderStatus::Closed {
            return Err(OrderError::OrderNotEditable {
                order_id: order.order_id.clone(),
                status: order.status,
            });
        }
        let ticket = order
            .ticket(&self.ticket_id)
            .ok_or_else(|| OrderError::TicketNotFound(self.ticket_id.clone()))?;
        tickets::check_transition(ticket, self.to)?;
        let from = ticket.status;

        ctx.emit(
            metadata,
            EventPayload::TicketAdvanced {
                ticket_id: self.ticket_id.clone(),
                from,
                to: self.to,
            },
        )?;

        let order = ctx.require_aggregate()?;
        if let Some(promoted) = tickets::promoted_status(order) {
            let current = order.status;
            tracing::debug!(
                order_id = %order.order_id,
                ticket_id = %self.ticket_id,
                from = %current,
                to = %promoted,
                "Kitchen flow promotes order status"
            );
            ctx.emit(
                metadata,
                EventPayload::StatusChanged {
                    from: current,
                    to: promoted,
                },
            )?;
        }
        Ok(())
    }
}
