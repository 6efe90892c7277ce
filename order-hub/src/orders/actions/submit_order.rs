//! SubmitOrder command handler
//!
//! Sends the order to the kitchen: `opened -> ordered`, then one ticket per
//! station grouping the opened lines.

use crate::orders::tickets;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderStatus};

/// SubmitOrder action
#[derive(Debug, Clone, Copy)]
pub struct SubmitOrderAction;

impl CommandHandler for SubmitOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        let order = ctx.require_aggregate()?;
        if order.status != OrderStatus::Opened {
            return Err(OrderError::invalid_transition(
                "order",
                order.status,
                OrderStatus::Ordered,
                "order was already submitted",
            ));
        }
        let groups = tickets::group_by_station(order.unsubmitted_items());
        if groups.is_empty() {
            return Err(OrderError::Validation(
                "order has no items to submit".to_string(),
            ));
        }

        ctx.emit(
            metadata,
            EventPayload::StatusChanged {
                from: OrderStatus::Opened,
                to: OrderStatus::Ordered,
            },
        )?;
        for (station, line_keys) in groups {
            ctx.emit(
                metadata,
                EventPayload::TicketCreated {
                    ticket_id: shared::util::new_id(),
                    station,
                    line_keys,
                },
            )?;
        }
        Ok(())
    }
}
