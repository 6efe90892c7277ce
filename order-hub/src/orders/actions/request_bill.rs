//! RequestBill command handler
//!
//! Allowed once the order is in service and every live line has reached a
//! station. Freezes net, tax and service.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderAggregate, OrderStatus};

/// RequestBill action
#[derive(Debug, Clone, Default)]
pub struct RequestBillAction {
    pub note: Option<String>,
}

/// Check that the bill may be requested on `order`
pub(crate) fn check_bill_allowed(order: &OrderAggregate) -> Result<(), OrderError> {
    if !order.status.is_in_service() {
        return Err(OrderError::invalid_transition(
            "order",
            order.status,
            OrderStatus::BillRequested,
            "the bill can only be requested once the order is submitted and not yet billed",
        ));
    }
    let pending = order.unsubmitted_items().count();
    if pending > 0 {
        return Err(OrderError::invalid_transition(
            "order",
            order.status,
            OrderStatus::BillRequested,
            format!("{pending} item(s) have not been submitted yet"),
        ));
    }
    Ok(())
}

impl CommandHandler for RequestBillAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        check_bill_allowed(ctx.require_aggregate()?)?;

        ctx.emit(
            metadata,
            EventPayload::BillRequested {
                note: self.note.clone(),
            },
        )?;
        Ok(())
    }
}
