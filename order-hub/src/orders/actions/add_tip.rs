//! AddTip command handler

use crate::order_money;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderStatus};

/// AddTip action - tips accumulate until the order is paid
#[derive(Debug, Clone)]
pub struct AddTipAction {
    pub amount: f64,
}

impl CommandHandler for AddTipAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        let order = ctx.require_aggregate()?;
        if order.status >= OrderStatus::Paid {
            return Err(OrderError::OrderNotEditable {
                order_id: order.order_id.clone(),
                status: order.status,
            });
        }
        order_money::validate_tip(self.amount)?;

        ctx.emit(metadata, EventPayload::TipAdded { amount: self.amount })?;
        Ok(())
    }
}
