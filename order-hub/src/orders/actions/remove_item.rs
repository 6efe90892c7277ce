//! RemoveItem command handler
//!
//! Soft-deletes a line. The line stays on the order with status `removed`
//! for the audit trail; tracked stock is given back.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::EventPayload;

/// RemoveItem action
#[derive(Debug, Clone)]
pub struct RemoveItemAction {
    pub line_key: String,
    pub reason: Option<String>,
}

impl CommandHandler for RemoveItemAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        let order = ctx.require_aggregate()?;
        if !order.status.is_editable() {
            return Err(OrderError::OrderNotEditable {
                order_id: order.order_id.clone(),
                status: order.status,
            });
        }

        let item = order
            .item(&self.line_key)
            .ok_or_else(|| OrderError::ItemNotFound(self.line_key.clone()))?;
        if !item.is_live() {
            return Err(OrderError::invalid_transition(
                "line_item",
                "removed",
                "removed",
                format!("line {} is already removed", self.line_key),
            ));
        }
        let (menu_item_id, quantity) = (item.menu_item_id, item.quantity);

        ctx.adjust_inventory(menu_item_id, i64::from(quantity))?;
        ctx.emit(
            metadata,
            EventPayload::ItemRemoved {
                line_key: self.line_key.clone(),
                reason: self.reason.clone(),
            },
        )?;
        Ok(())
    }
}
