//! AddItem command handler
//!
//! Adds one line to an editable order with the menu item's name, station and
//! price snapshotted. Tracked stock is decremented first. Once the order
//! has been submitted the new line goes straight to its station on a ticket
//! of its own.

use crate::order_money;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderStatus};

/// AddItem action
#[derive(Debug, Clone)]
pub struct AddItemAction {
    /// Caller-generated, unique per order
    pub line_key: String,
    pub menu_item_id: i64,
    pub quantity: u32,
}

impl CommandHandler for AddItemAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        // 1. Validate order state
        let order = ctx.require_aggregate()?;
        if !order.status.is_editable() {
            return Err(OrderError::OrderNotEditable {
                order_id: order.order_id.clone(),
                status: order.status,
            });
        }
        let restaurant_id = order.restaurant_id;
        let submitted = order.status != OrderStatus::Opened;

        // 2. Validate line identity and quantity
        if self.line_key.trim().is_empty() {
            return Err(OrderError::Validation("line_key must not be empty".to_string()));
        }
        if order.item(&self.line_key).is_some() {
            return Err(OrderError::Validation(format!(
                "line_key {} is already used on this order",
                self.line_key
            )));
        }
        order_money::validate_quantity(self.quantity)?;

        // 3. Resolve the menu item
        let item = ctx
            .catalog()
            .menu_item(restaurant_id, self.menu_item_id)
            .ok_or(OrderError::MenuItemNotFound(self.menu_item_id))?;
        if !item.is_available {
            return Err(OrderError::MenuItemUnavailable(self.menu_item_id));
        }
        order_money::validate_price(item.price)?;

        // 4. Reserve stock (reverted by the manager if the unit fails)
        ctx.adjust_inventory(item.id, -i64::from(self.quantity))?;

        // 5. Emit
        ctx.emit(
            metadata,
            EventPayload::ItemAdded {
                line_key: self.line_key.clone(),
                menu_item_id: item.id,
                name: item.name,
                station: item.station.clone(),
                price: item.price,
                quantity: self.quantity,
            },
        )?;
        if submitted {
            ctx.emit(
                metadata,
                EventPayload::TicketCreated {
                    ticket_id: shared::util::new_id(),
                    station: item.station,
                    line_keys: vec![self.line_key.clone()],
                },
            )?;
        }
        Ok(())
    }
}
