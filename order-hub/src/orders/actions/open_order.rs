//! OpenOrder command handler
//!
//! Opens an order at a table. The restaurant's tax and service rates and the
//! table's smartmenu slug are snapshotted into the `order_opened` event, so
//! the log alone is enough to rebuild totals later.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::EventPayload;

/// OpenOrder action
#[derive(Debug, Clone)]
pub struct OpenOrderAction {
    pub restaurant_id: i64,
    pub table_id: i64,
}

impl CommandHandler for OpenOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        if ctx.aggregate().is_some() {
            return Err(OrderError::Validation(format!(
                "order {} is already open",
                ctx.order_id()
            )));
        }

        let catalog = ctx.catalog();
        let restaurant = catalog.restaurant(self.restaurant_id).ok_or_else(|| {
            OrderError::Validation(format!("restaurant {} not found", self.restaurant_id))
        })?;
        let table = catalog
            .table(self.table_id)
            .filter(|t| t.restaurant_id == restaurant.id)
            .ok_or_else(|| {
                OrderError::Validation(format!(
                    "table {} not found in restaurant {}",
                    self.table_id, self.restaurant_id
                ))
            })?;
        if !table.is_active {
            return Err(OrderError::Validation(format!(
                "table {} is not active",
                table.id
            )));
        }

        ctx.emit(
            metadata,
            EventPayload::OrderOpened {
                restaurant_id: restaurant.id,
                table_id: table.id,
                table_name: table.name,
                smartmenu_slug: table.smartmenu_slug,
                tax_rate: restaurant.tax_rate,
                service_rate: restaurant.service_rate,
            },
        )?;
        Ok(())
    }
}
