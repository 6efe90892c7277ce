//! OrderOpened event applier
//!
//! Applies the OrderOpened event to create the initial aggregate state,
//! including the tax and service rate snapshots.

use crate::order_money;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderAggregate, OrderEvent, OrderStatus};

/// OrderOpened applier
pub struct OrderOpenedApplier;

impl EventApplier for OrderOpenedApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent) {
        if let EventPayload::OrderOpened {
            restaurant_id,
            table_id,
            table_name,
            smartmenu_slug,
            tax_rate,
            service_rate,
        } = &event.payload
        {
            // Only the first event of the log opens the order
            if aggregate.last_applied_sequence != 0 {
                return;
            }

            // Set order_id from event (important for replay scenarios)
            aggregate.order_id = event.order_id.clone();
            aggregate.restaurant_id = *restaurant_id;
            aggregate.table_id = *table_id;
            aggregate.table_name = table_name.clone();
            aggregate.smartmenu_slug = smartmenu_slug.clone();
            aggregate.tax_rate = *tax_rate;
            aggregate.service_rate = *service_rate;
            aggregate.status = OrderStatus::Opened;
            aggregate.opened_at = event.occurred_at;
            aggregate.updated_at = event.occurred_at;

            order_money::recalculate_totals(aggregate);
        }
    }
}
