//! ItemAdded event applier
//!
//! Creates a line item from the payload snapshot. Lines added while the order
//! is still being built start `opened`; once the order has been submitted
//! they start `ordered`.

use crate::order_money;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, LineItem, LineItemStatus, OrderAggregate, OrderEvent};

/// ItemAdded applier
pub struct ItemAddedApplier;

impl EventApplier for ItemAddedApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent) {
        if let EventPayload::ItemAdded {
            line_key,
            menu_item_id,
            name,
            station,
            price,
            quantity,
        } = &event.payload
        {
            if aggregate.totals_frozen || !aggregate.status.is_editable() {
                return;
            }
            // line_key is never reused, not even after removal
            if aggregate.item(line_key).is_some() {
                return;
            }

            aggregate.items.push(LineItem {
                line_key: line_key.clone(),
                menu_item_id: *menu_item_id,
                name: name.clone(),
                station: station.clone(),
                price: *price,
                quantity: *quantity,
                status: LineItemStatus::Live(aggregate.status.initial_item_stage()),
                ticket_id: None,
                added_at: event.occurred_at,
                updated_at: event.occurred_at,
            });
            aggregate.updated_at = event.occurred_at;

            order_money::recalculate_totals(aggregate);
        }
    }
}
