//! ItemRemoved event applier
//!
//! Soft-deletes the line: its status becomes `removed` and it stays on the
//! aggregate for the audit trail, but no longer counts towards totals.

use crate::order_money;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderAggregate, OrderEvent};

/// ItemRemoved applier
pub struct ItemRemovedApplier;

impl EventApplier for ItemRemovedApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent) {
        if let EventPayload::ItemRemoved { line_key, .. } = &event.payload {
            if aggregate.totals_frozen {
                return;
            }
            let Some(item) = aggregate.item_mut(line_key) else {
                return;
            };
            if !item.remove(event.occurred_at) {
                return;
            }
            aggregate.updated_at = event.occurred_at;

            order_money::recalculate_totals(aggregate);
        }
    }
}
