//! StatusChanged event applier
//!
//! Moves the order along its status chain when the payload's precondition
//! still holds. A stale `from` is a no-op, not a projection failure.

use crate::order_money;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderAggregate, OrderEvent, OrderStatus};

/// StatusChanged applier
pub struct StatusChangedApplier;

impl EventApplier for StatusChangedApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent) {
        if let EventPayload::StatusChanged { from, to } = &event.payload {
            if aggregate.status != *from {
                return;
            }
            aggregate.status = *to;
            if *to >= OrderStatus::BillRequested {
                aggregate.totals_frozen = true;
            }
            aggregate.updated_at = event.occurred_at;

            order_money::recalculate_totals(aggregate);
        }
    }
}
