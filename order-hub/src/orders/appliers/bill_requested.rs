//! BillRequested event applier
//!
//! Moves the order to `bill_requested` and freezes net, tax and service.
//! Only the tip may change afterwards.

use crate::order_money;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderAggregate, OrderEvent, OrderStatus};

/// BillRequested applier
pub struct BillRequestedApplier;

impl EventApplier for BillRequestedApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent) {
        if let EventPayload::BillRequested { .. } = &event.payload {
            if !aggregate.status.is_editable() {
                return;
            }
            // Settle the live lines one last time before freezing
            order_money::recalculate_totals(aggregate);
            aggregate.status = OrderStatus::BillRequested;
            aggregate.totals_frozen = true;
            aggregate.updated_at = event.occurred_at;
        }
    }
}
