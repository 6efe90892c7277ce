//! TipAdded event applier

use crate::order_money;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderAggregate, OrderEvent, OrderStatus};

/// TipAdded applier
pub struct TipAddedApplier;

impl EventApplier for TipAddedApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent) {
        if let EventPayload::TipAdded { amount } = &event.payload {
            if aggregate.status >= OrderStatus::Paid {
                return;
            }
            order_money::add_tip(aggregate, *amount);
            aggregate.updated_at = event.occurred_at;
        }
    }
}
