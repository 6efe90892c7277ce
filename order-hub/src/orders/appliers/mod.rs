//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions.

use enum_dispatch::enum_dispatch;

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderAggregate, OrderEvent};

mod bill_requested;
mod item_added;
mod item_removed;
mod order_opened;
mod status_changed;
mod ticket_advanced;
mod ticket_created;
mod tip_added;

pub use bill_requested::BillRequestedApplier;
pub use item_added::ItemAddedApplier;
pub use item_removed::ItemRemovedApplier;
pub use order_opened::OrderOpenedApplier;
pub use status_changed::StatusChangedApplier;
pub use ticket_advanced::TicketAdvancedApplier;
pub use ticket_created::TicketCreatedApplier;
pub use tip_added::TipAddedApplier;

/// Event types this server does not know; the projector steps over them
pub struct UnknownApplier;

impl EventApplier for UnknownApplier {
    fn apply(&self, _aggregate: &mut OrderAggregate, _event: &OrderEvent) {}
}

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderOpened(OrderOpenedApplier),
    ItemAdded(ItemAddedApplier),
    ItemRemoved(ItemRemovedApplier),
    StatusChanged(StatusChangedApplier),
    TicketCreated(TicketCreatedApplier),
    TicketAdvanced(TicketAdvancedApplier),
    BillRequested(BillRequestedApplier),
    TipAdded(TipAddedApplier),
    Unknown(UnknownApplier),
}

/// Convert OrderEvent reference to EventAction
///
/// This is the ONLY place with a match on EventPayload.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderOpened { .. } => EventAction::OrderOpened(OrderOpenedApplier),
            EventPayload::ItemAdded { .. } => EventAction::ItemAdded(ItemAddedApplier),
            EventPayload::ItemRemoved { .. } => EventAction::ItemRemoved(ItemRemovedApplier),
            EventPayload::StatusChanged { .. } => EventAction::StatusChanged(StatusChangedApplier),
            EventPayload::TicketCreated { .. } => EventAction::TicketCreated(TicketCreatedApplier),
            EventPayload::TicketAdvanced { .. } => {
                EventAction::TicketAdvanced(TicketAdvancedApplier)
            }
            EventPayload::BillRequested { .. } => EventAction::BillRequested(BillRequestedApplier),
            EventPayload::TipAdded { .. } => EventAction::TipAdded(TipAddedApplier),
            EventPayload::Unknown => EventAction::Unknown(UnknownApplier),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{event, fold, item_payload, opened_payload};
    use super::*;
    use shared::order::OrderStatus;

    #[test]
    fn test_event_action_dispatches_by_payload() {
        let order = fold(vec![
            opened_payload(),
            item_payload("a1", 9.5, "kitchen"),
            EventPayload::TipAdded { amount: 1.0 },
        ]);
        assert_eq!(order.status, OrderStatus::Opened);
        assert!(order.item("a1").is_some());
        assert_eq!(order.totals.tip, 1.0);

        // Unknown events route to the no-op applier
        let before = order.clone();
        let mut after = order;
        let unknown = event(4, EventPayload::Unknown);
        assert!(matches!(EventAction::from(&unknown), EventAction::Unknown(_)));
        EventAction::from(&unknown).apply(&mut after, &unknown);
        assert_eq!(after, before);
    }
}
