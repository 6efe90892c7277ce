//! ChangeStatus command handler
//!
//! Explicit order status moves. `from` must match the current status and
//! only forward moves are legal:
//!
//! - `opened -> ordered` is a submit (tickets are created)
//! - kitchen stages (`preparing`, `ready`, `delivered`) move forward while
//!   the order is in service
//! - `bill_requested` requires every live line to be submitted
//! - `paid` only from `bill_requested`, `closed` only from `paid`

use super::request_bill::check_bill_allowed;
use super::submit_order::SubmitOrderAction;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderStatus};

/// ChangeStatus action
#[derive(Debug, Clone)]
pub struct ChangeStatusAction {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl ChangeStatusAction {
    fn reject(&self, reason: impl Into<String>) -> OrderError {
        OrderError::invalid_transition("order", self.from, self.to, reason)
    }

    fn emit_change(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        ctx.emit(
            metadata,
            EventPayload::StatusChanged {
                from: self.from,
                to: self.to,
            },
        )?;
        Ok(())
    }
}

impl CommandHandler for ChangeStatusAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        let order = ctx.require_aggregate()?;
        if order.status != self.from {
            return Err(self.reject(format!("order is {}", order.status)));
        }
        if self.to <= self.from {
            return Err(self.reject("only forward moves are allowed"));
        }

        match (self.from, self.to) {
            (OrderStatus::Opened, OrderStatus::Ordered) => SubmitOrderAction.execute(ctx, metadata),
            (_, OrderStatus::BillRequested) => {
                check_bill_allowed(order)?;
                ctx.emit(metadata, EventPayload::BillRequested { note: None })?;
                Ok(())
            }
            (from, OrderStatus::Preparing | OrderStatus::Ready | OrderStatus::Delivered) => {
                if !from.is_in_service() {
                    return Err(self.reject("order must be submitted first"));
                }
                self.emit_change(ctx, metadata)
            }
            (OrderStatus::BillRequested, OrderStatus::Paid)
            | (OrderStatus::Paid, OrderStatus::Closed) => self.emit_change(ctx, metadata),
            _ => Err(self.reject("transition is not allowed")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::Fixture;
    use crate::orders::actions::{AddItemAction, OpenOrderAction};

    fn change(from: OrderStatus, to: OrderStatus) -> ChangeStatusAction {
        ChangeStatusAction { from, to }
    }

    fn with_items() -> Fixture {
        let fx = Fixture::new();
        fx.run(OpenOrderAction {
            restaurant_id: 1,
            table_id: 7,
        })
        .unwrap();
        for key in ["a1", "a2"] {
            fx.run(AddItemAction {
                line_key: key.to_string(),
                menu_item_id: 5,
                quantity: 1,
            })
            .unwrap();
        }
        fx
    }

    #[test]
    fn test_full_lifecycle() {
        let fx = with_items();
        let chain = [
            OrderStatus::Opened,
            OrderStatus::Ordered,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::BillRequested,
            OrderStatus::Paid,
            OrderStatus::Closed,
        ];
        for pair in chain.windows(2) {
            let effects = fx.run(change(pair[0], pair[1])).unwrap();
            assert_eq!(effects.aggregate.unwrap().status, pair[1]);
        }
    }

    #[test]
    fn test_bill_with_unsubmitted_items_is_rejected() {
        let fx = with_items();
        let before = fx.event_count();

        let err = fx
            .run(change(OrderStatus::Ordered, OrderStatus::BillRequested))
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
        let err = fx
            .run(change(OrderStatus::Opened, OrderStatus::BillRequested))
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
        assert_eq!(fx.event_count(), before);
    }

    #[test]
    fn test_illegal_moves_are_rejected() {
        let fx = with_items();
        fx.run(change(OrderStatus::Opened, OrderStatus::Ordered)).unwrap();
        let before = fx.event_count();

        for (from, to) in [
            (OrderStatus::Ordered, OrderStatus::Opened),
            (OrderStatus::Ordered, OrderStatus::Ordered),
            (OrderStatus::Ordered, OrderStatus::Paid),
            (OrderStatus::Ordered, OrderStatus::Closed),
            (OrderStatus::Preparing, OrderStatus::Ready),
        ] {
            assert!(
                matches!(fx.run(change(from, to)), Err(OrderError::InvalidTransition { .. })),
                "{from} -> {to} should be rejected"
            );
        }
        assert_eq!(fx.event_count(), before);
    }

    #[test]
    fn test_kitchen_stage_before_submit_is_rejected() {
        let fx = with_items();
        assert!(fx
            .run(change(OrderStatus::Opened, OrderStatus::Preparing))
            .is_err());
    }
}
