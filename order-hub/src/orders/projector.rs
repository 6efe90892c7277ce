//! Order event projector
//!
//! Folds the unapplied tail of an order's log into its aggregate. The
//! aggregate, its cursor (`last_applied_sequence`) and the lookup indices are
//! written in the caller's transaction, so mutations and cursor either commit
//! together or not at all.
//!
//! Callers serialize projection per order (see [`super::locks`]); the
//! read-then-write of the cursor is not atomic on its own.

use redb::WriteTransaction;
use shared::order::{EventPayload, OrderAggregate, OrderEvent, OrderEventType};

use super::appliers::EventAction;
use super::storage::{OrderStorage, StorageResult};
use super::traits::EventApplier;

/// Apply one event and advance the cursor
///
/// Events at or below the cursor were already applied and are ignored.
/// Unknown event types are skipped, but the cursor still moves past them.
pub fn apply_event(aggregate: &mut OrderAggregate, event: &OrderEvent) {
    if event.sequence <= aggregate.last_applied_sequence {
        return;
    }
    if event.event_type == OrderEventType::Unknown {
        tracing::warn!(
            order_id = %event.order_id,
            sequence = event.sequence,
            "Skipping unknown event type"
        );
    }

    EventAction::from(event).apply(aggregate, event);
    aggregate.last_applied_sequence = event.sequence;
}

/// Project pending events inside `txn`
///
/// Returns the post-projection aggregate, `None` if the order has no events.
/// With nothing pending the stored aggregate is returned untouched.
pub fn project_in_txn(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    order_id: &str,
) -> StorageResult<Option<OrderAggregate>> {
    let current = storage.get_aggregate_txn(txn, order_id)?;
    let cursor = current.as_ref().map_or(0, |a| a.last_applied_sequence);
    let pending = storage.events_after_txn(txn, order_id, cursor)?;
    if pending.is_empty() {
        return Ok(current);
    }

    let mut aggregate = current.unwrap_or_else(|| OrderAggregate::new(order_id.to_string()));
    for event in &pending {
        apply_event(&mut aggregate, event);
        index_event(storage, txn, &aggregate, event)?;
    }
    storage.store_aggregate(txn, &aggregate)?;

    tracing::debug!(
        order_id,
        applied = pending.len(),
        last_applied_sequence = aggregate.last_applied_sequence,
        "Projected order events"
    );
    Ok(Some(aggregate))
}

/// Project pending events in a transaction of its own
pub fn project(storage: &OrderStorage, order_id: &str) -> StorageResult<Option<OrderAggregate>> {
    let txn = storage.begin_write()?;
    let aggregate = project_in_txn(storage, &txn, order_id)?;
    txn.commit()?;
    Ok(aggregate)
}

/// Keep the ticket and smartmenu lookups in step with what was applied
fn index_event(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    aggregate: &OrderAggregate,
    event: &OrderEvent,
) -> StorageResult<()> {
    match &event.payload {
        EventPayload::OrderOpened { smartmenu_slug, .. } if event.sequence == 1 => {
            if is_latest_at_table(storage, txn, smartmenu_slug, aggregate)? {
                storage.index_smartmenu(txn, smartmenu_slug, &aggregate.order_id)?;
            }
            Ok(())
        }
        EventPayload::TicketCreated { ticket_id, .. } if aggregate.ticket(ticket_id).is_some() => {
            storage.index_ticket(txn, ticket_id, &aggregate.order_id)
        }
        _ => Ok(()),
    }
}

/// A rebuilt older order must not take the slug back from a newer one
fn is_latest_at_table(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    slug: &str,
    aggregate: &OrderAggregate,
) -> StorageResult<bool> {
    let Some(current) = storage.find_order_for_smartmenu_txn(txn, slug)? else {
        return Ok(true);
    };
    if current == aggregate.order_id {
        return Ok(true);
    }
    Ok(storage
        .get_aggregate_txn(txn, &current)?
        .is_none_or(|other| other.opened_at <= aggregate.opened_at))
}
