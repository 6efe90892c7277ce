//! Event replay
//!
//! The aggregate table is a derived cache. These helpers rebuild an order's
//! aggregate from its log alone, through the same appliers the incremental
//! projector uses.

use shared::order::{OrderAggregate, OrderEvent};

use super::projector;
use super::storage::{OrderStorage, StorageResult};

/// Fold a full log (ascending) into a fresh aggregate
///
/// Returns `None` for an empty log.
pub fn replay(order_id: &str, events: &[OrderEvent]) -> Option<OrderAggregate> {
    if events.is_empty() {
        return None;
    }
    let mut aggregate = OrderAggregate::new(order_id.to_string());
    for event in events {
        projector::apply_event(&mut aggregate, event);
    }
    Some(aggregate)
}

/// Replay an order's stored log without touching the stored aggregate
pub fn replay_from_storage(
    storage: &OrderStorage,
    order_id: &str,
) -> StorageResult<Option<OrderAggregate>> {
    let events = storage.get_events_for_order(order_id)?;
    Ok(replay(order_id, &events))
}

/// Drop the stored aggregate and project the whole log again
///
/// The caller must hold the order's lock.
pub fn rebuild(storage: &OrderStorage, order_id: &str) -> StorageResult<Option<OrderAggregate>> {
    let txn = storage.begin_write()?;
    storage.remove_aggregate(&txn, order_id)?;
    let aggregate = projector::project_in_txn(storage, &txn, order_id)?;
    txn.commit()?;

    tracing::info!(
        order_id,
        last_applied_sequence = aggregate.as_ref().map(|a| a.last_applied_sequence),
        "Rebuilt order aggregate from event log"
    );
    Ok(aggregate)
}
