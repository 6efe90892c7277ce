//! Core traits of the order engine
//!
//! - [`EventApplier`]: folds one event into the aggregate (pure)
//! - [`CommandHandler`]: validates a command and emits its events
//! - [`CommandContext`]: the per-unit transaction scope handed to commands

use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use shared::order::{EventPayload, EventSource, OrderAggregate, OrderEvent, OrderStatus};
use thiserror::Error;

// The dispatch impl for `EventAction` is generated next to the trait
#[allow(unused_imports)]
use super::appliers::{
    BillRequestedApplier, EventAction, ItemAddedApplier, ItemRemovedApplier, OrderOpenedApplier,
    StatusChangedApplier, TicketAdvancedApplier, TicketCreatedApplier, TipAddedApplier,
    UnknownApplier,
};
use super::event_store::{self, Emitted, NewEvent};
use super::projector;
use super::storage::{OrderStorage, StorageError};
use crate::services::{Catalog, InventoryError, InventoryLedger};

/// Errors raised by the order engine
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed or missing input; nothing was emitted
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(i64),

    #[error("Menu item unavailable: {0}")]
    MenuItemUnavailable(i64),

    #[error("Order {order_id} is not editable in status {status}")]
    OrderNotEditable {
        order_id: String,
        status: OrderStatus,
    },

    /// Illegal ticket or order status move; nothing was mutated
    #[error("Invalid {entity} transition {from} -> {to}: {reason}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
        reason: String,
    },

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Another writer took the sequence; the unit is retried
    #[error("Sequence {sequence} already taken on order {order_id}")]
    SequenceConflict { order_id: String, sequence: u64 },

    /// Retries exhausted
    #[error("Concurrent update conflict on order {0}")]
    ConcurrencyConflict(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SequenceConflict { order_id, sequence } => {
                OrderError::SequenceConflict { order_id, sequence }
            }
            other => OrderError::Storage(other),
        }
    }
}

impl From<redb::CommitError> for OrderError {
    fn from(err: redb::CommitError) -> Self {
        OrderError::Storage(StorageError::from(err))
    }
}

impl OrderError {
    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        to: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        OrderError::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }
}

// ========== Event Applier ==========

/// Applies one event to the aggregate
///
/// Implementations are pure: no I/O, no clock. Stale or inapplicable events
/// are skipped, never failed. The projector advances the cursor.
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, aggregate: &mut OrderAggregate, event: &OrderEvent);
}

// ========== Command Handler ==========

/// Request-scoped metadata of a command
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub source: EventSource,
    /// Attached to the first event the command emits
    pub idempotency_key: Option<String>,
}

impl CommandMetadata {
    pub fn new(source: EventSource, idempotency_key: Option<String>) -> Self {
        Self {
            source,
            idempotency_key,
        }
    }

    pub fn staff() -> Self {
        Self::new(EventSource::Staff, None)
    }
}

/// Validates a command against the current aggregate and emits its events
///
/// All validation happens before the first emit. Events emitted before a
/// later failure are discarded with the transaction.
pub trait CommandHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError>;
}

/// Transaction scope of one command unit
///
/// Every emit is projected immediately, so the command always reads the
/// post-projection aggregate of its own earlier events.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a OrderStorage,
    catalog: &'a dyn Catalog,
    inventory: &'a dyn InventoryLedger,
    order_id: String,
    aggregate: Option<OrderAggregate>,
    emitted: Vec<OrderEvent>,
    inventory_adjustments: Vec<(i64, i64)>,
}

/// What a command unit produced
#[derive(Debug)]
pub struct CommandEffects {
    pub events: Vec<OrderEvent>,
    pub aggregate: Option<OrderAggregate>,
    /// (menu_item_id, delta) applied to inventory; reverted if the unit fails
    pub inventory_adjustments: Vec<(i64, i64)>,
}

impl<'a> CommandContext<'a> {
    /// Open the scope, catching the aggregate up with its log first
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a OrderStorage,
        catalog: &'a dyn Catalog,
        inventory: &'a dyn InventoryLedger,
        order_id: impl Into<String>,
    ) -> Result<Self, OrderError> {
        let order_id = order_id.into();
        let aggregate = projector::project_in_txn(storage, txn, &order_id)?;
        Ok(Self {
            txn,
            storage,
            catalog,
            inventory,
            order_id,
            aggregate,
            emitted: Vec::new(),
            inventory_adjustments: Vec::new(),
        })
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn catalog(&self) -> &'a dyn Catalog {
        self.catalog
    }

    pub fn aggregate(&self) -> Option<&OrderAggregate> {
        self.aggregate.as_ref()
    }

    /// Current aggregate, or `OrderNotFound`
    pub fn require_aggregate(&self) -> Result<&OrderAggregate, OrderError> {
        self.aggregate
            .as_ref()
            .ok_or_else(|| OrderError::OrderNotFound(self.order_id.clone()))
    }

    /// Append an event and project it
    pub fn emit(
        &mut self,
        metadata: &CommandMetadata,
        payload: EventPayload,
    ) -> Result<&OrderEvent, OrderError> {
        let idempotency_key = if self.emitted.is_empty() {
            metadata.idempotency_key.clone()
        } else {
            None
        };
        let emitted = event_store::emit(
            self.storage,
            self.txn,
            NewEvent {
                order_id: self.order_id.clone(),
                source: metadata.source,
                idempotency_key,
                payload,
            },
        )?;
        let event = match emitted {
            Emitted::Appended(event) => event,
            Emitted::Duplicate(event) => {
                // Duplicates are caught before the command runs
                return Err(OrderError::Validation(format!(
                    "idempotency key already used by event {}",
                    event.sequence
                )));
            }
        };

        self.aggregate = projector::project_in_txn(self.storage, self.txn, &self.order_id)?;
        self.emitted.push(event);
        self.emitted
            .last()
            .ok_or_else(|| OrderError::Validation("no event emitted".to_string()))
    }

    /// Adjust a tracked inventory counter, remembering it for compensation
    pub fn adjust_inventory(&mut self, menu_item_id: i64, delta: i64) -> Result<(), OrderError> {
        if let Some(remaining) = self.inventory.adjust(menu_item_id, delta)? {
            tracing::debug!(menu_item_id, delta, remaining, "Inventory adjusted");
            self.inventory_adjustments.push((menu_item_id, delta));
        }
        Ok(())
    }

    pub fn into_effects(self) -> CommandEffects {
        CommandEffects {
            events: self.emitted,
            aggregate: self.aggregate,
            inventory_adjustments: self.inventory_adjustments,
        }
    }
}
