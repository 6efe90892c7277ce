//! OrdersManager - command processing, projection and broadcast
//!
//! This module handles:
//! - Serializing every unit of work on one order behind its lock
//! - Idempotent command execution (caller-supplied idempotency keys)
//! - Emitting events and projecting them in the same transaction
//! - Compensating inventory when a unit fails
//! - Broadcasting fresh snapshots once the unit has committed
//!
//! # Command Flow
//!
//! ```text
//! execute(order_id, action, metadata)
//!     ├─ 1. Take the per-order lock
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Idempotency check: a known key returns the stored event
//!     ├─ 4. Create CommandContext (catches the aggregate up with its log)
//!     ├─ 5. Execute the action: validate, emit, project after each emit
//!     ├─ 6. Commit (events + aggregate + cursor as one unit)
//!     │     └─ on failure: revert inventory, drop the transaction
//!     ├─ 7. Retry on SequenceConflict (bounded)
//!     ├─ 8. Release the lock
//!     └─ 9. Broadcast staff + customer snapshots (best effort)
//! ```

mod error;
pub use error::*;

use super::actions::{
    AddItemAction, AddTipAction, AdvanceTicketAction, ChangeStatusAction, CommandAction,
    OpenOrderAction, RemoveItemAction, RequestBillAction, SubmitOrderAction,
};
use super::event_store::{self, EventPage, EventQuery, NewEvent};
use super::locks::OrderLocks;
use super::projector;
use super::reducer;
use super::snapshot::{self, SnapshotContext};
use super::storage::{OrderStorage, StorageError};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::realtime::{self, Publisher};
use crate::services::{Catalog, InventoryLedger};
use serde::Serialize;
use shared::order::{
    ChannelMessage, OrderAggregate, OrderEvent, OrderStatus, Participant, ParticipantRole,
    Session, StateSnapshot, StationTicket, TicketStatus,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Attempts of one unit before a sequence conflict is surfaced
const MAX_ATTEMPTS: usize = 3;

/// Result of a successful command
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    /// Post-projection aggregate
    pub order: OrderAggregate,
    /// Events appended by this command; the stored event for a duplicate
    pub events: Vec<OrderEvent>,
    /// The idempotency key was seen before and nothing was appended
    pub duplicate: bool,
}

/// Result of a raw emit
#[derive(Debug, Clone, Serialize)]
pub struct EmitOutcome {
    pub event: OrderEvent,
    pub order: OrderAggregate,
    pub duplicate: bool,
}

/// OrdersManager for command processing
pub struct OrdersManager {
    storage: OrderStorage,
    locks: OrderLocks,
    catalog: Arc<dyn Catalog>,
    inventory: Arc<dyn InventoryLedger>,
    publisher: Arc<dyn Publisher>,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &self.storage)
            .field("locks", &self.locks.len())
            .finish()
    }
}

impl OrdersManager {
    pub fn new(
        storage: OrderStorage,
        catalog: Arc<dyn Catalog>,
        inventory: Arc<dyn InventoryLedger>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            storage,
            locks: OrderLocks::new(),
            catalog,
            inventory,
            publisher,
        }
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    // ========== Commands ==========

    /// Open an order on a table
    ///
    /// Pass `order_id` to make the open itself retry-safe together with an
    /// idempotency key; otherwise a fresh id is generated. Keys are scoped to
    /// an order, so a key without an `order_id` is rejected.
    pub fn open_order(
        &self,
        order_id: Option<String>,
        restaurant_id: i64,
        table_id: i64,
        metadata: &CommandMetadata,
    ) -> ManagerResult<CommandOutcome> {
        let order_id = match (order_id, &metadata.idempotency_key) {
            (Some(order_id), _) => order_id,
            (None, None) => shared::util::new_id(),
            (None, Some(_)) => {
                return Err(ManagerError::Validation(
                    "an idempotency key on open requires a client order_id".to_string(),
                ));
            }
        };
        self.execute(
            &order_id,
            OpenOrderAction {
                restaurant_id,
                table_id,
            },
            metadata,
        )
    }

    pub fn add_item(
        &self,
        order_id: &str,
        line_key: impl Into<String>,
        menu_item_id: i64,
        quantity: u32,
        metadata: &CommandMetadata,
    ) -> ManagerResult<CommandOutcome> {
        self.execute(
            order_id,
            AddItemAction {
                line_key: line_key.into(),
                menu_item_id,
                quantity,
            },
            metadata,
        )
    }

    pub fn remove_item(
        &self,
        order_id: &str,
        line_key: impl Into<String>,
        reason: Option<String>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<CommandOutcome> {
        self.execute(
            order_id,
            RemoveItemAction {
                line_key: line_key.into(),
                reason,
            },
            metadata,
        )
    }

    pub fn submit_order(
        &self,
        order_id: &str,
        metadata: &CommandMetadata,
    ) -> ManagerResult<CommandOutcome> {
        self.execute(order_id, SubmitOrderAction, metadata)
    }

    pub fn change_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        metadata: &CommandMetadata,
    ) -> ManagerResult<CommandOutcome> {
        self.execute(order_id, ChangeStatusAction { from, to }, metadata)
    }

    pub fn request_bill(
        &self,
        order_id: &str,
        note: Option<String>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<CommandOutcome> {
        self.execute(order_id, RequestBillAction { note }, metadata)
    }

    pub fn add_tip(
        &self,
        order_id: &str,
        amount: f64,
        metadata: &CommandMetadata,
    ) -> ManagerResult<CommandOutcome> {
        self.execute(order_id, AddTipAction { amount }, metadata)
    }

    /// Advance a station ticket; returns the ticket after the move
    pub fn advance_ticket(
        &self,
        ticket_id: &str,
        to: TicketStatus,
        metadata: &CommandMetadata,
    ) -> ManagerResult<(StationTicket, CommandOutcome)> {
        let order_id = self
            .storage
            .find_order_for_ticket(ticket_id)?
            .ok_or_else(|| ManagerError::TicketNotFound(ticket_id.to_string()))?;
        let outcome = self.execute(
            &order_id,
            AdvanceTicketAction {
                ticket_id: ticket_id.to_string(),
                to,
            },
            metadata,
        )?;
        let ticket = outcome
            .order
            .ticket(ticket_id)
            .cloned()
            .ok_or_else(|| ManagerError::TicketNotFound(ticket_id.to_string()))?;
        Ok((ticket, outcome))
    }

    /// Execute one command as a single unit
    pub fn execute(
        &self,
        order_id: &str,
        action: impl Into<CommandAction>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<CommandOutcome> {
        let action = action.into();
        tracing::debug!(order_id, command = action.name(), source = %metadata.source, "Processing command");

        let outcome = self.with_retry(order_id, || self.try_execute(order_id, &action, metadata));
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::debug!(order_id, command = action.name(), error = %err, "Command rejected");
                return Err(err.into());
            }
        };

        if outcome.duplicate {
            tracing::info!(order_id, command = action.name(), "Duplicate command, returning stored event");
        } else {
            tracing::info!(
                order_id,
                command = action.name(),
                events = outcome.events.len(),
                sequence = outcome.order.last_applied_sequence,
                status = %outcome.order.status,
                "Command applied"
            );
            self.broadcast(&outcome.order);
        }
        Ok(outcome)
    }

    fn try_execute(
        &self,
        order_id: &str,
        action: &CommandAction,
        metadata: &CommandMetadata,
    ) -> Result<CommandOutcome, OrderError> {
        let txn = self.storage.begin_write()?;

        if let Some(key) = metadata.idempotency_key.as_deref() {
            if let Some(sequence) = self.storage.find_idempotent_txn(&txn, order_id, key)? {
                let event = self
                    .storage
                    .get_event_txn(&txn, order_id, sequence)?
                    .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
                let order = projector::project_in_txn(&self.storage, &txn, order_id)?
                    .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
                txn.commit()?;
                return Ok(CommandOutcome {
                    order,
                    events: vec![event],
                    duplicate: true,
                });
            }
        }

        let mut ctx = CommandContext::new(
            &txn,
            &self.storage,
            self.catalog.as_ref(),
            self.inventory.as_ref(),
            order_id,
        )?;
        let result = action.execute(&mut ctx, metadata);
        let effects = ctx.into_effects();

        if let Err(err) = result {
            self.revert_inventory(order_id, &effects.inventory_adjustments);
            return Err(err);
        }
        if let Err(err) = txn.commit() {
            self.revert_inventory(order_id, &effects.inventory_adjustments);
            return Err(err.into());
        }

        let order = effects
            .aggregate
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        Ok(CommandOutcome {
            order,
            events: effects.events,
            duplicate: false,
        })
    }

    /// Run `unit` under the order's lock, retrying sequence conflicts
    fn with_retry<T>(
        &self,
        order_id: &str,
        mut unit: impl FnMut() -> Result<T, OrderError>,
    ) -> Result<T, OrderError> {
        self.locks.with_lock(order_id, || {
            let mut attempt = 1;
            loop {
                match unit() {
                    Err(OrderError::SequenceConflict { sequence, .. }) if attempt < MAX_ATTEMPTS => {
                        tracing::warn!(order_id, sequence, attempt, "Sequence conflict, retrying unit");
                        attempt += 1;
                    }
                    Err(OrderError::SequenceConflict { sequence, .. }) => {
                        tracing::error!(order_id, sequence, attempt, "Sequence conflict, giving up");
                        return Err(OrderError::ConcurrencyConflict(order_id.to_string()));
                    }
                    other => return other,
                }
            }
        })
    }

    fn revert_inventory(&self, order_id: &str, adjustments: &[(i64, i64)]) {
        for &(menu_item_id, delta) in adjustments.iter().rev() {
            if let Err(e) = self.inventory.adjust(menu_item_id, -delta) {
                tracing::error!(order_id, menu_item_id, delta, error = %e, "Failed to revert inventory adjustment");
            }
        }
    }

    // ========== Event Store ==========

    /// Append one raw event and project it
    ///
    /// No workflow validation runs here beyond the payload checks of the
    /// event store; commands should go through [`Self::execute`].
    pub fn emit(&self, new: NewEvent) -> ManagerResult<EmitOutcome> {
        let order_id = new.order_id.clone();
        let outcome = self.with_retry(&order_id, || {
            let txn = self.storage.begin_write()?;
            let emitted = event_store::emit(&self.storage, &txn, new.clone())?;
            let order = projector::project_in_txn(&self.storage, &txn, &order_id)?
                .ok_or_else(|| OrderError::OrderNotFound(order_id.clone()))?;
            txn.commit()?;
            Ok((emitted, order))
        })?;

        let (emitted, order) = outcome;
        let duplicate = emitted.is_duplicate();
        if !duplicate {
            self.broadcast(&order);
        }
        Ok(EmitOutcome {
            event: emitted.into_event(),
            order,
            duplicate,
        })
    }

    /// Catch the aggregate up with its log
    pub fn project(&self, order_id: &str) -> ManagerResult<Option<OrderAggregate>> {
        let aggregate = self.locks.with_lock(order_id, || projector::project(&self.storage, order_id))?;
        Ok(aggregate)
    }

    /// Drop and rebuild the aggregate from the log
    pub fn rebuild(&self, order_id: &str) -> ManagerResult<Option<OrderAggregate>> {
        let aggregate = self.locks.with_lock(order_id, || reducer::rebuild(&self.storage, order_id))?;
        Ok(aggregate)
    }

    /// Fold the stored log into a fresh aggregate without persisting it
    pub fn replay(&self, order_id: &str) -> ManagerResult<Option<OrderAggregate>> {
        Ok(reducer::replay_from_storage(&self.storage, order_id)?)
    }

    pub fn get_order(&self, order_id: &str) -> ManagerResult<OrderAggregate> {
        self.storage
            .get_aggregate(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// Newest-first page of an order's event log
    pub fn events(&self, order_id: &str, query: &EventQuery) -> ManagerResult<EventPage> {
        Ok(event_store::feed(&self.storage, order_id, query)?)
    }

    /// Order currently bound to a smartmenu slug
    pub fn order_for_smartmenu(&self, slug: &str) -> ManagerResult<String> {
        self.storage
            .find_order_for_smartmenu(slug)?
            .ok_or_else(|| ManagerError::OrderNotFound(format!("smartmenu {slug}")))
    }

    // ========== Participants & Snapshots ==========

    /// Record a session joining an order
    ///
    /// Re-joining keeps the original join time and updates the locale. The
    /// read and the upsert run under the order's lock.
    pub fn join(
        &self,
        order_id: &str,
        session_id: &str,
        role: ParticipantRole,
        locale: Option<String>,
    ) -> ManagerResult<Participant> {
        if session_id.trim().is_empty() {
            return Err(ManagerError::Validation("session_id must not be empty".to_string()));
        }
        let participant = self.locks.with_lock(order_id, || -> ManagerResult<Participant> {
            let order = self.get_order(order_id)?;
            let existing = self.storage.get_participant(order_id, session_id, role)?;
            let locale = match (locale, &existing) {
                (Some(locale), _) => locale,
                (None, Some(existing)) => existing.locale.clone(),
                (None, None) => self
                    .catalog
                    .restaurant(order.restaurant_id)
                    .map(|r| r.default_locale)
                    .unwrap_or_default(),
            };
            let participant = Participant {
                order_id: order_id.to_string(),
                session_id: session_id.to_string(),
                role,
                locale,
                joined_at: existing.map_or_else(shared::util::now_millis, |p| p.joined_at),
            };

            let txn = self.storage.begin_write()?;
            self.storage.upsert_participant(&txn, &participant)?;
            txn.commit().map_err(StorageError::from)?;
            Ok(participant)
        })?;

        tracing::info!(order_id, session_id, role = %role, locale = %participant.locale, "Participant joined");
        Ok(participant)
    }

    /// Snapshot of an order for one viewer session
    pub fn snapshot(&self, order_id: &str, session: &Session) -> ManagerResult<StateSnapshot> {
        let order = self.get_order(order_id)?;
        let participant = self
            .storage
            .get_participant(order_id, &session.session_id, session.role)?;
        self.render(&order, participant.as_ref(), session)
            .ok_or_else(|| {
                ManagerError::Validation(format!(
                    "restaurant {} is missing from the catalog",
                    order.restaurant_id
                ))
            })
    }

    fn render(
        &self,
        order: &OrderAggregate,
        participant: Option<&Participant>,
        session: &Session,
    ) -> Option<StateSnapshot> {
        let restaurant = self.catalog.restaurant(order.restaurant_id)?;
        let table = self.catalog.table(order.table_id);
        let menu = self.catalog.menu(order.restaurant_id);
        let sold_out: BTreeSet<i64> = menu
            .items
            .iter()
            .filter(|item| self.inventory.remaining(item.id).is_some_and(|left| left <= 0))
            .map(|item| item.id)
            .collect();

        Some(snapshot::build_snapshot(SnapshotContext {
            menu: &menu,
            restaurant: &restaurant,
            table: table.as_ref(),
            order,
            participant,
            session,
            sold_out: &sold_out,
        }))
    }

    /// Publish staff and customer snapshots of `order`
    ///
    /// Runs after commit and outside the order's lock. Failures are logged
    /// and never reach the caller. The smartmenu topic only carries the
    /// order its slug currently resolves to.
    fn broadcast(&self, order: &OrderAggregate) {
        let mut targets = vec![(
            realtime::order_topic(&order.order_id),
            ParticipantRole::Staff,
        )];
        if self.is_current_for_smartmenu(order) {
            targets.push((
                realtime::smartmenu_topic(&order.smartmenu_slug),
                ParticipantRole::Customer,
            ));
        }

        for (topic, role) in targets {
            let session = snapshot::broadcast_session(role);
            let Some(state) = self.render(order, None, &session) else {
                tracing::warn!(
                    order_id = %order.order_id,
                    restaurant_id = order.restaurant_id,
                    "Restaurant missing from catalog, skipping broadcast"
                );
                return;
            };
            realtime::publish_best_effort(
                self.publisher.as_ref(),
                &topic,
                &ChannelMessage::new(state),
            );
        }
    }

    fn is_current_for_smartmenu(&self, order: &OrderAggregate) -> bool {
        match self.storage.find_order_for_smartmenu(&order.smartmenu_slug) {
            Ok(Some(current)) => current == order.order_id,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(
                    order_id = %order.order_id,
                    slug = %order.smartmenu_slug,
                    error = %e,
                    "Smartmenu lookup failed, skipping guest broadcast"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests;
