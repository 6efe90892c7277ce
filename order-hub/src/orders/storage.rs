//! redb-based storage layer for the order event log
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `events` | `(order_id, sequence)` | `OrderEvent` | Event log (append-only) |
//! | `idempotency` | `(order_id, key)` | `sequence` | Retry de-duplication |
//! | `aggregates` | `order_id` | `OrderAggregate` | Projected state (rebuildable) |
//! | `ticket_index` | `ticket_id` | `order_id` | Ticket lookup |
//! | `smartmenu_index` | `slug` | `order_id` | Latest order opened at a table |
//! | `participants` | `(order_id, session_id, role)` | `Participant` | Snapshot scoping |
//!
//! The event log is the durable audit trail. Everything else is derived and
//! can be rebuilt from it.
//!
//! # Durability
//!
//! Every mutation happens inside one write transaction. Dropping a
//! `WriteTransaction` without committing aborts it, so a failed unit leaves
//! no partial state behind.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::order::{OrderAggregate, OrderEvent, Participant, ParticipantRole};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Event log: key = (order_id, sequence), value = JSON-serialized OrderEvent
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("events");

/// Idempotency keys: key = (order_id, idempotency_key), value = sequence of the stored event
const IDEMPOTENCY_TABLE: TableDefinition<(&str, &str), u64> = TableDefinition::new("idempotency");

/// Aggregates: key = order_id, value = JSON-serialized OrderAggregate
const AGGREGATES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("aggregates");

/// Ticket index: key = ticket_id, value = order_id
const TICKET_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("ticket_index");

/// Smartmenu index: key = slug, value = order_id
const SMARTMENU_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("smartmenu_index");

/// Participants: key = (order_id, session_id, role), value = JSON-serialized Participant
const PARTICIPANTS_TABLE: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("participants");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `(order_id, sequence)` already holds an event
    #[error("Sequence conflict: order_id={order_id}, sequence={sequence}")]
    SequenceConflict { order_id: String, sequence: u64 },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the transaction survives a crash or power loss.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and ephemeral runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(IDEMPOTENCY_TABLE)?;
            let _ = write_txn.open_table(AGGREGATES_TABLE)?;
            let _ = write_txn.open_table(TICKET_INDEX_TABLE)?;
            let _ = write_txn.open_table(SMARTMENU_INDEX_TABLE)?;
            let _ = write_txn.open_table(PARTICIPANTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    ///
    /// redb admits one write transaction at a time; this blocks until the
    /// previous one commits or aborts.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Event Operations ==========

    /// Append an event
    ///
    /// Fails with [`StorageError::SequenceConflict`] if the key is taken.
    /// The caller's transaction must then be dropped.
    pub fn append_event(&self, txn: &WriteTransaction, event: &OrderEvent) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.order_id.as_str(), event.sequence);
        if table.get(key)?.is_some() {
            return Err(StorageError::SequenceConflict {
                order_id: event.order_id.clone(),
                sequence: event.sequence,
            });
        }
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Highest sequence stored for an order (0 when the log is empty)
    pub fn last_sequence_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<u64> {
        let table = txn.open_table(EVENTS_TABLE)?;
        let last = table
            .range((order_id, 0u64)..=(order_id, u64::MAX))?
            .next_back()
            .transpose()?
            .map(|(key, _)| key.value().1)
            .unwrap_or(0);
        Ok(last)
    }

    /// Read one event (within transaction)
    pub fn get_event_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        sequence: u64,
    ) -> StorageResult<Option<OrderEvent>> {
        let table = txn.open_table(EVENTS_TABLE)?;
        match table.get((order_id, sequence))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Events with `sequence > after`, ascending (within transaction)
    pub fn events_after_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        after: u64,
    ) -> StorageResult<Vec<OrderEvent>> {
        let table = txn.open_table(EVENTS_TABLE)?;
        if after == u64::MAX {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for result in table.range((order_id, after + 1)..=(order_id, u64::MAX))? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }

    /// Get all events for an order, ascending
    pub fn get_events_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }

    /// Number of events stored for an order
    pub fn count_events(&self, order_id: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;
        let mut count = 0;
        for result in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            result?;
            count += 1;
        }
        Ok(count)
    }

    /// Walk an order's events newest first, starting below `before`
    ///
    /// `visit` returns `false` to stop the scan.
    pub fn scan_events_desc(
        &self,
        order_id: &str,
        before: Option<u64>,
        mut visit: impl FnMut(OrderEvent) -> bool,
    ) -> StorageResult<()> {
        let upper = match before {
            Some(0) => return Ok(()),
            Some(seq) => seq - 1,
            None => u64::MAX,
        };

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;
        for result in table.range((order_id, 0u64)..=(order_id, upper))?.rev() {
            let (_key, value) = result?;
            let event: OrderEvent = serde_json::from_slice(value.value())?;
            if !visit(event) {
                break;
            }
        }
        Ok(())
    }

    /// Total events across all orders
    pub fn total_events(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Idempotency ==========

    /// Sequence of the event previously stored under `(order_id, key)`
    pub fn find_idempotent_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        key: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(IDEMPOTENCY_TABLE)?;
        Ok(table.get((order_id, key))?.map(|guard| guard.value()))
    }

    pub fn store_idempotency_key(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        key: &str,
        sequence: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(IDEMPOTENCY_TABLE)?;
        table.insert((order_id, key), sequence)?;
        Ok(())
    }

    // ========== Aggregate Operations ==========

    /// Store an aggregate
    pub fn store_aggregate(
        &self,
        txn: &WriteTransaction,
        aggregate: &OrderAggregate,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(AGGREGATES_TABLE)?;
        let value = serde_json::to_vec(aggregate)?;
        table.insert(aggregate.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an aggregate by order ID
    pub fn get_aggregate(&self, order_id: &str) -> StorageResult<Option<OrderAggregate>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AGGREGATES_TABLE)?;

        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an aggregate by order ID (within transaction)
    pub fn get_aggregate_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderAggregate>> {
        let table = txn.open_table(AGGREGATES_TABLE)?;

        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Drop the projected state of an order, keeping its log
    pub fn remove_aggregate(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(AGGREGATES_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    // ========== Indices ==========

    pub fn index_ticket(
        &self,
        txn: &WriteTransaction,
        ticket_id: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(TICKET_INDEX_TABLE)?;
        table.insert(ticket_id, order_id)?;
        Ok(())
    }

    /// Order that owns a ticket
    pub fn find_order_for_ticket(&self, ticket_id: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TICKET_INDEX_TABLE)?;
        Ok(table.get(ticket_id)?.map(|guard| guard.value().to_string()))
    }

    pub fn index_smartmenu(
        &self,
        txn: &WriteTransaction,
        slug: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SMARTMENU_INDEX_TABLE)?;
        table.insert(slug, order_id)?;
        Ok(())
    }

    /// Latest order opened under a smartmenu slug
    pub fn find_order_for_smartmenu(&self, slug: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SMARTMENU_INDEX_TABLE)?;
        Ok(table.get(slug)?.map(|guard| guard.value().to_string()))
    }

    pub fn find_order_for_smartmenu_txn(
        &self,
        txn: &WriteTransaction,
        slug: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(SMARTMENU_INDEX_TABLE)?;
        Ok(table.get(slug)?.map(|guard| guard.value().to_string()))
    }

    // ========== Participants ==========

    /// Insert or replace a participant row
    pub fn upsert_participant(
        &self,
        txn: &WriteTransaction,
        participant: &Participant,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PARTICIPANTS_TABLE)?;
        let role = participant.role.to_string();
        let key = (
            participant.order_id.as_str(),
            participant.session_id.as_str(),
            role.as_str(),
        );
        let value = serde_json::to_vec(participant)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Participant row for one (order, session, role)
    pub fn get_participant(
        &self,
        order_id: &str,
        session_id: &str,
        role: ParticipantRole,
    ) -> StorageResult<Option<Participant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PARTICIPANTS_TABLE)?;
        let role = role.to_string();

        match table.get((order_id, session_id, role.as_str()))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All participants of an order, ordered by (session_id, role)
    pub fn list_participants(&self, order_id: &str) -> StorageResult<Vec<Participant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PARTICIPANTS_TABLE)?;

        let mut participants = Vec::new();
        for result in table.range((order_id, "", "")..)? {
            let (key, value) = result?;
            if key.value().0 != order_id {
                break;
            }
            participants.push(serde_json::from_slice(value.value())?);
        }
        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{EventPayload, EventSource};

    fn tip_event(order_id: &str, sequence: u64) -> OrderEvent {
        OrderEvent::new(
            order_id.to_string(),
            sequence,
            EventSource::Staff,
            None,
            EventPayload::TipAdded { amount: 1.0 },
        )
    }

    #[test]
    fn test_append_and_read_events() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.append_event(&txn, &tip_event("o-1", 1)).unwrap();
        storage.append_event(&txn, &tip_event("o-1", 2)).unwrap();
        storage.append_event(&txn, &tip_event("o-2", 1)).unwrap();
        assert_eq!(storage.last_sequence_txn(&txn, "o-1").unwrap(), 2);
        assert_eq!(storage.last_sequence_txn(&txn, "o-3").unwrap(), 0);
        assert_eq!(storage.events_after_txn(&txn, "o-1", 1).unwrap().len(), 1);
        txn.commit().unwrap();

        let events = storage.get_events_for_order("o-1").unwrap();
        let seqs: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(storage.total_events().unwrap(), 3);
    }

    #[test]
    fn test_duplicate_sequence_is_a_conflict() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.append_event(&txn, &tip_event("o-1", 1)).unwrap();
        let err = storage.append_event(&txn, &tip_event("o-1", 1)).unwrap_err();
        assert!(matches!(err, StorageError::SequenceConflict { sequence: 1, .. }));
    }

    #[test]
    fn test_committed_events_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.redb");
        {
            let storage = OrderStorage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            storage.append_event(&txn, &tip_event("o-1", 1)).unwrap();
            storage.append_event(&txn, &tip_event("o-1", 2)).unwrap();
            txn.commit().unwrap();
        }

        let storage = OrderStorage::open(&path).unwrap();
        assert_eq!(storage.count_events("o-1").unwrap(), 2);
        let events = storage.get_events_for_order("o-1").unwrap();
        assert_eq!(events[1].sequence, 2);
        assert_eq!(events[1].payload, EventPayload::TipAdded { amount: 1.0 });
    }

    #[test]
    fn test_uncommitted_transaction_leaves_nothing() {
        let storage = OrderStorage::open_in_memory().unwrap();
        {
            let txn = storage.begin_write().unwrap();
            storage.append_event(&txn, &tip_event("o-1", 1)).unwrap();
            // dropped without commit
        }
        assert_eq!(storage.count_events("o-1").unwrap(), 0);
    }

    #[test]
    fn test_scan_desc_respects_cursor() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for seq in 1..=5 {
            storage.append_event(&txn, &tip_event("o-1", seq)).unwrap();
        }
        txn.commit().unwrap();

        let mut seen = Vec::new();
        storage
            .scan_events_desc("o-1", Some(4), |e| {
                seen.push(e.sequence);
                true
            })
            .unwrap();
        assert_eq!(seen, vec![3, 2, 1]);

        let mut seen = Vec::new();
        storage
            .scan_events_desc("o-1", None, |e| {
                seen.push(e.sequence);
                seen.len() < 2
            })
            .unwrap();
        assert_eq!(seen, vec![5, 4]);
    }

    #[test]
    fn test_participants_are_scoped_per_order() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for (order, session, role) in [
            ("o-1", "s-1", ParticipantRole::Customer),
            ("o-1", "s-1", ParticipantRole::Staff),
            ("o-2", "s-9", ParticipantRole::Customer),
        ] {
            storage
                .upsert_participant(
                    &txn,
                    &Participant {
                        order_id: order.to_string(),
                        session_id: session.to_string(),
                        role,
                        locale: "en".to_string(),
                        joined_at: 1,
                    },
                )
                .unwrap();
        }
        txn.commit().unwrap();

        assert_eq!(storage.list_participants("o-1").unwrap().len(), 2);
        let p = storage
            .get_participant("o-2", "s-9", ParticipantRole::Customer)
            .unwrap()
            .unwrap();
        assert_eq!(p.session_id, "s-9");
        assert!(
            storage
                .get_participant("o-2", "s-9", ParticipantRole::Staff)
                .unwrap()
                .is_none()
        );
    }
}
