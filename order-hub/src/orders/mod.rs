//! Live order core
//!
//! This module implements the order log and everything derived from it:
//!
//! - **event_store**: append-only, per-order sequenced log with idempotency keys
//! - **projector** / **appliers**: fold pending events into the aggregate
//! - **reducer**: replay a log from sequence 1, rebuild the aggregate cache
//! - **actions**: commands validated against the aggregate before emitting
//! - **tickets**: station ticket state machine and order promotion
//! - **snapshot**: viewer-scoped state pushed to realtime subscribers
//! - **manager**: OrdersManager tying the above into one unit per command
//! - **storage**: redb tables for events, aggregates and indices
//!
//! # Architecture
//!
//! ```text
//! Command → OrdersManager ─┬─ per-order lock ──────────────────────────┐
//!                          │  emit → Storage (redb) → project → commit │
//!                          └───────────────────────────────────────────┘
//!                                         ↓
//!                          build snapshot → broadcast (best effort)
//!                                         ↓
//!                                  All Subscribers
//! ```

pub mod actions;
pub mod appliers;
pub mod event_store;
pub mod locks;
pub mod manager;
pub mod projector;
pub mod reducer;
pub mod snapshot;
pub mod storage;
pub mod tickets;
pub mod traits;

// Re-exports
pub use event_store::{EventPage, EventQuery, NewEvent};
pub use manager::{CommandOutcome, EmitOutcome, ManagerError, ManagerResult, OrdersManager};
pub use storage::OrderStorage;
pub use traits::{CommandMetadata, OrderError};

// Re-export shared types for convenience
pub use shared::order::{
    EventPayload, EventSource, OrderAggregate, OrderEvent, OrderEventType, OrderStatus,
    TicketStatus,
};
