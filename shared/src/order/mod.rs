//! Order Event Sourcing Module
//!
//! This module provides types for the live order event log:
//! - Events: Immutable facts appended to an order's log
//! - Aggregate: Order state folded from the event stream
//! - State: Viewer-scoped snapshot pushed to realtime subscribers

pub mod aggregate;
pub mod event;
pub mod state;
pub mod types;

// Re-exports
pub use aggregate::{OrderAggregate, OrderStatus, OrderTotals};
pub use event::{EventPayload, OrderEvent, OrderEventType};
pub use state::{
    AvailabilityFlags, ChannelMessage, LineItemView, MenuItemView, OrderView, ParticipantView,
    StateSnapshot, TicketView,
};
pub use types::*;
