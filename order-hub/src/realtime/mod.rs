//! Realtime snapshot fan-out
//!
//! ```text
//! OrdersManager (after commit, lock released)
//!       │ StateSnapshot (staff) / StateSnapshot (customer)
//!       ▼
//! Publisher
//!   ├── order:{order_id}      -> staff dashboards
//!   └── smartmenu:{slug}      -> guest devices at the table
//!           │
//!           ▼
//!   WebSocket handlers (subscribe -> forward)
//! ```
//!
//! Every message is a full state replace, so a subscriber that misses one
//! catches up with the next. Delivery is best-effort.

mod broadcaster;

pub use broadcaster::TopicBroadcaster;

use shared::order::ChannelMessage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Failed to serialize channel message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No subscribers on topic {0}")]
    NoSubscribers(String),
}

/// Transport seam for snapshot delivery
pub trait Publisher: Send + Sync {
    /// Publish to a topic, returning how many subscribers received it
    fn publish(&self, topic: &str, message: &ChannelMessage) -> Result<usize, BroadcastError>;
}

/// Topic of an order's staff-scoped channel
pub fn order_topic(order_id: &str) -> String {
    format!("order:{order_id}")
}

/// Topic of a table's guest-scoped channel
pub fn smartmenu_topic(slug: &str) -> String {
    format!("smartmenu:{slug}")
}

/// Publish and swallow the outcome
///
/// A failed broadcast never reaches the caller of the mutation.
pub fn publish_best_effort(publisher: &dyn Publisher, topic: &str, message: &ChannelMessage) {
    match publisher.publish(topic, message) {
        Ok(receivers) => {
            tracing::debug!(topic, receivers, "Snapshot broadcast");
        }
        Err(BroadcastError::NoSubscribers(_)) => {
            tracing::debug!(topic, "No subscribers, broadcast skipped");
        }
        Err(e) => {
            tracing::warn!(topic, error = %e, "Snapshot broadcast failed");
        }
    }
}
