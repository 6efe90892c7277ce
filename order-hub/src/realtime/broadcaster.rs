//! TopicBroadcaster - in-process topic registry over tokio broadcast channels
//!
//! Messages are serialized once per publish and shared as `Arc<str>`, so
//! fan-out to many WebSocket connections costs no extra serialization.

use dashmap::DashMap;
use shared::order::ChannelMessage;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{BroadcastError, Publisher};

/// Default per-topic buffer, enough to absorb a burst on connect
pub const DEFAULT_CAPACITY: usize = 256;

/// Topic -> broadcast channel
#[derive(Debug, Clone)]
pub struct TopicBroadcaster {
    topics: Arc<DashMap<String, broadcast::Sender<Arc<str>>>>,
    capacity: usize,
}

impl Default for TopicBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TopicBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a topic, creating it on first use
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Arc<str>> {
        if let Some(tx) = self.topics.get(topic) {
            return tx.subscribe();
        }
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Current number of receivers on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of registered topics
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Drop a topic whose last receiver is gone
    pub fn remove_if_idle(&self, topic: &str) {
        if self
            .topics
            .remove_if(topic, |_, tx| tx.receiver_count() == 0)
            .is_some()
        {
            tracing::debug!(topic, "Removed idle topic");
        }
    }
}

impl Publisher for TopicBroadcaster {
    fn publish(&self, topic: &str, message: &ChannelMessage) -> Result<usize, BroadcastError> {
        let Some(tx) = self.topics.get(topic).map(|tx| tx.clone()) else {
            return Err(BroadcastError::NoSubscribers(topic.to_string()));
        };
        let payload: Arc<str> = serde_json::to_string(message)?.into();

        match tx.send(payload) {
            Ok(receivers) => Ok(receivers),
            Err(_) => {
                // send only fails when every receiver has been dropped
                drop(tx);
                self.remove_if_idle(topic);
                Err(BroadcastError::NoSubscribers(topic.to_string()))
            }
        }
    }
}
