//! Per-order lock registry
//!
//! Sequence assignment and projection for one order run under that order's
//! mutex. Different orders never share a lock. Idle entries are pruned once
//! nobody holds a handle.
//!
//! The mutex does not make units on different orders run in parallel: redb
//! admits one write transaction per database, so their commits still queue
//! for the writer.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct OrderLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the order's mutex, created on first use
    pub fn handle(&self, order_id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(order_id) {
            return lock.clone();
        }
        self.locks
            .entry(order_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the order's lock
    pub fn with_lock<T>(&self, order_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.handle(order_id);
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        self.prune(order_id);
        result
    }

    /// Forget the entry if no one else holds it
    fn prune(&self, order_id: &str) {
        self.locks
            .remove_if(order_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of orders with a live lock entry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
