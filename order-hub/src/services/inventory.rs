//! Inventory ledger - per-menu-item stock counters
//!
//! Only tracked items have a counter; everything else is unlimited. Each
//! counter has its own mutex, narrower than (and independent of) the
//! per-order lock, so concurrent orders never lose a decrement.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("Menu item {menu_item_id} out of stock: requested {requested}, available {available}")]
    OutOfStock {
        menu_item_id: i64,
        requested: i64,
        available: i64,
    },
}

/// Initial stock of one tracked item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockLevel {
    pub menu_item_id: i64,
    pub quantity: i64,
}

/// Stock adjustment contract
pub trait InventoryLedger: Send + Sync {
    /// Add `delta` (negative to consume) to a tracked item's counter
    ///
    /// Returns the remaining stock, or `None` if the item is not tracked.
    /// A decrement below zero fails and leaves the counter unchanged.
    fn adjust(&self, menu_item_id: i64, delta: i64) -> Result<Option<i64>, InventoryError>;

    /// Remaining stock, `None` if the item is not tracked
    fn remaining(&self, menu_item_id: i64) -> Option<i64>;
}

/// In-memory inventory ledger
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    counters: DashMap<i64, Arc<Mutex<i64>>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_levels(levels: &[StockLevel]) -> Self {
        let inventory = Self::new();
        for level in levels {
            inventory.set_stock(level.menu_item_id, level.quantity);
        }
        inventory
    }

    /// Start tracking an item, or overwrite its counter
    pub fn set_stock(&self, menu_item_id: i64, quantity: i64) {
        match self.counter(menu_item_id) {
            Some(counter) => *counter.lock() = quantity,
            None => {
                self.counters
                    .insert(menu_item_id, Arc::new(Mutex::new(quantity)));
            }
        }
    }

    fn counter(&self, menu_item_id: i64) -> Option<Arc<Mutex<i64>>> {
        // Clone the handle so the map shard is released before locking
        self.counters.get(&menu_item_id).map(|c| c.clone())
    }
}

impl InventoryLedger for InMemoryInventory {
    fn adjust(&self, menu_item_id: i64, delta: i64) -> Result<Option<i64>, InventoryError> {
        let Some(counter) = self.counter(menu_item_id) else {
            return Ok(None);
        };
        let mut stock = counter.lock();
        let next = *stock + delta;
        if next < 0 {
            return Err(InventoryError::OutOfStock {
                menu_item_id,
                requested: -delta,
                available: *stock,
            });
        }
        *stock = next;
        Ok(Some(next))
    }

    fn remaining(&self, menu_item_id: i64) -> Option<i64> {
        self.counter(menu_item_id).map(|c| *c.lock())
    }
}
