//! Catalog - restaurants, tables and menus with in-memory caching
//!
//! Catalog CRUD happens elsewhere; the order hub only reads. The in-memory
//! implementation is filled from a JSON seed file at startup and by tests.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::{DiningTable, Menu, MenuItem, Restaurant};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use super::inventory::StockLevel;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only catalog lookups
pub trait Catalog: Send + Sync {
    fn restaurant(&self, restaurant_id: i64) -> Option<Restaurant>;

    fn table(&self, table_id: i64) -> Option<DiningTable>;

    /// Full menu of a restaurant; empty when none is registered
    fn menu(&self, restaurant_id: i64) -> Menu;

    fn menu_item(&self, restaurant_id: i64, menu_item_id: i64) -> Option<MenuItem> {
        self.menu(restaurant_id).item(menu_item_id).cloned()
    }
}

/// Catalog seed file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub tables: Vec<DiningTable>,
    #[serde(default)]
    pub menus: Vec<Menu>,
    /// Initial stock of tracked menu items
    #[serde(default)]
    pub stock: Vec<StockLevel>,
}

impl CatalogSeed {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// In-memory catalog
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    restaurants: RwLock<HashMap<i64, Restaurant>>,
    tables: RwLock<HashMap<i64, DiningTable>>,
    menus: RwLock<HashMap<i64, Menu>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: &CatalogSeed) -> Self {
        let catalog = Self::new();
        for restaurant in &seed.restaurants {
            catalog.upsert_restaurant(restaurant.clone());
        }
        for table in &seed.tables {
            catalog.upsert_table(table.clone());
        }
        for menu in &seed.menus {
            catalog.upsert_menu(menu.clone());
        }
        tracing::info!(
            restaurants = seed.restaurants.len(),
            tables = seed.tables.len(),
            menus = seed.menus.len(),
            "Catalog loaded"
        );
        catalog
    }

    pub fn upsert_restaurant(&self, restaurant: Restaurant) {
        self.restaurants.write().insert(restaurant.id, restaurant);
    }

    pub fn upsert_table(&self, table: DiningTable) {
        self.tables.write().insert(table.id, table);
    }

    pub fn upsert_menu(&self, menu: Menu) {
        self.menus.write().insert(menu.restaurant_id, menu);
    }

    /// Toggle a menu item's availability; false if the item is unknown
    pub fn set_available(&self, restaurant_id: i64, menu_item_id: i64, available: bool) -> bool {
        let mut menus = self.menus.write();
        let item = menus
            .get_mut(&restaurant_id)
            .and_then(|menu| menu.items.iter_mut().find(|i| i.id == menu_item_id));
        match item {
            Some(item) => {
                item.is_available = available;
                true
            }
            None => false,
        }
    }
}

impl Catalog for InMemoryCatalog {
    fn restaurant(&self, restaurant_id: i64) -> Option<Restaurant> {
        self.restaurants.read().get(&restaurant_id).cloned()
    }

    fn table(&self, table_id: i64) -> Option<DiningTable> {
        self.tables.read().get(&table_id).cloned()
    }

    fn menu(&self, restaurant_id: i64) -> Menu {
        self.menus
            .read()
            .get(&restaurant_id)
            .cloned()
            .unwrap_or_else(|| Menu {
                restaurant_id,
                items: Vec::new(),
            })
    }

    fn menu_item(&self, restaurant_id: i64, menu_item_id: i64) -> Option<MenuItem> {
        self.menus
            .read()
            .get(&restaurant_id)
            .and_then(|menu| menu.item(menu_item_id))
            .cloned()
    }
}
