//! Collaborators of the order core
//!
//! # Services
//!
//! - [`Catalog`] - read-only restaurants, tables and menus
//! - [`InventoryLedger`] - per-menu-item stock counters

pub mod catalog;
pub mod inventory;

pub use catalog::{Catalog, CatalogError, CatalogSeed, InMemoryCatalog};
pub use inventory::{InMemoryInventory, InventoryError, InventoryLedger, StockLevel};
