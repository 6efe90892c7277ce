//! Catalog models
//!
//! Read-only views of the restaurant, its tables and its menu. Catalog CRUD
//! lives outside the order hub; these are the shapes the order core consumes.
//! All IDs are `i64`.

pub mod dining_table;
pub mod menu;
pub mod restaurant;

// Re-exports
pub use dining_table::*;
pub use menu::*;
pub use restaurant::*;
