//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity
///
/// `smartmenu_slug` is the externally shared address guest devices use to
/// reach the table's menu and subscribe to its live order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub smartmenu_slug: String,
    pub is_active: bool,
}
