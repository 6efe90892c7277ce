//! Shared fixtures for integration tests

#![allow(dead_code)]

use order_hub::services::CatalogSeed;
use order_hub::{Config, ServerState};
use shared::order::{OrderAggregate, ParticipantRole, Session};

/// Seed in the `CATALOG_FILE` format
pub const SEED_JSON: &str = r#"{
  "restaurants": [
    { "id": 1, "name": "Bistro", "default_locale": "en", "currency": "EUR", "tax_rate": 10.0 }
  ],
  "tables": [
    { "id": 7, "restaurant_id": 1, "name": "Table 7", "smartmenu_slug": "table-7", "is_active": true },
    { "id": 9, "restaurant_id": 1, "name": "Terrace", "smartmenu_slug": "terrace", "is_active": true }
  ],
  "menus": [
    {
      "restaurant_id": 1,
      "items": [
        { "id": 5, "name": "Burger", "price": 9.5, "station": "kitchen", "sort_order": 1, "is_available": true,
          "translations": { "es": { "name": "Hamburguesa" } } },
        { "id": 6, "name": "Lemonade", "price": 3.0, "station": "bar", "sort_order": 2, "is_available": true },
        { "id": 7, "name": "Soup", "price": 4.0, "station": "kitchen", "sort_order": 3, "is_available": false },
        { "id": 8, "name": "Cake", "price": 5.0, "station": "pastry", "sort_order": 4, "is_available": true }
      ]
    }
  ],
  "stock": [ { "menu_item_id": 8, "quantity": 3 } ]
}"#;

pub fn seed() -> CatalogSeed {
    serde_json::from_str(SEED_JSON).unwrap()
}

/// Fresh state over an in-memory database
pub fn test_state() -> ServerState {
    ServerState::in_memory(Config::default(), &seed()).unwrap()
}

pub fn session(session_id: &str, role: ParticipantRole) -> Session {
    Session {
        session_id: session_id.to_string(),
        role,
        locale: None,
    }
}

pub fn ticket_for(order: &OrderAggregate, station: &str) -> String {
    order
        .tickets
        .iter()
        .find(|t| t.station == station)
        .map(|t| t.ticket_id.clone())
        .unwrap()
}
