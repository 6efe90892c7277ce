use super::*;
use crate::orders::actions::test_support::sample_catalog;
use crate::realtime::TopicBroadcaster;
use crate::services::InMemoryInventory;
use shared::order::{EventPayload, EventSource};
use tokio::sync::broadcast::Receiver;


struct Harness {
    manager: OrdersManager,
    broadcaster: TopicBroadcaster,
    inventory: Arc<InMemoryInventory>,
}

fn create_test_manager() -> Harness {
    let storage = OrderStorage::open_in_memory().unwrap();
    let broadcaster = TopicBroadcaster::new(64);
    let inventory = Arc::new(InMemoryInventory::new());
    let manager = OrdersManager::new(
        storage,
        Arc::new(sample_catalog()),
        inventory.clone(),
        Arc::new(broadcaster.clone()),
    );
    Harness {
        manager,
        broadcaster,
        inventory,
    }
}

fn staff() -> CommandMetadata {
    CommandMetadata::staff()
}

fn keyed(key: &str) -> CommandMetadata {
    CommandMetadata::new(EventSource::Guest, Some(key.to_string()))
}

// ========================================================================
// Helper: open table 7 with items
// ========================================================================

fn open_with_items(manager: &OrdersManager, items: &[(&str, i64)]) -> String {
    let outcome = manager.open_order(None, 1, 7, &staff()).unwrap();
    let order_id = outcome.order.order_id;
    for (line_key, menu_item_id) in items {
        manager
            .add_item(&order_id, *line_key, *menu_item_id, 1, &staff())
            .unwrap();
    }
    order_id
}

fn ticket_id(order: &OrderAggregate, station: &str) -> String {
    order
        .tickets
        .iter()
        .find(|t| t.station == station)
        .unwrap()
        .ticket_id
        .clone()
}

/// Drain a topic receiver into parsed channel messages
fn drain(rx: &mut Receiver<Arc<str>>) -> Vec<ChannelMessage> {
    let mut messages = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        messages.push(serde_json::from_str(&raw).unwrap());
    }
    messages
}

fn session(session_id: &str, role: ParticipantRole) -> Session {
    Session {
        session_id: session_id.to_string(),
        role,
        locale: None,
    }
}

fn sequences(manager: &OrdersManager, order_id: &str) -> Vec<u64> {
    manager
        .storage()
        .get_events_for_order(order_id)
        .unwrap()
        .iter()
        .map(|e| e.sequence)
        .collect()
}

fn raw_item(order_id: &str, line_key: &str, key: Option<&str>, price: f64) -> NewEvent {
    NewEvent {
        order_id: order_id.to_string(),
        source: EventSource::Voice,
        idempotency_key: key.map(str::to_string),
        payload: EventPayload::ItemAdded {
            line_key: line_key.to_string(),
            menu_item_id: 5,
            name: "Burger".to_string(),
            station: "kitchen".to_string(),
            price,
            quantity: 1,
        },
    }
}
