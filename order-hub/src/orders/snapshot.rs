//! State snapshot builder
//!
//! Pure and deterministic: the same aggregate, menu, participant and session
//! always render to the same snapshot, byte for byte once serialized. It is
//! never cached; every broadcast renders it fresh.
//!
//! Staff views carry every line (removed ones included) and the station
//! tickets. Customer views only show live lines.

use std::collections::BTreeSet;

use shared::models::{DiningTable, Menu, MenuItem, Restaurant};
use shared::order::{
    AvailabilityFlags, LineItem, LineItemView, MenuItemView, OrderAggregate, OrderStatus,
    OrderView, Participant, ParticipantRole, ParticipantView, Session, StateSnapshot, TicketView,
};

use crate::order_money;

/// Session id used for snapshots rendered for a whole topic
pub const BROADCAST_SESSION_ID: &str = "*";

/// Everything one snapshot is rendered from
#[derive(Debug, Clone, Copy)]
pub struct SnapshotContext<'a> {
    pub menu: &'a Menu,
    pub restaurant: &'a Restaurant,
    /// Current table record; the name snapshotted on the order is used without it
    pub table: Option<&'a DiningTable>,
    pub order: &'a OrderAggregate,
    pub participant: Option<&'a Participant>,
    pub session: &'a Session,
    /// Tracked menu items with no stock left
    pub sold_out: &'a BTreeSet<i64>,
}

/// Session a topic-wide snapshot is rendered for
pub fn broadcast_session(role: ParticipantRole) -> Session {
    Session {
        session_id: BROADCAST_SESSION_ID.to_string(),
        role,
        locale: None,
    }
}

/// Build the viewer-scoped snapshot
pub fn build_snapshot(ctx: SnapshotContext<'_>) -> StateSnapshot {
    let role = ctx.participant.map_or(ctx.session.role, |p| p.role);
    let locale = resolve_locale(&ctx);
    let order = ctx.order;

    let items = order
        .items
        .iter()
        .filter(|item| role == ParticipantRole::Staff || item.is_live())
        .map(|item| line_view(item, ctx.menu.item(item.menu_item_id), &locale))
        .collect();

    let tickets = if role == ParticipantRole::Staff {
        order
            .tickets
            .iter()
            .map(|t| TicketView {
                ticket_id: t.ticket_id.clone(),
                station: t.station.clone(),
                status: t.status,
                line_keys: t.line_keys.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let menu = ctx
        .menu
        .sorted_items()
        .into_iter()
        .map(|item| menu_view(item, &locale, ctx.sold_out))
        .collect();

    StateSnapshot {
        order: OrderView {
            order_id: order.order_id.clone(),
            restaurant_id: order.restaurant_id,
            restaurant_name: ctx.restaurant.name.clone(),
            currency: ctx.restaurant.currency.clone(),
            table_id: order.table_id,
            table_name: ctx
                .table
                .map_or_else(|| order.table_name.clone(), |t| t.name.clone()),
            smartmenu_slug: order.smartmenu_slug.clone(),
            status: order.status,
            items,
            tickets,
            totals: order.totals,
            last_sequence: order.last_applied_sequence,
            opened_at: order.opened_at,
            updated_at: order.updated_at,
        },
        participant: ParticipantView {
            session_id: ctx.session.session_id.clone(),
            role,
            locale,
        },
        menu,
        flags: flags(order),
    }
}

/// Participant preference, then the device hint, then the restaurant default
fn resolve_locale(ctx: &SnapshotContext<'_>) -> String {
    ctx.participant
        .map(|p| p.locale.as_str())
        .filter(|l| !l.is_empty())
        .or(ctx.session.locale.as_deref())
        .unwrap_or(&ctx.restaurant.default_locale)
        .to_string()
}

fn line_view(item: &LineItem, menu_item: Option<&MenuItem>, locale: &str) -> LineItemView {
    // The name snapshotted on the line wins unless a translation exists
    let (name, description) = match menu_item {
        Some(m) => match m.translations.get(locale) {
            Some(t) => (
                t.name.clone(),
                t.description.clone().or_else(|| m.description.clone()),
            ),
            None => (item.name.clone(), m.description.clone()),
        },
        None => (item.name.clone(), None),
    };

    LineItemView {
        line_key: item.line_key.clone(),
        menu_item_id: item.menu_item_id,
        name,
        description,
        station: item.station.clone(),
        price: item.price,
        quantity: item.quantity,
        line_total: order_money::to_f64(order_money::line_total(item)),
        status: item.status,
    }
}

fn menu_view(item: &MenuItem, locale: &str, sold_out: &BTreeSet<i64>) -> MenuItemView {
    let (name, description) = item.localized(locale);
    MenuItemView {
        id: item.id,
        name: name.to_string(),
        description: description.map(str::to_string),
        price: item.price,
        station: item.station.clone(),
        available: item.is_available && !sold_out.contains(&item.id),
    }
}

fn flags(order: &OrderAggregate) -> AvailabilityFlags {
    let unsubmitted = order.has_unsubmitted_items();
    AvailabilityFlags {
        can_add_items: order.status.is_editable(),
        can_submit: order.status == OrderStatus::Opened && unsubmitted,
        can_request_bill: order.status.is_in_service() && !unsubmitted,
        can_add_tip: order.status < OrderStatus::Paid,
        is_closed: order.status == OrderStatus::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_support::{fold, item_payload, opened_payload};
    use shared::models::MenuItemTranslation;
    use shared::order::{EventPayload, LineItemStatus, TicketStatus};
    use std::collections::BTreeMap;

    fn restaurant() -> Restaurant {
        Restaurant {
            id: 1,
            name: "Bistro".to_string(),
            default_locale: "en".to_string(),
            currency: "EUR".to_string(),
            tax_rate: 10.0,
            service_rate: 0.0,
        }
    }

    fn menu() -> Menu {
        let mut translations = BTreeMap::new();
        translations.insert(
            "es".to_string(),
            MenuItemTranslation {
                name: "Hamburguesa".to_string(),
                description: Some("Con queso".to_string()),
            },
        );
        Menu {
            restaurant_id: 1,
            items: vec![
                MenuItem {
                    id: 5,
                    name: "Burger".to_string(),
                    description: Some("With cheese".to_string()),
                    price: 9.5,
                    station: "kitchen".to_string(),
                    sort_order: 2,
                    is_available: true,
                    translations,
                },
                MenuItem {
                    id: 6,
                    name: "Lemonade".to_string(),
                    description: None,
                    price: 3.0,
                    station: "bar".to_string(),
                    sort_order: 1,
                    is_available: true,
                    translations: BTreeMap::new(),
                },
            ],
        }
    }

    fn order() -> OrderAggregate {
        fold(vec![
            opened_payload(),
            item_payload("a1", 9.5, "kitchen"),
            item_payload("a2", 9.5, "kitchen"),
            EventPayload::ItemRemoved {
                line_key: "a2".to_string(),
                reason: None,
            },
            EventPayload::StatusChanged {
                from: OrderStatus::Opened,
                to: OrderStatus::Ordered,
            },
            EventPayload::TicketCreated {
                ticket_id: "t1".to_string(),
                station: "kitchen".to_string(),
                line_keys: vec!["a1".to_string()],
            },
        ])
    }

    fn session(role: ParticipantRole, locale: Option<&str>) -> Session {
        Session {
            session_id: "s-1".to_string(),
            role,
            locale: locale.map(str::to_string),
        }
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let (menu, restaurant, order) = (menu(), restaurant(), order());
        let session = session(ParticipantRole::Staff, None);
        let sold_out = BTreeSet::new();
        let ctx = SnapshotContext {
            menu: &menu,
            restaurant: &restaurant,
            table: None,
            order: &order,
            participant: None,
            session: &session,
            sold_out: &sold_out,
        };

        let a = serde_json::to_vec(&build_snapshot(ctx)).unwrap();
        let b = serde_json::to_vec(&build_snapshot(ctx)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_staff_view_shows_everything() {
        let (menu, restaurant, order) = (menu(), restaurant(), order());
        let session = session(ParticipantRole::Staff, None);
        let sold_out = BTreeSet::new();
        let snapshot = build_snapshot(SnapshotContext {
            menu: &menu,
            restaurant: &restaurant,
            table: None,
            order: &order,
            participant: None,
            session: &session,
            sold_out: &sold_out,
        });

        assert_eq!(snapshot.order.items.len(), 2);
        assert_eq!(snapshot.order.items[1].status, LineItemStatus::Removed);
        assert_eq!(snapshot.order.tickets.len(), 1);
        assert_eq!(snapshot.order.tickets[0].status, TicketStatus::Ordered);
        assert_eq!(snapshot.order.last_sequence, 6);
        assert_eq!(snapshot.participant.locale, "en");
        assert_eq!(snapshot.order.items[0].name, "Burger");
        assert_eq!(snapshot.order.items[0].line_total, 9.5);
        assert!(snapshot.flags.can_request_bill);
        assert!(!snapshot.flags.can_submit);
    }

    #[test]
    fn test_customer_view_is_localized_and_trimmed() {
        let (menu, restaurant, order) = (menu(), restaurant(), order());
        let session = session(ParticipantRole::Staff, Some("fr"));
        let participant = Participant {
            order_id: order.order_id.clone(),
            session_id: "s-1".to_string(),
            role: ParticipantRole::Customer,
            locale: "es".to_string(),
            joined_at: 0,
        };
        let sold_out: BTreeSet<i64> = [6].into_iter().collect();
        let snapshot = build_snapshot(SnapshotContext {
            menu: &menu,
            restaurant: &restaurant,
            table: None,
            order: &order,
            participant: Some(&participant),
            session: &session,
            sold_out: &sold_out,
        });

        assert_eq!(snapshot.participant.role, ParticipantRole::Customer);
        assert_eq!(snapshot.participant.locale, "es");
        assert_eq!(snapshot.order.items.len(), 1);
        assert_eq!(snapshot.order.items[0].name, "Hamburguesa");
        assert_eq!(snapshot.order.items[0].description.as_deref(), Some("Con queso"));
        assert!(snapshot.order.tickets.is_empty());

        // Menu in display order, sold out items flagged
        assert_eq!(snapshot.menu[0].id, 6);
        assert!(!snapshot.menu[0].available);
        assert_eq!(snapshot.menu[1].name, "Hamburguesa");
        assert!(snapshot.menu[1].available);
    }

    #[test]
    fn test_session_locale_used_without_participant() {
        let (menu, restaurant, order) = (menu(), restaurant(), order());
        let session = session(ParticipantRole::Customer, Some("es"));
        let sold_out = BTreeSet::new();
        let snapshot = build_snapshot(SnapshotContext {
            menu: &menu,
            restaurant: &restaurant,
            table: None,
            order: &order,
            participant: None,
            session: &session,
            sold_out: &sold_out,
        });
        assert_eq!(snapshot.participant.locale, "es");
        assert_eq!(snapshot.participant.role, ParticipantRole::Customer);
    }

    #[test]
    fn test_table_rename_is_reflected() {
        let (menu, restaurant, order) = (menu(), restaurant(), order());
        let session = broadcast_session(ParticipantRole::Staff);
        let table = DiningTable {
            id: 7,
            restaurant_id: 1,
            name: "Terrace 1".to_string(),
            smartmenu_slug: "table-7".to_string(),
            is_active: true,
        };
        let sold_out = BTreeSet::new();
        let snapshot = build_snapshot(SnapshotContext {
            menu: &menu,
            restaurant: &restaurant,
            table: Some(&table),
            order: &order,
            participant: None,
            session: &session,
            sold_out: &sold_out,
        });
        assert_eq!(snapshot.order.table_name, "Terrace 1");
        assert_eq!(snapshot.participant.session_id, BROADCAST_SESSION_ID);
    }
}
