//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type. Every check runs against the post-projection
//! aggregate before the first event is emitted.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

mod add_item;
mod add_tip;
mod advance_ticket;
mod change_status;
mod open_order;
mod remove_item;
mod request_bill;
mod submit_order;

pub use add_item::AddItemAction;
pub use add_tip::AddTipAction;
pub use advance_ticket::AdvanceTicketAction;
pub use change_status::ChangeStatusAction;
pub use open_order::OpenOrderAction;
pub use remove_item::RemoveItemAction;
pub use request_bill::RequestBillAction;
pub use submit_order::SubmitOrderAction;

/// CommandAction enum - dispatches to concrete action implementations
#[derive(Debug, Clone)]
pub enum CommandAction {
    OpenOrder(OpenOrderAction),
    AddItem(AddItemAction),
    RemoveItem(RemoveItemAction),
    SubmitOrder(SubmitOrderAction),
    ChangeStatus(ChangeStatusAction),
    RequestBill(RequestBillAction),
    AddTip(AddTipAction),
    AdvanceTicket(AdvanceTicketAction),
}

impl CommandAction {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            CommandAction::OpenOrder(_) => "open_order",
            CommandAction::AddItem(_) => "add_item",
            CommandAction::RemoveItem(_) => "remove_item",
            CommandAction::SubmitOrder(_) => "submit_order",
            CommandAction::ChangeStatus(_) => "change_status",
            CommandAction::RequestBill(_) => "request_bill",
            CommandAction::AddTip(_) => "add_tip",
            CommandAction::AdvanceTicket(_) => "advance_ticket",
        }
    }
}

/// Manual implementation of CommandHandler for CommandAction
impl CommandHandler for CommandAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), OrderError> {
        match self {
            CommandAction::OpenOrder(action) => action.execute(ctx, metadata),
            CommandAction::AddItem(action) => action.execute(ctx, metadata),
            CommandAction::RemoveItem(action) => action.execute(ctx, metadata),
            CommandAction::SubmitOrder(action) => action.execute(ctx, metadata),
            CommandAction::ChangeStatus(action) => action.execute(ctx, metadata),
            CommandAction::RequestBill(action) => action.execute(ctx, metadata),
            CommandAction::AddTip(action) => action.execute(ctx, metadata),
            CommandAction::AdvanceTicket(action) => action.execute(ctx, metadata),
        }
    }
}

macro_rules! impl_from_action {
    ($($variant:ident($action:ty)),* $(,)?) => {
        $(
            impl From<$action> for CommandAction {
                fn from(action: $action) -> Self {
                    CommandAction::$variant(action)
                }
            }
        )*
    };
}

impl_from_action!(
    OpenOrder(OpenOrderAction),
    AddItem(AddItemAction),
    RemoveItem(RemoveItemAction),
    SubmitOrder(SubmitOrderAction),
    ChangeStatus(ChangeStatusAction),
    RequestBill(RequestBillAction),
    AddTip(AddTipAction),
    AdvanceTicket(AdvanceTicketAction),
);

#[cfg(test)]
pub(crate) mod test_support {
    use shared::models::{DiningTable, Menu, MenuItem, Restaurant};
    use std::collections::BTreeMap;

    use crate::orders::storage::OrderStorage;
    use crate::orders::traits::{
        CommandContext, CommandEffects, CommandHandler, CommandMetadata, OrderError,
    };
    use crate::services::{InMemoryCatalog, InMemoryInventory, InventoryLedger};

    pub const ORDER_ID: &str = "order-1";

    pub fn sample_catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.upsert_restaurant(Restaurant {
            id: 1,
            name: "Bistro".to_string(),
            default_locale: "en".to_string(),
            currency: "EUR".to_string(),
            tax_rate: 10.0,
            service_rate: 0.0,
        });
        catalog.upsert_table(DiningTable {
            id: 7,
            restaurant_id: 1,
            name: "Table 7".to_string(),
            smartmenu_slug: "table-7".to_string(),
            is_active: true,
        });
        catalog.upsert_table(DiningTable {
            id: 8,
            restaurant_id: 1,
            name: "Table 8".to_string(),
            smartmenu_slug: "table-8".to_string(),
            is_active: false,
        });
        let item = |id: i64, name: &str, price: f64, station: &str, available: bool| MenuItem {
            id,
            name: name.to_string(),
            description: None,
            price,
            station: station.to_string(),
            sort_order: id as i32,
            is_available: available,
            translations: BTreeMap::new(),
        };
        catalog.upsert_menu(Menu {
            restaurant_id: 1,
            items: vec![
                item(5, "Burger", 9.50, "kitchen", true),
                item(6, "Lemonade", 3.00, "bar", true),
                item(7, "Soup", 4.00, "kitchen", false),
            ],
        });
        catalog
    }

    pub struct Fixture {
        pub storage: OrderStorage,
        pub catalog: InMemoryCatalog,
        pub inventory: InMemoryInventory,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                storage: OrderStorage::open_in_memory().unwrap(),
                catalog: sample_catalog(),
                inventory: InMemoryInventory::new(),
            }
        }

        /// Run one action in its own transaction; commit on success
        ///
        /// Like the manager, inventory adjustments are reverted on failure.
        pub fn run(&self, action: impl CommandHandler) -> Result<CommandEffects, OrderError> {
            let txn = self.storage.begin_write()?;
            let mut ctx = CommandContext::new(
                &txn,
                &self.storage,
                &self.catalog,
                &self.inventory,
                ORDER_ID,
            )?;
            let result = action.execute(&mut ctx, &CommandMetadata::staff());
            let effects = ctx.into_effects();
            match result {
                Ok(()) => {
                    txn.commit()?;
                    Ok(effects)
                }
                Err(e) => {
                    for (menu_item_id, delta) in effects.inventory_adjustments {
                        self.inventory.adjust(menu_item_id, -delta).unwrap();
                    }
                    Err(e)
                }
            }
        }

        pub fn event_count(&self) -> u64 {
            self.storage.count_events(ORDER_ID).unwrap()
        }
    }
}
