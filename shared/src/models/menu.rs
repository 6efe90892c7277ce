//! Menu Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Localized name/description of a menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItemTranslation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: i64,
    /// Base (untranslated) name
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    /// Preparation station the item is routed to ("kitchen", "bar", ...)
    pub station: String,
    pub sort_order: i32,
    pub is_available: bool,
    /// Translations keyed by locale. BTreeMap keeps serialization stable.
    #[serde(default)]
    pub translations: BTreeMap<String, MenuItemTranslation>,
}

impl MenuItem {
    /// Resolve name and description for a locale, falling back to the base text
    pub fn localized(&self, locale: &str) -> (&str, Option<&str>) {
        match self.translations.get(locale) {
            Some(t) => (
                t.name.as_str(),
                t.description.as_deref().or(self.description.as_deref()),
            ),
            None => (self.name.as_str(), self.description.as_deref()),
        }
    }
}

/// A restaurant's menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Menu {
    pub restaurant_id: i64,
    pub items: Vec<MenuItem>,
}

impl Menu {
    /// Find a menu item by id
    pub fn item(&self, id: i64) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Items in display order (sort_order, then id)
    pub fn sorted_items(&self) -> Vec<&MenuItem> {
        let mut items: Vec<&MenuItem> = self.items.iter().collect();
        items.sort_by_key(|i| (i.sort_order, i.id));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> MenuItem {
        let mut translations = BTreeMap::new();
        translations.insert(
            "es".to_string(),
            MenuItemTranslation {
                name: "Hamburguesa".to_string(),
                description: None,
            },
        );
        MenuItem {
            id: 5,
            name: "Burger".to_string(),
            description: Some("Beef patty".to_string()),
            price: 9.5,
            station: "kitchen".to_string(),
            sort_order: 0,
            is_available: true,
            translations,
        }
    }

    #[test]
    fn test_localized_falls_back_to_base_description() {
        let item = item();
        assert_eq!(item.localized("es"), ("Hamburguesa", Some("Beef patty")));
        assert_eq!(item.localized("fr"), ("Burger", Some("Beef patty")));
    }

    #[test]
    fn test_sorted_items_is_stable() {
        let mut a = item();
        a.id = 2;
        a.sort_order = 1;
        let mut b = item();
        b.id = 1;
        b.sort_order = 1;
        let c = item();
        let menu = Menu {
            restaurant_id: 1,
            items: vec![a, b, c],
        };
        let ids: Vec<i64> = menu.sorted_items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![5, 1, 2]);
    }
}
