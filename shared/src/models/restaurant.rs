//! Restaurant Model

use serde::{Deserialize, Serialize};

/// Restaurant settings consumed by the order core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    /// Locale used when a viewer has no preference (e.g. "en")
    pub default_locale: String,
    /// ISO currency code (e.g. "EUR")
    pub currency: String,
    /// Tax rate in percentage (e.g., 10 = 10%)
    pub tax_rate: f64,
    /// Service charge in percentage
    #[serde(default)]
    pub service_rate: f64,
}
