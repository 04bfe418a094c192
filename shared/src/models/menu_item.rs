//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Menu catalog entry (菜单项)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Current price; orders snapshot it as `unit_rate`
    pub price: f64,
    pub updated_at: i64,
}

/// Create or replace menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemUpsert {
    pub name: String,
    pub price: f64,
}
