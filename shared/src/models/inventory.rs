//! Inventory Ledger Model

use serde::{Deserialize, Serialize};

/// On-hand quantity for one (restaurant, menu item)
///
/// 数量可以为负：下单不因库存不足被拒绝，负值留给后续盘点处理。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryEntry {
    pub menu_item_id: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub min_level: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_restocked_at: Option<i64>,
}

impl InventoryEntry {
    pub fn is_low(&self) -> bool {
        self.quantity <= self.min_level
    }
}

/// Set stock payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUpdate {
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min_level: Option<f64>,
    #[serde(default)]
    pub max_level: Option<f64>,
}
