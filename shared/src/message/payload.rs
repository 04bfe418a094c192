use crate::models::InventoryEntry;
use crate::order::{ItemStatus, Order, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};

// ==================== Order ====================

/// 订单事件负载（order_created / order_updated / order_status_changed）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEventData {
    pub order_id: String,
    pub order_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    pub status: OrderStatus,
    pub sub_total: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub item_count: usize,
    pub items: Vec<OrderItemEventData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemEventData {
    pub id: String,
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_rate: f64,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_id: Option<String>,
}

impl From<&OrderItem> for OrderItemEventData {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id.clone(),
            menu_item_id: item.menu_item_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_rate: item.unit_rate,
            status: item.status,
            sub_id: item.sub_id.clone(),
        }
    }
}

impl From<&Order> for OrderEventData {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            order_number: order.order_number,
            table_id: order.table_id.clone(),
            table_number: order.table_number.clone(),
            status: order.status,
            sub_total: order.sub_total,
            tax_amount: order.tax_amount,
            total: order.total,
            item_count: order.item_count(),
            items: order.items.iter().map(OrderItemEventData::from).collect(),
        }
    }
}

/// 菜品状态变更负载
///
/// 单个菜品更新带 `item_id`；按菜单项批量更新带 `menu_item_id` 且 `bulk = true`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStatusEventData {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_item_id: Option<String>,
    pub status: ItemStatus,
    pub bulk: bool,
}

// ==================== Table ====================

/// 桌台状态变更负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEventData {
    pub table_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    pub is_occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_order_id: Option<String>,
}

impl TableEventData {
    /// 订单占用桌台；无桌台的订单返回 None
    pub fn occupied_by(order: &Order) -> Option<Self> {
        let table_id = order.table_id.clone()?;
        Some(Self {
            table_id,
            table_number: order.table_number.clone(),
            is_occupied: true,
            current_order_id: Some(order.id.clone()),
        })
    }

    /// 订单对应桌台已空出；无桌台的订单返回 None
    pub fn vacated_by(order: &Order) -> Option<Self> {
        let table_id = order.table_id.clone()?;
        Some(Self {
            table_id,
            table_number: order.table_number.clone(),
            is_occupied: false,
            current_order_id: None,
        })
    }
}

// ==================== Inventory ====================

/// 库存变更负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEventData {
    pub menu_item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    pub quantity: f64,
    pub is_low: bool,
    pub min_level: f64,
}

impl InventoryEventData {
    pub fn from_entry(entry: &InventoryEntry, item_name: Option<String>) -> Self {
        Self {
            menu_item_id: entry.menu_item_id.clone(),
            item_name,
            quantity: entry.quantity,
            is_low: entry.is_low(),
            min_level: entry.min_level,
        }
    }
}
