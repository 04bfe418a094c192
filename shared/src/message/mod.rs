//! 实时推送事件定义
//!
//! pos-server 的通知中心按餐厅（room）向厨房屏幕、收银终端广播这些事件。
//! 事件只推送不落库：广播时不在线的连接会永久错过该事件。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod payload;
pub use payload::*;

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubEventType {
    /// 连接建立后的欢迎消息
    Connected,
    OrderCreated,
    OrderUpdated,
    OrderStatusChanged,
    TableStatusChanged,
    InventoryUpdated,
    /// 客户端发起，原样转发到本房间
    OrderUpdate,
    /// 客户端发起，原样转发到本房间
    InventoryUpdate,
}

impl HubEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::OrderCreated => "order_created",
            Self::OrderUpdated => "order_updated",
            Self::OrderStatusChanged => "order_status_changed",
            Self::TableStatusChanged => "table_status_changed",
            Self::InventoryUpdated => "inventory_updated",
            Self::OrderUpdate => "order_update",
            Self::InventoryUpdate => "inventory_update",
        }
    }

    /// Types a client may push back through its own room
    pub fn is_client_relayable(&self) -> bool {
        matches!(self, Self::OrderUpdate | Self::InventoryUpdate)
    }
}

impl fmt::Display for HubEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HubEventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connected" => Ok(Self::Connected),
            "order_created" => Ok(Self::OrderCreated),
            "order_updated" => Ok(Self::OrderUpdated),
            "order_status_changed" => Ok(Self::OrderStatusChanged),
            "table_status_changed" => Ok(Self::TableStatusChanged),
            "inventory_updated" => Ok(Self::InventoryUpdated),
            "order_update" => Ok(Self::OrderUpdate),
            "inventory_update" => Ok(Self::InventoryUpdate),
            _ => Err(()),
        }
    }
}

/// 推送给客户端的事件 `{type, room_id, data, timestamp}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubEvent {
    #[serde(rename = "type")]
    pub event_type: HubEventType,
    /// 目标房间 = 餐厅 ID
    pub room_id: String,
    pub data: serde_json::Value,
    /// UTC 毫秒
    pub timestamp: i64,
}

impl HubEvent {
    /// 创建事件，payload 序列化为 JSON
    ///
    /// payload 都是本模块内的纯数据结构，序列化失败时退化为 `null`。
    pub fn new<T: Serialize>(
        event_type: HubEventType,
        room_id: impl Into<String>,
        payload: &T,
    ) -> Self {
        Self {
            event_type,
            room_id: room_id.into(),
            data: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
            timestamp: crate::util::now_millis(),
        }
    }

    /// 连接欢迎消息
    pub fn connected(room_id: impl Into<String>, connection_id: u64) -> Self {
        Self::new(
            HubEventType::Connected,
            room_id,
            &serde_json::json!({ "connection_id": connection_id }),
        )
    }

    pub fn order_created(order: &crate::order::Order) -> Self {
        Self::new(
            HubEventType::OrderCreated,
            &order.restaurant_id,
            &OrderEventData::from(order),
        )
    }

    pub fn order_updated(order: &crate::order::Order) -> Self {
        Self::new(
            HubEventType::OrderUpdated,
            &order.restaurant_id,
            &OrderEventData::from(order),
        )
    }

    pub fn order_status_changed(order: &crate::order::Order) -> Self {
        Self::new(
            HubEventType::OrderStatusChanged,
            &order.restaurant_id,
            &OrderEventData::from(order),
        )
    }

    pub fn item_status_changed(restaurant_id: &str, data: &ItemStatusEventData) -> Self {
        Self::new(HubEventType::OrderStatusChanged, restaurant_id, data)
    }

    pub fn table_status_changed(restaurant_id: &str, data: &TableEventData) -> Self {
        Self::new(HubEventType::TableStatusChanged, restaurant_id, data)
    }

    pub fn inventory_updated(restaurant_id: &str, data: &InventoryEventData) -> Self {
        Self::new(HubEventType::InventoryUpdated, restaurant_id, data)
    }

    /// 序列化为 WebSocket 文本帧
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// 客户端上行消息（宽松解析，未知类型直接忽略）
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl InboundMessage {
    /// 白名单内的上行消息转为本房间事件，房间和时间戳由服务端指定
    pub fn into_relay(self, room_id: &str) -> Option<HubEvent> {
        let event_type = self.event_type.parse::<HubEventType>().ok()?;
        if !event_type.is_client_relayable() {
            return None;
        }
        Some(HubEvent {
            event_type,
            room_id: room_id.to_string(),
            data: self.data,
            timestamp: crate::util::now_millis(),
        })
    }
}
