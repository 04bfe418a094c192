//! Order, line item and request types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Status
// ============================================================================

/// 订单状态
///
/// `pending → completed` 或 `pending → cancelled`，后两者为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// 菜品（行项目）厨房状态
///
/// `pending → cooking → ready → served`，`cancelled` 可从任意非终态进入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Cooking,
    Ready,
    Served,
    Cancelled,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cooking => "cooking",
            Self::Ready => "ready",
            Self::Served => "served",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses a kitchen update may set
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Nothing left to bring to the table
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Served | Self::Cancelled)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "cooking" => Ok(Self::Cooking),
            "ready" => Ok(Self::Ready),
            "served" => Ok(Self::Served),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown item status: {other}")),
        }
    }
}

/// ListOrders 状态过滤
///
/// `active` 仅按订单状态定义：所有非终态订单。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Exact(OrderStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            Self::Active => !status.is_terminal(),
            Self::Exact(s) => *s == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "active" {
            return Ok(Self::Active);
        }
        s.parse().map(Self::Exact)
    }
}

// ============================================================================
// Payment
// ============================================================================

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Upi,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Upi => "upi",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "upi" => Ok(Self::Upi),
            other => Err(format!("unsupported payment method: {other}")),
        }
    }
}

/// Payment figures recorded at completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Payment {
    pub method: PaymentMethod,
    pub amount_received: f64,
    pub change_returned: f64,
}

// ============================================================================
// Order / OrderItem
// ============================================================================

/// 订单行项目
///
/// `unit_rate` 和 `name` 是下单时的菜单快照，之后菜单改价不影响历史订单。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_rate: f64,
    /// unit_rate × quantity
    pub total: f64,
    pub status: ItemStatus,
    /// Batch id shared by items appended in one update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: i64,
}

/// 订单
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub restaurant_id: String,
    /// Per-restaurant sequence, starts at 1, never reused
    pub order_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    pub status: OrderStatus,

    // === Derived amounts ===
    pub sub_total: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    /// sub_total + tax_amount - discount_amount
    pub total: f64,

    // === Payment (set on completion) ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_received: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_returned: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,

    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// 所有菜品都已上桌或取消（空订单不算）
    pub fn all_items_settled(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.status.is_settled())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// One requested line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub table_number: Option<String>,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Append items payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub items: Vec<OrderItemInput>,
}

/// Complete order payload (payment fields optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteOrderRequest {
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub amount_received: Option<f64>,
    #[serde(default)]
    pub change_returned: Option<f64>,
}

/// Item status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStatusRequest {
    pub status: String,
}

/// Paged order listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    /// Matching orders before paging
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("active".parse::<StatusFilter>(), Ok(StatusFilter::Active));
        assert_eq!(
            "completed".parse::<StatusFilter>(),
            Ok(StatusFilter::Exact(OrderStatus::Completed))
        );
        assert!("cooking".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_active_filter_is_non_terminal() {
        assert!(StatusFilter::Active.matches(OrderStatus::Pending));
        assert!(!StatusFilter::Active.matches(OrderStatus::Completed));
        assert!(!StatusFilter::Active.matches(OrderStatus::Cancelled));
    }

    #[test]
    fn test_item_status_assignable() {
        for s in ["pending", "cooking", "ready", "served"] {
            assert!(s.parse::<ItemStatus>().unwrap().is_assignable());
        }
        assert!(!ItemStatus::Cancelled.is_assignable());
        assert!("done".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&ItemStatus::Cooking).unwrap();
        assert_eq!(json, "\"cooking\"");
        let s: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(s, OrderStatus::Cancelled);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("upi".parse::<PaymentMethod>(), Ok(PaymentMethod::Upi));
        assert!("card".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_all_items_settled() {
        let item = |status| OrderItem {
            id: "i".into(),
            order_id: "o".into(),
            menu_item_id: "m".into(),
            name: "Dal".into(),
            quantity: 1,
            unit_rate: 5.0,
            total: 5.0,
            status,
            sub_id: None,
            notes: None,
            created_at: 0,
        };
        let mut order = Order {
            id: "o".into(),
            restaurant_id: "r".into(),
            order_number: 1,
            table_id: None,
            table_number: None,
            status: OrderStatus::Pending,
            sub_total: 0.0,
            tax_amount: 0.0,
            discount_amount: 0.0,
            total: 0.0,
            payment_method: None,
            amount_received: None,
            change_returned: None,
            notes: None,
            created_by: None,
            created_at: 0,
            updated_at: 0,
            completed_at: None,
            items: vec![],
        };
        assert!(!order.all_items_settled());

        order.items = vec![item(ItemStatus::Served), item(ItemStatus::Cancelled)];
        assert!(order.all_items_settled());

        order.items.push(item(ItemStatus::Ready));
        assert!(!order.all_items_settled());
    }
}
