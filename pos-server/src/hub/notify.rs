//! 事件发布
//!
//! handler 只依赖 [`EventPublisher`]，不直接持有 hub；
//! [`OrderNotifier`] 决定一次订单变更要发哪些事件（含桌台占用/空出）。

use super::{BroadcastOutcome, NotificationHub};
use shared::message::{HubEvent, InventoryEventData, ItemStatusEventData, TableEventData};
use shared::models::InventoryEntry;
use shared::order::Order;

/// Publish capability over the hub
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: HubEvent) -> BroadcastOutcome;
}

impl EventPublisher for NotificationHub {
    fn publish(&self, event: HubEvent) -> BroadcastOutcome {
        let outcome = self.broadcast_to_room(&event.room_id, &event);
        tracing::debug!(
            room_id = %event.room_id,
            event_type = %event.event_type,
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            "Event published"
        );
        outcome
    }
}

/// Events emitted after a committed order mutation
pub struct OrderNotifier<'a> {
    publisher: &'a dyn EventPublisher,
}

impl<'a> OrderNotifier<'a> {
    pub fn new(publisher: &'a dyn EventPublisher) -> Self {
        Self { publisher }
    }

    /// 新订单，有桌台时同时标记占用
    pub fn order_created(&self, order: &Order) {
        self.publisher.publish(HubEvent::order_created(order));
        if let Some(table) = TableEventData::occupied_by(order) {
            self.publisher
                .publish(HubEvent::table_status_changed(&order.restaurant_id, &table));
        }
    }

    pub fn order_updated(&self, order: &Order) {
        self.publisher.publish(HubEvent::order_updated(order));
    }

    /// 完成或取消，桌台空出
    pub fn order_finished(&self, order: &Order) {
        self.publisher.publish(HubEvent::order_status_changed(order));
        self.vacate_table(order);
    }

    /// 菜品状态变更；全部上桌/取消后桌台空出
    ///
    /// 已完成/已取消的订单在结束时已经空出桌台，不再重复推送。
    pub fn items_changed(&self, order: &Order, change: &ItemStatusEventData) {
        self.publisher
            .publish(HubEvent::item_status_changed(&order.restaurant_id, change));
        self.publisher.publish(HubEvent::order_updated(order));
        if !order.status.is_terminal() && order.all_items_settled() {
            self.vacate_table(order);
        }
    }

    /// 库存变化（下单扣减、取消回补、手动盘点）
    pub fn inventory_changed(
        &self,
        restaurant_id: &str,
        entry: &InventoryEntry,
        item_name: Option<String>,
    ) {
        let data = InventoryEventData::from_entry(entry, item_name);
        self.publisher
            .publish(HubEvent::inventory_updated(restaurant_id, &data));
    }

    fn vacate_table(&self, order: &Order) {
        if let Some(table) = TableEventData::vacated_by(order) {
            self.publisher
                .publish(HubEvent::table_status_changed(&order.restaurant_id, &table));
        }
    }
}
