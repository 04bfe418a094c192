//! OrdersManager - 订单事务引擎
//!
//! 每个写操作都在一个 redb 写事务内完成（订单行、菜品行、库存计数一起提交或一起回滚）。
//! 事件广播不在这里：调用方在成功返回后自行构造事件推送到通知中心。
//!
//! # Create Flow
//!
//! ```text
//! create_order(req)
//!     ├─ 1. Validate items (before any transaction)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. order_number = max + 1 (same transaction)
//!     ├─ 4. Insert pending order with zero amounts
//!     ├─ 5. Per item: catalog price snapshot → insert line → deduct ledger
//!     ├─ 6. tax = sub_total × rate, total = sub_total + tax
//!     ├─ 7. Write back order row
//!     └─ 8. Commit (any error before this drops the transaction)
//! ```

mod error;
pub use error::*;

use super::catalog::MenuCatalog;
use super::ledger::InventoryLedger;
use super::money::{self, order_total, tax_on, to_decimal, to_f64};
use super::storage::OrderStorage;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::models::{InventoryEntry, MenuItem, MenuItemUpsert, StockUpdate};
use shared::order::{
    CreateOrderRequest, ItemStatus, Order, OrderItem, OrderItemInput, OrderList, OrderStatus,
    Payment, StatusFilter,
};
use shared::util::{new_id, now_millis};
use std::path::Path;
use std::sync::Arc;

/// Default order tax rate (5%)
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
/// Default ListOrders page size
pub const DEFAULT_LIST_LIMIT: usize = 20;
/// Upper bound for ListOrders page size
pub const MAX_LIST_LIMIT: usize = 100;

/// OrdersManager for order mutations
pub struct OrdersManager {
    storage: OrderStorage,
    ledger: InventoryLedger,
    catalog: Arc<dyn MenuCatalog>,
    tax_rate: Decimal,
    default_list_limit: usize,
    max_list_limit: usize,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("catalog", &"<dyn MenuCatalog>")
            .field("tax_rate", &self.tax_rate)
            .finish()
    }
}

impl OrdersManager {
    /// Create a new OrdersManager with the given database path
    pub fn new(db_path: impl AsRef<Path>) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        Ok(Self::with_storage(storage))
    }

    /// Create an OrdersManager with existing storage; the storage also serves as menu catalog
    pub fn with_storage(storage: OrderStorage) -> Self {
        let ledger = InventoryLedger::new(storage.clone());
        let catalog: Arc<dyn MenuCatalog> = Arc::new(storage.clone());
        Self {
            storage,
            ledger,
            catalog,
            tax_rate: DEFAULT_TAX_RATE,
            default_list_limit: DEFAULT_LIST_LIMIT,
            max_list_limit: MAX_LIST_LIMIT,
        }
    }

    /// Replace the menu catalog
    pub fn with_catalog(mut self, catalog: Arc<dyn MenuCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the tax rate (e.g. `0.05`)
    pub fn with_tax_rate(mut self, rate: f64) -> Self {
        self.tax_rate = to_decimal(rate);
        self
    }

    /// Set ListOrders default and maximum page sizes
    pub fn with_list_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.max_list_limit = max_limit.max(1);
        self.default_list_limit = default_limit.clamp(1, self.max_list_limit);
        self
    }

    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    // ========== Commands ==========

    /// Create a pending order with its items, deducting tracked inventory
    pub fn create_order(
        &self,
        restaurant_id: &str,
        actor: Option<&str>,
        request: &CreateOrderRequest,
    ) -> ManagerResult<Order> {
        money::validate_items(&request.items)?;

        let txn = self.storage.begin_write()?;
        let order_number = self.storage.next_order_number(&txn, restaurant_id)?;
        let now = now_millis();

        let mut order = Order {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            order_number,
            table_id: request.table_id.clone(),
            table_number: request.table_number.clone(),
            status: OrderStatus::Pending,
            sub_total: 0.0,
            tax_amount: 0.0,
            discount_amount: 0.0,
            total: 0.0,
            payment_method: None,
            amount_received: None,
            change_returned: None,
            notes: request.notes.clone(),
            created_by: actor.map(str::to_string),
            created_at: now,
            updated_at: now,
            completed_at: None,
            items: Vec::new(),
        };
        self.storage.put_order(&txn, &order)?;

        let sub_total = self.append_items(&txn, &mut order, &request.items, None, now)?;
        let tax_amount = tax_on(sub_total, self.tax_rate);
        order.sub_total = to_f64(sub_total);
        order.tax_amount = to_f64(tax_amount);
        order.total = to_f64(order_total(sub_total, tax_amount, Decimal::ZERO));
        self.storage.put_order(&txn, &order)?;

        self.storage.commit(txn)?;

        tracing::info!(
            restaurant_id = %restaurant_id,
            order_id = %order.id,
            order_number = order.order_number,
            items = order.items.len(),
            total = order.total,
            "Order created"
        );
        Ok(order)
    }

    /// Append items to a pending order
    ///
    /// Items added in one call share a `sub_id`. Tax is charged on the added
    /// amount so `total == sub_total + tax_amount - discount_amount` still holds.
    pub fn update_order(
        &self,
        restaurant_id: &str,
        order_id: &str,
        items: &[OrderItemInput],
    ) -> ManagerResult<Order> {
        money::validate_items(items)?;

        let txn = self.storage.begin_write()?;
        let mut order = self.load_owned(&txn, restaurant_id, order_id)?;
        ensure_pending(&order)?;

        let now = now_millis();
        let sub_id = new_id();
        let added = self.append_items(&txn, &mut order, items, Some(&sub_id), now)?;

        let sub_total = to_decimal(order.sub_total) + added;
        let tax_amount = to_decimal(order.tax_amount) + tax_on(added, self.tax_rate);
        let discount = to_decimal(order.discount_amount);
        order.sub_total = to_f64(sub_total);
        order.tax_amount = to_f64(tax_amount);
        order.total = to_f64(order_total(sub_total, tax_amount, discount));
        order.updated_at = now;
        self.storage.put_order(&txn, &order)?;

        self.storage.commit(txn)?;

        tracing::info!(
            restaurant_id = %restaurant_id,
            order_id = %order.id,
            sub_id = %sub_id,
            added_items = items.len(),
            total = order.total,
            "Order items appended"
        );
        Ok(order)
    }

    /// `pending → completed`
    pub fn complete_order(&self, restaurant_id: &str, order_id: &str) -> ManagerResult<Order> {
        self.finish(restaurant_id, order_id, None)
    }

    /// `pending → completed`, recording payment figures
    pub fn complete_order_with_payment(
        &self,
        restaurant_id: &str,
        order_id: &str,
        payment: Payment,
    ) -> ManagerResult<Order> {
        money::validate_payment(&payment)?;
        self.finish(restaurant_id, order_id, Some(payment))
    }

    fn finish(
        &self,
        restaurant_id: &str,
        order_id: &str,
        payment: Option<Payment>,
    ) -> ManagerResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_owned(&txn, restaurant_id, order_id)?;
        ensure_pending(&order)?;

        let now = now_millis();
        order.status = OrderStatus::Completed;
        order.completed_at = Some(now);
        order.updated_at = now;
        if let Some(p) = payment {
            order.payment_method = Some(p.method);
            order.amount_received = Some(to_f64(to_decimal(p.amount_received)));
            order.change_returned = Some(to_f64(to_decimal(p.change_returned)));
        }
        self.storage.put_order(&txn, &order)?;

        self.storage.commit(txn)?;

        tracing::info!(
            restaurant_id = %restaurant_id,
            order_id = %order.id,
            payment_method = order.payment_method.map(|m| m.as_str()),
            "Order completed"
        );
        Ok(order)
    }

    /// `pending → cancelled`, restoring every item's quantity to the ledger
    pub fn cancel_order(&self, restaurant_id: &str, order_id: &str) -> ManagerResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_owned(&txn, restaurant_id, order_id)?;
        ensure_pending(&order)?;

        for item in &order.items {
            self.ledger
                .restore(&txn, restaurant_id, &item.menu_item_id, item.quantity)?;
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order)?;

        self.storage.commit(txn)?;

        tracing::info!(
            restaurant_id = %restaurant_id,
            order_id = %order.id,
            restored_items = order.items.len(),
            "Order cancelled"
        );
        Ok(order)
    }

    /// Set the kitchen status of one line item
    pub fn update_item_status(
        &self,
        restaurant_id: &str,
        order_id: &str,
        item_id: &str,
        status: ItemStatus,
    ) -> ManagerResult<Order> {
        ensure_assignable(status)?;

        let txn = self.storage.begin_write()?;
        let mut order = self.load_owned(&txn, restaurant_id, order_id)?;

        let position = order
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| ManagerError::ItemNotFound(item_id.to_string()))?;

        let now = now_millis();
        order.items[position].status = status;
        self.storage
            .put_item(&txn, position as u32, &order.items[position])?;
        order.updated_at = now;
        self.storage.put_order(&txn, &order)?;

        self.storage.commit(txn)?;

        tracing::debug!(
            order_id = %order_id,
            item_id = %item_id,
            status = %status,
            "Item status updated"
        );
        Ok(order)
    }

    /// Set the kitchen status of every line of one menu item
    ///
    /// Returns the order and the number of lines changed.
    pub fn update_items_by_menu_item(
        &self,
        restaurant_id: &str,
        order_id: &str,
        menu_item_id: &str,
        status: ItemStatus,
    ) -> ManagerResult<(Order, usize)> {
        ensure_assignable(status)?;

        let txn = self.storage.begin_write()?;
        let mut order = self.load_owned(&txn, restaurant_id, order_id)?;

        let mut affected = 0usize;
        for (position, item) in order.items.iter_mut().enumerate() {
            if item.menu_item_id == menu_item_id {
                item.status = status;
                self.storage.put_item(&txn, position as u32, item)?;
                affected += 1;
            }
        }

        if affected == 0 {
            return Err(ManagerError::ItemNotFound(format!(
                "no items for menu item {} in order {}",
                menu_item_id, order_id
            )));
        }

        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order)?;

        self.storage.commit(txn)?;

        tracing::debug!(
            order_id = %order_id,
            menu_item_id = %menu_item_id,
            status = %status,
            affected,
            "Item status bulk updated"
        );
        Ok((order, affected))
    }

    // ========== Queries ==========

    /// Fetch one order with its items
    pub fn get_order(&self, restaurant_id: &str, order_id: &str) -> ManagerResult<Order> {
        self.storage
            .get_order(order_id)?
            .filter(|o| o.restaurant_id == restaurant_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// List orders newest-first; `limit` falls back to the default and is capped
    pub fn list_orders(
        &self,
        restaurant_id: &str,
        filter: Option<StatusFilter>,
        limit: Option<usize>,
        offset: usize,
    ) -> ManagerResult<OrderList> {
        let limit = match limit {
            Some(l) if l > 0 => l.min(self.max_list_limit),
            _ => self.default_list_limit,
        };
        let (orders, count) = self
            .storage
            .list_orders(restaurant_id, filter, limit, offset)?;
        Ok(OrderList { orders, count })
    }

    // ========== Menu & Inventory ==========

    /// Insert or reprice a menu item; existing orders keep their snapshot
    pub fn upsert_menu_item(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
        upsert: &MenuItemUpsert,
    ) -> ManagerResult<MenuItem> {
        if menu_item_id.trim().is_empty() {
            return Err(ManagerError::InvalidOperation(
                "menu_item_id must not be empty".into(),
            ));
        }
        if upsert.name.trim().is_empty() {
            return Err(ManagerError::InvalidOperation(
                "menu item name must not be empty".into(),
            ));
        }
        money::validate_price(upsert.price, menu_item_id)?;

        let item = MenuItem {
            id: menu_item_id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            name: upsert.name.trim().to_string(),
            price: to_f64(to_decimal(upsert.price)),
            updated_at: now_millis(),
        };
        self.storage.put_menu_item(&item)?;

        tracing::info!(
            restaurant_id = %restaurant_id,
            menu_item_id = %menu_item_id,
            price = item.price,
            "Menu item saved"
        );
        Ok(item)
    }

    pub fn get_menu_item(&self, restaurant_id: &str, menu_item_id: &str) -> ManagerResult<MenuItem> {
        self.storage
            .get_menu_item(restaurant_id, menu_item_id)?
            .ok_or_else(|| ManagerError::MenuItemNotFound(menu_item_id.to_string()))
    }

    pub fn list_menu_items(&self, restaurant_id: &str) -> ManagerResult<Vec<MenuItem>> {
        Ok(self.storage.list_menu_items(restaurant_id)?)
    }

    /// Set on-hand stock for a menu item (restock / stocktake)
    pub fn set_stock(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
        update: &StockUpdate,
    ) -> ManagerResult<InventoryEntry> {
        if !update.quantity.is_finite() {
            return Err(ManagerError::InvalidQuantity(format!(
                "stock quantity must be a finite number, got {}",
                update.quantity
            )));
        }
        if update.min_level.is_some_and(|v| !v.is_finite() || v < 0.0)
            || update.max_level.is_some_and(|v| !v.is_finite() || v < 0.0)
        {
            return Err(ManagerError::InvalidQuantity(
                "stock levels must be non-negative numbers".into(),
            ));
        }
        Ok(self
            .ledger
            .set_stock(restaurant_id, menu_item_id, update, now_millis())?)
    }

    pub fn get_stock(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> ManagerResult<Option<InventoryEntry>> {
        Ok(self.ledger.get(restaurant_id, menu_item_id)?)
    }

    pub fn list_inventory(&self, restaurant_id: &str) -> ManagerResult<Vec<InventoryEntry>> {
        Ok(self.ledger.list(restaurant_id)?)
    }

    // ========== Internals ==========

    /// Load an order that belongs to `restaurant_id` (within transaction)
    fn load_owned(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        order_id: &str,
    ) -> ManagerResult<Order> {
        self.storage
            .get_order_txn(txn, order_id)?
            .filter(|o| o.restaurant_id == restaurant_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// Price, insert and deduct each requested line; returns the added sub-total
    fn append_items(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
        items: &[OrderItemInput],
        sub_id: Option<&str>,
        now: i64,
    ) -> ManagerResult<Decimal> {
        let mut added = Decimal::ZERO;

        for input in items {
            let menu_item = self
                .catalog
                .find_menu_item(&order.restaurant_id, &input.menu_item_id)?
                .ok_or_else(|| ManagerError::MenuItemNotFound(input.menu_item_id.clone()))?;
            money::validate_price(menu_item.price, &menu_item.id)?;

            let line_total = money::line_total(menu_item.price, input.quantity);
            let item = OrderItem {
                id: new_id(),
                order_id: order.id.clone(),
                menu_item_id: input.menu_item_id.clone(),
                name: menu_item.name,
                quantity: input.quantity,
                unit_rate: menu_item.price,
                total: to_f64(line_total),
                status: ItemStatus::Pending,
                sub_id: sub_id.map(str::to_string),
                notes: input.notes.clone(),
                created_at: now,
            };

            let position = order.items.len() as u32;
            self.storage.put_item(txn, position, &item)?;
            self.ledger.deduct(
                txn,
                &order.restaurant_id,
                &input.menu_item_id,
                input.quantity,
            )?;

            added += line_total;
            order.items.push(item);
        }

        Ok(added)
    }
}

fn ensure_pending(order: &Order) -> ManagerResult<()> {
    match order.status {
        OrderStatus::Pending => Ok(()),
        OrderStatus::Completed => Err(ManagerError::OrderAlreadyCompleted(order.id.clone())),
        OrderStatus::Cancelled => Err(ManagerError::OrderAlreadyCancelled(order.id.clone())),
    }
}

fn ensure_assignable(status: ItemStatus) -> ManagerResult<()> {
    if status.is_assignable() {
        Ok(())
    } else {
        Err(ManagerError::InvalidItemStatus(format!(
            "{} is not an accepted item status (pending, cooking, ready, served)",
            status
        )))
    }
}

#[cfg(test)]
mod tests;
