//! Inventory ledger
//!
//! 每个 (餐厅, 菜单项) 一个库存计数。没有条目表示该菜品不追踪库存，
//! 扣减/回补直接跳过。扣减允许出现负数，下单不会因库存不足失败。

use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::models::{InventoryEntry, StockUpdate};

use super::money::{quantity_to_f64, to_decimal};
use super::storage::{OrderStorage, StorageResult};

/// Inventory ledger over [`OrderStorage`]
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    storage: OrderStorage,
}

impl InventoryLedger {
    pub fn new(storage: OrderStorage) -> Self {
        Self { storage }
    }

    /// Apply `delta` to an entry inside the caller's transaction
    ///
    /// Returns the new quantity, or `None` when the item is untracked.
    pub fn adjust(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        menu_item_id: &str,
        delta: Decimal,
    ) -> StorageResult<Option<f64>> {
        let Some(mut entry) = self
            .storage
            .get_inventory_txn(txn, restaurant_id, menu_item_id)?
        else {
            return Ok(None);
        };

        entry.quantity = quantity_to_f64(to_decimal(entry.quantity) + delta);
        self.storage.put_inventory(txn, restaurant_id, &entry)?;

        if entry.is_low() {
            tracing::debug!(
                restaurant_id = %restaurant_id,
                menu_item_id = %menu_item_id,
                quantity = entry.quantity,
                min_level = entry.min_level,
                "Inventory at or below minimum level"
            );
        }

        Ok(Some(entry.quantity))
    }

    /// Deduct `quantity` units (order creation / update)
    pub fn deduct(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        menu_item_id: &str,
        quantity: u32,
    ) -> StorageResult<Option<f64>> {
        self.adjust(txn, restaurant_id, menu_item_id, -Decimal::from(quantity))
    }

    /// Restore `quantity` units (order cancellation)
    pub fn restore(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        menu_item_id: &str,
        quantity: u32,
    ) -> StorageResult<Option<f64>> {
        self.adjust(txn, restaurant_id, menu_item_id, Decimal::from(quantity))
    }

    /// Set on-hand stock, creating the entry if needed
    ///
    /// Levels not given in `update` keep their previous values.
    pub fn set_stock(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
        update: &StockUpdate,
        now: i64,
    ) -> StorageResult<InventoryEntry> {
        let txn = self.storage.begin_write()?;
        let previous = self
            .storage
            .get_inventory_txn(&txn, restaurant_id, menu_item_id)?;

        let entry = InventoryEntry {
            menu_item_id: menu_item_id.to_string(),
            quantity: update.quantity,
            unit: update
                .unit
                .clone()
                .or_else(|| previous.as_ref().and_then(|p| p.unit.clone())),
            min_level: update
                .min_level
                .or(previous.as_ref().map(|p| p.min_level))
                .unwrap_or(0.0),
            max_level: update
                .max_level
                .or(previous.as_ref().and_then(|p| p.max_level)),
            last_restocked_at: Some(now),
        };

        self.storage.put_inventory(&txn, restaurant_id, &entry)?;
        txn.commit()?;

        tracing::info!(
            restaurant_id = %restaurant_id,
            menu_item_id = %menu_item_id,
            quantity = entry.quantity,
            "Inventory stock set"
        );
        Ok(entry)
    }

    pub fn get(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> StorageResult<Option<InventoryEntry>> {
        self.storage.get_inventory(restaurant_id, menu_item_id)
    }

    pub fn list(&self, restaurant_id: &str) -> StorageResult<Vec<InventoryEntry>> {
        self.storage.list_inventory(restaurant_id)
    }
}
