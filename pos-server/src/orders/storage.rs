//! redb-based storage layer for orders, line items, inventory and menu
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` (header, no items) | Order rows |
//! | `order_items` | `(order_id, position)` | `OrderItem` | Line items in insertion order |
//! | `order_numbers` | `(restaurant_id, order_number)` | `order_id` | Number uniqueness + newest-first index |
//! | `inventory` | `(restaurant_id, menu_item_id)` | `InventoryEntry` | Inventory ledger |
//! | `menu_items` | `(restaurant_id, menu_item_id)` | `MenuItem` | Menu catalog |
//!
//! # Atomicity
//!
//! 一个 `WriteTransaction` 就是一个原子单元：提交前 drop 即整体回滚。
//! redb 同一时刻只允许一个写事务，订单号 `max + 1` 的读写和库存的读改写
//! 因此天然串行，不会出现重复订单号或丢失更新。

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{InventoryEntry, MenuItem};
use shared::order::{Order, OrderItem, StatusFilter};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Order headers: key = order_id, value = JSON-serialized Order (items empty)
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Line items: key = (order_id, position), value = JSON-serialized OrderItem
const ORDER_ITEMS_TABLE: TableDefinition<(&str, u32), &[u8]> = TableDefinition::new("order_items");

/// Per-restaurant order numbers: key = (restaurant_id, order_number), value = order_id
const ORDER_NUMBERS_TABLE: TableDefinition<(&str, u64), &str> =
    TableDefinition::new("order_numbers");

/// Inventory ledger: key = (restaurant_id, menu_item_id), value = JSON-serialized InventoryEntry
const INVENTORY_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("inventory");

/// Menu catalog: key = (restaurant_id, menu_item_id), value = JSON-serialized MenuItem
const MENU_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("menu_items");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order index points to missing order: {0}")]
    DanglingIndex(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable once `commit()` returns (copy-on-write with
    /// atomic root swap), so a crash never leaves a half-written order.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and embedding)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // 预建所有表，读事务打开不存在的表会报错
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_ITEMS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(INVENTORY_TABLE)?;
            let _ = write_txn.open_table(MENU_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction (the atomic unit)
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Commit a transaction started with [`Self::begin_write`]
    pub fn commit(&self, txn: WriteTransaction) -> StorageResult<()> {
        txn.commit()?;
        Ok(())
    }

    // ========== Order Numbers ==========

    /// Next order number for a restaurant: `max(existing) + 1`, starting at 1
    ///
    /// Must be called inside the same transaction that inserts the order.
    pub fn next_order_number(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
    ) -> StorageResult<u64> {
        let table = txn.open_table(ORDER_NUMBERS_TABLE)?;
        let last = table
            .range((restaurant_id, 0u64)..=(restaurant_id, u64::MAX))?
            .next_back();

        match last {
            Some(entry) => {
                let (key, _value) = entry?;
                Ok(key.value().1 + 1)
            }
            None => Ok(1),
        }
    }

    // ========== Orders ==========

    /// Insert or replace an order header (items are stored separately)
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let header = Order {
            items: Vec::new(),
            ..order.clone()
        };
        let value = serde_json::to_vec(&header)?;

        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(order.id.as_str(), value.as_slice())?;

        let mut numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
        numbers.insert(
            (order.restaurant_id.as_str(), order.order_number),
            order.id.as_str(),
        )?;
        Ok(())
    }

    /// Insert or replace a line item at the given position
    pub fn put_item(
        &self,
        txn: &WriteTransaction,
        position: u32,
        item: &OrderItem,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
        let value = serde_json::to_vec(item)?;
        table.insert((item.order_id.as_str(), position), value.as_slice())?;
        Ok(())
    }

    /// Load an order with its items (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let mut order: Order = match table.get(order_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(None),
        };

        let items_table = txn.open_table(ORDER_ITEMS_TABLE)?;
        for result in items_table.range((order_id, 0u32)..=(order_id, u32::MAX))? {
            let (_key, value) = result?;
            order.items.push(serde_json::from_slice(value.value())?);
        }

        Ok(Some(order))
    }

    /// Load an order with its items
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let items_table = read_txn.open_table(ORDER_ITEMS_TABLE)?;

        let mut order: Order = match table.get(order_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(None),
        };

        for result in items_table.range((order_id, 0u32)..=(order_id, u32::MAX))? {
            let (_key, value) = result?;
            order.items.push(serde_json::from_slice(value.value())?);
        }

        Ok(Some(order))
    }

    /// List a restaurant's orders newest-first
    ///
    /// Returns the requested page plus the number of orders matching `filter`.
    pub fn list_orders(
        &self,
        restaurant_id: &str,
        filter: Option<StatusFilter>,
        limit: usize,
        offset: usize,
    ) -> StorageResult<(Vec<Order>, usize)> {
        let read_txn = self.db.begin_read()?;
        let numbers = read_txn.open_table(ORDER_NUMBERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;
        let items_table = read_txn.open_table(ORDER_ITEMS_TABLE)?;

        // count 需要匹配总数，因此每次都扫描该餐厅全部订单头（O(n)）；
        // 分页只决定哪些订单加载明细。
        let mut matched = 0usize;
        let mut page = Vec::new();

        for result in numbers
            .range((restaurant_id, 0u64)..=(restaurant_id, u64::MAX))?
            .rev()
        {
            let (_key, order_id) = result?;
            let order_id = order_id.value();

            let order: Order = match orders_table.get(order_id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StorageError::DanglingIndex(order_id.to_string())),
            };

            if let Some(f) = filter
                && !f.matches(order.status)
            {
                continue;
            }

            if matched >= offset && page.len() < limit {
                page.push(order);
            }
            matched += 1;
        }

        for order in &mut page {
            let id = order.id.clone();
            for result in items_table.range((id.as_str(), 0u32)..=(id.as_str(), u32::MAX))? {
                let (_key, value) = result?;
                order.items.push(serde_json::from_slice(value.value())?);
            }
        }

        Ok((page, matched))
    }

    // ========== Inventory ==========

    /// Read a ledger entry (within transaction)
    pub fn get_inventory_txn(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> StorageResult<Option<InventoryEntry>> {
        let table = txn.open_table(INVENTORY_TABLE)?;
        match table.get((restaurant_id, menu_item_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a ledger entry
    pub fn put_inventory(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        entry: &InventoryEntry,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(INVENTORY_TABLE)?;
        let value = serde_json::to_vec(entry)?;
        table.insert((restaurant_id, entry.menu_item_id.as_str()), value.as_slice())?;
        Ok(())
    }

    /// Read a ledger entry
    pub fn get_inventory(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> StorageResult<Option<InventoryEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;
        match table.get((restaurant_id, menu_item_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All ledger entries of a restaurant, ordered by menu item id
    pub fn list_inventory(&self, restaurant_id: &str) -> StorageResult<Vec<InventoryEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;

        let mut entries = Vec::new();
        for result in table.range((restaurant_id, "")..)? {
            let (key, value) = result?;
            if key.value().0 != restaurant_id {
                break;
            }
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    // ========== Menu ==========

    /// Insert or replace a menu item
    pub fn put_menu_item(&self, item: &MenuItem) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(MENU_TABLE)?;
            let value = serde_json::to_vec(item)?;
            table.insert(
                (item.restaurant_id.as_str(), item.id.as_str()),
                value.as_slice(),
            )?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Read a menu item
    pub fn get_menu_item(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> StorageResult<Option<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_TABLE)?;
        match table.get((restaurant_id, menu_item_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All menu items of a restaurant, ordered by id
    pub fn list_menu_items(&self, restaurant_id: &str) -> StorageResult<Vec<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_TABLE)?;

        let mut items = Vec::new();
        for result in table.range((restaurant_id, "")..)? {
            let (key, value) = result?;
            if key.value().0 != restaurant_id {
                break;
            }
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    /// Count of stored orders across all restaurants
    pub fn order_count(&self) -> StorageResult<u64> {
        use redb::ReadableTableMetadata;
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        Ok(table.len()?)
    }
}
