//! Order Transaction Engine
//!
//! - **manager**: OrdersManager, every mutation runs in one redb write transaction
//! - **storage**: redb tables for orders, items, order numbers, inventory and menu
//! - **ledger**: per-menu-item inventory counts, deducted on create and restored on cancel
//! - **catalog**: menu price lookup injected into the manager
//! - **money**: Decimal arithmetic and input validation
//!
//! # Data Flow
//!
//! ```text
//! HTTP handler → OrdersManager → redb (single transaction, commit)
//!                     ↓
//!               Order snapshot
//!                     ↓
//!   handler builds HubEvent → NotificationHub → room subscribers
//! ```
//!
//! 通知只在提交成功后发出；失败的事务不产生任何事件。

pub mod catalog;
pub mod ledger;
pub mod manager;
pub mod money;
pub mod storage;

// Re-exports
pub use catalog::{CatalogError, MenuCatalog, MenuItemRef};
pub use ledger::InventoryLedger;
pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use storage::{OrderStorage, StorageError, StorageResult};
