//! Data models
//!
//! Shared between pos-server and its clients (via API).

pub mod inventory;
pub mod menu_item;

// Re-exports
pub use inventory::*;
pub use menu_item::*;
