//! Menu catalog lookup
//!
//! 订单引擎只需要“菜品是否存在 + 当前价格”，通过 [`MenuCatalog`] 注入，
//! 默认实现读取 redb 中的 `menu_items` 表。

use super::storage::{OrderStorage, StorageError};
use shared::models::MenuItem;
use thiserror::Error;

/// Snapshot of a menu item at lookup time
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemRef {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl From<MenuItem> for MenuItemRef {
    fn from(item: MenuItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
        }
    }
}

#[derive(Debug, Error)]
#[error("Menu catalog unavailable: {0}")]
pub struct CatalogError(pub String);

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        Self(err.to_string())
    }
}

/// Menu lookup scoped to one restaurant
pub trait MenuCatalog: Send + Sync {
    /// `Ok(None)` when the item does not exist for this restaurant
    fn find_menu_item(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> Result<Option<MenuItemRef>, CatalogError>;
}

impl MenuCatalog for OrderStorage {
    fn find_menu_item(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> Result<Option<MenuItemRef>, CatalogError> {
        Ok(self
            .get_menu_item(restaurant_id, menu_item_id)?
            .map(MenuItemRef::from))
    }
}
