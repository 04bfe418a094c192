//! Inventory API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/inventory | GET | 本餐厅全部库存 |
//! | /api/inventory/{menu_item_id} | GET | 单个菜品库存 |
//! | /api/inventory/{menu_item_id} | PUT | 设置库存（进货/盘点） |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{menu_item_id}", get(handler::get_by_id).put(handler::set_stock))
}
