//! Menu API Module
//!
//! 订单引擎只读取菜品名称和价格；这里提供最小的维护接口。
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/menu | GET | 本餐厅菜单 |
//! | /api/menu/{menu_item_id} | GET | 菜品详情 |
//! | /api/menu/{menu_item_id} | PUT | 新增或改价 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menu", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{menu_item_id}", get(handler::get_by_id).put(handler::upsert))
}
