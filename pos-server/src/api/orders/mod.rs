//! Order API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders | POST | 创建订单 |
//! | /api/orders | GET | 订单列表 (?status=&limit=&offset=) |
//! | /api/orders/{id} | GET | 订单详情 |
//! | /api/orders/{id}/items | PUT | 追加菜品 |
//! | /api/orders/{id}/complete | POST | 完成（可带支付信息） |
//! | /api/orders/{id}/cancel | POST | 取消并回补库存 |
//! | /api/orders/{id}/items/{item_id}/status | PUT | 单个菜品状态 |
//! | /api/orders/{id}/menu-items/{menu_item_id}/status | PUT | 按菜单项批量更新状态 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/items", put(handler::add_items))
        .route("/{id}/complete", post(handler::complete))
        .route("/{id}/cancel", post(handler::cancel))
        .route(
            "/{id}/items/{item_id}/status",
            put(handler::update_item_status),
        )
        .route(
            "/{id}/menu-items/{menu_item_id}/status",
            put(handler::update_menu_item_status),
        )
}
