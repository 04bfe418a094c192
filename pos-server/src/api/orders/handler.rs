//! Order API Handlers
//!
//! 所有写操作：阻塞线程池里提交事务 → 成功后构造事件推送到 hub。
//! 推送失败（队列满、连接已断）不影响响应。

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::message::ItemStatusEventData;
use shared::order::{
    CompleteOrderRequest, CreateOrderRequest, ItemStatus, ItemStatusRequest, Order, OrderList,
    Payment, PaymentMethod, StatusFilter, UpdateOrderRequest,
};

use crate::api::{RestaurantScope, run_blocking};
use crate::core::ServerState;

const RESOURCE: &str = "order";

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// pending | completed | cancelled | active
    pub status: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// POST /api/orders
pub async fn create(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let restaurant_id = scope.restaurant_id.clone();
    let actor = scope.user_id.clone();
    let order = run_blocking(move || {
        orders.create_order(&restaurant_id, actor.as_deref(), &payload)
    })
    .await?;

    state.notifier().order_created(&order);
    publish_stock(&state, &order, order.items.iter().map(|i| i.menu_item_id.clone())).await;

    Ok(ApiResponse::success(order))
}

/// GET /api/orders
pub async fn list(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<OrderList>> {
    let filter = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(s.parse::<StatusFilter>().map_err(AppError::validation)?),
        None => None,
    };

    let orders = state.orders.clone();
    let list = run_blocking(move || {
        orders.list_orders(&scope.restaurant_id, filter, query.limit, query.offset)
    })
    .await?;

    Ok(ApiResponse::success(list))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(move || orders.get_order(&scope.restaurant_id, &id)).await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/orders/{id}/items
pub async fn add_items(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    let touched: Vec<String> = payload
        .items
        .iter()
        .map(|i| i.menu_item_id.clone())
        .collect();

    let orders = state.orders.clone();
    let order = run_blocking(move || {
        orders.update_order(&scope.restaurant_id, &id, &payload.items)
    })
    .await?;

    state.notifier().order_updated(&order);
    publish_stock(&state, &order, touched.into_iter()).await;

    Ok(ApiResponse::success(order))
}

/// POST /api/orders/{id}/complete
///
/// Body 可省略；带 `payment_method` 时记录支付信息。
pub async fn complete(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<ApiResponse<Order>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteOrderRequest::default()
    } else {
        serde_json::from_slice::<CompleteOrderRequest>(&body).map_err(|e| {
            AppError::with_message(ErrorCode::InvalidFormat, format!("Invalid body: {}", e))
        })?
    };
    let payment = payment_from(&request)?;

    let orders = state.orders.clone();
    let order = run_blocking(move || match payment {
        Some(payment) => orders.complete_order_with_payment(&scope.restaurant_id, &id, payment),
        None => orders.complete_order(&scope.restaurant_id, &id),
    })
    .await?;

    state.notifier().order_finished(&order);

    Ok(ApiResponse::success(order))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(move || orders.cancel_order(&scope.restaurant_id, &id)).await?;

    state.notifier().order_finished(&order);
    publish_stock(&state, &order, order.items.iter().map(|i| i.menu_item_id.clone())).await;

    Ok(ApiResponse::success(order))
}

/// PUT /api/orders/{id}/items/{item_id}/status
pub async fn update_item_status(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path((id, item_id)): Path<(String, String)>,
    Json(payload): Json<ItemStatusRequest>,
) -> AppResult<ApiResponse<Order>> {
    let status = parse_item_status(&payload.status)?;

    let orders = state.orders.clone();
    let order_id = id.clone();
    let target = item_id.clone();
    let order = run_blocking(move || {
        orders.update_item_status(&scope.restaurant_id, &order_id, &target, status)
    })
    .await?;

    let change = ItemStatusEventData {
        order_id: id,
        item_id: Some(item_id),
        menu_item_id: None,
        status,
        bulk: false,
    };
    state.notifier().items_changed(&order, &change);

    Ok(ApiResponse::success(order))
}

/// PUT /api/orders/{id}/menu-items/{menu_item_id}/status
pub async fn update_menu_item_status(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path((id, menu_item_id)): Path<(String, String)>,
    Json(payload): Json<ItemStatusRequest>,
) -> AppResult<ApiResponse<Order>> {
    let status = parse_item_status(&payload.status)?;

    let orders = state.orders.clone();
    let order_id = id.clone();
    let target = menu_item_id.clone();
    let (order, affected) = run_blocking(move || {
        orders.update_items_by_menu_item(&scope.restaurant_id, &order_id, &target, status)
    })
    .await?;

    tracing::debug!(resource = RESOURCE, order_id = %id, affected, "Bulk item status applied");

    let change = ItemStatusEventData {
        order_id: id,
        item_id: None,
        menu_item_id: Some(menu_item_id),
        status,
        bulk: true,
    };
    state.notifier().items_changed(&order, &change);

    Ok(ApiResponse::success(order))
}

// ========== Helpers ==========

fn parse_item_status(raw: &str) -> AppResult<ItemStatus> {
    raw.trim()
        .to_ascii_lowercase()
        .parse::<ItemStatus>()
        .map_err(|e| AppError::with_message(ErrorCode::InvalidItemStatus, e))
}

/// 支付信息：没有 `payment_method` 视为无支付信息的完成
fn payment_from(request: &CompleteOrderRequest) -> AppResult<Option<Payment>> {
    let Some(raw) = request.payment_method.as_deref() else {
        if request.amount_received.is_some() || request.change_returned.is_some() {
            return Err(AppError::required("payment_method"));
        }
        return Ok(None);
    };

    let method = raw
        .trim()
        .to_ascii_lowercase()
        .parse::<PaymentMethod>()
        .map_err(|e| AppError::with_message(ErrorCode::PaymentInvalidMethod, e))?;

    Ok(Some(Payment {
        method,
        amount_received: request.amount_received.unwrap_or(0.0),
        change_returned: request.change_returned.unwrap_or(0.0),
    }))
}

/// 推送受影响菜单项的最新库存（只推送追踪库存的菜品）
async fn publish_stock(
    state: &ServerState,
    order: &Order,
    menu_item_ids: impl Iterator<Item = String>,
) {
    let mut ids: Vec<String> = menu_item_ids.collect();
    ids.sort();
    ids.dedup();

    let orders = state.orders.clone();
    let restaurant_id = order.restaurant_id.clone();
    let lookup = ids.clone();
    let entries = run_blocking(move || {
        lookup
            .iter()
            .filter_map(|id| orders.get_stock(&restaurant_id, id).transpose())
            .collect::<Result<Vec<_>, _>>()
    })
    .await;

    let entries = match entries {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(order_id = %order.id, error = %e, "Skipping inventory notifications");
            return;
        }
    };

    let notifier = state.notifier();
    for entry in &entries {
        let name = order
            .items
            .iter()
            .find(|i| i.menu_item_id == entry.menu_item_id)
            .map(|i| i.name.clone());
        notifier.inventory_changed(&order.restaurant_id, entry, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_from_request() {
        assert_eq!(payment_from(&CompleteOrderRequest::default()).unwrap(), None);

        let payment = payment_from(&CompleteOrderRequest {
            payment_method: Some(" UPI ".into()),
            amount_received: Some(378.0),
            change_returned: None,
        })
        .unwrap()
        .unwrap();
        assert_eq!(payment.method, PaymentMethod::Upi);
        assert_eq!(payment.change_returned, 0.0);

        let err = payment_from(&CompleteOrderRequest {
            payment_method: Some("card".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentInvalidMethod);

        let err = payment_from(&CompleteOrderRequest {
            amount_received: Some(10.0),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
    }

    #[test]
    fn test_parse_item_status() {
        assert_eq!(parse_item_status("Served").unwrap(), ItemStatus::Served);
        assert_eq!(
            parse_item_status("burnt").unwrap_err().code,
            ErrorCode::InvalidItemStatus
        );
    }
}
