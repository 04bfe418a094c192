//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{InventoryEntry, StockUpdate};

use crate::api::{RestaurantScope, run_blocking};
use crate::core::ServerState;

/// GET /api/inventory
pub async fn list(
    State(state): State<ServerState>,
    scope: RestaurantScope,
) -> AppResult<ApiResponse<Vec<InventoryEntry>>> {
    let orders = state.orders.clone();
    let entries = run_blocking(move || orders.list_inventory(&scope.restaurant_id)).await?;
    Ok(ApiResponse::success(entries))
}

/// GET /api/inventory/{menu_item_id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(menu_item_id): Path<String>,
) -> AppResult<ApiResponse<InventoryEntry>> {
    let orders = state.orders.clone();
    let id = menu_item_id.clone();
    let entry = run_blocking(move || orders.get_stock(&scope.restaurant_id, &id))
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InventoryNotFound,
                format!("No inventory tracked for {}", menu_item_id),
            )
            .with_detail("menu_item_id", menu_item_id)
        })?;
    Ok(ApiResponse::success(entry))
}

/// PUT /api/inventory/{menu_item_id}
pub async fn set_stock(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(menu_item_id): Path<String>,
    Json(payload): Json<StockUpdate>,
) -> AppResult<ApiResponse<InventoryEntry>> {
    let orders = state.orders.clone();
    let restaurant_id = scope.restaurant_id.clone();
    let (entry, name) = run_blocking(move || {
        let entry = orders.set_stock(&restaurant_id, &menu_item_id, &payload)?;
        // 菜单里没有也允许记录库存，名称仅用于推送
        let name = orders
            .get_menu_item(&restaurant_id, &menu_item_id)
            .ok()
            .map(|m| m.name);
        Ok((entry, name))
    })
    .await?;

    state
        .notifier()
        .inventory_changed(&scope.restaurant_id, &entry, name);

    Ok(ApiResponse::success(entry))
}
