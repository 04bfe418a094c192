//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{MenuItem, MenuItemUpsert};

use crate::api::{RestaurantScope, run_blocking};
use crate::core::ServerState;

/// GET /api/menu
pub async fn list(
    State(state): State<ServerState>,
    scope: RestaurantScope,
) -> AppResult<ApiResponse<Vec<MenuItem>>> {
    let orders = state.orders.clone();
    let items = run_blocking(move || orders.list_menu_items(&scope.restaurant_id)).await?;
    Ok(ApiResponse::success(items))
}

/// GET /api/menu/{menu_item_id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(menu_item_id): Path<String>,
) -> AppResult<ApiResponse<MenuItem>> {
    let orders = state.orders.clone();
    let item =
        run_blocking(move || orders.get_menu_item(&scope.restaurant_id, &menu_item_id)).await?;
    Ok(ApiResponse::success(item))
}

/// PUT /api/menu/{menu_item_id}
pub async fn upsert(
    State(state): State<ServerState>,
    scope: RestaurantScope,
    Path(menu_item_id): Path<String>,
    Json(payload): Json<MenuItemUpsert>,
) -> AppResult<ApiResponse<MenuItem>> {
    let orders = state.orders.clone();
    let item = run_blocking(move || {
        orders.upsert_menu_item(&scope.restaurant_id, &menu_item_id, &payload)
    })
    .await?;
    Ok(ApiResponse::success(item))
}
