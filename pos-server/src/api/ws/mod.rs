//! 实时推送 WebSocket
//!
//! GET /api/ws?restaurant_id=<id>&user_id=<id>
//!
//! 浏览器 WebSocket 不能自定义 header，因此餐厅也可以通过 query 传递；
//! 两者都有时以 query 为准。
//!
//! 协议:
//! - Server → Client: `{type, room_id, data, timestamp}`，首条为 `connected`
//! - Client → Server: `{type, data}`，只有 `order_update` / `inventory_update` 会转发到本房间

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use http::HeaderMap;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};

use crate::api::scope::{RESTAURANT_HEADER, USER_HEADER, header_value};
use crate::core::ServerState;
use crate::hub::HubError;
use crate::hub::session::run_session;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/ws", get(handle_ws))
}

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    restaurant_id: Option<String>,
    user_id: Option<String>,
}

/// GET /api/ws
pub async fn handle_ws(
    State(state): State<ServerState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let restaurant_id = non_empty(query.restaurant_id)
        .or_else(|| header_value(&headers, RESTAURANT_HEADER))
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotSelected))?;
    let user_id = non_empty(query.user_id).or_else(|| header_value(&headers, USER_HEADER));

    // 升级前注册，房间满时直接返回错误；升级失败时 Connection 被 drop，自动注销
    let connection = state
        .hub
        .register(&restaurant_id, user_id)
        .map_err(hub_error)?;

    let hub = state.hub.clone();
    let session = state.config.session_config();
    Ok(ws
        .max_message_size(state.config.ws_max_message_size)
        .on_upgrade(move |socket| run_session(socket, hub, connection, session)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn hub_error(err: HubError) -> AppError {
    match err {
        HubError::RoomFull { room_id, limit } => {
            tracing::warn!(room_id = %room_id, limit, "WebSocket connection rejected, room full");
            AppError::with_message(
                ErrorCode::ConnectionLimitReached,
                format!("Too many connections for restaurant ({limit})"),
            )
            .with_detail("room_id", room_id)
        }
        HubError::ShuttingDown => AppError::with_message(
            ErrorCode::SystemBusy,
            "Server is shutting down",
        ),
    }
}
