//! 推送中心统计
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/hub/stats | GET | 房间数、连接数、各房间连接数 |

use axum::{Router, extract::State, routing::get};
use shared::error::{ApiResponse, AppResult};

use crate::core::ServerState;
use crate::hub::HubStats;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/hub/stats", get(stats))
}

/// GET /api/hub/stats
pub async fn stats(State(state): State<ServerState>) -> AppResult<ApiResponse<HubStats>> {
    Ok(ApiResponse::success(state.hub.stats()))
}
