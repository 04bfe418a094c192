//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /health | GET | 健康检查 | 无 |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    environment: String,
    server_time: String,
    database: CheckResult,
    connections: usize,
}

#[derive(Serialize)]
pub struct CheckResult {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let storage = state.orders.storage().clone();
    let database = match tokio::task::spawn_blocking(move || storage.order_count()).await {
        Ok(Ok(_)) => CheckResult {
            status: "ok",
            message: None,
        },
        Ok(Err(e)) => CheckResult {
            status: "error",
            message: Some(e.to_string()),
        },
        Err(e) => CheckResult {
            status: "error",
            message: Some(e.to_string()),
        },
    };

    Json(HealthResponse {
        status: if database.status == "ok" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        server_time: chrono::Utc::now().to_rfc3339(),
        database,
        connections: state.hub.connection_count(),
    })
}
