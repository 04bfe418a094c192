//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 订单事务接口
//! - [`inventory`] - 库存接口
//! - [`menu`] - 菜单价格接口
//! - [`ws`] - 实时推送 WebSocket
//! - [`hub`] - 推送中心统计
//!
//! 除 `/health` 外，所有接口通过 `X-Restaurant-Id` 确定餐厅（见 [`scope`]）。

pub mod health;
pub mod hub;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod scope;
pub mod ws;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;
use crate::orders::{ManagerError, ManagerResult};
use crate::utils::{AppError, AppResult};

pub use scope::RestaurantScope;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(inventory::router())
        .merge(menu::router())
        .merge(ws::router())
        .merge(hub::router())
}

/// Build a fully configured application with all middleware
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    let request_id = HeaderName::from_static("x-request-id");

    build_router()
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(ConcurrencyLimitLayer::new(state.config.max_concurrent_requests))
        .layer(TraceLayer::new_for_http())
        // Request ID
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, XRequestId))
}

/// 在阻塞线程池执行订单引擎调用（redb 读写是同步的）
pub(crate) async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> ManagerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Blocking task failed");
            Err(ManagerError::Internal("blocking task failed".into()))
        })
        .map_err(AppError::from)
}
