//! POS Server - 餐厅订单事务引擎 + 实时推送
//!
//! # 模块结构
//!
//! ```text
//! pos-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── orders/        # 订单事务引擎 (redb)
//! ├── hub/           # 按餐厅分房间的实时推送
//! ├── api/           # HTTP / WebSocket 路由和处理器
//! └── utils/         # 日志、错误类型
//! ```

pub mod api;
pub mod core;
pub mod hub;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use hub::{BroadcastOutcome, EventPublisher, NotificationHub};
pub use orders::{OrderStorage, OrdersManager};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::init_logger;

/// 加载 `.env` 并初始化日志
pub fn setup_environment() {
    // .env 不存在时忽略
    let _ = dotenv::dotenv();

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let json = std::env::var("ENVIRONMENT").is_ok_and(|e| e == "production");
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty());
    init_logger(&level, json, log_dir.as_deref());
}
