use std::path::PathBuf;
use std::time::Duration;

use crate::core::{Result, ServerError};
use crate::hub::session::SessionConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖（启动时先加载 `.env`）：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录（redb 数据库、日志） |
/// | HTTP_PORT | 8080 | HTTP / WebSocket 端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | 未设置 | 日志目录，设置后按天滚动写文件 |
/// | TAX_RATE | 0.05 | 订单税率 |
/// | ORDER_LIST_DEFAULT_LIMIT | 20 | 订单列表默认条数 |
/// | ORDER_LIST_MAX_LIMIT | 100 | 订单列表最大条数 |
/// | HUB_OUTBOUND_CAPACITY | 256 | 每个连接的出站队列容量 |
/// | WS_PING_INTERVAL_SECS | 54 | WebSocket ping 间隔 |
/// | WS_READ_TIMEOUT_SECS | 60 | WebSocket 读超时 |
/// | WS_WRITE_TIMEOUT_SECS | 10 | WebSocket 写超时 |
/// | WS_MAX_CONNECTIONS_PER_ROOM | 100 | 单个餐厅最大连接数 |
/// | WS_MAX_MESSAGE_SIZE | 65536 | 上行消息最大字节数 |
/// | MAX_CONCURRENT_REQUESTS | 1024 | HTTP 并发请求上限 |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 优雅关闭等待时间 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/pos HTTP_PORT=9000 TAX_RATE=0.18 cargo run -p pos-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,

    // === 订单 ===
    pub tax_rate: f64,
    pub order_list_default_limit: usize,
    pub order_list_max_limit: usize,

    // === 实时推送 ===
    pub hub_outbound_capacity: usize,
    pub ws_ping_interval_secs: u64,
    pub ws_read_timeout_secs: u64,
    pub ws_write_timeout_secs: u64,
    pub ws_max_connections_per_room: usize,
    pub ws_max_message_size: usize,

    /// HTTP 并发请求上限
    pub max_concurrent_requests: usize,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        let tax_rate = env_or("TAX_RATE", 0.05_f64);
        let tax_rate = if tax_rate.is_finite() && (0.0..1.0).contains(&tax_rate) {
            tax_rate
        } else {
            tracing::warn!(tax_rate, "TAX_RATE out of range, falling back to 0.05");
            0.05
        };

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),

            tax_rate,
            order_list_default_limit: env_or("ORDER_LIST_DEFAULT_LIMIT", 20),
            order_list_max_limit: env_or("ORDER_LIST_MAX_LIMIT", 100),

            hub_outbound_capacity: env_or("HUB_OUTBOUND_CAPACITY", 256),
            ws_ping_interval_secs: env_or("WS_PING_INTERVAL_SECS", 54),
            ws_read_timeout_secs: env_or("WS_READ_TIMEOUT_SECS", 60),
            ws_write_timeout_secs: env_or("WS_WRITE_TIMEOUT_SECS", 10),
            ws_max_connections_per_room: env_or("WS_MAX_CONNECTIONS_PER_ROOM", 100),
            ws_max_message_size: env_or("WS_MAX_MESSAGE_SIZE", 65536),

            max_concurrent_requests: env_or("MAX_CONCURRENT_REQUESTS", 1024),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    /// WebSocket 会话超时设置
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ping_interval: Duration::from_secs(self.ws_ping_interval_secs.max(1)),
            read_timeout: Duration::from_secs(self.ws_read_timeout_secs.max(1)),
            write_timeout: Duration::from_secs(self.ws_write_timeout_secs.max(1)),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// 启动前检查配置之间的约束
    pub fn validate(&self) -> Result<()> {
        if self.ws_ping_interval_secs >= self.ws_read_timeout_secs {
            return Err(ServerError::Config(format!(
                "WS_PING_INTERVAL_SECS ({}) must be shorter than WS_READ_TIMEOUT_SECS ({})",
                self.ws_ping_interval_secs, self.ws_read_timeout_secs
            )));
        }
        if self.order_list_max_limit == 0
            || self.hub_outbound_capacity == 0
            || self.max_concurrent_requests == 0
        {
            return Err(ServerError::Config(
                "ORDER_LIST_MAX_LIMIT, HUB_OUTBOUND_CAPACITY and MAX_CONCURRENT_REQUESTS must be positive"
                    .into(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_and_derived_paths() {
        let config = Config::with_overrides("/tmp/pos-test", 9100);

        assert_eq!(config.http_port, 9100);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/pos-test").join("orders.redb")
        );
        assert_eq!(
            config.session_config().write_timeout,
            Duration::from_secs(config.ws_write_timeout_secs.max(1))
        );
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or::<u16>("POS_SERVER_TEST_UNSET_VARIABLE", 42), 42);
    }
}
