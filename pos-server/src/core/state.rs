use std::sync::Arc;

use crate::core::{Config, Result};
use crate::hub::notify::OrderNotifier;
use crate::hub::{EventPublisher, NotificationHub};
use crate::orders::{OrderStorage, OrdersManager};

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | orders | Arc<OrdersManager> | 订单事务引擎 |
/// | hub | NotificationHub | 实时推送中心 |
///
/// Clone 只复制引用。
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub orders: Arc<OrdersManager>,
    pub hub: NotificationHub,
}

impl ServerState {
    /// 打开工作目录下的数据库并创建推送中心
    pub fn initialize(config: &Config) -> Result<Self> {
        config.validate()?;

        std::fs::create_dir_all(&config.work_dir)?;
        let db_path = config.database_path();
        let storage = OrderStorage::open(&db_path)?;

        tracing::info!(path = %db_path.display(), "Order storage opened");
        Ok(Self::with_storage(config.clone(), storage))
    }

    /// 使用现有存储构建状态（测试用内存数据库）
    pub fn with_storage(config: Config, storage: OrderStorage) -> Self {
        let orders = OrdersManager::with_storage(storage)
            .with_tax_rate(config.tax_rate)
            .with_list_limits(config.order_list_default_limit, config.order_list_max_limit);
        let hub = NotificationHub::new(
            config.hub_outbound_capacity,
            config.ws_max_connections_per_room,
        );

        Self {
            config,
            orders: Arc::new(orders),
            hub,
        }
    }

    pub fn publisher(&self) -> &dyn EventPublisher {
        &self.hub
    }

    /// 提交成功后的订单事件
    pub fn notifier(&self) -> OrderNotifier<'_> {
        OrderNotifier::new(self.publisher())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ServerError;

    #[test]
    fn test_initialize_creates_database_in_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("pos");
        let config = Config::with_overrides(work_dir.to_string_lossy(), 0);

        let state = ServerState::initialize(&config).unwrap();

        assert!(config.database_path().exists());
        assert_eq!(state.hub.connection_count(), 0);
    }

    #[test]
    fn test_validate_rejects_ping_after_read_deadline() {
        let mut config = Config::with_overrides("./unused", 0);
        config.ws_ping_interval_secs = 60;
        config.ws_read_timeout_secs = 30;

        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }
}
