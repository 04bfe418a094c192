//! Server Implementation
//!
//! HTTP / WebSocket 服务器启动和优雅关闭

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use crate::api::build_app;
use crate::core::{Config, Result, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    /// 运行直到 ctrl-c
    ///
    /// 收到信号后停止接收新连接、关闭所有 WebSocket 会话，
    /// 最多等待 `SHUTDOWN_TIMEOUT_MS` 让进行中的请求结束。
    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        let app = build_app(&state).with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("POS server listening on {}", addr);

        let signalled = CancellationToken::new();
        let hub = state.hub.clone();
        let on_signal = signalled.clone();
        let shutdown = async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
            hub.shutdown();
            on_signal.cancel();
        };

        let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown);
        let grace = self.config.shutdown_timeout();

        tokio::select! {
            result = async move { serve.await } => result?,
            _ = async {
                signalled.cancelled().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(timeout_ms = self.config.shutdown_timeout_ms, "Graceful shutdown timed out");
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}
