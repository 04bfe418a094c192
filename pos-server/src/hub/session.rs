//! WebSocket session - 一个连接的读写两个 pump
//!
//! - 写 pump: 从出站队列取事件写出，空闲时定时 ping，每帧有写超时
//! - 读 pump: 每次读有超时（pong 也算活跃），白名单内的上行消息转发到本房间
//!
//! 任一 pump 结束或 hub 关闭时取消连接级 token，两边一起退出，最后 unregister。

use super::{Connection, NotificationHub};
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use shared::message::{HubEvent, InboundMessage};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Keepalive / deadline settings of a session
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub ping_interval: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(54),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
        }
    }
}

/// Drive one registered connection until either side ends
pub async fn run_session(
    socket: WebSocket,
    hub: NotificationHub,
    connection: Connection,
    config: SessionConfig,
) {
    let connection_id = connection.id();
    let room_id = connection.room_id().to_string();
    let (sink, stream) = socket.split();

    let cancel = hub.shutdown_token().child_token();

    let writer = tokio::spawn(write_pump(sink, connection, config, cancel.clone()));

    read_pump(stream, &hub, &room_id, connection_id, config, &cancel).await;

    cancel.cancel();
    // 写 pump 持有 Connection，退出时 drop 即 unregister
    if let Err(e) = writer.await {
        tracing::error!(connection_id, error = %e, "Write pump panicked");
    }
    hub.unregister(connection_id);

    tracing::info!(connection_id, room_id = %room_id, "WebSocket session closed");
}

async fn write_pump(
    mut sink: SplitSink<WebSocket, Message>,
    mut connection: Connection,
    config: SessionConfig,
    cancel: CancellationToken,
) {
    let connection_id = connection.id();
    let mut ping = tokio::time::interval(config.ping_interval);
    ping.tick().await; // skip immediate

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = timeout(config.write_timeout, sink.send(Message::Close(None))).await;
                break;
            }
            event = connection.recv() => match event {
                Some(event) => match encode(&event) {
                    Some(text) => Message::Text(text.into()),
                    None => continue,
                },
                None => {
                    // 已被 unregister，队列关闭
                    let _ = timeout(config.write_timeout, sink.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = ping.tick() => Message::Ping(vec![].into()),
        };

        match timeout(config.write_timeout, sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection_id, error = %e, "WebSocket write failed");
                break;
            }
            Err(_) => {
                tracing::warn!(connection_id, "WebSocket write timed out");
                break;
            }
        }
    }

    // 读 pump 可能还在等待，通知它退出
    cancel.cancel();
}

async fn read_pump(
    mut stream: SplitStream<WebSocket>,
    hub: &NotificationHub,
    room_id: &str,
    connection_id: u64,
    config: SessionConfig,
    cancel: &CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = timeout(config.read_timeout, stream.next()) => next,
        };

        let message = match next {
            Err(_) => {
                tracing::info!(connection_id, "WebSocket read deadline exceeded");
                break;
            }
            Ok(None) | Ok(Some(Ok(Message::Close(_)))) => break,
            Ok(Some(Err(e))) => {
                tracing::debug!(connection_id, error = %e, "WebSocket read failed");
                break;
            }
            Ok(Some(Ok(message))) => message,
        };

        if let Message::Text(text) = message {
            relay(hub, room_id, connection_id, text.as_str());
        }
        // Ping/Pong/Binary 只用于刷新读超时
    }
}

/// 转发白名单内的客户端消息到本房间，其余忽略
fn relay(hub: &NotificationHub, room_id: &str, connection_id: u64, text: &str) {
    let inbound = match serde_json::from_str::<InboundMessage>(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::debug!(connection_id, error = %e, "Ignoring malformed client message");
            return;
        }
    };

    let event_type = inbound.event_type.clone();
    match inbound.into_relay(room_id) {
        Some(event) => {
            let outcome = hub.broadcast_to_room(room_id, &event);
            tracing::debug!(
                connection_id,
                room_id = %room_id,
                event_type = %event.event_type,
                delivered = outcome.delivered,
                "Client event relayed"
            );
        }
        None => {
            tracing::debug!(connection_id, event_type = %event_type, "Ignoring non-relayable client message");
        }
    }
}

fn encode(event: &HubEvent) -> Option<String> {
    match event.to_json() {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(event_type = %event.event_type, error = %e, "Failed to encode hub event");
            None
        }
    }
}
