//! NotificationHub - 按餐厅分房间的实时事件广播
//!
//! ```text
//! handler (after commit)
//!       │ HubEvent { room_id = restaurant_id }
//!       ▼
//! NotificationHub
//!   ├── connections: id → Member { room_id, outbound tx }
//!   └── rooms: room_id → [id, ...]
//!         │ try_send (满了就丢)
//!         ▼
//!   per-connection bounded queue → WebSocket write pump
//! ```
//!
//! 成员关系的增删和广播都在同一把锁内完成，两份视图不会出现不一致；
//! 广播只做非阻塞入队，慢连接只会丢自己的事件，不影响其他连接。

pub mod notify;
pub mod session;

use parking_lot::Mutex;
use shared::message::HubEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use notify::EventPublisher;

/// 每个连接的出站队列默认容量
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;
/// 单个房间默认最大连接数
pub const DEFAULT_MAX_CONNECTIONS_PER_ROOM: usize = 100;

pub type ConnectionId = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("Room {room_id} is full ({limit} connections)")]
    RoomFull { room_id: String, limit: usize },

    #[error("Notification hub is shutting down")]
    ShuttingDown,
}

/// Result of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BroadcastOutcome {
    /// Connections whose queue accepted the event
    pub delivered: usize,
    /// Connections that missed it (queue full or already closing)
    pub dropped: usize,
}

/// Hub snapshot for `/api/hub/stats`
#[derive(Debug, Clone, serde::Serialize)]
pub struct HubStats {
    pub room_count: usize,
    pub connection_count: usize,
    pub rooms: Vec<RoomStats>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RoomStats {
    pub room_id: String,
    pub connections: usize,
}

struct Member {
    room_id: String,
    user_id: Option<String>,
    tx: mpsc::Sender<HubEvent>,
}

#[derive(Default)]
struct Membership {
    connections: HashMap<ConnectionId, Member>,
    rooms: HashMap<String, Vec<ConnectionId>>,
}

struct HubShared {
    membership: Mutex<Membership>,
    next_id: AtomicU64,
    outbound_capacity: usize,
    max_per_room: usize,
    shutdown: CancellationToken,
}

/// Room-partitioned broadcaster, cheap to clone
#[derive(Clone)]
pub struct NotificationHub {
    shared: Arc<HubShared>,
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("outbound_capacity", &self.shared.outbound_capacity)
            .field("max_per_room", &self.shared.max_per_room)
            .field("connection_count", &self.connection_count())
            .finish()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_CAPACITY, DEFAULT_MAX_CONNECTIONS_PER_ROOM)
    }
}

impl NotificationHub {
    pub fn new(outbound_capacity: usize, max_per_room: usize) -> Self {
        Self {
            shared: Arc::new(HubShared {
                membership: Mutex::new(Membership::default()),
                next_id: AtomicU64::new(1),
                outbound_capacity: outbound_capacity.max(1),
                max_per_room: max_per_room.max(1),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Token cancelled on server shutdown; every session watches it
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// Stop admitting connections and close every open session
    pub fn shutdown(&self) {
        self.shared.shutdown.cancel();
        tracing::info!(
            connections = self.connection_count(),
            "Notification hub shutting down"
        );
    }

    /// Add a connection to `room_id`, creating the room if needed
    ///
    /// The returned [`Connection`] owns the outbound queue; dropping it unregisters.
    /// A `connected` welcome event is queued before anything else.
    pub fn register(
        &self,
        room_id: &str,
        user_id: Option<String>,
    ) -> Result<Connection, HubError> {
        if self.shared.shutdown.is_cancelled() {
            return Err(HubError::ShuttingDown);
        }

        let (tx, receiver) = mpsc::channel(self.shared.outbound_capacity);
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut membership = self.shared.membership.lock();
            let members = membership.rooms.entry(room_id.to_string()).or_default();
            if members.len() >= self.shared.max_per_room {
                return Err(HubError::RoomFull {
                    room_id: room_id.to_string(),
                    limit: self.shared.max_per_room,
                });
            }
            members.push(id);

            // 容量至少为 1，新队列一定能放下欢迎事件
            let _ = tx.try_send(HubEvent::connected(room_id, id));

            membership.connections.insert(
                id,
                Member {
                    room_id: room_id.to_string(),
                    user_id: user_id.clone(),
                    tx,
                },
            );
        }

        tracing::info!(
            connection_id = id,
            room_id = %room_id,
            user_id = ?user_id,
            "Connection registered"
        );

        Ok(Connection {
            id,
            room_id: room_id.to_string(),
            user_id,
            receiver,
            hub: self.clone(),
        })
    }

    /// Remove a connection from both views and close its queue
    ///
    /// Returns `false` when it was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = {
            let mut membership = self.shared.membership.lock();
            let Some(member) = membership.connections.remove(&id) else {
                return false;
            };
            if let Some(members) = membership.rooms.get_mut(&member.room_id) {
                members.retain(|m| *m != id);
                if members.is_empty() {
                    membership.rooms.remove(&member.room_id);
                }
            }
            member
        };

        tracing::info!(
            connection_id = id,
            room_id = %removed.room_id,
            user_id = ?removed.user_id,
            "Connection unregistered"
        );
        true
    }

    /// Non-blocking fan-out to every connection in `room_id`
    pub fn broadcast_to_room(&self, room_id: &str, event: &HubEvent) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let membership = self.shared.membership.lock();

        let Some(members) = membership.rooms.get(room_id) else {
            return outcome;
        };

        for id in members {
            let Some(member) = membership.connections.get(id) else {
                continue;
            };
            match member.tx.try_send(event.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    outcome.dropped += 1;
                    tracing::warn!(
                        connection_id = id,
                        room_id = %room_id,
                        event_type = %event.event_type,
                        "Outbound queue full, event dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // 会话正在退出，稍后 unregister
                    outcome.dropped += 1;
                }
            }
        }

        outcome
    }

    // ========== Observability ==========

    pub fn room_count(&self) -> usize {
        self.shared.membership.lock().rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.shared.membership.lock().connections.len()
    }

    pub fn room_size(&self, room_id: &str) -> usize {
        self.shared
            .membership
            .lock()
            .rooms
            .get(room_id)
            .map_or(0, Vec::len)
    }

    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.shared.membership.lock().connections.contains_key(&id)
    }

    pub fn stats(&self) -> HubStats {
        let membership = self.shared.membership.lock();
        let mut rooms: Vec<RoomStats> = membership
            .rooms
            .iter()
            .map(|(room_id, members)| RoomStats {
                room_id: room_id.clone(),
                connections: members.len(),
            })
            .collect();
        rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));

        HubStats {
            room_count: membership.rooms.len(),
            connection_count: membership.connections.len(),
            rooms,
        }
    }
}

/// A registered connection's receiving end
///
/// Dropping it unregisters the connection.
pub struct Connection {
    id: ConnectionId,
    room_id: String,
    user_id: Option<String>,
    receiver: mpsc::Receiver<HubEvent>,
    hub: NotificationHub,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("room_id", &self.room_id)
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Next queued event; `None` once unregistered and drained
    pub async fn recv(&mut self) -> Option<HubEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<HubEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::HubEventType;

    fn event(room_id: &str, n: u64) -> HubEvent {
        HubEvent::new(
            HubEventType::OrderUpdated,
            room_id,
            &serde_json::json!({ "n": n }),
        )
    }

    /// 丢弃欢迎事件
    fn registered(hub: &NotificationHub, room_id: &str) -> Connection {
        let mut conn = hub.register(room_id, None).unwrap();
        let welcome = conn.try_recv().unwrap();
        assert_eq!(welcome.event_type, HubEventType::Connected);
        conn
    }

    #[test]
    fn test_broadcast_to_empty_room_is_noop() {
        let hub = NotificationHub::default();
        let mut other = registered(&hub, "r2");

        let outcome = hub.broadcast_to_room("r1", &event("r1", 1));

        assert_eq!(outcome, BroadcastOutcome::default());
        assert!(other.try_recv().is_none());
        assert_eq!(hub.room_count(), 1);
    }

    #[test]
    fn test_rooms_are_isolated() {
        let hub = NotificationHub::default();
        let mut a = registered(&hub, "r1");
        let mut b = registered(&hub, "r2");

        hub.broadcast_to_room("r1", &event("r1", 1));
        hub.broadcast_to_room("r2", &event("r2", 2));

        assert_eq!(a.try_recv().unwrap().room_id, "r1");
        assert!(a.try_recv().is_none());
        assert_eq!(b.try_recv().unwrap().room_id, "r2");
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn test_unregister_removes_from_both_views() {
        let hub = NotificationHub::default();
        let a = hub.register("r1", None).unwrap();
        let b = hub.register("r1", None).unwrap();
        let a_id = a.id();

        assert!(hub.unregister(a_id));
        assert!(!hub.is_registered(a_id));
        assert_eq!(hub.room_size("r1"), 1);
        assert_eq!(hub.connection_count(), 1);

        // 幂等
        assert!(!hub.unregister(a_id));

        drop(b);
        assert_eq!(hub.room_count(), 0);
        assert_eq!(hub.connection_count(), 0);
        drop(a);
    }

    #[tokio::test]
    async fn test_unregister_closes_queue() {
        let hub = NotificationHub::default();
        let mut conn = registered(&hub, "r1");

        hub.unregister(conn.id());

        assert!(conn.recv().await.is_none());
    }

    #[test]
    fn test_full_queue_drops_only_for_slow_connection() {
        let hub = NotificationHub::new(2, 10);
        // 欢迎事件占用一个位置，不取出
        let mut slow = hub.register("r1", None).unwrap();
        let mut fast = hub.register("r1", None).unwrap();
        fast.try_recv().unwrap();

        let first = hub.broadcast_to_room("r1", &event("r1", 1));
        assert_eq!(first, BroadcastOutcome { delivered: 2, dropped: 0 });
        fast.try_recv().unwrap();

        let second = hub.broadcast_to_room("r1", &event("r1", 2));
        assert_eq!(second, BroadcastOutcome { delivered: 1, dropped: 1 });
        assert_eq!(fast.try_recv().unwrap().data["n"], 2);

        // 慢连接没有被断开，只是丢了一条
        assert!(hub.is_registered(slow.id()));
        assert_eq!(slow.try_recv().unwrap().event_type, HubEventType::Connected);
        assert_eq!(slow.try_recv().unwrap().data["n"], 1);
        assert!(slow.try_recv().is_none());
    }

    #[test]
    fn test_events_keep_submission_order() {
        let hub = NotificationHub::new(64, 10);
        let mut conn = registered(&hub, "r1");

        for n in 0..20 {
            hub.broadcast_to_room("r1", &event("r1", n));
        }

        for n in 0..20u64 {
            assert_eq!(conn.try_recv().unwrap().data["n"], n);
        }
    }

    #[test]
    fn test_room_limit() {
        let hub = NotificationHub::new(8, 2);
        let _a = hub.register("r1", None).unwrap();
        let _b = hub.register("r1", None).unwrap();

        let err = hub.register("r1", None).unwrap_err();
        assert_eq!(
            err,
            HubError::RoomFull {
                room_id: "r1".into(),
                limit: 2
            }
        );
        assert!(hub.register("r2", None).is_ok());
        assert_eq!(hub.room_size("r1"), 2);
    }

    #[test]
    fn test_register_after_shutdown_is_rejected() {
        let hub = NotificationHub::default();
        hub.shutdown();

        assert_eq!(
            hub.register("r1", None).unwrap_err(),
            HubError::ShuttingDown
        );
        assert!(hub.shutdown_token().is_cancelled());
    }

    #[test]
    fn test_concurrent_register_and_broadcast_stay_consistent() {
        let hub = NotificationHub::new(1024, 1000);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let hub = hub.clone();
                std::thread::spawn(move || {
                    for n in 0..50 {
                        let conn = hub.register("r1", Some(format!("u{t}"))).unwrap();
                        hub.broadcast_to_room("r1", &event("r1", n));
                        drop(conn);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn test_stats() {
        let hub = NotificationHub::default();
        let _a = hub.register("r2", None).unwrap();
        let _b = hub.register("r1", None).unwrap();
        let _c = hub.register("r1", Some("u1".into())).unwrap();

        let stats = hub.stats();
        assert_eq!(stats.room_count, 2);
        assert_eq!(stats.connection_count, 3);
        assert_eq!(stats.rooms[0].room_id, "r1");
        assert_eq!(stats.rooms[0].connections, 2);
    }
}
