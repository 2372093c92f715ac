//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの outbound channel (容量付き `Sender`) を管理
//! - 接続へのフレーム送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! The socket itself lives in the UI layer (`ui/handler/websocket.rs`), which
//! creates the channel and runs the writer task. Sending here only enqueues,
//! so one slow socket never holds up delivery to the others. A stalled socket
//! whose queue is full loses frames instead of growing without bound.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc::error::TrySendError};

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: connection id, Value: outbound channel of that connection
    clients: RwLock<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.write().await;
        clients.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.write().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!("Connection '{}' unregistered from MessagePusher", connection_id);
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        frame: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.read().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        enqueue(connection_id, sender, frame)?;
        tracing::debug!("Pushed frame to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        frame: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.read().await;

        for target in targets {
            match clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = enqueue(&target, sender, frame) {
                        tracing::warn!("Failed to push frame to connection '{}': {}", target, e);
                    }
                }
                None => {
                    tracing::debug!(
                        "Connection '{}' not registered during broadcast, skipping",
                        target
                    );
                }
            }
        }

        Ok(())
    }
}

fn enqueue(
    connection_id: &ConnectionId,
    sender: &PusherChannel,
    frame: &str,
) -> Result<(), MessagePushError> {
    sender.try_send(frame.to_string()).map_err(|e| match e {
        TrySendError::Full(_) => MessagePushError::QueueFull(connection_id.to_string()),
        TrySendError::Closed(_) => {
            MessagePushError::PushFailed(format!("connection '{}' is closed", connection_id))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OUTBOUND_QUEUE_CAPACITY, outbound_channel};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - push_to: 特定の接続への送信
    // - broadcast: 複数接続への送信と部分失敗の許容
    // - unregister 後は届かないこと
    // - キューが満杯の接続だけがフレームを失うこと
    // ========================================

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定の接続にフレームを送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = outbound_channel();
        let connection_id = ConnectionId::generate();
        pusher.register_client(connection_id, tx).await;

        // when (操作):
        let result = pusher.push_to(&connection_id, "Hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_client_not_found() {
        // テスト項目: 存在しない接続への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let result = pusher.push_to(&ConnectionId::generate(), "Hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_push_to_closed_channel_fails() {
        // テスト項目: 受信側が閉じた接続への送信は PushFailed
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, rx) = outbound_channel();
        let connection_id = ConnectionId::generate();
        pusher.register_client(connection_id, tx).await;
        drop(rx);

        // when (操作):
        let result = pusher.push_to(&connection_id, "Hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::PushFailed(_))));
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        // テスト項目: 一部の接続が存在しない・閉じていてもブロードキャストは成功する
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx_alive, mut rx_alive) = outbound_channel();
        let (tx_closed, rx_closed) = outbound_channel();
        let alive = ConnectionId::generate();
        let closed = ConnectionId::generate();
        pusher.register_client(alive, tx_alive).await;
        pusher.register_client(closed, tx_closed).await;
        drop(rx_closed);

        // when (操作):
        let targets = vec![closed, ConnectionId::generate(), alive];
        let result = pusher.broadcast(targets, "Broadcast").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx_alive.recv().await, Some("Broadcast".to_string()));
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        // テスト項目: unregister 後の接続には配信されない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = outbound_channel();
        let connection_id = ConnectionId::generate();
        pusher.register_client(connection_id, tx).await;

        // when (操作):
        pusher.unregister_client(&connection_id).await;
        pusher.unregister_client(&connection_id).await;
        pusher.broadcast(vec![connection_id], "late").await.unwrap();

        // then (期待する結果):
        assert_eq!(pusher.client_count().await, 0);
        // the only sender was dropped with the registration
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_full_queue_drops_frames_for_that_connection_only() {
        // テスト項目: 送信キューが満杯の接続ではフレームが捨てられ、他の接続には届く
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (stalled_tx, mut stalled_rx) = outbound_channel();
        let (healthy_tx, mut healthy_rx) = outbound_channel();
        let stalled = ConnectionId::generate();
        let healthy = ConnectionId::generate();
        pusher.register_client(stalled, stalled_tx).await;
        pusher.register_client(healthy, healthy_tx).await;
        for i in 0..OUTBOUND_QUEUE_CAPACITY {
            pusher.push_to(&stalled, &format!("backlog-{}", i)).await.unwrap();
        }

        // when (操作):
        let direct = pusher.push_to(&stalled, "overflow").await;
        let broadcast = pusher.broadcast(vec![stalled, healthy], "news").await;

        // then (期待する結果):
        assert!(matches!(direct, Err(MessagePushError::QueueFull(_))));
        assert!(broadcast.is_ok());
        assert_eq!(healthy_rx.recv().await, Some("news".to_string()));
        let mut drained = 0;
        while let Ok(frame) = stalled_rx.try_recv() {
            assert!(frame.starts_with("backlog-"));
            drained += 1;
        }
        assert_eq!(drained, OUTBOUND_QUEUE_CAPACITY);
    }
}
