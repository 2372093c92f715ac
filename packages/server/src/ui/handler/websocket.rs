//! WebSocket connection handlers.
//!
//! Credentials in the upgrade request (`?token=` or a Bearer header)
//! authenticate the socket right away. Otherwise the first frame must be
//! `connect` carrying `{token}`.
//!
//! One task pair per socket: the receive loop feeds inbound frames to the
//! connection gateway, and `pusher_loop` drains the connection's outbound
//! channel onto the socket. Whichever ends first aborts the other, and the
//! gateway tears the connection down only once both have stopped.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, header::AUTHORIZATION},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, outbound_channel},
    infrastructure::dto::websocket::{CONNECT_EVENT, ClientFrame, GatewayFrame},
    ui::state::AppState,
    usecase::{ConnectionGateway, Disposition, HandshakeData},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    ws.on_upgrade(move |socket| handle_socket(socket, state, query.token, authorization))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Outbound channel of this connection (filled by the MessagePusher)
/// * `sender` - WebSocket sink of this connection
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Wait for the first text frame. `None` on close, error or a frame that is
/// not JSON.
async fn next_client_frame(receiver: &mut SplitStream<WebSocket>) -> Option<ClientFrame> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                return match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(frame) => Some(frame),
                    Err(e) => {
                        tracing::warn!("Handshake frame is not a valid event: {}", e);
                        None
                    }
                };
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

async fn reject(mut sender: SplitSink<WebSocket, Message>, message: String) {
    match GatewayFrame::connect_error(message).to_frame() {
        Ok(frame) => {
            let _ = sender.send(Message::Text(frame.into())).await;
        }
        Err(e) => tracing::error!("Failed to serialize connect_error: {}", e),
    }
    let _ = sender.send(Message::Close(None)).await;
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    query_token: Option<String>,
    authorization: Option<String>,
) {
    let gateway = state.connection_gateway.clone();
    let connection_id = gateway.accept();
    let (mut sender, mut receiver) = socket.split();

    // 1. Handshake
    let upgrade = HandshakeData {
        auth: Value::Null,
        query_token,
        authorization,
    };
    let handshake = if upgrade.token().is_some() {
        upgrade
    } else {
        let first =
            tokio::time::timeout(state.handshake_timeout, next_client_frame(&mut receiver)).await;
        let frame = match first {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("Connection '{}' closed before handshake", connection_id);
                return;
            }
            Err(_) => {
                tracing::warn!("Connection '{}' handshake timed out", connection_id);
                reject(sender, "handshake timed out".to_string()).await;
                return;
            }
        };

        if frame.event != CONNECT_EVENT {
            // the connection is not authenticated yet, so the gateway refuses it
            gateway.on_message(&connection_id, &frame.event, &frame.data).await;
            let _ = sender.send(Message::Close(None)).await;
            return;
        }

        HandshakeData {
            auth: frame.data,
            ..upgrade
        }
    };

    let (tx, rx) = outbound_channel();
    if let Err(e) = gateway.on_connect(connection_id, &handshake, tx).await {
        tracing::warn!("Socket connection rejected: {}", e);
        reject(sender, e.to_string()).await;
        return;
    }

    // 2. Frame loops
    let recv_gateway = gateway.clone();
    let mut recv_task = tokio::spawn(async move {
        receive_loop(receiver, recv_gateway, connection_id).await;
    });
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other and wait until it has
    // stopped, so no control message is still in flight during teardown
    let remaining = tokio::select! {
        _ = &mut recv_task => send_task,
        _ = &mut send_task => recv_task,
    };
    remaining.abort();
    let _ = remaining.await;

    // 3. Teardown
    gateway.on_disconnect(&connection_id).await;
}

async fn receive_loop(
    mut receiver: SplitStream<WebSocket>,
    gateway: Arc<ConnectionGateway>,
    connection_id: ConnectionId,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let frame = match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!("Ignoring malformed frame from '{}': {}", connection_id, e);
                        continue;
                    }
                };
                if frame.event == CONNECT_EVENT {
                    tracing::debug!("Connection '{}' is already authenticated", connection_id);
                    continue;
                }
                if gateway.on_message(&connection_id, &frame.event, &frame.data).await
                    == Disposition::Disconnect
                {
                    break;
                }
            }
            Message::Close(_) => {
                tracing::debug!("Connection '{}' requested close", connection_id);
                break;
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            _ => {}
        }
    }
}
