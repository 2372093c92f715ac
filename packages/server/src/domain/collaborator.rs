//! Traits for the collaborators around the realtime subsystem.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::{AuthError, MessagePushError, TextGenerationError},
    event::{Event, EventEnvelope},
    value_object::{ConnectionId, Identity, RoomKey},
};

/// Frames a connection may have queued before further frames to it are dropped
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Outbound queue of one connection; its writer task drains it onto the socket
pub type PusherChannel = mpsc::Sender<String>;

/// A fresh outbound queue with the standard capacity
pub fn outbound_channel() -> (PusherChannel, mpsc::Receiver<String>) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

/// Verifies a bearer token and yields the identity it was issued for.
#[cfg_attr(test, mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Pushes serialized frames to live connections.
///
/// Pushing never waits on the network: a frame is queued on the connection's
/// outbound channel and written by that connection's own task. A connection
/// whose queue is full loses the frame; nobody else is affected.
#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, connection_id: &ConnectionId);

    async fn push_to(&self, connection_id: &ConnectionId, frame: &str)
    -> Result<(), MessagePushError>;

    /// Push to every target; failures for individual targets are logged and skipped
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        frame: &str,
    ) -> Result<(), MessagePushError>;
}

/// Fire-and-forget entry point used by mutation code after its write has
/// committed. Implementations must return without waiting for delivery and
/// must never fail toward the caller.
pub trait EventPublisher: Send + Sync {
    fn submit(&self, envelope: EventEnvelope);

    fn publish(&self, room: RoomKey, event: Event) {
        self.submit(EventEnvelope::new(room, event));
    }
}

/// Opaque text generation backend (LLM or otherwise)
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenerationError>;
}
