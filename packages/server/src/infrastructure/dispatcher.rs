//! Event dispatcher: the bridge from mutation code to live delivery.
//!
//! `submit` only enqueues. A fixed pool of worker tasks drains the queues and
//! broadcasts through the room directory. Envelopes are routed by a stable hash
//! of the room key, so every envelope for one room is handled by the same
//! worker in submission order while other rooms proceed in parallel.

use std::{
    any::Any,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    panic::AssertUnwindSafe,
    sync::Arc,
};

use futures_util::FutureExt;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::domain::{EventEnvelope, EventPublisher, MessagePushError, RoomKey};

use super::room_directory::RoomDirectory;

#[derive(Debug, Error)]
enum DeliveryError {
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}

pub struct EventDispatcher {
    queues: Vec<mpsc::UnboundedSender<EventEnvelope>>,
    workers: Vec<JoinHandle<()>>,
}

impl EventDispatcher {
    /// Spawn `workers` delivery tasks on the current runtime.
    ///
    /// A worker count of zero is treated as one.
    pub fn start(room_directory: Arc<RoomDirectory>, workers: usize) -> Self {
        let count = workers.max(1);
        let mut queues = Vec::with_capacity(count);
        let mut handles = Vec::with_capacity(count);

        for index in 0..count {
            let (tx, rx) = mpsc::unbounded_channel();
            queues.push(tx);
            handles.push(tokio::spawn(worker_loop(index, rx, room_directory.clone())));
        }
        tracing::info!("Event dispatcher started with {} worker(s)", count);

        Self {
            queues,
            workers: handles,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.queues.len()
    }

    /// Stop every worker. Envelopes still queued are dropped and later
    /// submissions are logged and discarded.
    pub fn shutdown(&self) {
        for worker in &self.workers {
            worker.abort();
        }
        tracing::info!("Event dispatcher stopped");
    }

    fn worker_for(&self, room: &RoomKey) -> usize {
        let mut hasher = DefaultHasher::new();
        room.hash(&mut hasher);
        (hasher.finish() % self.queues.len() as u64) as usize
    }
}

impl EventPublisher for EventDispatcher {
    fn submit(&self, envelope: EventEnvelope) {
        let index = self.worker_for(&envelope.room);
        if let Err(mpsc::error::SendError(envelope)) = self.queues[index].send(envelope) {
            tracing::warn!(
                "Delivery worker {} is gone, dropping '{}' for room '{}'",
                index,
                envelope.event.name(),
                envelope.room
            );
        }
    }
}

async fn worker_loop(
    index: usize,
    mut rx: mpsc::UnboundedReceiver<EventEnvelope>,
    room_directory: Arc<RoomDirectory>,
) {
    while let Some(envelope) = rx.recv().await {
        let event_name = envelope.event.name();
        let room = envelope.room.clone();

        let outcome = AssertUnwindSafe(deliver(&room_directory, envelope))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(delivered)) => {
                tracing::debug!(
                    "Worker {} delivered '{}' to {} member(s) of '{}'",
                    index,
                    event_name,
                    delivered,
                    room
                );
            }
            Ok(Err(e)) => {
                tracing::error!(
                    "Worker {} failed to deliver '{}' to '{}': {}",
                    index,
                    event_name,
                    room,
                    e
                );
            }
            Err(panic) => {
                tracing::error!(
                    "Worker {} panicked while delivering '{}' to '{}': {}",
                    index,
                    event_name,
                    room,
                    panic_message(panic.as_ref())
                );
            }
        }
    }
    tracing::debug!("Delivery worker {} exiting", index);
}

async fn deliver(room_directory: &RoomDirectory, envelope: EventEnvelope) -> Result<usize, DeliveryError> {
    let frame = envelope.event.to_frame()?;
    Ok(room_directory.broadcast(&envelope.room, &frame).await?)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
