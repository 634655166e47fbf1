//! Types for the event queue.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the event queue.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Acknowledge failed: {0}")]
    Acknowledge(String),
}

/// One message pulled from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Queue-assigned message id (for logging).
    pub id: String,
    /// Raw message body.
    pub body: String,
    /// Opaque handle used to acknowledge (delete) the message.
    pub receipt: String,
}

/// Trait for event queue backends.
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Wait for the next batch of messages.
    ///
    /// May block for the backend's long-poll period and then return an empty
    /// batch.
    async fn receive(&self) -> Result<Vec<QueueMessage>, QueueError>;

    /// Acknowledge a processed message so it is not redelivered.
    async fn acknowledge(&self, message: &QueueMessage) -> Result<(), QueueError>;
}
