//! Mock event queue for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

use crate::queue::{EventQueue, QueueError, QueueMessage};

/// Mock implementation of the EventQueue trait.
///
/// `receive` behaves like a long poll: it returns pending messages at once, or
/// waits up to the configured wait time for one to be pushed.
///
/// # Example
///
/// ```rust,ignore
/// use framewatch_core::testing::{fixtures, MockEventQueue};
///
/// let queue = MockEventQueue::new();
/// queue.push_event(fixtures::state_change_event("C", "STARTING", 0)).await;
///
/// let batch = queue.receive().await?;
/// queue.acknowledge(&batch[0]).await?;
/// assert_eq!(queue.acknowledged().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockEventQueue {
    pending: Arc<RwLock<VecDeque<QueueMessage>>>,
    /// Receipt handles of acknowledged messages.
    acknowledged: Arc<RwLock<Vec<String>>>,
    arrivals: Arc<Notify>,
    next_id: AtomicU64,
    wait: Arc<RwLock<Duration>>,
    max_batch: usize,
    receive_failures: Arc<RwLock<u32>>,
    fail_acks: Arc<RwLock<bool>>,
    receives: Arc<RwLock<usize>>,
}

impl Default for MockEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEventQueue {
    /// Create an empty queue with a one second long-poll wait.
    pub fn new() -> Self {
        Self {
            pending: Arc::new(RwLock::new(VecDeque::new())),
            acknowledged: Arc::new(RwLock::new(Vec::new())),
            arrivals: Arc::new(Notify::new()),
            next_id: AtomicU64::new(1),
            wait: Arc::new(RwLock::new(Duration::from_secs(1))),
            max_batch: 10,
            receive_failures: Arc::new(RwLock::new(0)),
            fail_acks: Arc::new(RwLock::new(false)),
            receives: Arc::new(RwLock::new(0)),
        }
    }

    /// Enqueue a message with the given body, returning its receipt handle.
    pub async fn push_event(&self, body: impl Into<String>) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let receipt = format!("receipt-{}", n);
        self.pending.write().await.push_back(QueueMessage {
            id: format!("msg-{}", n),
            body: body.into(),
            receipt: receipt.clone(),
        });
        self.arrivals.notify_one();
        receipt
    }

    /// Get receipt handles of every acknowledged message.
    pub async fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.read().await.clone()
    }

    /// Get the number of messages not yet received.
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Get the number of receive calls.
    pub async fn receive_count(&self) -> usize {
        *self.receives.read().await
    }

    /// Set how long an empty receive waits before returning.
    pub async fn set_wait(&self, wait: Duration) {
        *self.wait.write().await = wait;
    }

    /// Fail the next `count` receive calls.
    pub async fn fail_next_receives(&self, count: u32) {
        *self.receive_failures.write().await = count;
    }

    /// Make acknowledgements fail.
    pub async fn fail_acknowledgements(&self, fail: bool) {
        *self.fail_acks.write().await = fail;
    }

    async fn drain(&self) -> Vec<QueueMessage> {
        let mut pending = self.pending.write().await;
        let n = pending.len().min(self.max_batch);
        pending.drain(..n).collect()
    }
}

#[async_trait]
impl EventQueue for MockEventQueue {
    fn name(&self) -> &str {
        "mock"
    }

    async fn receive(&self) -> Result<Vec<QueueMessage>, QueueError> {
        *self.receives.write().await += 1;

        {
            let mut failures = self.receive_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(QueueError::Receive("mock connectivity failure".to_string()));
            }
        }

        let batch = self.drain().await;
        if !batch.is_empty() {
            return Ok(batch);
        }

        let wait = *self.wait.read().await;
        tokio::select! {
            _ = self.arrivals.notified() => {}
            _ = tokio::time::sleep(wait) => {}
        }
        Ok(self.drain().await)
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Result<(), QueueError> {
        if *self.fail_acks.read().await {
            return Err(QueueError::Acknowledge("mock acknowledge failure".to_string()));
        }
        self.acknowledged.write().await.push(message.receipt.clone());
        Ok(())
    }
}
