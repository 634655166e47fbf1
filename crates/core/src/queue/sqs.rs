//! SQS event queue.

use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use aws_sdk_sqs::Client;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::QueueConfig;
use crate::metrics::record_external_call;

use super::{EventQueue, QueueError, QueueMessage};

/// Long-polling SQS consumer.
///
/// The queue URL is resolved from the queue name on first use, so building
/// the queue never touches the network.
#[derive(Debug)]
pub struct SqsEventQueue {
    client: Client,
    config: QueueConfig,
    queue_url: OnceCell<String>,
}

impl SqsEventQueue {
    pub fn new(client: Client, config: QueueConfig) -> Self {
        Self {
            client,
            config,
            queue_url: OnceCell::new(),
        }
    }

    async fn queue_url(&self) -> Result<&str, QueueError> {
        let url = self
            .queue_url
            .get_or_try_init(|| async {
                let started = Instant::now();
                let result = self
                    .client
                    .get_queue_url()
                    .queue_name(&self.config.name)
                    .send()
                    .await;
                record_external_call("sqs", "get_queue_url", started, result.is_ok());

                let output = result
                    .map_err(|e| QueueError::QueueNotFound(DisplayErrorContext(&e).to_string()))?;
                let url = output
                    .queue_url
                    .ok_or_else(|| QueueError::QueueNotFound(self.config.name.clone()))?;
                info!(queue = %self.config.name, url = %url, "Resolved queue URL");
                Ok::<_, QueueError>(url)
            })
            .await?;
        Ok(url.as_str())
    }
}

#[async_trait]
impl EventQueue for SqsEventQueue {
    fn name(&self) -> &str {
        "sqs"
    }

    async fn receive(&self) -> Result<Vec<QueueMessage>, QueueError> {
        let url = self.queue_url().await?;

        let started = Instant::now();
        let result = self
            .client
            .receive_message()
            .queue_url(url)
            .wait_time_seconds(self.config.wait_time_secs as i32)
            .max_number_of_messages(self.config.max_messages as i32)
            .send()
            .await;
        record_external_call("sqs", "receive_message", started, result.is_ok());

        let output = result.map_err(|e| QueueError::Receive(DisplayErrorContext(&e).to_string()))?;
        let messages: Vec<QueueMessage> = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(to_queue_message)
            .collect();

        debug!(count = messages.len(), "Received queue messages");
        Ok(messages)
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let url = self.queue_url().await?;

        let started = Instant::now();
        let result = self
            .client
            .delete_message()
            .queue_url(url)
            .receipt_handle(&message.receipt)
            .send()
            .await;
        record_external_call("sqs", "delete_message", started, result.is_ok());

        result.map_err(|e| QueueError::Acknowledge(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

/// Map an SQS message into a [`QueueMessage`], or `None` if it has no receipt
/// handle and so can never be acknowledged.
fn to_queue_message(message: Message) -> Option<QueueMessage> {
    let id = message.message_id.unwrap_or_default();
    let Some(receipt) = message.receipt_handle else {
        warn!(message_id = %id, "Message without receipt handle, cannot acknowledge");
        return None;
    };
    Some(QueueMessage {
        id,
        body: message.body.unwrap_or_default(),
        receipt,
    })
}
