//! Fleet event dispatcher.
//!
//! Brings the registry in line with the fleet at startup, then consumes
//! lifecycle notifications from the event queue and turns them into registry
//! starts and stops.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::fleet::{EventDecodeError, FleetEvent};
use crate::inventory::FleetInventory;
use crate::metrics::{FLEET_EVENTS, QUEUE_ACK_ERRORS, QUEUE_RECEIVE_ERRORS};
use crate::queue::{EventQueue, QueueError, QueueMessage};

use super::config::DispatcherConfig;
use super::registry::WorkerRegistry;
use super::types::{DispatchAction, StartOutcome};

pub struct FleetEventDispatcher {
    registry: Arc<WorkerRegistry>,
    queue: Arc<dyn EventQueue>,
    inventory: Arc<dyn FleetInventory>,
    config: DispatcherConfig,
}

impl FleetEventDispatcher {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        queue: Arc<dyn EventQueue>,
        inventory: Arc<dyn FleetInventory>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            queue,
            inventory,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Start a worker for every pipeline of every active group.
    ///
    /// Returns the number of workers started. An inventory failure is logged
    /// and starts nothing.
    pub async fn reconcile(&self) -> usize {
        let groups = match self.inventory.active_groups().await {
            Ok(groups) => groups,
            Err(e) => {
                error!(
                    inventory = self.inventory.name(),
                    error = %e,
                    "Failed to list active pipeline groups"
                );
                return 0;
            }
        };

        info!(groups = groups.len(), "Reconciling active pipeline groups");

        let mut started = 0;
        let mut first = true;
        for group in &groups {
            for key in group.pipeline_keys() {
                if !first {
                    if let Some(delay) = self.stagger_delay() {
                        tokio::time::sleep(delay).await;
                    }
                }
                first = false;

                if self.registry.start(key).await == StartOutcome::Started {
                    started += 1;
                }
            }
        }

        info!(started, "Startup reconciliation complete");
        started
    }

    /// Random pause between startup starts, in `[1s, interval - 1s]`.
    fn stagger_delay(&self) -> Option<Duration> {
        if !self.config.stagger {
            return None;
        }
        let interval_ms = u64::try_from(self.config.interval.as_millis()).unwrap_or(u64::MAX);
        if interval_ms < 2000 {
            return None;
        }
        let ms = rand::rng().random_range(1000..=interval_ms - 1000);
        Some(Duration::from_millis(ms))
    }

    /// Decode one message and apply it to the registry.
    ///
    /// Does not acknowledge the message.
    pub async fn handle_message(
        &self,
        message: &QueueMessage,
    ) -> Result<DispatchAction, EventDecodeError> {
        let event = FleetEvent::from_json(&message.body)?;
        Ok(self.apply(event).await)
    }

    /// Apply a decoded lifecycle event to the registry.
    pub async fn apply(&self, event: FleetEvent) -> DispatchAction {
        let FleetEvent { key, state } = event;

        if state.is_active() {
            let outcome = self.registry.start(key.clone()).await;
            DispatchAction::Start { key, outcome }
        } else if state.is_inactive() {
            let stopped = self.registry.stop(&key).await;
            DispatchAction::Stop { key, stopped }
        } else {
            DispatchAction::Ignored { key, state }
        }
    }

    /// Handle one message and always acknowledge it afterwards.
    pub async fn process_message(&self, message: &QueueMessage) {
        match self.handle_message(message).await {
            Ok(action) => {
                FLEET_EVENTS.with_label_values(&[action.as_str()]).inc();
                match &action {
                    DispatchAction::Ignored { key, state } => {
                        debug!(pipeline_key = %key, state = %state, "Ignoring lifecycle state");
                    }
                    other => {
                        debug!(message_id = %message.id, action = ?other, "Applied fleet event");
                    }
                }
            }
            Err(e) => {
                FLEET_EVENTS.with_label_values(&["malformed"]).inc();
                warn!(message_id = %message.id, error = %e, "Discarding malformed fleet event");
            }
        }

        if let Err(e) = self.queue.acknowledge(message).await {
            QUEUE_ACK_ERRORS.inc();
            error!(message_id = %message.id, error = %e, "Failed to acknowledge message");
        }
    }

    async fn process_batch(&self, messages: &[QueueMessage]) {
        for message in messages {
            self.process_message(message).await;
        }
    }

    /// Receive one batch and process every message in it.
    ///
    /// Returns the number of messages processed.
    pub async fn poll_once(&self) -> Result<usize, QueueError> {
        let messages = self.queue.receive().await?;
        self.process_batch(&messages).await;
        Ok(messages.len())
    }

    /// Consume fleet events until `shutdown` is cancelled.
    ///
    /// Receive failures never end the loop.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(queue = self.queue.name(), "Listening for fleet events");

        loop {
            let received = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                result = self.queue.receive() => result,
            };

            match received {
                Ok(messages) => self.process_batch(&messages).await,
                Err(e) => {
                    QUEUE_RECEIVE_ERRORS.inc();
                    error!(queue = self.queue.name(), error = %e, "Failed to receive fleet events");

                    let backoff = self.config.receive_error_backoff;
                    if !backoff.is_zero() {
                        tokio::select! {
                            biased;

                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                }
            }
        }

        info!("Fleet event dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::LifecycleState;
    use crate::monitor::{WorkerAdapters, WorkerConfig};
    use crate::testing::{
        fixtures, MockEventQueue, MockInventory, MockPublisher, MockSampler, MockScorer,
    };

    struct Harness {
        queue: Arc<MockEventQueue>,
        inventory: Arc<MockInventory>,
        dispatcher: FleetEventDispatcher,
    }

    fn harness(config: DispatcherConfig) -> Harness {
        let adapters = WorkerAdapters {
            sampler: Arc::new(MockSampler::new()),
            scorer: Arc::new(MockScorer::new()),
            publisher: Arc::new(MockPublisher::new()),
        };
        let registry = Arc::new(WorkerRegistry::new(adapters, WorkerConfig::default()));
        let queue = Arc::new(MockEventQueue::new());
        let inventory = Arc::new(MockInventory::new());
        let dispatcher =
            FleetEventDispatcher::new(registry, queue.clone(), inventory.clone(), config);
        Harness {
            queue,
            inventory,
            dispatcher,
        }
    }

    fn message(body: &str) -> QueueMessage {
        QueueMessage {
            id: "m-1".to_string(),
            body: body.to_string(),
            receipt: "r-1".to_string(),
        }
    }

    #[test]
    fn test_stagger_delay_bounds() {
        let h = harness(DispatcherConfig {
            interval: Duration::from_secs(3),
            ..DispatcherConfig::default()
        });
        for _ in 0..100 {
            let delay = h.dispatcher.stagger_delay().unwrap();
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(2));
        }
    }

    #[test]
    fn test_stagger_skipped_for_short_interval_or_disabled() {
        let short = harness(DispatcherConfig {
            interval: Duration::from_secs(1),
            ..DispatcherConfig::default()
        });
        assert_eq!(short.dispatcher.stagger_delay(), None);

        let disabled = harness(DispatcherConfig {
            stagger: false,
            ..DispatcherConfig::default()
        });
        assert_eq!(disabled.dispatcher.stagger_delay(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_start_and_stop() {
        let h = harness(DispatcherConfig::default());
        let key = fixtures::key("C", 0);

        let action = h
            .dispatcher
            .apply(FleetEvent {
                key: key.clone(),
                state: LifecycleState::Starting,
            })
            .await;
        assert_eq!(
            action,
            DispatchAction::Start {
                key: key.clone(),
                outcome: StartOutcome::Started
            }
        );

        let action = h
            .dispatcher
            .apply(FleetEvent {
                key: key.clone(),
                state: LifecycleState::Stopped,
            })
            .await;
        assert_eq!(
            action,
            DispatchAction::Stop {
                key: key.clone(),
                stopped: vec![key.clone()]
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_ignores_other_states() {
        let h = harness(DispatcherConfig::default());
        let key = fixtures::key("C", 0);
        let state = LifecycleState::parse("UPDATING");

        let action = h
            .dispatcher
            .apply(FleetEvent {
                key: key.clone(),
                state: state.clone(),
            })
            .await;

        assert_eq!(action, DispatchAction::Ignored { key, state });
        assert!(h.dispatcher.registry().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_message_is_acknowledged() {
        let h = harness(DispatcherConfig::default());
        let msg = message("{not json");

        assert!(h.dispatcher.handle_message(&msg).await.is_err());
        h.dispatcher.process_message(&msg).await;

        assert_eq!(h.queue.acknowledged().await, vec!["r-1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ack_failure_is_not_fatal() {
        let h = harness(DispatcherConfig::default());
        h.queue.fail_acknowledgements(true).await;

        h.dispatcher
            .process_message(&message(&fixtures::state_change_event("C", "RUNNING", 0)))
            .await;

        assert!(h.dispatcher.registry().is_active(&fixtures::key("C", 0)).await);
        assert!(h.queue.acknowledged().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_inventory_failure_starts_nothing() {
        let h = harness(DispatcherConfig::default());
        h.inventory.set_failure(true).await;

        assert_eq!(h.dispatcher.reconcile().await, 0);
        assert!(h.dispatcher.registry().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_and_poll_once_process_batches_alike() {
        let h = harness(DispatcherConfig::default());
        let key = fixtures::key("C", 0);

        h.queue
            .push_event(fixtures::state_change_event("C", "RUNNING", 0))
            .await;
        h.queue.push_event("{not json").await;
        assert_eq!(h.dispatcher.poll_once().await.unwrap(), 2);
        assert!(h.dispatcher.registry().is_active(&key).await);
        assert_eq!(h.queue.acknowledged().await.len(), 2);

        h.queue
            .push_event(fixtures::state_change_event("C", "STOPPED", 0))
            .await;
        h.queue.push_event("{not json").await;

        let shutdown = CancellationToken::new();
        let run = h.dispatcher.run(shutdown.clone());
        tokio::pin!(run);
        tokio::select! {
            _ = &mut run => panic!("dispatcher exited before shutdown"),
            _ = tokio::time::sleep(Duration::from_secs(5)) => {}
        }

        assert!(!h.dispatcher.registry().is_active(&key).await);
        assert_eq!(h.queue.acknowledged().await.len(), 4);

        shutdown.cancel();
        run.await;
    }
}
