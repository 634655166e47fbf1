//! Worker lifecycle integration tests.
//!
//! These tests drive the worker registry with mock adapters on a paused clock:
//! - Idempotent start and stop
//! - Primary-stop compensation for the secondary pipeline
//! - Difference publishing and baseline reset after failures
//! - Bounded work after a stop

use std::sync::Arc;
use std::time::Duration;

use framewatch_core::{
    sampler::SamplerError,
    scorer::ScorerError,
    testing::{fixtures, MockPublisher, MockSampler, MockScorer},
    StartOutcome, WorkerAdapters, WorkerConfig, WorkerRegistry,
};

/// Test helper holding the registry and its mocks.
struct TestHarness {
    registry: Arc<WorkerRegistry>,
    sampler: Arc<MockSampler>,
    scorer: Arc<MockScorer>,
    publisher: Arc<MockPublisher>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(WorkerConfig {
            interval: Duration::from_secs(10),
            publish_retries: 0,
            publish_retry_delay: Duration::from_millis(100),
        })
    }

    fn with_config(config: WorkerConfig) -> Self {
        let sampler = Arc::new(MockSampler::new());
        let scorer = Arc::new(MockScorer::new());
        let publisher = Arc::new(MockPublisher::new());
        let adapters = WorkerAdapters {
            sampler: sampler.clone(),
            scorer: scorer.clone(),
            publisher: publisher.clone(),
        };

        Self {
            registry: Arc::new(WorkerRegistry::new(adapters, config)),
            sampler,
            scorer,
            publisher,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_yields_one_worker() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);

    assert_eq!(h.registry.start(key.clone()).await, StartOutcome::Started);
    assert_eq!(h.registry.start(key.clone()).await, StartOutcome::AlreadyRunning);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.registry.active_keys().await, vec![key.clone()]);
    // One worker means one sample per interval
    assert_eq!(h.sampler.calls_for(&key).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_starts_yield_one_worker() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);

    let (first, second) = tokio::join!(h.registry.start(key.clone()), h.registry.start(key.clone()));

    let mut outcomes = [first, second];
    outcomes.sort_by_key(|o| *o != StartOutcome::Started);
    assert_eq!(outcomes, [StartOutcome::Started, StartOutcome::AlreadyRunning]);
    assert_eq!(h.registry.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_without_worker_is_noop() {
    let h = TestHarness::new();

    assert!(h.registry.stop(&fixtures::key("A", 0)).await.is_empty());
    assert!(h.registry.stop(&fixtures::key("A", 1)).await.is_empty());
    assert!(h.registry.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 1);
    h.registry.start(key.clone()).await;

    assert_eq!(h.registry.stop(&key).await, vec![key.clone()]);
    assert!(h.registry.stop(&key).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_primary_stops_secondary() {
    let h = TestHarness::new();
    h.registry.start(fixtures::key("B", 0)).await;
    h.registry.start(fixtures::key("B", 1)).await;
    h.registry.start(fixtures::key("C", 1)).await;

    h.registry.stop(&fixtures::key("B", 0)).await;
    assert_eq!(h.registry.active_keys().await, vec![fixtures::key("C", 1)]);

    // Compensation is harmless when the secondary is not running
    h.registry.start(fixtures::key("D", 0)).await;
    assert_eq!(
        h.registry.stop(&fixtures::key("D", 0)).await,
        vec![fixtures::key("D", 0)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_scores_publish_difference() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);
    h.scorer.push_scores(&[42.0, 50.0]).await;

    h.registry.start(key.clone()).await;
    // Iterations at t=0 and t=10
    tokio::time::sleep(Duration::from_secs(15)).await;

    assert_eq!(h.publisher.values_for(&key).await, vec![8.0]);
    let point = &h.publisher.published().await[0];
    assert_eq!(point.key, key);
}

#[tokio::test(start_paused = true)]
async fn test_score_failure_skips_two_publishes() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);
    h.scorer.push_score(10.0).await;
    h.scorer.push_score(12.0).await;
    h.scorer
        .push_error(ScorerError::Api("throttled".to_string()))
        .await;
    h.scorer.push_scores(&[20.0, 25.0]).await;

    h.registry.start(key.clone()).await;
    // Iterations at t=0, 10, 20, 30, 40
    tokio::time::sleep(Duration::from_secs(45)).await;

    // 10 -> 12 publishes 2, the failure resets, 20 is a new baseline, 25 publishes 5
    assert_eq!(h.publisher.values_for(&key).await, vec![2.0, 5.0]);
}

#[tokio::test(start_paused = true)]
async fn test_sample_failure_skips_two_publishes() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);
    h.scorer.push_scores(&[10.0, 30.0, 31.0]).await;
    h.sampler.push_sample(fixtures::sample()).await;
    h.sampler.push_error(SamplerError::Empty).await;

    h.registry.start(key.clone()).await;
    // Iterations at t=0 (baseline), 10 (no sample), 20 (baseline), 30 (publish)
    tokio::time::sleep(Duration::from_secs(35)).await;

    assert_eq!(h.publisher.values_for(&key).await, vec![1.0]);
    // The failed iteration never reached the scorer
    assert_eq!(h.scorer.call_count().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_publish_failure_does_not_end_worker() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);
    h.scorer.push_scores(&[1.0, 4.0, 9.0]).await;
    h.publisher.fail_next(1).await;

    h.registry.start(key.clone()).await;
    tokio::time::sleep(Duration::from_secs(25)).await;

    // 4 - 1 was dropped, 9 - 4 still published against the advanced baseline
    assert_eq!(h.publisher.values_for(&key).await, vec![5.0]);
    assert!(h.registry.is_active(&key).await);
}

#[tokio::test(start_paused = true)]
async fn test_slow_iteration_shortens_wait() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);
    h.sampler.set_delay(Duration::from_secs(4)).await;

    h.registry.start(key.clone()).await;
    // Iterations start at t=0, 10, 20 regardless of the 4s sample latency
    tokio::time::sleep(Duration::from_secs(21)).await;

    assert_eq!(h.sampler.calls_for(&key).await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_iteration_finishes_at_most_one_iteration() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);
    h.sampler.set_delay(Duration::from_secs(2)).await;

    h.registry.start(key.clone()).await;
    // Second iteration is sampling at t=11
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(h.sampler.calls_for(&key).await, 2);

    h.registry.stop(&key).await;
    assert!(!h.registry.is_active(&key).await);

    tokio::time::sleep(Duration::from_secs(60)).await;
    // The in-flight iteration completed, nothing after it
    assert_eq!(h.sampler.calls_for(&key).await, 2);
    assert_eq!(h.scorer.call_count().await, 2);
    assert_eq!(h.publisher.attempt_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_wait_exits_promptly() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);

    h.registry.start(key.clone()).await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    h.registry.stop(&key).await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.sampler.calls_for(&key).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop_starts_fresh_baseline() {
    let h = TestHarness::new();
    let key = fixtures::key("A", 0);
    h.scorer.push_scores(&[10.0, 50.0, 53.0]).await;

    h.registry.start(key.clone()).await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    h.registry.stop(&key).await;
    tokio::task::yield_now().await;

    assert_eq!(h.registry.start(key.clone()).await, StartOutcome::Started);
    tokio::time::sleep(Duration::from_secs(15)).await;

    // 50 is a baseline for the new worker, not a difference against 10
    assert_eq!(h.publisher.values_for(&key).await, vec![3.0]);
}

#[tokio::test(start_paused = true)]
async fn test_workers_are_independent() {
    let h = TestHarness::new();
    h.registry.start(fixtures::key("A", 0)).await;
    h.registry.start(fixtures::key("A", 1)).await;
    h.registry.start(fixtures::key("B", 0)).await;

    tokio::time::sleep(Duration::from_secs(25)).await;

    for key in h.registry.active_keys().await {
        assert_eq!(h.sampler.calls_for(&key).await, 3);
    }
    assert_eq!(h.sampler.call_count().await, 9);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_everything() {
    let h = TestHarness::new();
    h.registry.start(fixtures::key("A", 0)).await;
    h.registry.start(fixtures::key("B", 0)).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    h.registry.shutdown(Duration::from_secs(5)).await;

    assert!(h.registry.is_empty().await);
    let calls = h.sampler.call_count().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.sampler.call_count().await, calls);
    assert_eq!(
        h.registry.start(fixtures::key("A", 0)).await,
        StartOutcome::ShuttingDown
    );
}
