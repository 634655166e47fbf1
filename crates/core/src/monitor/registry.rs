//! Registry of running monitoring workers, keyed by pipeline.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fleet::PipelineKey;
use crate::metrics::REGISTRY_OPERATIONS;

use super::config::WorkerConfig;
use super::types::{StartOutcome, WorkerInfo};
use super::worker::{MonitoringWorker, WorkerAdapters};

/// A spawned worker and the token that stops it.
struct WorkerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

/// Owns every monitoring worker in the process.
///
/// `start` and `stop` take the same lock for their whole check-and-mutate
/// sequence, so for any key there is at most one handle and a stop racing a
/// start always sees either nothing or the complete handle.
pub struct WorkerRegistry {
    adapters: WorkerAdapters,
    config: WorkerConfig,
    workers: Mutex<HashMap<PipelineKey, WorkerHandle>>,
    root: CancellationToken,
}

impl WorkerRegistry {
    pub fn new(adapters: WorkerAdapters, config: WorkerConfig) -> Self {
        Self {
            adapters,
            config,
            workers: Mutex::new(HashMap::new()),
            root: CancellationToken::new(),
        }
    }

    /// Start monitoring `key` unless a worker for it already exists.
    pub async fn start(&self, key: PipelineKey) -> StartOutcome {
        let mut workers = self.workers.lock().await;

        if self.root.is_cancelled() {
            debug!(pipeline_key = %key, "Registry shut down, not starting worker");
            REGISTRY_OPERATIONS
                .with_label_values(&["start", "skipped"])
                .inc();
            return StartOutcome::ShuttingDown;
        }

        if let Some(existing) = workers.get(&key) {
            if !existing.task.is_finished() {
                debug!(pipeline_key = %key, "Worker already running, skipping start");
                REGISTRY_OPERATIONS
                    .with_label_values(&["start", "skipped"])
                    .inc();
                return StartOutcome::AlreadyRunning;
            }
            // Only a panic ends a worker without its token being cancelled
            warn!(pipeline_key = %key, "Replacing worker that exited unexpectedly");
        }

        let cancel = self.root.child_token();
        let worker = MonitoringWorker::new(key.clone(), self.adapters.clone(), self.config.clone());
        let task = tokio::spawn(worker.run(cancel.clone()));

        workers.insert(
            key.clone(),
            WorkerHandle {
                cancel,
                task,
                started_at: Utc::now(),
            },
        );

        info!(group = %key.group, pipeline = key.pipeline, "Started monitoring pipeline");
        REGISTRY_OPERATIONS
            .with_label_values(&["start", "started"])
            .inc();
        StartOutcome::Started
    }

    /// Stop monitoring `key`, returning the keys whose workers were stopped.
    ///
    /// Stopping pipeline 0 also stops pipeline 1 of the same group. Returns
    /// without waiting for the workers to exit.
    pub async fn stop(&self, key: &PipelineKey) -> Vec<PipelineKey> {
        let mut targets = vec![key.clone()];
        if key.pipeline == 0 {
            targets.push(key.sibling(1));
        }

        let mut workers = self.workers.lock().await;
        let mut stopped = Vec::new();

        for target in targets {
            match workers.remove(&target) {
                Some(handle) => {
                    handle.cancel.cancel();
                    info!(
                        group = %target.group,
                        pipeline = target.pipeline,
                        "Stopped monitoring pipeline"
                    );
                    REGISTRY_OPERATIONS
                        .with_label_values(&["stop", "stopped"])
                        .inc();
                    stopped.push(target);
                }
                None => {
                    debug!(pipeline_key = %target, "No worker to stop");
                    REGISTRY_OPERATIONS
                        .with_label_values(&["stop", "absent"])
                        .inc();
                }
            }
        }

        stopped
    }

    /// Whether a worker for `key` is registered.
    pub async fn is_active(&self, key: &PipelineKey) -> bool {
        self.workers.lock().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.workers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workers.lock().await.is_empty()
    }

    /// Registered keys in sorted order.
    pub async fn active_keys(&self) -> Vec<PipelineKey> {
        let mut keys: Vec<PipelineKey> = self.workers.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of registered workers, sorted by key.
    pub async fn workers(&self) -> Vec<WorkerInfo> {
        let mut infos: Vec<WorkerInfo> = self
            .workers
            .lock()
            .await
            .iter()
            .map(|(key, handle)| WorkerInfo {
                key: key.clone(),
                started_at: handle.started_at,
            })
            .collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }

    /// Cancel every worker and wait up to `grace` for them to exit.
    ///
    /// After shutdown the registry refuses new starts.
    pub async fn shutdown(&self, grace: Duration) {
        let handles: Vec<WorkerHandle> = {
            let mut workers = self.workers.lock().await;
            self.root.cancel();
            workers.drain().map(|(_, handle)| handle).collect()
        };

        if handles.is_empty() {
            return;
        }

        let count = handles.len();
        info!(workers = count, "Waiting for workers to exit");

        let tasks = handles.into_iter().map(|handle| handle.task);
        match tokio::time::timeout(grace, futures::future::join_all(tasks)).await {
            Ok(results) => {
                let panicked = results.iter().filter(|r| r.is_err()).count();
                if panicked > 0 {
                    warn!(panicked, "Some workers ended abnormally");
                }
                debug!(workers = count, "All workers exited");
            }
            Err(_) => {
                warn!(
                    workers = count,
                    grace_secs = grace.as_secs_f64(),
                    "Workers did not exit within grace period"
                );
            }
        }
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("adapters", &self.adapters)
            .field("config", &self.config)
            .field("shut_down", &self.root.is_cancelled())
            .finish_non_exhaustive()
    }
}
