//! Bounded, supervised scheduling of pipeline runs

use crate::orchestrator::Orchestrator;
use appforge_core::{RequestKind, TaskRequest, TaskStatus};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Spawns pipeline runs, at most `max_concurrent_runs` executing at once
///
/// Scheduling never waits: runs beyond the limit are spawned immediately
/// and queue on the semaphore inside their own task.
#[derive(Clone)]
pub struct RunScheduler {
    orchestrator: Arc<Orchestrator>,
    permits: Arc<Semaphore>,
    max_concurrent_runs: usize,
}

impl RunScheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, max_concurrent_runs: usize) -> Self {
        let max_concurrent_runs = max_concurrent_runs.max(1);
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(max_concurrent_runs)),
            max_concurrent_runs,
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn max_concurrent_runs(&self) -> usize {
        self.max_concurrent_runs
    }

    /// Runs currently holding a permit
    pub fn active_runs(&self) -> usize {
        self.max_concurrent_runs - self.permits.available_permits()
    }

    /// Spawn a supervised run; the handle resolves to the terminal status
    ///
    /// If the run panics the record is marked `failed`.
    pub fn schedule(&self, kind: RequestKind, request: TaskRequest) -> JoinHandle<TaskStatus> {
        let id = request.task_id();
        let orchestrator = self.orchestrator.clone();
        let permits = self.permits.clone();

        let run = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            match kind {
                RequestKind::Build => orchestrator.run_build(&request).await,
                RequestKind::Revision => orchestrator.run_revision(&request).await,
            }
        });

        let store = self.orchestrator.store().clone();
        tokio::spawn(async move {
            match run.await {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!("Pipeline run for {} aborted: {}", id, e);
                    if let Err(e) = store.set_status(&id, TaskStatus::Failed) {
                        tracing::error!("Failed to record status for {}: {}", id, e);
                    }
                    TaskStatus::Failed
                }
            }
        })
    }
}
