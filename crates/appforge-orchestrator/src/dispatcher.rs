//! Request acceptance
//!
//! Checks an inbound request, records it as `processing` and schedules its
//! pipeline. Acceptance returns as soon as the run is spawned.

use crate::scheduler::RunScheduler;
use crate::secrets::SecretRegistry;
use crate::store::TaskStore;
use appforge_core::{
    AppforgeError, RequestKind, Result, TaskId, TaskRecord, TaskRequest, TaskStatus,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Entry point from the HTTP surface into the orchestrator
#[derive(Clone)]
pub struct Dispatcher {
    secrets: Arc<dyn SecretRegistry>,
    store: Arc<dyn TaskStore>,
    scheduler: RunScheduler,
}

impl Dispatcher {
    pub fn new(secrets: Arc<dyn SecretRegistry>, scheduler: RunScheduler) -> Self {
        let store = scheduler.orchestrator().store().clone();
        Self {
            secrets,
            store,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &RunScheduler {
        &self.scheduler
    }

    /// Accept a request and schedule its pipeline
    ///
    /// Checks run in order: request shape (`Validation`), secret (`Auth`),
    /// then for revisions the existence of `{task}-1` (`NotFound`). The
    /// round-1 record only has to exist; its status does not matter.
    pub fn accept(&self, kind: RequestKind, request: TaskRequest) -> Result<TaskId> {
        self.submit(kind, request).map(|(id, _)| id)
    }

    /// Like [`Dispatcher::accept`], also returning the run's handle
    pub fn submit(
        &self,
        kind: RequestKind,
        request: TaskRequest,
    ) -> Result<(TaskId, JoinHandle<TaskStatus>)> {
        request.validate(kind)?;

        if !self.secrets.verify(&request.email, &request.secret) {
            return Err(AppforgeError::Auth("Invalid secret".to_string()));
        }

        if kind == RequestKind::Revision && !self.store.contains(&TaskId::build_of(&request.task)) {
            return Err(AppforgeError::NotFound("Original task not found".to_string()));
        }

        let record = TaskRecord::accepted(request.clone());
        let id = record.id.clone();
        self.store.put(record);
        tracing::info!("Accepted {} request {}", kind, id);

        let handle = self.scheduler.schedule(kind, request);
        Ok((id, handle))
    }

    /// Current record for a task id
    pub fn status(&self, id: &TaskId) -> Result<TaskRecord> {
        self.store.get(id)
    }
}
