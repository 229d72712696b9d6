//! Task record store
//!
//! Process-lifetime mapping from task id to its current record. Records are
//! never deleted; a second `put` for the same id replaces the first.

use appforge_core::{AppforgeError, Result, TaskId, TaskRecord, TaskStatus};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage for task records
///
/// Calls are synchronous and must not be held across an await.
pub trait TaskStore: Send + Sync {
    /// Insert or replace the record under its own id
    fn put(&self, record: TaskRecord);

    /// Fetch a copy of a record, `NotFound` if absent
    fn get(&self, id: &TaskId) -> Result<TaskRecord>;

    /// Overwrite the status of an existing record
    fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<()>;

    /// Record the repository created or updated for an existing record
    fn set_repository(&self, id: &TaskId, repo_name: &str) -> Result<()>;

    fn contains(&self, id: &TaskId) -> bool;
}

/// [`TaskStore`] over a lock-guarded hash map
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    records: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn update<F>(&self, id: &TaskId, apply: F) -> Result<()>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| AppforgeError::NotFound(format!("Task {} not found", id)))?;
        apply(record);
        record.updated_at = Utc::now();
        Ok(())
    }
}

impl TaskStore for InMemoryTaskStore {
    fn put(&self, record: TaskRecord) {
        self.records.write().insert(record.id.clone(), record);
    }

    fn get(&self, id: &TaskId) -> Result<TaskRecord> {
        self.records
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AppforgeError::NotFound(format!("Task {} not found", id)))
    }

    fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        self.update(id, |record| record.status = status)
    }

    fn set_repository(&self, id: &TaskId, repo_name: &str) -> Result<()> {
        self.update(id, |record| record.repo_name = Some(repo_name.to_string()))
    }

    fn contains(&self, id: &TaskId) -> bool {
        self.records.read().contains_key(id)
    }
}
