//! Task record store
//!
//! The task store is the only shared mutable structure in the engine. All
//! components reach it through the lifecycle manager, never by direct field
//! mutation. Implementations must serialize conflicting writes to the same
//! task id; [`MemoryTaskStore`] is the default, and hosts may plug in a
//! database- or cache-backed implementation through the same trait.

use crate::error::{Error, Result};
use crate::types::{Task, TaskId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A single atomic mutation applied to a task record
///
/// The closure runs under the store's write serialization for that record,
/// so a concurrent progress update and completion can never interleave into
/// an inconsistent record. Returning an error leaves the record untouched.
pub type TaskMutation = Box<dyn FnOnce(&mut Task) -> Result<()> + Send>;

/// Keyed record store for task metadata
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task record; the id must not already exist
    async fn insert(&self, task: Task) -> Result<()>;

    /// Fetch a task by id, or [`Error::TaskNotFound`]
    async fn get(&self, id: &TaskId) -> Result<Task>;

    /// Atomically read-modify-write a task record, returning the updated copy
    ///
    /// If the mutation returns an error the record is left unchanged and the
    /// error is propagated.
    async fn modify(&self, id: &TaskId, mutation: TaskMutation) -> Result<Task>;

    /// Snapshot of all task records, in no particular order
    async fn list(&self) -> Result<Vec<Task>>;

    /// Remove a task record by id
    async fn remove(&self, id: &TaskId) -> Result<()>;

    /// Remove a batch of task records, returning how many existed
    async fn remove_batch(&self, ids: &[TaskId]) -> Result<usize>;
}

/// In-memory task store
///
/// Backed by a single `RwLock<HashMap>`; the write lock is held for the
/// duration of each [`TaskStore::modify`] call, which gives per-record
/// write atomicity.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.task_id) {
            return Err(Error::TaskAlreadyExists(task.task_id.clone()));
        }
        tasks.insert(task.task_id.clone(), task);
        Ok(())
    }

    async fn get(&self, id: &TaskId) -> Result<Task> {
        let tasks = self.tasks.read().await;
        tasks
            .get(id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(id.clone()))
    }

    async fn modify(&self, id: &TaskId, mutation: TaskMutation) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.clone()))?;

        // Mutate a scratch copy so a failed mutation leaves the record intact
        let mut updated = task.clone();
        mutation(&mut updated)?;
        *task = updated.clone();
        Ok(updated)
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().cloned().collect())
    }

    async fn remove(&self, id: &TaskId) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::TaskNotFound(id.clone()))
    }

    async fn remove_batch(&self, ids: &[TaskId]) -> Result<usize> {
        let mut tasks = self.tasks.write().await;
        let mut removed = 0;
        for id in ids {
            if tasks.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
