//! Task lifecycle management
//!
//! The lifecycle manager is the single gateway to the task store. It enforces
//! the task state machine and keeps timestamp/progress bookkeeping consistent:
//!
//! - `PENDING -> PROCESSING` sets `start_time`
//! - `PROCESSING -> PROCESSING` carries progress updates
//! - `PROCESSING -> COMPLETED | FAILED` sets `progress = 100` and `end_time`
//! - `PENDING -> FAILED` is reserved for the reaper's timeout sweep
//! - any non-terminal state `-> CANCELED`
//!
//! Every other transition is a programming error and is rejected with
//! [`Error::InvalidTransition`], leaving the record untouched.

use crate::error::{Error, Result};
use crate::store::TaskStore;
use crate::types::{ExportDescriptor, Task, TaskId, TaskStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Whether the state machine permits moving `from -> to`
fn transition_allowed(from: TaskStatus, to: TaskStatus) -> bool {
    match (from, to) {
        (TaskStatus::Pending, TaskStatus::Processing) => true,
        (TaskStatus::Processing, TaskStatus::Processing) => true,
        (TaskStatus::Processing, TaskStatus::Completed) => true,
        (TaskStatus::Processing, TaskStatus::Failed) => true,
        // Timeout sweep can fail a task its worker never picked up
        (TaskStatus::Pending, TaskStatus::Failed) => true,
        (from, TaskStatus::Canceled) => !from.is_terminal(),
        _ => false,
    }
}

/// Validate and apply a transition on a task record, including bookkeeping
fn apply_transition(task: &mut Task, to: TaskStatus) -> Result<()> {
    let from = task.status;
    if !transition_allowed(from, to) {
        return Err(Error::InvalidTransition {
            id: task.task_id.clone(),
            from,
            to,
        });
    }

    let now = Utc::now();
    match to {
        TaskStatus::Processing => {
            if from == TaskStatus::Pending {
                task.start_time = Some(now);
                task.progress = 0;
            }
        }
        TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Canceled => {
            task.progress = 100;
            task.end_time = Some(now);
        }
        TaskStatus::Pending => {}
    }
    task.status = to;
    Ok(())
}

/// Create/update/complete/fail operations over the task store, with state
/// machine enforcement
///
/// Cloneable; all clones share the same underlying store.
#[derive(Clone)]
pub struct TaskLifecycleManager {
    store: Arc<dyn TaskStore>,
}

impl TaskLifecycleManager {
    /// Create a lifecycle manager over the given store
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Create a new `PENDING` task record from a descriptor and captured params
    pub async fn create_task(
        &self,
        id: TaskId,
        descriptor: &ExportDescriptor,
        params: HashMap<String, serde_json::Value>,
    ) -> Result<Task> {
        let task = Task {
            task_id: id.clone(),
            code: descriptor.code.clone(),
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            params,
            status: TaskStatus::Pending,
            progress: 0,
            result: HashMap::new(),
            error_message: None,
            create_time: Utc::now(),
            start_time: None,
            end_time: None,
        };
        self.store.insert(task.clone()).await?;
        info!(task_id = %id, code = %descriptor.code, "Export task created");
        Ok(task)
    }

    /// Move a task to a new status, enforcing the state machine
    pub async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        let task = self
            .store
            .modify(id, Box::new(move |task| apply_transition(task, status)))
            .await?;
        debug!(task_id = %id, status = %status, "Task status updated");
        Ok(task)
    }

    /// Update progress on a `PROCESSING` task; values above 100 are clamped
    pub async fn update_progress(&self, id: &TaskId, progress: u8) -> Result<Task> {
        let clamped = progress.min(100);
        self.store
            .modify(
                id,
                Box::new(move |task| {
                    apply_transition(task, TaskStatus::Processing)?;
                    task.progress = clamped;
                    Ok(())
                }),
            )
            .await
    }

    /// Complete a task, recording its result (at minimum the artifact path)
    pub async fn complete(
        &self,
        id: &TaskId,
        result: HashMap<String, serde_json::Value>,
    ) -> Result<Task> {
        let task = self
            .store
            .modify(
                id,
                Box::new(move |task| {
                    apply_transition(task, TaskStatus::Completed)?;
                    task.result = result;
                    Ok(())
                }),
            )
            .await?;
        info!(task_id = %id, "Export task completed");
        Ok(task)
    }

    /// Fail a task, recording the error message
    pub async fn fail(&self, id: &TaskId, message: &str) -> Result<Task> {
        let message = message.to_string();
        let task = self
            .store
            .modify(
                id,
                Box::new(move |task| {
                    apply_transition(task, TaskStatus::Failed)?;
                    task.error_message = Some(message);
                    Ok(())
                }),
            )
            .await?;
        info!(task_id = %id, error = %task.error_message.as_deref().unwrap_or(""), "Export task failed");
        Ok(task)
    }

    /// Cancel a non-terminal task
    ///
    /// Cancellation is not preemptive: a worker already past its pre-start
    /// check runs to completion, and its terminal write will then be rejected.
    pub async fn cancel(&self, id: &TaskId) -> Result<Task> {
        let task = self.update_status(id, TaskStatus::Canceled).await?;
        info!(task_id = %id, "Export task canceled");
        Ok(task)
    }

    /// Fetch a task by id
    pub async fn get_task(&self, id: &TaskId) -> Result<Task> {
        self.store.get(id).await
    }

    /// Snapshot of all task records
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.store.list().await
    }

    /// Remove a batch of task records; used by the reaper's retention sweep
    pub async fn purge_tasks(&self, ids: &[TaskId]) -> Result<usize> {
        self.store.remove_batch(ids).await
    }

    /// Shared handle to the underlying store
    #[cfg(test)]
    pub(crate) fn store(&self) -> Arc<dyn TaskStore> {
        Arc::clone(&self.store)
    }
}
