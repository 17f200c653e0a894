//! Detached export worker body.
//!
//! Runs entirely off the calling thread inside a pool slot. Every error in
//! the export sequence is caught at the worker boundary and converted into a
//! `fail()` on the lifecycle manager; nothing downstream can observe a
//! throw from a detached worker.

use crate::error::{Error, Result};
use crate::types::{ExportDescriptor, RESULT_FILE_PATH, RESULT_URL, TaskId, TaskStatus};
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use super::ExportEngine;
use super::dispatch::ExportFuture;

/// Progress after the task moved to `PROCESSING`
pub(crate) const PROGRESS_STARTED: u8 = 20;
/// Progress after the business call returned its data
pub(crate) const PROGRESS_DATA_READY: u8 = 40;
/// Progress after the destination path was resolved
pub(crate) const PROGRESS_PATH_RESOLVED: u8 = 60;
/// Progress after the artifact was streamed to storage
pub(crate) const PROGRESS_ARTIFACT_WRITTEN: u8 = 80;

/// Run one export task to a terminal state
///
/// Never returns an error: failures become `FAILED` task records.
pub(crate) async fn run_export<F>(
    engine: ExportEngine,
    id: TaskId,
    descriptor: ExportDescriptor,
    business: F,
) where
    F: FnOnce() -> ExportFuture + Send,
{
    // Best-effort cancellation: honor a cancel that landed before pickup
    match engine.lifecycle.get_task(&id).await {
        Ok(task) if task.status == TaskStatus::Canceled => {
            info!(task_id = %id, "Task canceled before start, skipping");
            return;
        }
        Ok(_) => {}
        Err(e) => {
            error!(task_id = %id, error = %e, "Task record missing at worker start");
            return;
        }
    }

    if let Err(e) = execute(&engine, &id, &descriptor, business).await {
        let message = e.to_string();
        error!(task_id = %id, error = %message, "Export task failed");
        if let Err(fail_err) = engine.lifecycle.fail(&id, &message).await {
            // Lost a race with a concurrent cancel/timeout; the record is
            // already terminal
            error!(task_id = %id, error = %fail_err, "Could not record export failure");
        }
    }
}

/// The export sequence; any error here fails the task
async fn execute<F>(
    engine: &ExportEngine,
    id: &TaskId,
    descriptor: &ExportDescriptor,
    business: F,
) -> Result<()>
where
    F: FnOnce() -> ExportFuture + Send,
{
    engine
        .lifecycle
        .update_status(id, TaskStatus::Processing)
        .await?;
    engine.lifecycle.update_progress(id, PROGRESS_STARTED).await?;

    let data = business().await?;
    engine
        .lifecycle
        .update_progress(id, PROGRESS_DATA_READY)
        .await?;

    let path = engine
        .storage
        .generate_file_path(descriptor.file_type, &descriptor.filename);
    engine
        .lifecycle
        .update_progress(id, PROGRESS_PATH_RESOLVED)
        .await?;

    let generator = engine.registry.resolve(descriptor)?;
    debug!(
        task_id = %id,
        generator = generator.name(),
        path = %path.display(),
        "Generating export artifact"
    );

    let mut sink = engine.storage.writer(&path).await?;
    generator.generate(&data, descriptor, &mut sink).await?;
    sink.shutdown().await?;
    engine
        .lifecycle
        .update_progress(id, PROGRESS_ARTIFACT_WRITTEN)
        .await?;

    if !engine.storage.exists(&path).await {
        return Err(Error::Storage {
            path,
            message: "empty or missing artifact".into(),
        });
    }
    let size = engine.storage.size(&path).await?;
    if size == 0 {
        return Err(Error::Storage {
            path,
            message: "empty or missing artifact".into(),
        });
    }

    let mut result = HashMap::new();
    result.insert(
        RESULT_FILE_PATH.to_string(),
        serde_json::json!(path.to_string_lossy()),
    );
    result.insert(
        RESULT_URL.to_string(),
        serde_json::json!(engine.storage.url(&path)),
    );

    engine.lifecycle.complete(id, result).await?;
    info!(task_id = %id, size_bytes = size, "Export artifact written");
    Ok(())
}
