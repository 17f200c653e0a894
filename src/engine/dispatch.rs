//! Sync/async export dispatch.
//!
//! The dispatch path wraps an export-capable business call. With no
//! descriptor, or a descriptor whose `async` flag is off, the call runs on
//! the caller's task and its bytes stream back directly. With the flag on,
//! the work is submitted to the bounded worker pool and the caller gets an
//! accepted-task reply immediately; failures are visible only by polling.

use crate::error::{Error, Result};
use crate::types::{AcceptedTask, ExportDescriptor, ExportOutcome, TaskId};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

use super::ExportEngine;
use super::worker;

/// Future returned by a business thunk: the raw data to export
pub type ExportFuture = BoxFuture<'static, Result<serde_json::Value>>;

impl ExportEngine {
    /// Run an export-capable operation
    ///
    /// `business` is the deferred business call producing the exportable
    /// data; `params` are the original call's arguments, captured into the
    /// task record for diagnostics (ignored on the synchronous path).
    ///
    /// # Errors
    ///
    /// Synchronous exports propagate generator/storage errors directly.
    /// Asynchronous submission fails with [`Error::SubmissionRejected`] when
    /// the pool is saturated and [`Error::ShuttingDown`] during shutdown;
    /// both happen before any task record exists. Once a task id has been
    /// returned, failures are only visible through [`ExportEngine::get_task`].
    pub async fn export<F>(
        &self,
        descriptor: Option<ExportDescriptor>,
        params: HashMap<String, serde_json::Value>,
        business: F,
    ) -> Result<ExportOutcome>
    where
        F: FnOnce() -> ExportFuture + Send + 'static,
    {
        let Some(descriptor) = descriptor else {
            // Not export-configured: let the call proceed and pass its
            // result through as plain JSON
            let data = business().await?;
            return Ok(ExportOutcome::Inline(serde_json::to_vec(&data)?));
        };

        if !descriptor.run_async {
            return self.export_sync(&descriptor, business).await;
        }

        self.submit(descriptor, params, business).await
    }

    /// Synchronous path: generate into memory and hand the bytes back
    async fn export_sync<F>(&self, descriptor: &ExportDescriptor, business: F) -> Result<ExportOutcome>
    where
        F: FnOnce() -> ExportFuture + Send,
    {
        let data = business().await?;
        let generator = self.registry.resolve(descriptor)?;
        debug!(
            code = %descriptor.code,
            generator = generator.name(),
            "Running synchronous export"
        );

        let mut buf: Vec<u8> = Vec::new();
        generator.generate(&data, descriptor, &mut buf).await?;
        Ok(ExportOutcome::Inline(buf))
    }

    /// Asynchronous path: reserve a pool slot, create the task record, and
    /// spawn the worker
    async fn submit<F>(
        &self,
        descriptor: ExportDescriptor,
        params: HashMap<String, serde_json::Value>,
        business: F,
    ) -> Result<ExportOutcome>
    where
        F: FnOnce() -> ExportFuture + Send + 'static,
    {
        if !self.pool.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        // Reserve the slot first so rejection happens before any task exists
        let permit = self
            .pool
            .permits
            .clone()
            .try_acquire_owned()
            .map_err(|_| Error::SubmissionRejected {
                capacity: self.pool.capacity,
            })?;

        let id = TaskId::generate();
        self.lifecycle
            .create_task(id.clone(), &descriptor, params)
            .await?;

        let engine = self.clone();
        let worker_id = id.clone();
        tokio::spawn(async move {
            // The permit is this worker's pool slot, held for its lifetime
            let _permit = permit;
            worker::run_export(engine, worker_id, descriptor, business).await;
        });

        info!(task_id = %id, "Export task submitted");
        Ok(ExportOutcome::Accepted(AcceptedTask::new(id)))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::super::test_helpers::{create_test_engine, descriptor, slow_thunk, thunk};
    use crate::error::Error;
    use crate::types::FileKind;
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn absent_descriptor_passes_data_through() {
        let (engine, _temp) = create_test_engine().await;
        let outcome = engine
            .export(None, HashMap::new(), thunk(serde_json::json!({"ok": true})))
            .await
            .unwrap();

        let bytes = outcome.inline().expect("inline outcome");
        let parsed: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(parsed["ok"], true);
        assert!(engine.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sync_export_streams_bytes_and_creates_no_task() {
        let (engine, _temp) = create_test_engine().await;
        let outcome = engine
            .export(
                Some(descriptor(FileKind::Json, false)),
                HashMap::new(),
                thunk(serde_json::json!({"rows": [1, 2]})),
            )
            .await
            .unwrap();

        let bytes = outcome.inline().expect("inline outcome");
        assert!(!bytes.is_empty());
        assert!(engine.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sync_export_propagates_generator_errors() {
        let (engine, _temp) = create_test_engine().await;
        // No built-in generator claims pdf
        let err = engine
            .export(
                Some(descriptor(FileKind::Pdf, false)),
                HashMap::new(),
                thunk(serde_json::json!([])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoGeneratorFound { .. }));
    }

    #[tokio::test]
    async fn async_export_replies_accepted_with_a_pollable_id() {
        let (engine, _temp) = create_test_engine().await;
        let outcome = engine
            .export(
                Some(descriptor(FileKind::Json, true)),
                HashMap::new(),
                thunk(serde_json::json!({"n": 1})),
            )
            .await
            .unwrap();

        let accepted = outcome.accepted().expect("accepted outcome");
        assert_eq!(accepted.status, "accepted");
        // The id is pollable immediately, before the worker finishes
        engine.get_task(&accepted.task_id).await.unwrap();
    }

    #[tokio::test]
    async fn params_are_captured_on_the_task_record() {
        let (engine, _temp) = create_test_engine().await;
        let mut params = HashMap::new();
        params.insert("month".to_string(), serde_json::json!("2026-08"));

        let outcome = engine
            .export(
                Some(descriptor(FileKind::Json, true)),
                params,
                thunk(serde_json::json!({})),
            )
            .await
            .unwrap();

        let id = outcome.accepted().unwrap().task_id.clone();
        let task = engine.get_task(&id).await.unwrap();
        assert_eq!(task.params["month"], "2026-08");
    }

    #[tokio::test]
    async fn saturated_pool_rejects_before_creating_a_task() {
        let (engine, _temp) = create_test_engine().await;
        let capacity = engine.pool.capacity;

        // Occupy every slot with slow exports
        for _ in 0..capacity {
            engine
                .export(
                    Some(descriptor(FileKind::Json, true)),
                    HashMap::new(),
                    slow_thunk(std::time::Duration::from_millis(500)),
                )
                .await
                .unwrap();
        }

        let err = engine
            .export(
                Some(descriptor(FileKind::Json, true)),
                HashMap::new(),
                thunk(serde_json::json!({})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SubmissionRejected { .. }));

        // Exactly the in-flight tasks exist, nothing for the rejected one
        assert_eq!(engine.list_tasks().await.unwrap().len(), capacity);
    }

    #[tokio::test]
    async fn shutdown_flag_rejects_new_submissions() {
        let (engine, _temp) = create_test_engine().await;
        engine.pool.accepting_new.store(false, Ordering::SeqCst);

        let err = engine
            .export(
                Some(descriptor(FileKind::Json, true)),
                HashMap::new(),
                thunk(serde_json::json!({})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ShuttingDown));
    }
}
