//! Core engine implementation split into focused submodules.
//!
//! The `ExportEngine` struct and its methods are organized by domain:
//! - [`dispatch`] - Sync/async export decision and task submission
//! - [`worker`] - Detached export worker body
//!
//! The engine is cloneable: all fields are Arc-wrapped, and clones share the
//! task store, worker pool, and storage gateway.

mod dispatch;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatch::ExportFuture;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::generator::GeneratorRegistry;
use crate::lifecycle::TaskLifecycleManager;
use crate::reaper::Reaper;
use crate::storage::{LocalStorage, StorageGateway};
use crate::store::{MemoryTaskStore, TaskStore};
use crate::types::{Task, TaskId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Bounded worker pool state
#[derive(Clone)]
pub(crate) struct WorkerPool {
    /// One permit per worker slot; a task holds its permit for its lifetime
    pub(crate) permits: Arc<Semaphore>,
    /// Configured pool size
    pub(crate) capacity: usize,
    /// Flag to indicate whether new exports are accepted (false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Main export engine instance (cloneable - all fields are Arc-wrapped)
///
/// Decides whether an export request is served synchronously or
/// asynchronously, tracks task lifecycle through the task store, dispatches
/// to the generator registry, and persists artifacts through the storage
/// gateway. Pair it with a [`Reaper`] to reclaim stuck and expired tasks.
#[derive(Clone)]
pub struct ExportEngine {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Lifecycle manager over the shared task store
    pub(crate) lifecycle: TaskLifecycleManager,
    /// Ordered format generator registry
    pub(crate) registry: Arc<GeneratorRegistry>,
    /// Artifact storage gateway
    pub(crate) storage: Arc<dyn StorageGateway>,
    /// Bounded worker pool
    pub(crate) pool: WorkerPool,
    /// Cancellation token stopping the reaper loop on shutdown
    pub(crate) reaper_shutdown: CancellationToken,
}

impl std::fmt::Debug for ExportEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExportEngine {
    /// Create an engine with the default backends: local-disk storage rooted
    /// at `config.export_dir` and an in-memory task store
    pub async fn new(config: Config, registry: GeneratorRegistry) -> Result<Self> {
        let storage: Arc<dyn StorageGateway> = Arc::new(LocalStorage::new(&config.export_dir));
        let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::new());
        Self::with_backends(config, registry, storage, store).await
    }

    /// Create an engine with custom storage and task-store backends
    pub async fn with_backends(
        config: Config,
        registry: GeneratorRegistry,
        storage: Arc<dyn StorageGateway>,
        store: Arc<dyn TaskStore>,
    ) -> Result<Self> {
        config.validate()?;

        // Ensure the artifact root exists up front
        tokio::fs::create_dir_all(&config.export_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create export directory '{}': {}",
                        config.export_dir.display(),
                        e
                    ),
                ))
            })?;

        let pool = WorkerPool {
            permits: Arc::new(Semaphore::new(config.worker_pool_size)),
            capacity: config.worker_pool_size,
            accepting_new: Arc::new(AtomicBool::new(true)),
        };

        tracing::info!(
            worker_pool_size = config.worker_pool_size,
            export_dir = %config.export_dir.display(),
            "Export engine initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            lifecycle: TaskLifecycleManager::new(store),
            registry: Arc::new(registry),
            storage,
            pool,
            reaper_shutdown: CancellationToken::new(),
        })
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Fetch a task by id - the polling surface for external callers
    pub async fn get_task(&self, id: &TaskId) -> Result<Task> {
        self.lifecycle.get_task(id).await
    }

    /// Snapshot of all task records
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.lifecycle.list_tasks().await
    }

    /// Administratively cancel a task
    ///
    /// Best-effort and non-preemptive: canceling a `PENDING` task prevents
    /// its worker from doing any work, but a worker already running finishes,
    /// and canceling a terminal task is an error.
    pub async fn cancel_task(&self, id: &TaskId) -> Result<Task> {
        self.lifecycle.cancel(id).await
    }

    /// Start the reaper background task
    ///
    /// Sweeps the task store on `config.cleanup_interval_secs`, failing stuck
    /// tasks and purging expired ones. The task exits when
    /// [`shutdown`](ExportEngine::shutdown) is called.
    pub fn start_reaper(&self) -> tokio::task::JoinHandle<()> {
        let reaper = Reaper::new(self.clone(), self.reaper_shutdown.clone());
        let handle = tokio::spawn(async move {
            reaper.run().await;
        });
        tracing::info!("Reaper background task started");
        handle
    }

    /// Gracefully shut down: stop accepting new exports, stop the reaper, and
    /// wait for in-flight workers to finish
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Export engine shutting down");
        self.pool.accepting_new.store(false, Ordering::SeqCst);
        self.reaper_shutdown.cancel();

        // Draining every permit means no worker is still holding one
        let _drain = self
            .pool
            .permits
            .acquire_many(self.pool.capacity as u32)
            .await
            .map_err(|_| Error::Other("worker pool semaphore closed".into()))?;

        tracing::info!("Export engine shutdown complete");
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::test_helpers::create_test_engine;
    use crate::config::Config;
    use crate::error::Error;
    use crate::generator::GeneratorRegistry;
    use crate::types::TaskId;

    use super::ExportEngine;

    #[tokio::test]
    async fn invalid_config_is_rejected_at_construction() {
        let config = Config {
            worker_pool_size: 0,
            ..Default::default()
        };
        let err = ExportEngine::new(config, GeneratorRegistry::with_builtins())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn engine_creates_export_dir() {
        let (engine, temp) = create_test_engine().await;
        assert!(engine.get_config().export_dir.is_dir());
        drop(temp);
    }

    #[tokio::test]
    async fn get_task_on_unknown_id_is_not_found() {
        let (engine, _temp) = create_test_engine().await;
        let err = engine.get_task(&TaskId::from("missing")).await.unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn shutdown_with_idle_pool_returns_immediately() {
        let (engine, _temp) = create_test_engine().await;
        tokio::time::timeout(std::time::Duration::from_secs(1), engine.shutdown())
            .await
            .expect("shutdown should not block on an idle pool")
            .unwrap();
    }
}
