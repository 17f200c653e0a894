//! Background reaper for stuck and expired tasks
//!
//! The reaper runs on its own periodic timer and performs two independent
//! sweeps per tick:
//!
//! - **Timeout sweep**: non-terminal tasks whose start (or creation) predates
//!   the timeout window are marked `FAILED` with message "task timed out".
//! - **Retention sweep**: terminal tasks older than the retention window have
//!   their backing artifact deleted (best-effort) and their record removed.
//!
//! Both sweeps operate on a snapshot and tolerate racing workers: a task
//! that reaches a terminal state mid-sweep is simply cleaned up one cycle
//! late.
//!
//! # Example
//!
//! ```no_run
//! use export_engine::{Config, ExportEngine, GeneratorRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = ExportEngine::new(Config::default(), GeneratorRegistry::with_builtins()).await?;
//!
//! // Runs until engine.shutdown() is called
//! let _handle = engine.start_reaper();
//! # Ok(())
//! # }
//! ```

use crate::engine::ExportEngine;
use crate::error::Error;
use chrono::Utc;
use std::path::Path;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periodic process that times out stuck tasks and purges expired ones
pub struct Reaper {
    /// Engine whose task store and storage gateway are swept
    engine: ExportEngine,

    /// Token that stops the loop on engine shutdown
    shutdown: CancellationToken,
}

impl Reaper {
    /// Creates a new reaper
    ///
    /// Usually constructed through
    /// [`ExportEngine::start_reaper`](crate::ExportEngine::start_reaper).
    pub fn new(engine: ExportEngine, shutdown: CancellationToken) -> Self {
        Self { engine, shutdown }
    }

    /// Run the sweep loop until the shutdown token is canceled
    pub async fn run(self) {
        let interval = self.engine.get_config().cleanup_interval();
        info!(interval_secs = interval.as_secs(), "Reaper started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Reaper shutting down");
                    break;
                }
                _ = sleep(interval) => {
                    self.sweep_timeouts().await;
                    self.sweep_retention().await;
                }
            }
        }

        info!("Reaper stopped");
    }

    /// Fail tasks stuck in `PENDING`/`PROCESSING` past the timeout window
    async fn sweep_timeouts(&self) {
        let snapshot = match self.engine.lifecycle.list_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "Timeout sweep could not list tasks");
                return;
            }
        };
        let cutoff = Utc::now() - self.engine.get_config().task_timeout();

        for task in snapshot {
            if task.status.is_terminal() {
                continue;
            }
            let anchor = task.start_time.unwrap_or(task.create_time);
            if anchor >= cutoff {
                continue;
            }

            match self.engine.lifecycle.fail(&task.task_id, "task timed out").await {
                Ok(_) => {
                    warn!(task_id = %task.task_id, code = %task.code, "Task timed out, marked failed");
                }
                Err(Error::InvalidTransition { .. }) => {
                    // Lost the race: the worker finished while we swept
                    debug!(task_id = %task.task_id, "Task reached a terminal state mid-sweep, skipping");
                }
                Err(e) => {
                    warn!(task_id = %task.task_id, error = %e, "Could not time out task");
                }
            }
        }
    }

    /// Delete artifacts and records of terminal tasks past the retention window
    async fn sweep_retention(&self) {
        let snapshot = match self.engine.lifecycle.list_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "Retention sweep could not list tasks");
                return;
            }
        };
        let cutoff = Utc::now() - self.engine.get_config().retention();

        let mut expired = Vec::new();
        for task in snapshot {
            if !task.status.is_terminal() || task.create_time >= cutoff {
                continue;
            }

            if let Some(path) = task.file_path() {
                if let Err(e) = self.engine.storage.delete(Path::new(path)).await {
                    // Best-effort: the record still goes, the orphan is logged
                    warn!(task_id = %task.task_id, path, error = %e, "Failed to delete expired artifact");
                }
            }
            expired.push(task.task_id.clone());
        }

        if expired.is_empty() {
            return;
        }
        match self.engine.lifecycle.purge_tasks(&expired).await {
            Ok(purged) => info!(purged, "Retention sweep removed expired tasks"),
            Err(e) => warn!(error = %e, "Retention sweep could not purge task records"),
        }
    }
}
