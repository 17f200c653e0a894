//! Configuration types for export-engine

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for [`ExportEngine`](crate::ExportEngine)
///
/// All knobs are externally supplied; the engine never computes its own
/// limits. Defaults are sensible for a single-process deployment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for generated artifacts (default: "./exports")
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Maximum concurrent export workers (default: 4)
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Seconds between reaper sweeps (default: 300)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Minutes a task may sit in `PENDING`/`PROCESSING` before the reaper
    /// fails it (default: 30)
    #[serde(default = "default_task_timeout_minutes")]
    pub task_timeout_minutes: i64,

    /// Days a terminal task and its artifact are retained before the reaper
    /// purges them (default: 7)
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
            worker_pool_size: default_worker_pool_size(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            task_timeout_minutes: default_task_timeout_minutes(),
            retention_days: default_retention_days(),
        }
    }
}

impl Config {
    /// Validate the configuration, rejecting values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker_pool_size == 0 {
            return Err(Error::Config {
                message: "worker_pool_size must be at least 1".into(),
                key: Some("worker_pool_size".into()),
            });
        }
        if self.cleanup_interval_secs == 0 {
            return Err(Error::Config {
                message: "cleanup_interval_secs must be at least 1".into(),
                key: Some("cleanup_interval_secs".into()),
            });
        }
        if self.task_timeout_minutes <= 0 {
            return Err(Error::Config {
                message: "task_timeout_minutes must be positive".into(),
                key: Some("task_timeout_minutes".into()),
            });
        }
        if self.retention_days <= 0 {
            return Err(Error::Config {
                message: "retention_days must be positive".into(),
                key: Some("retention_days".into()),
            });
        }
        Ok(())
    }

    /// Interval between reaper sweeps
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Timeout window for the reaper's stuck-task sweep
    pub fn task_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.task_timeout_minutes)
    }

    /// Retention window for the reaper's purge sweep
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./exports")
}

fn default_worker_pool_size() -> usize {
    4
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

fn default_task_timeout_minutes() -> i64 {
    30
}

fn default_retention_days() -> i64 {
    7
}
