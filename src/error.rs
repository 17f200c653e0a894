//! Error types for export-engine
//!
//! This module provides error handling for the library, including:
//! - Lifecycle errors (unknown task ids, invalid state transitions)
//! - Dispatch errors (pool saturation, shutdown in progress)
//! - Generator and storage failures surfaced into task records

use crate::types::{FileKind, TaskId, TaskStatus};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for export-engine
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "worker_pool_size")
        key: Option<String>,
    },

    /// No task exists for the given id; passing an unknown id is a caller bug
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A task record already exists for the given id
    #[error("task already exists: {0}")]
    TaskAlreadyExists(TaskId),

    /// A lifecycle operation attempted a transition the state machine forbids
    #[error("invalid transition for task {id}: {from} -> {to}")]
    InvalidTransition {
        /// The task whose record was left untouched
        id: TaskId,
        /// Status the task currently holds
        from: TaskStatus,
        /// Status the caller tried to move it to
        to: TaskStatus,
    },

    /// No registered generator claims support for the descriptor
    #[error("no generator found for {file_type} export \"{filename}\"")]
    NoGeneratorFound {
        /// File kind the descriptor asked for
        file_type: FileKind,
        /// Target filename from the descriptor
        filename: String,
    },

    /// Storage gateway failure (write, verify, or delete)
    #[error("{message}: {path}")]
    Storage {
        /// Artifact path the operation was acting on
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Worker pool is saturated; no task record was created
    #[error("export submission rejected: all {capacity} worker slots are busy")]
    SubmissionRejected {
        /// Configured worker pool size
        capacity: usize,
    },

    /// Shutdown in progress - not accepting new exports
    #[error("shutdown in progress: not accepting new exports")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}
