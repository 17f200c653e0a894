//! Core types for export-engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key under which a completed task's artifact path is stored in [`Task::result`]
pub const RESULT_FILE_PATH: &str = "file_path";

/// Key under which a completed task's access URL is stored in [`Task::result`]
pub const RESULT_URL: &str = "url";

/// Unique identifier for an export task
///
/// Ids are opaque strings, generated once at submission time and never reused.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh, globally unique task id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// View the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// Task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created, waiting for its worker to start
    Pending,
    /// Worker is running
    Processing,
    /// Artifact generated and verified
    Completed,
    /// Worker failed; see [`Task::error_message`]
    Failed,
    /// Canceled before the worker picked it up (or administratively)
    Canceled,
}

impl TaskStatus {
    /// Whether this status is terminal (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Canceled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
        };
        write!(f, "{}", name)
    }
}

/// Output file format for an export
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Excel workbook (.xlsx)
    Excel,
    /// PDF document (.pdf)
    Pdf,
    /// Word document (.docx)
    Word,
    /// Comma-separated values (.csv)
    Csv,
    /// JSON document (.json)
    Json,
}

impl FileKind {
    /// File extension for artifacts of this kind, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Excel => "xlsx",
            FileKind::Pdf => "pdf",
            FileKind::Word => "docx",
            FileKind::Csv => "csv",
            FileKind::Json => "json",
        }
    }

    /// Directory name used when laying out artifacts by kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            FileKind::Excel => "excel",
            FileKind::Pdf => "pdf",
            FileKind::Word => "word",
            FileKind::Csv => "csv",
            FileKind::Json => "json",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Declarative configuration attached to an export-capable operation
///
/// Carried alongside the business call; the engine inspects `run_async` to
/// decide between the synchronous and asynchronous paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportDescriptor {
    /// Business code identifying the export (e.g., "ORDER_REPORT")
    pub code: String,

    /// Human-readable export name
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Target filename (without extension; the engine appends one per `file_type`)
    pub filename: String,

    /// Output format
    pub file_type: FileKind,

    /// Whether the export runs asynchronously as a tracked task
    #[serde(rename = "async", default)]
    pub run_async: bool,
}

/// A unit of asynchronous export work tracked by id, status, and progress
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Globally unique identity, assigned exactly once at submission
    pub task_id: TaskId,

    /// Business code copied from the triggering descriptor
    pub code: String,

    /// Business name copied from the triggering descriptor
    pub name: String,

    /// Description copied from the triggering descriptor
    #[serde(default)]
    pub description: String,

    /// Arguments captured from the original call, for diagnostics
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Progress percentage, 0-100
    pub progress: u8,

    /// On success, holds at minimum the artifact path under [`RESULT_FILE_PATH`]
    #[serde(default)]
    pub result: HashMap<String, serde_json::Value>,

    /// Present only when `status` is [`TaskStatus::Failed`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the task record was created
    pub create_time: DateTime<Utc>,

    /// Set on transition into [`TaskStatus::Processing`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// Set on any terminal transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Task {
    /// Artifact path recorded on completion, if any
    pub fn file_path(&self) -> Option<&str> {
        self.result.get(RESULT_FILE_PATH).and_then(|v| v.as_str())
    }
}

/// Synchronous reply to the original caller when an export was accepted for
/// asynchronous processing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcceptedTask {
    /// Always `"accepted"`
    pub status: String,

    /// Id to poll task status with
    pub task_id: TaskId,
}

impl AcceptedTask {
    /// Build the accepted-task reply for a freshly submitted task
    pub fn new(task_id: TaskId) -> Self {
        Self {
            status: "accepted".to_string(),
            task_id,
        }
    }
}

/// Outcome of an export call
#[derive(Debug)]
pub enum ExportOutcome {
    /// Synchronous path: the generated bytes, streamed back directly
    Inline(Vec<u8>),
    /// Asynchronous path: work was submitted; poll with the task id
    Accepted(AcceptedTask),
}

impl ExportOutcome {
    /// Generated bytes if this outcome is the synchronous path
    pub fn inline(&self) -> Option<&[u8]> {
        match self {
            ExportOutcome::Inline(bytes) => Some(bytes),
            ExportOutcome::Accepted(_) => None,
        }
    }

    /// Accepted-task reply if this outcome is the asynchronous path
    pub fn accepted(&self) -> Option<&AcceptedTask> {
        match self {
            ExportOutcome::Inline(_) => None,
            ExportOutcome::Accepted(accepted) => Some(accepted),
        }
    }
}
