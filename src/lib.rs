//! # export-engine
//!
//! Embeddable asynchronous task engine for long-running file exports.
//!
//! ## Design Philosophy
//!
//! export-engine is designed to be:
//! - **Library-first** - No CLI or HTTP layer, purely a Rust crate for embedding
//! - **Pluggable** - Format generators, artifact storage, and the task store
//!   are all trait seams the host can replace
//! - **Non-blocking for callers** - Asynchronous exports return a task id
//!   immediately; progress and failures are observed by polling
//! - **Self-cleaning** - A background reaper times out stuck tasks and purges
//!   expired ones along with their artifacts
//!
//! ## Quick Start
//!
//! ```no_run
//! use export_engine::{
//!     Config, ExportDescriptor, ExportEngine, ExportOutcome, FileKind, GeneratorRegistry,
//! };
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = ExportEngine::new(Config::default(), GeneratorRegistry::with_builtins()).await?;
//!     engine.start_reaper();
//!
//!     let descriptor = ExportDescriptor {
//!         code: "ORDER_REPORT".into(),
//!         name: "Order report".into(),
//!         description: "Monthly order export".into(),
//!         filename: "orders".into(),
//!         file_type: FileKind::Json,
//!         run_async: true,
//!     };
//!
//!     let outcome = engine
//!         .export(Some(descriptor), HashMap::new(), || {
//!             Box::pin(async { Ok(serde_json::json!([{"order": 1}])) })
//!         })
//!         .await?;
//!
//!     if let ExportOutcome::Accepted(accepted) = outcome {
//!         // Poll for completion
//!         let task = engine.get_task(&accepted.task_id).await?;
//!         println!("status: {:?}", task.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Core engine (dispatch decision and export workers)
pub mod engine;
/// Error types
pub mod error;
/// Format generators and their registry
pub mod generator;
/// Task lifecycle management
pub mod lifecycle;
/// Background reaper for stuck and expired tasks
pub mod reaper;
/// Artifact storage gateway
pub mod storage;
/// Task record store
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use engine::{ExportEngine, ExportFuture};
pub use error::{Error, Result};
pub use generator::{CsvGenerator, ExportGenerator, GeneratorRegistry, JsonGenerator};
pub use lifecycle::TaskLifecycleManager;
pub use reaper::Reaper;
pub use storage::{ArtifactWriter, LocalStorage, StorageGateway};
pub use store::{MemoryTaskStore, TaskMutation, TaskStore};
pub use types::{
    AcceptedTask, ExportDescriptor, ExportOutcome, FileKind, RESULT_FILE_PATH, RESULT_URL, Task,
    TaskId, TaskStatus,
};
