//! Shared test helpers for creating ExportEngine instances in tests.

use crate::config::Config;
use crate::generator::GeneratorRegistry;
use crate::types::{ExportDescriptor, FileKind};
use std::time::Duration;
use tempfile::tempdir;

use super::ExportEngine;
use super::dispatch::ExportFuture;

/// Helper to create a test ExportEngine backed by a temp directory.
/// Returns the engine and the tempdir (which must be kept alive).
pub(crate) async fn create_test_engine() -> (ExportEngine, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let config = Config {
        export_dir: temp_dir.path().join("exports"),
        worker_pool_size: 3,
        cleanup_interval_secs: 1,
        ..Default::default()
    };

    let engine = ExportEngine::new(config, GeneratorRegistry::with_builtins())
        .await
        .unwrap();

    (engine, temp_dir)
}

/// Descriptor for a test export of the given kind
pub(crate) fn descriptor(file_type: FileKind, run_async: bool) -> ExportDescriptor {
    ExportDescriptor {
        code: "TEST_EXPORT".into(),
        name: "Test export".into(),
        description: "Engine test fixture".into(),
        filename: "fixture".into(),
        file_type,
        run_async,
    }
}

/// Business thunk resolving immediately with the given data
pub(crate) fn thunk(data: serde_json::Value) -> impl FnOnce() -> ExportFuture + Send + 'static {
    move || Box::pin(async move { Ok(data) })
}

/// Business thunk failing with the given message
pub(crate) fn failing_thunk(message: &str) -> impl FnOnce() -> ExportFuture + Send + 'static {
    let message = message.to_string();
    move || Box::pin(async move { Err(crate::error::Error::Other(message)) })
}

/// Business thunk that sleeps before resolving, for pool saturation tests
pub(crate) fn slow_thunk(delay: Duration) -> impl FnOnce() -> ExportFuture + Send + 'static {
    move || {
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(serde_json::json!({"slow": true}))
        })
    }
}
