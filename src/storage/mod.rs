//! Artifact storage gateway
//!
//! Abstracts "write a named artifact, read it back, check existence/size,
//! produce an access URL". The engine and reaper only ever touch artifacts
//! through this trait; [`LocalStorage`] backs it with the local filesystem,
//! and hosts may plug in an object-storage implementation. Paths handed
//! across the trait are relative to the gateway's root, so task records stay
//! portable across backends.

mod local;

pub use local::LocalStorage;

use crate::error::Result;
use crate::types::FileKind;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::AsyncWrite;

/// Boxed async byte sink handed out by [`StorageGateway::writer`]
pub type ArtifactWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Abstraction over a byte-addressable artifact store
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Build a fresh destination path for an artifact of the given kind
    ///
    /// Paths are unique per call; two tasks never share a destination.
    fn generate_file_path(&self, kind: FileKind, filename: &str) -> PathBuf;

    /// Open a writer for the given path, creating intermediate structure
    async fn writer(&self, path: &Path) -> Result<ArtifactWriter>;

    /// Whether an artifact exists at the given path
    async fn exists(&self, path: &Path) -> bool;

    /// Size in bytes of the artifact at the given path
    async fn size(&self, path: &Path) -> Result<u64>;

    /// Delete the artifact at the given path; deleting a missing artifact
    /// is not an error
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Produce an access URL for the artifact at the given path
    fn url(&self, path: &Path) -> String;
}
