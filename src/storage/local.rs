//! Local filesystem storage backend

use super::{ArtifactWriter, StorageGateway};
use crate::error::{Error, Result};
use crate::types::FileKind;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Storage gateway backed by a local directory
///
/// Artifacts are laid out `<kind>/<yyyymmdd>/<uuid>_<filename>.<ext>` under
/// the root, so sweeps and manual inspection can navigate by format and day.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a gateway rooted at the given directory
    ///
    /// The directory itself is created lazily by the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory this gateway writes under
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl StorageGateway for LocalStorage {
    fn generate_file_path(&self, kind: FileKind, filename: &str) -> PathBuf {
        // Strip any caller-supplied extension; the kind dictates it
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());

        let day = Utc::now().format("%Y%m%d");
        let unique = uuid::Uuid::new_v4();
        PathBuf::from(kind.dir_name())
            .join(day.to_string())
            .join(format!("{}_{}.{}", unique, stem, kind.extension()))
    }

    async fn writer(&self, path: &Path) -> Result<ArtifactWriter> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| Error::Storage {
                path: path.to_path_buf(),
                message: format!("failed to create artifact directory: {}", e),
            })?;
        }
        let file = tokio::fs::File::create(&full)
            .await
            .map_err(|e| Error::Storage {
                path: path.to_path_buf(),
                message: format!("failed to create artifact: {}", e),
            })?;
        Ok(Box::pin(file))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn size(&self, path: &Path) -> Result<u64> {
        let meta = tokio::fs::metadata(self.resolve(path))
            .await
            .map_err(|e| Error::Storage {
                path: path.to_path_buf(),
                message: format!("failed to stat artifact: {}", e),
            })?;
        Ok(meta.len())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(self.resolve(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage {
                path: path.to_path_buf(),
                message: format!("failed to delete artifact: {}", e),
            }),
        }
    }

    fn url(&self, path: &Path) -> String {
        let full = self.resolve(path);
        format!("file://{}", full.display())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn generated_paths_are_unique_and_typed() {
        let storage = LocalStorage::new("/tmp/exports");

        let a = storage.generate_file_path(FileKind::Excel, "orders");
        let b = storage.generate_file_path(FileKind::Excel, "orders");
        assert_ne!(a, b);
        assert!(a.starts_with("excel"));
        assert_eq!(a.extension().unwrap(), "xlsx");
    }

    #[test]
    fn caller_extension_is_replaced_by_kind() {
        let storage = LocalStorage::new("/tmp/exports");
        let path = storage.generate_file_path(FileKind::Csv, "orders.xls");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_orders.csv"), "unexpected name: {name}");
    }

    #[tokio::test]
    async fn write_then_verify_round_trips() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let path = storage.generate_file_path(FileKind::Json, "data");

        let mut writer = storage.writer(&path).await.unwrap();
        writer.write_all(b"{\"ok\":true}").await.unwrap();
        writer.shutdown().await.unwrap();

        assert!(storage.exists(&path).await);
        assert_eq!(storage.size(&path).await.unwrap(), 11);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let path = storage.generate_file_path(FileKind::Json, "data");

        let mut writer = storage.writer(&path).await.unwrap();
        writer.write_all(b"x").await.unwrap();
        writer.shutdown().await.unwrap();

        storage.delete(&path).await.unwrap();
        assert!(!storage.exists(&path).await);
        // Second delete of a missing artifact is fine
        storage.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn size_of_missing_artifact_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let err = storage.size(Path::new("json/nope.json")).await.unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[test]
    fn url_points_into_root() {
        let storage = LocalStorage::new("/data/exports");
        let url = storage.url(Path::new("pdf/20260830/a_report.pdf"));
        assert_eq!(url, "file:///data/exports/pdf/20260830/a_report.pdf");
    }
}
