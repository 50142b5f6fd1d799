//! File storage backends
//!
//! Uploaded documents and generated certificates are kept behind the
//! [`FileStore`] trait: a local-filesystem backend for deployments and an
//! in-memory backend for tests. The workflow engine only ever passes
//! opaque paths around; it never reads file contents itself.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};

/// An uploaded file ready to be persisted
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Descriptor of a persisted file
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub stored_name: String,
    pub original_name: String,
    pub path: String,
    pub size_bytes: i64,
    pub content_type: String,
}

/// File storage backend trait
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist an upload under a generated name
    async fn save(&self, file: &NewFile) -> Result<StoredFile>;

    /// Write content at a fixed path (used for generated certificates)
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Retrieve content by path
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Check if a path exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Delete content by path
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Filesystem-based storage backend
pub struct LocalFileStore {
    base_dir: PathBuf,
    max_upload_bytes: u64,
}

impl LocalFileStore {
    pub fn new(base_dir: impl Into<PathBuf>, max_upload_bytes: u64) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.upload_dir, config.max_upload_bytes)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }
}

/// Extension of the original filename, restricted to short ASCII
/// alphanumerics so stored names stay shell- and URL-safe.
fn sanitized_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ext.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(8)
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|ext| !ext.is_empty())
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, file: &NewFile) -> Result<StoredFile> {
        if file.bytes.len() as u64 > self.max_upload_bytes {
            return Err(AppError::Validation {
                message: format!(
                    "file {} exceeds the {} byte upload limit",
                    file.original_name, self.max_upload_bytes
                ),
                field: Some("documents".to_string()),
            });
        }

        let stored_name = match sanitized_extension(&file.original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        self.put(&stored_name, &file.bytes).await?;

        Ok(StoredFile {
            stored_name: stored_name.clone(),
            original_name: file.original_name.clone(),
            path: stored_name,
            size_bytes: file.bytes.len() as i64,
            content_type: file.content_type.clone(),
        })
    }

    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path);

        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut out = fs::File::create(&full).await?;
        out.write_all(bytes).await?;
        out.sync_all().await?;

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.resolve(path))
            .await
            .map_err(|e| AppError::Storage {
                message: format!("failed to read {}: {}", path, e),
            })
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.resolve(path)).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        fs::remove_file(self.resolve(path))
            .await
            .map_err(|e| AppError::Storage {
                message: format!("failed to delete {}: {}", path, e),
            })
    }
}

/// In-memory storage backend for tests
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.files.lock().expect("file store lock poisoned")
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn save(&self, file: &NewFile) -> Result<StoredFile> {
        let stored_name = match sanitized_extension(&file.original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        self.lock().insert(stored_name.clone(), file.bytes.clone());

        Ok(StoredFile {
            stored_name: stored_name.clone(),
            original_name: file.original_name.clone(),
            path: stored_name,
            size_bytes: file.bytes.len() as i64,
            content_type: file.content_type.clone(),
        })
    }

    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.lock().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::Storage {
                message: format!("no such file: {}", path),
            })
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.lock().contains_key(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| AppError::Storage {
                message: format!("no such file: {}", path),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_upload(bytes: &[u8]) -> NewFile {
        NewFile {
            original_name: "dni escaneado.PDF".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_sanitized_extension() {
        assert_eq!(sanitized_extension("scan.PDF"), Some("pdf".to_string()));
        assert_eq!(sanitized_extension("photo.jpeg"), Some("jpeg".to_string()));
        assert_eq!(sanitized_extension("no_extension"), None);
        assert_eq!(sanitized_extension("weird.p!d@f"), Some("pdf".to_string()));
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(dir.path(), 1024);

        let saved = store.save(&pdf_upload(b"%PDF-1.4")).await.expect("save");
        assert!(saved.stored_name.ends_with(".pdf"));
        assert_eq!(saved.size_bytes, 8);

        assert!(store.exists(&saved.path).await.expect("exists"));
        assert_eq!(store.read(&saved.path).await.expect("read"), b"%PDF-1.4");

        store.delete(&saved.path).await.expect("delete");
        assert!(!store.exists(&saved.path).await.expect("exists"));
        assert!(store.read(&saved.path).await.is_err());
    }

    #[tokio::test]
    async fn test_local_store_rejects_oversized_upload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(dir.path(), 4);

        let err = store.save(&pdf_upload(b"too large")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryFileStore::new();
        let saved = store.save(&pdf_upload(b"data")).await.expect("save");

        assert!(store.exists(&saved.path).await.expect("exists"));
        assert_eq!(store.read(&saved.path).await.expect("read"), b"data");
        assert_eq!(store.len(), 1);

        store.delete(&saved.path).await.expect("delete");
        assert!(store.is_empty());
    }
}
