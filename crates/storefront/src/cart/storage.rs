//! Persistent slots holding the serialized cart.
//!
//! A slot stores one opaque string and is overwritten wholesale on every
//! write. The store owns the only handle to its slot.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors reading or writing a slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single named slot of durable storage.
#[async_trait]
pub trait SnapshotSlot: Send + Sync {
    /// Current contents, or `None` if nothing was ever written.
    async fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the contents.
    async fn write(&self, contents: &str) -> Result<(), StorageError>;
}

/// A slot backed by a file.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the target,
/// so a reader never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotSlot for FileSlot {
    async fn read(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn write(&self, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, contents)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

/// An in-process slot. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that already holds `contents`.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    /// What a fresh reader would see.
    pub async fn contents(&self) -> Option<String> {
        self.contents.lock().await.clone()
    }
}

#[async_trait]
impl SnapshotSlot for MemorySlot {
    async fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents().await)
    }

    async fn write(&self, contents: &str) -> Result<(), StorageError> {
        *self.contents.lock().await = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_slot_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("cart.json"));
        assert!(slot.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_slot_overwrites_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("nested/data/cart.json"));

        slot.write("first").await.unwrap();
        slot.write("second").await.unwrap();

        assert_eq!(slot.read().await.unwrap().as_deref(), Some("second"));
        assert!(!slot.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_slot_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the read fail.
        let slot = FileSlot::new(dir.path());
        let err = slot.read().await.unwrap_err();
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }

    #[tokio::test]
    async fn test_memory_slot_clones_share_contents() {
        let slot = MemorySlot::new();
        let other = slot.clone();
        slot.write("{}").await.unwrap();
        assert_eq!(other.contents().await.as_deref(), Some("{}"));
        assert_eq!(
            MemorySlot::with_contents("x").read().await.unwrap().as_deref(),
            Some("x")
        );
    }
}
