//! Media store seam: durable put/get of raw media bytes by reference.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ProviderError, ProviderResult};

/// Durable storage of raw media bytes keyed by an opaque reference.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes, returning the reference under which they were stored.
    async fn put(&self, bytes: Vec<u8>) -> ProviderResult<String>;

    /// Fetch bytes by reference.
    async fn get(&self, media_ref: &str) -> ProviderResult<Vec<u8>>;

    /// Delete bytes by reference. Deleting a missing object is a no-op.
    async fn delete(&self, media_ref: &str) -> ProviderResult<()>;
}

/// Filesystem-backed media store. References are relative file names under a
/// root directory, so a reference never escapes the root.
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, media_ref: &str) -> ProviderResult<PathBuf> {
        if media_ref.is_empty() || media_ref.contains("..") || media_ref.contains('/') {
            return Err(ProviderError::validation(format!(
                "invalid media ref: {}",
                media_ref
            )));
        }
        Ok(self.root.join(media_ref))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn put(&self, bytes: Vec<u8>) -> ProviderResult<String> {
        tokio::fs::create_dir_all(&self.root).await?;
        let media_ref = format!("{}.bin", Uuid::new_v4());
        let path = self.path_for(&media_ref)?;
        tokio::fs::write(&path, &bytes).await?;
        debug!(media_ref = media_ref.as_str(), size = bytes.len(), "Stored media object");
        Ok(media_ref)
    }

    async fn get(&self, media_ref: &str) -> ProviderResult<Vec<u8>> {
        let path = self.path_for(media_ref)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProviderError::not_found(media_ref))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, media_ref: &str) -> ProviderResult<()> {
        let path = self.path_for(media_ref)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory media store for tests and single-process runs.
#[derive(Default)]
pub struct MemoryMediaStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn put(&self, bytes: Vec<u8>) -> ProviderResult<String> {
        let media_ref = format!("{}.bin", Uuid::new_v4());
        self.objects.lock().await.insert(media_ref.clone(), bytes);
        Ok(media_ref)
    }

    async fn get(&self, media_ref: &str) -> ProviderResult<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(media_ref)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(media_ref))
    }

    async fn delete(&self, media_ref: &str) -> ProviderResult<()> {
        self.objects.lock().await.remove(media_ref);
        Ok(())
    }
}
