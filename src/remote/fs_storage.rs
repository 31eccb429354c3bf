//! Blob storage on a local (or mounted) directory.

use super::{PhotoStorage, UploadError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

const SCHEME: &str = "blob://";

pub struct FsPhotoStorage {
    root: Option<PathBuf>,
}

impl FsPhotoStorage {
    /// `None` models a mis-configured storage: every upload fails.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn root(&self) -> Result<&Path, UploadError> {
        self.root.as_deref().ok_or(UploadError::NotConfigured)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, UploadError> {
        let rel = Path::new(relative);
        // Keep every blob under the root.
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(UploadError::Failed(format!("invalid storage path: {relative}")));
        }
        Ok(self.root()?.join(rel))
    }
}

#[async_trait]
impl PhotoStorage for FsPhotoStorage {
    async fn upload(&self, jpeg: &[u8], path: &str) -> Result<String, UploadError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| UploadError::Failed(e.to_string()))?;
        }
        tokio::fs::write(&target, jpeg)
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?;

        log::debug!("uploaded {} bytes to {}", jpeg.len(), target.display());
        Ok(format!("{SCHEME}{path}"))
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, UploadError> {
        let relative = reference
            .strip_prefix(SCHEME)
            .ok_or_else(|| UploadError::NotFound(reference.to_string()))?;
        let target = self.resolve(relative)?;
        tokio::fs::read(&target)
            .await
            .map_err(|_| UploadError::NotFound(reference.to_string()))
    }
}
