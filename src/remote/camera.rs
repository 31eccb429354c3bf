//! Camera stand-in for the CLI: a "capture" reads an image file.

use super::{Camera, CaptureError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct FileCamera {
    source: PathBuf,
}

impl FileCamera {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn capture(&self, task_id: &str) -> Result<Vec<u8>, CaptureError> {
        log::debug!("capturing {} for task {}", self.source.display(), task_id);
        tokio::fs::read(&self.source).await.map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => {
                CaptureError::PermissionDenied(self.source.display().to_string())
            }
            ErrorKind::Interrupted => CaptureError::Cancelled,
            _ => CaptureError::Unavailable(format!("{}: {}", self.source.display(), e)),
        })
    }
}
