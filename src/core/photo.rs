//! Photo capture, downscale/encode and upload with inline fallback.

use crate::errors::{AppError, AppResult};
use crate::models::task_result::{PhotoData, PhotoRef, TaskResult};
use crate::models::template::TaskDefinition;
use crate::remote::{Camera, CaptureError, PhotoStorage};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{NaiveDate, NaiveDateTime};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use std::sync::Arc;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSettings {
    /// Longest edge after downscale, in pixels.
    pub max_edge: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            max_edge: 800,
            quality: 70,
        }
    }
}

/// Where a new photo goes.
#[derive(Debug, Clone, Copy)]
pub struct PhotoTarget<'a> {
    pub store_id: &'a str,
    pub date: NaiveDate,
    pub submission_id: &'a str,
    pub task_id: &'a str,
    /// 1-based index of the photo within the task.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub photo: PhotoRef,
    /// False when the upload failed and the photo was kept inline.
    pub uploaded: bool,
}

/// Deterministic blob path of a photo.
pub fn storage_path(target: &PhotoTarget<'_>) -> String {
    format!(
        "checklists/{}/{}/{}/{}_{}.jpg",
        target.store_id,
        target.date.format("%Y-%m-%d"),
        target.submission_id,
        target.task_id,
        target.index
    )
}

/// Decode any supported image, shrink it so the longer edge is at most
/// `max_edge`, and re-encode as JPEG.
pub fn downscale_and_encode(raw: &[u8], settings: PhotoSettings) -> AppResult<Vec<u8>> {
    let img = image::load_from_memory(raw).map_err(|e| AppError::Encode(e.to_string()))?;

    let (w, h) = img.dimensions();
    let img = if w.max(h) > settings.max_edge {
        img.resize(settings.max_edge, settings.max_edge, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, settings.quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| AppError::Encode(e.to_string()))?;
    Ok(out)
}

pub fn to_data_url(jpeg: &[u8]) -> String {
    format!("{DATA_URL_PREFIX}{}", BASE64_STANDARD.encode(jpeg))
}

pub fn from_data_url(data_url: &str) -> Option<Vec<u8>> {
    let payload = data_url.strip_prefix(DATA_URL_PREFIX)?;
    BASE64_STANDARD.decode(payload).ok()
}

/// Attach `photo` to `result` and auto-complete the task once the required
/// count is met. Returns whether the requirement is now satisfied.
pub fn apply_photo(
    result: &mut TaskResult,
    photo: PhotoRef,
    task: &TaskDefinition,
    user: &str,
    at: NaiveDateTime,
) -> bool {
    result.photos.push(photo);
    let satisfied = result.photo_count() >= task.required_photos as usize;
    if task.needs_photos() && satisfied && !result.completed {
        result.set_completed(true, user, at);
    }
    satisfied
}

pub struct PhotoCaptureUploader {
    camera: Arc<dyn Camera>,
    storage: Arc<dyn PhotoStorage>,
    settings: PhotoSettings,
}

impl PhotoCaptureUploader {
    pub fn new(
        camera: Arc<dyn Camera>,
        storage: Arc<dyn PhotoStorage>,
        settings: PhotoSettings,
    ) -> Self {
        Self {
            camera,
            storage,
            settings,
        }
    }

    pub fn storage(&self) -> Arc<dyn PhotoStorage> {
        Arc::clone(&self.storage)
    }

    /// Grab a raw frame. Errors are returned so the caller can offer a retry.
    pub async fn capture(&self, task_id: &str) -> Result<Vec<u8>, CaptureError> {
        self.camera.capture(task_id).await
    }

    /// Encode and store a captured frame.
    ///
    /// An upload failure is not an error: the JPEG is kept inline on the
    /// task result instead.
    pub async fn commit(&self, target: &PhotoTarget<'_>, raw: &[u8]) -> AppResult<CommitOutcome> {
        let jpeg = downscale_and_encode(raw, self.settings)?;
        let path = storage_path(target);

        match self.storage.upload(&jpeg, &path).await {
            Ok(reference) => Ok(CommitOutcome {
                photo: PhotoRef::new(PhotoData::Stored { reference, path }),
                uploaded: true,
            }),
            Err(e) => {
                log::warn!("upload of {path} failed, keeping photo inline: {e}");
                Ok(CommitOutcome {
                    photo: PhotoRef::new(PhotoData::Inline {
                        data_url: to_data_url(&jpeg),
                    }),
                    uploaded: false,
                })
            }
        }
    }
}
