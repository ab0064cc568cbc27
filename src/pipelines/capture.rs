// SPDX-License-Identifier: GPL-3.0-only

//! Capture source
//!
//! Both input paths end in the same [`SourceImage`]: an upload is sniffed,
//! decoded and re-encoded; a camera frame is drawn into an offscreen RGB
//! raster and encoded. Decoding and encoding run on the blocking pool.

use super::encoding::{self, EncodingQuality};
use super::result::ImageHandle;
use crate::backends::camera::CameraFrame;
use crate::errors::CaptureError;
use image::RgbImage;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where a source image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Upload,
    Camera,
}

/// A user-selected file
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    /// Declared MIME type, if the picker supplied one
    pub mime: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, mime: None }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Normalized in-memory source image (baseline JPEG)
#[derive(Clone)]
pub struct SourceImage {
    id: Uuid,
    width: u32,
    height: u32,
    encoded: Arc<[u8]>,
    origin: SourceOrigin,
}

impl SourceImage {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    /// Shared JPEG bytes
    pub fn encoded(&self) -> Arc<[u8]> {
        Arc::clone(&self.encoded)
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.encoded.len())
            .field("origin", &self.origin)
            .finish()
    }
}

impl ImageHandle for SourceImage {
    const KIND: &'static str = "source";

    fn handle_id(&self) -> Uuid {
        self.id
    }
}

/// Produces normalized source images
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureSource {
    quality: EncodingQuality,
}

impl CaptureSource {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    /// Validate and normalize an uploaded file
    ///
    /// # Errors
    /// `CaptureError::InvalidImage` when the bytes are not a decodable image
    pub async fn from_upload(&self, upload: Upload) -> Result<SourceImage, CaptureError> {
        if let Some(mime) = upload.mime.as_deref()
            && !mime.starts_with("image/")
        {
            warn!(mime, "Rejected upload with non-image MIME type");
            return Err(CaptureError::InvalidImage(format!(
                "'{}' is not an image type",
                mime
            )));
        }

        let format = encoding::sniff_format(&upload.bytes).ok_or_else(|| {
            CaptureError::InvalidImage("Unrecognized image format".to_string())
        })?;
        debug!(?format, size = upload.bytes.len(), "Decoding upload");

        let quality = self.quality;
        let image = tokio::task::spawn_blocking(move || -> Result<SourceImage, CaptureError> {
            let rgb = encoding::decode(&upload.bytes)?.to_rgb8();
            normalize(&rgb, quality, SourceOrigin::Upload)
        })
        .await
        .map_err(|e| CaptureError::Encoding(format!("Task join error: {}", e)))??;

        info!(width = image.width, height = image.height, "Upload captured");
        Ok(image)
    }

    /// Read a file from disk and treat it as an upload
    pub async fn from_file(&self, path: &Path) -> Result<SourceImage, CaptureError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            CaptureError::InvalidImage(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        self.from_upload(Upload::new(bytes)).await
    }

    /// Snapshot a camera frame into the same representation as uploads
    pub async fn from_frame(&self, frame: CameraFrame) -> Result<SourceImage, CaptureError> {
        let quality = self.quality;
        let image = tokio::task::spawn_blocking(move || -> Result<SourceImage, CaptureError> {
            let rgb = frame.to_rgb_image().ok_or_else(|| {
                CaptureError::InvalidImage(format!(
                    "Frame buffer does not match {}x{} {:?}",
                    frame.width, frame.height, frame.format
                ))
            })?;
            normalize(&rgb, quality, SourceOrigin::Camera)
        })
        .await
        .map_err(|e| CaptureError::Encoding(format!("Task join error: {}", e)))??;

        info!(width = image.width, height = image.height, "Camera frame captured");
        Ok(image)
    }
}

fn normalize(
    rgb: &RgbImage,
    quality: EncodingQuality,
    origin: SourceOrigin,
) -> Result<SourceImage, CaptureError> {
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(CaptureError::InvalidImage("Image has no pixels".to_string()));
    }
    let encoded = encoding::encode_jpeg(rgb, quality).map_err(CaptureError::Encoding)?;
    Ok(SourceImage {
        id: Uuid::new_v4(),
        width: rgb.width(),
        height: rgb.height(),
        encoded: Arc::from(encoded.into_boxed_slice()),
        origin,
    })
}
