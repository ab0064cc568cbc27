// SPDX-License-Identifier: GPL-3.0-only

//! File-backed virtual camera
//!
//! Serves a still image as if it were a live camera. The image is decoded
//! once when the stream opens and scaled down to fit the requested ideal
//! resolution; every captured frame is that same picture. Used by the CLI
//! and wherever no physical device is available.

use super::types::{CameraConstraints, CameraFrame};
use super::{CameraBackend, CameraStream};
use crate::constants::file_formats;
use crate::errors::CameraError;
use async_trait::async_trait;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Camera backend that streams frames decoded from an image file
#[derive(Debug, Clone)]
pub struct FileSourceBackend {
    path: PathBuf,
}

impl FileSourceBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CameraBackend for FileSourceBackend {
    fn name(&self) -> &str {
        "file-source"
    }

    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !file_formats::is_image_extension(&extension) {
            return Err(CameraError::Unavailable(format!(
                "Unsupported file source format: '{}'",
                extension
            )));
        }

        let path = self.path.clone();
        let constraints = *constraints;
        let frame = tokio::task::spawn_blocking(move || load_frame(&path, &constraints))
            .await
            .map_err(|e| CameraError::Unavailable(format!("File source task error: {}", e)))??;

        info!(
            path = %self.path.display(),
            width = frame.width,
            height = frame.height,
            "File source camera opened"
        );

        Ok(Box::new(FileSourceStream {
            label: self.path.display().to_string(),
            frame,
            live: true,
        }))
    }
}

/// Load and fit the source image
fn load_frame(path: &Path, constraints: &CameraConstraints) -> Result<CameraFrame, CameraError> {
    let img = image::open(path).map_err(|e| {
        CameraError::Unavailable(format!("Failed to load '{}': {}", path.display(), e))
    })?;

    let img = if img.width() > constraints.ideal_width || img.height() > constraints.ideal_height
    {
        debug!(
            from_width = img.width(),
            from_height = img.height(),
            %constraints,
            "Scaling file source to ideal resolution"
        );
        img.resize(
            constraints.ideal_width,
            constraints.ideal_height,
            FilterType::Triangle,
        )
    } else {
        img
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

struct FileSourceStream {
    label: String,
    frame: CameraFrame,
    live: bool,
}

impl CameraStream for FileSourceStream {
    fn label(&self) -> &str {
        &self.label
    }

    fn capture_frame(&mut self) -> Result<CameraFrame, CameraError> {
        if !self.live {
            return Err(CameraError::NotOpen);
        }
        let mut frame = self.frame.clone();
        frame.captured_at = Instant::now();
        Ok(frame)
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
