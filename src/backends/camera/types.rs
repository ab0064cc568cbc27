// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Which way the requested camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Front camera (selfie)
    #[default]
    User,
    /// Rear camera
    Environment,
}

/// Constraints passed to a backend when requesting a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: CameraFacing,
}

impl std::fmt::Display for CameraConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} ({:?})",
            self.ideal_width, self.ideal_height, self.facing
        )
    }
}

/// Pixel layout of a camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit red, green, blue, alpha
    RGBA,
    /// Packed 8-bit red, green, blue
    RGB24,
    /// Single luma channel, expanded to gray on conversion
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::RGBA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Draw the frame into an offscreen RGB raster, dropping alpha and padding
    ///
    /// Returns `None` when the buffer is too short for the declared geometry.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.width == 0 || self.height == 0 {
            return None;
        }

        let bpp = self.format.bytes_per_pixel();
        let row_bytes = self.width as usize * bpp;
        let stride = self.stride as usize;
        if stride < row_bytes {
            return None;
        }

        let needed = stride * (self.height as usize - 1) + row_bytes;
        if self.data.len() < needed {
            return None;
        }

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for row in self.data.chunks(stride).take(self.height as usize) {
            for pixel in row[..row_bytes].chunks_exact(bpp) {
                match self.format {
                    PixelFormat::RGBA | PixelFormat::RGB24 => rgb.extend_from_slice(&pixel[..3]),
                    PixelFormat::Gray8 => rgb.extend_from_slice(&[pixel[0]; 3]),
                }
            }
        }

        RgbImage::from_raw(self.width, self.height, rgb)
    }
}
