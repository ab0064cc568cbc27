// SPDX-License-Identifier: GPL-3.0-only

//! Image normalization helpers
//!
//! Uploads and camera snapshots are both normalized to baseline JPEG so the
//! render pipeline never has to care where an image came from.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// JPEG preset applied when a capture is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    Low,
    Medium,
    /// Default preset
    #[default]
    High,
    Maximum,
}

impl EncodingQuality {
    pub const ALL: [EncodingQuality; 4] = [
        EncodingQuality::Low,
        EncodingQuality::Medium,
        EncodingQuality::High,
        EncodingQuality::Maximum,
    ];

    /// Quality factor handed to the JPEG encoder
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Sniff the container format from magic bytes
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Decode any supported image
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Encode an RGB raster as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality())
        .encode_image(image)
        .map_err(|e| format!("JPEG encoding failed: {}", e))?;

    debug!(
        width = image.width(),
        height = image.height(),
        size = buffer.len(),
        "Encoded JPEG"
    );
    Ok(buffer)
}
