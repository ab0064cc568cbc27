// SPDX-License-Identifier: GPL-3.0-only

//! Image handle lifecycle
//!
//! [`ImageSlot`] owns at most one image handle. Publishing installs the new
//! handle before the previous one is released, so a reader never observes
//! an empty slot during a swap. Clearing and dropping release through the
//! same path, which keeps a per-slot release count for diagnostics.

use super::encoding;
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// An owned image that lives in an [`ImageSlot`]
pub trait ImageHandle {
    /// Name used in logs ("source", "result")
    const KIND: &'static str;

    fn handle_id(&self) -> Uuid;
}

/// Single-occupancy owner of an image handle
pub struct ImageSlot<T: ImageHandle> {
    current: Option<T>,
    released: u64,
}

impl<T: ImageHandle> ImageSlot<T> {
    pub fn new() -> Self {
        Self {
            current: None,
            released: 0,
        }
    }

    /// Install `handle`, then release the one it replaces
    pub fn publish(&mut self, handle: T) {
        debug!(kind = T::KIND, id = %handle.handle_id(), "Publishing image handle");
        if let Some(previous) = self.current.replace(handle) {
            self.release(previous);
        }
    }

    /// Release the current handle, if any
    pub fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            self.release(previous);
        }
    }

    /// Borrow the current handle; re-read on every use instead of caching
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Handles released by this slot so far
    pub fn released_count(&self) -> u64 {
        self.released
    }

    fn release(&mut self, handle: T) {
        debug!(kind = T::KIND, id = %handle.handle_id(), "Releasing image handle");
        self.released += 1;
        drop(handle);
    }
}

impl<T: ImageHandle> Default for ImageSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ImageHandle> Drop for ImageSlot<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Slot holding the latest accepted render
pub type ResultSlot = ImageSlot<RenderedImage>;

/// A decoded composite returned by the render service
#[derive(Clone)]
pub struct RenderedImage {
    id: Uuid,
    generation: u64,
    encoded: Arc<[u8]>,
    pixels: RgbaImage,
}

impl RenderedImage {
    /// Decode the service response for `generation`
    pub fn decode(generation: u64, encoded: Vec<u8>) -> Result<Self, image::ImageError> {
        let pixels = encoding::decode(&encoded)?.to_rgba8();
        Ok(Self {
            id: Uuid::new_v4(),
            generation,
            encoded: Arc::from(encoded.into_boxed_slice()),
            pixels,
        })
    }

    /// Generation of the request this image answers
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Bytes as returned by the service
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedImage")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("bytes", &self.encoded.len())
            .finish()
    }
}

impl ImageHandle for RenderedImage {
    const KIND: &'static str = "result";

    fn handle_id(&self) -> Uuid {
        self.id
    }
}
