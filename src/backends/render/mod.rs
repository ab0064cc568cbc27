// SPDX-License-Identifier: GPL-3.0-only

//! Remote makeup render service
//!
//! The service is a black box: given a [`RenderRequest`] it returns the
//! encoded bytes of a composite image, or fails. Latency is unbounded from
//! the caller's point of view; the pipeline applies its own timeout.

pub mod http;

pub use http::HttpRenderService;

use crate::errors::RenderError;
use crate::pipelines::render::RenderRequest;
use async_trait::async_trait;

#[async_trait]
pub trait RenderService: Send + Sync {
    /// Render one self-contained request
    ///
    /// # Returns
    /// The encoded composite (usually JPEG) exactly as the service sent it
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError>;
}
