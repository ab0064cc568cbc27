// SPDX-License-Identifier: GPL-3.0-only

//! Image pipelines feeding and draining the render service
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │ Upload/Frame │ ──▶ │  CaptureSource   │ ──▶ │  RenderPipeline  │ ──▶ │ ResultSlot  │
//! │              │     │  - sniff/decode  │     │  - generations   │     │ - publish   │
//! │              │     │  - JPEG encode   │     │  - timeout       │     │ - release   │
//! └──────────────┘     └──────────────────┘     └──────────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`capture`]: upload and camera-frame normalization
//! - [`encoding`]: JPEG presets and format sniffing
//! - [`render`]: request sequencing and stale-response discarding
//! - [`result`]: single-occupancy image slots

pub mod capture;
pub mod encoding;
pub mod render;
pub mod result;

pub use capture::{CaptureSource, SourceImage, Upload};
pub use encoding::EncodingQuality;
pub use render::{RenderOutcome, RenderPipeline, RenderRequest, Resolution};
pub use result::{ImageSlot, RenderedImage, ResultSlot};
