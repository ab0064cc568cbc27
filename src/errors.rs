// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the try-on pipeline
//!
//! Every failure the session can encounter is recoverable and is reduced to a
//! status/message pair for display. The enums here carry enough context for
//! that message and for logging; none of them is meant to escape the session
//! as an unhandled fault.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using TryOnError
pub type TryOnResult<T> = Result<T, TryOnError>;

/// Top-level error type
#[derive(Debug, Clone, Error)]
pub enum TryOnError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Product binding error: {0}")]
    Binding(#[from] BindingError),
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Camera device errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The user (or platform policy) refused camera access
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    /// No usable capture device
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    /// A frame was requested but no stream is open
    #[error("Camera is not open")]
    NotOpen,
    /// An open request is already waiting on the permission prompt
    #[error("Camera request already pending")]
    Busy,
}

/// Errors producing a source image from an upload or a camera frame
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("Image encoding failed: {0}")]
    Encoding(String),
}

/// Render service failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Transport-level failure (DNS, reset, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),
    /// The service answered with a non-success status
    #[error("Render service returned {status}: {detail}")]
    Server { status: u16, detail: String },
    /// No answer within the configured bound
    #[error("Render request timed out after {0:?}")]
    Timeout(Duration),
    /// The body was not a decodable image
    #[error("Invalid render response: {0}")]
    InvalidResponse(String),
    /// The service could not be reached at all
    #[error("Render service unavailable: {0}")]
    Unavailable(String),
}

impl RenderError {
    /// Whether the render service is absent altogether (no response path)
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::Unavailable(_))
    }
}

/// Errors establishing a bound product from inbound parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("No region rule matches product category '{0}'")]
    UnknownCategory(String),
    #[error("Invalid product color '{0}'")]
    InvalidColor(String),
}

/// Parameter parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("Invalid color '{0}' (expected #RRGGBB)")]
    InvalidColor(String),
    #[error("Unknown region '{0}'")]
    UnknownRegion(String),
    #[error("Unknown makeup type '{0}'")]
    UnknownMakeupType(String),
}

/// Cart handoff errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Product information not found")]
    NotBound,
    #[error("Please sign in to add products to the cart")]
    NotAuthenticated,
    #[error("Invalid product ID format")]
    InvalidProductId(String),
    #[error("Cart service rejected the item ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("Cart network error: {0}")]
    Network(String),
}

/// Configuration file errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(String),
    #[error("Config parse error: {0}")]
    Parse(String),
    #[error("Config serialization error: {0}")]
    Serialize(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::InvalidImage(err.to_string())
    }
}
