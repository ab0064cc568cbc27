// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │       Session       │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │     CameraGuard     │  ← Exclusive ownership, guaranteed release
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Grant / stream / frame capture
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌────────────┐
//!     │ FileSource │  ← Virtual camera backed by an image file
//!     └────────────┘
//! ```

pub mod file_source;
pub mod guard;
pub mod types;

pub use file_source::FileSourceBackend;
pub use guard::CameraGuard;
pub use types::*;

use crate::errors::CameraError;
use async_trait::async_trait;

/// Host camera capability
///
/// `open` may suspend indefinitely while the platform shows a permission
/// prompt; callers must not hold session state across it.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Human readable backend name for logs
    fn name(&self) -> &str;

    /// Request camera access and start a stream
    ///
    /// # Errors
    /// * `CameraError::PermissionDenied` - the user refused access
    /// * `CameraError::Unavailable` - no usable device
    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// A live capture-device stream
pub trait CameraStream: Send {
    /// Label for logs (device name or source path)
    fn label(&self) -> &str;

    /// Grab the current frame
    fn capture_frame(&mut self) -> Result<CameraFrame, CameraError>;

    /// Stop all tracks; idempotent
    fn stop(&mut self);

    /// Whether the tracks are still running
    fn is_live(&self) -> bool;
}
