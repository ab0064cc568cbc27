// SPDX-License-Identifier: GPL-3.0-only

//! Camera resource guard
//!
//! The guard is the only owner of the live camera stream. At most one
//! stream is held at a time; installing a new one stops the previous one
//! first, and dropping the guard stops whatever is still open, so every
//! exit path (mode switch, capture, reset, teardown, error) releases the
//! device through [`CameraGuard::close`].

use super::{CameraBackend, CameraConstraints, CameraFrame, CameraStream};
use crate::errors::CameraError;
use tracing::{debug, info, warn};

#[derive(Default)]
pub struct CameraGuard {
    stream: Option<Box<dyn CameraStream>>,
    opened: u64,
    closed: u64,
}

impl CameraGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close any open stream, then request and hold a new one
    ///
    /// On failure nothing is held and the error is returned unchanged.
    pub async fn open(
        &mut self,
        backend: &dyn CameraBackend,
        constraints: &CameraConstraints,
    ) -> Result<(), CameraError> {
        self.close();

        info!(backend = backend.name(), %constraints, "Requesting camera access");
        match backend.open(constraints).await {
            Ok(stream) => {
                self.install(stream);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Camera open failed");
                Err(e)
            }
        }
    }

    /// Take ownership of an already granted stream
    pub fn install(&mut self, stream: Box<dyn CameraStream>) {
        self.close();
        info!(stream = stream.label(), "Camera stream live");
        self.stream = Some(stream);
        self.opened += 1;
    }

    /// Stop all tracks and drop the handle; safe when nothing is open
    ///
    /// Returns true if a stream was actually closed.
    pub fn close(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                self.closed += 1;
                info!(stream = stream.label(), "Camera stream closed");
                true
            }
            None => {
                debug!("Camera close requested with no open stream");
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.as_ref().is_some_and(|stream| stream.is_live())
    }

    pub fn capture_frame(&mut self) -> Result<CameraFrame, CameraError> {
        let stream = self.stream.as_mut().ok_or(CameraError::NotOpen)?;
        if !stream.is_live() {
            return Err(CameraError::NotOpen);
        }
        stream.capture_frame()
    }

    /// Streams held over the guard's lifetime
    pub fn opened_count(&self) -> u64 {
        self.opened
    }

    /// Streams released over the guard's lifetime
    pub fn closed_count(&self) -> u64 {
        self.closed
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.close();
    }
}
