// SPDX-License-Identifier: GPL-3.0-only

//! Session state enums and the events that flow back into a session

use crate::backends::camera::CameraStream;
use crate::errors::CameraError;
use crate::pipelines::render::RenderOutcome;
use std::fmt;

/// Where the next source image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Upload,
    Camera,
}

/// Coarse session state shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    /// Waiting on the camera permission prompt or a snapshot
    Capturing,
    /// At least one render request newer than the current result is in flight
    Rendering,
    /// The last handled operation failed; see the session message
    Error,
}

/// Asynchronous completion delivered back to the session
pub enum SessionEvent {
    CameraOpened {
        attempt: u64,
        result: Result<Box<dyn CameraStream>, CameraError>,
    },
    RenderCompleted(RenderOutcome),
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::CameraOpened { attempt, result } => f
                .debug_struct("CameraOpened")
                .field("attempt", attempt)
                .field(
                    "result",
                    &result.as_ref().map(|stream| stream.label().to_string()),
                )
                .finish(),
            SessionEvent::RenderCompleted(outcome) => {
                f.debug_tuple("RenderCompleted").field(outcome).finish()
            }
        }
    }
}

/// What handling an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A render result became the latest result
    Published { generation: u64 },
    /// The newest render failed; the previous result stays visible
    RenderFailed { generation: u64 },
    /// Older than something already handled
    Discarded { generation: u64 },
    /// The camera stream is live
    CameraReady,
    /// Camera access was refused or the device is missing
    CameraFailed,
    /// A grant nobody is waiting for any more; closed on arrival
    CameraIgnored,
}
