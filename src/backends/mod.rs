// SPDX-License-Identifier: GPL-3.0-only

//! Collaborators outside the try-on core
//!
//! - [`camera`]: camera grant, stream and frame capture
//! - [`render`]: the remote makeup render service
//! - [`commerce`]: authentication and cart

pub mod camera;
pub mod commerce;
pub mod render;
