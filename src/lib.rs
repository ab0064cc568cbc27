// SPDX-License-Identifier: GPL-3.0-only

//! Virtual makeup try-on preview
//!
//! A user supplies a face image (upload or live camera), tunes per-region
//! cosmetic parameters, and sees a server-rendered composite update live.
//!
//! # Architecture
//!
//! - [`session`]: the [`Session`] aggregate, parameter store and product binding
//! - [`pipelines`]: capture normalization, the render pipeline and image slots
//! - [`backends`]: camera, render service and storefront collaborators
//! - [`cart`]: add-to-cart handoff for a bound product
//! - [`config`]: user configuration handling

pub mod backends;
pub mod cart;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use errors::{TryOnError, TryOnResult};
pub use session::{InputMode, Session, SessionEvent, SessionStatus};
