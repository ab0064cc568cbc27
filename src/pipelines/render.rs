// SPDX-License-Identifier: GPL-3.0-only

//! Render pipeline
//!
//! Every trigger carries a generation number. Requests run concurrently on
//! the runtime and report back through a channel; the owner feeds each
//! [`RenderOutcome`] to [`RenderPipeline::resolve`], which decides whether it
//! is the newest answer seen so far or a stale one to drop.
//!
//! ```text
//!   submit(g1) ──▶ task ─────────────── slow ──────────────┐
//!   submit(g2) ──▶ task ── fast ──┐                         │
//!                                 ▼                         ▼
//!                          resolve(g2): Accepted    resolve(g1): Stale
//! ```
//!
//! Failed responses advance the watermark the same way accepted ones do, so
//! an older success can never overwrite the state a newer failure reported.

use super::capture::SourceImage;
use super::result::RenderedImage;
use crate::backends::render::RenderService;
use crate::errors::RenderError;
use crate::session::{MakeupType, Region, RegionConfig, RegionParams};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A self-contained render request built once from session state
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    pub generation: u64,
    #[serde(skip)]
    pub image: Arc<[u8]>,
    pub image_id: Uuid,
    pub regions: RegionConfig,
    pub makeup_type: MakeupType,
}

impl RenderRequest {
    pub fn new(
        generation: u64,
        source: &SourceImage,
        regions: &RegionConfig,
        makeup_type: MakeupType,
    ) -> Self {
        Self {
            generation,
            image: source.encoded(),
            image_id: source.id(),
            regions: *regions,
            makeup_type,
        }
    }

    pub fn region(&self, region: Region) -> &RegionParams {
        self.regions.get(region)
    }

    /// JSON description for logs (image bytes omitted)
    pub fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("generation {}", self.generation))
    }
}

/// Completion of one render task
#[derive(Debug)]
pub struct RenderOutcome {
    pub generation: u64,
    pub result: Result<RenderedImage, RenderError>,
}

/// What the owner should do with an outcome
#[derive(Debug)]
pub enum Resolution {
    /// Newest answer so far; publish it
    Accepted(RenderedImage),
    /// Newest answer so far, and it failed
    Failed { generation: u64, error: RenderError },
    /// Older than something already handled; drop silently
    Stale { generation: u64 },
}

pub struct RenderPipeline {
    service: Arc<dyn RenderService>,
    timeout: Duration,
    cancel_superseded: bool,
    in_flight: BTreeMap<u64, AbortHandle>,
    /// Highest generation whose response has been handled
    watermark: u64,
    /// Responses below this generation are stale regardless of watermark
    floor: u64,
    outcomes: mpsc::UnboundedSender<RenderOutcome>,
}

impl RenderPipeline {
    pub fn new(
        service: Arc<dyn RenderService>,
        timeout: Duration,
        cancel_superseded: bool,
        outcomes: mpsc::UnboundedSender<RenderOutcome>,
    ) -> Self {
        Self {
            service,
            timeout,
            cancel_superseded,
            in_flight: BTreeMap::new(),
            watermark: 0,
            floor: 0,
            outcomes,
        }
    }

    /// Issue `request` without waiting for it
    pub fn submit(&mut self, request: RenderRequest) {
        let generation = request.generation;
        info!(generation, request = %request.describe(), "Issuing render request");

        let service = Arc::clone(&self.service);
        let timeout = self.timeout;
        let outcomes = self.outcomes.clone();

        let task = tokio::spawn(async move {
            let result = run(service.as_ref(), &request, timeout).await;
            // The receiver is gone only when the session is being torn down
            let _ = outcomes.send(RenderOutcome { generation, result });
        });

        self.in_flight.insert(generation, task.abort_handle());
    }

    /// Classify an outcome against the generations already handled
    pub fn resolve(&mut self, outcome: RenderOutcome) -> Resolution {
        let generation = outcome.generation;
        self.in_flight.remove(&generation);

        if generation < self.floor || generation < self.watermark {
            debug!(
                generation,
                watermark = self.watermark,
                floor = self.floor,
                "Discarding stale render response"
            );
            return Resolution::Stale { generation };
        }

        self.watermark = generation;
        if self.cancel_superseded {
            self.abort_below(generation);
        }

        match outcome.result {
            Ok(image) => {
                info!(
                    generation,
                    width = image.width(),
                    height = image.height(),
                    "Render accepted"
                );
                Resolution::Accepted(image)
            }
            Err(error) => {
                warn!(generation, error = %error, "Render failed");
                Resolution::Failed { generation, error }
            }
        }
    }

    /// Mark every generation below `generation` stale and abort them
    pub fn invalidate_before(&mut self, generation: u64) {
        self.floor = self.floor.max(generation);
        self.abort_below(generation);
    }

    /// Abort everything in flight
    pub fn cancel_all(&mut self) {
        for (generation, handle) in std::mem::take(&mut self.in_flight) {
            debug!(generation, "Cancelling render request");
            handle.abort();
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Whether a request that could still replace the current result is in flight
    pub fn is_rendering(&self) -> bool {
        let from = self.watermark.saturating_add(1).max(self.floor);
        self.in_flight.range(from..).next().is_some()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn abort_below(&mut self, generation: u64) {
        let newer = self.in_flight.split_off(&generation);
        for (old, handle) in std::mem::replace(&mut self.in_flight, newer) {
            debug!(old, superseded_by = generation, "Cancelling superseded render");
            handle.abort();
        }
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn run(
    service: &dyn RenderService,
    request: &RenderRequest,
    timeout: Duration,
) -> Result<RenderedImage, RenderError> {
    let bytes = tokio::time::timeout(timeout, service.render(request))
        .await
        .map_err(|_| RenderError::Timeout(timeout))??;

    let generation = request.generation;
    tokio::task::spawn_blocking(move || RenderedImage::decode(generation, bytes))
        .await
        .map_err(|e| RenderError::InvalidResponse(format!("Decode task failed: {}", e)))?
        .map_err(|e| RenderError::InvalidResponse(e.to_string()))
}
