// SPDX-License-Identifier: GPL-3.0-only

//! Try-on session
//!
//! [`Session`] is the single owner of everything one try-on interaction
//! touches: the camera guard, the source and result image slots, the
//! parameter store and the render pipeline. Background work (camera grants,
//! render responses) never mutates the session directly; it comes back as a
//! [`SessionEvent`] that the owner passes to [`Session::handle_event`].
//!
//! ```text
//!   load_upload / capture_from_camera ──▶ source slot ──┐
//!                                                       ├──▶ RenderPipeline ──▶ result slot
//!   set_region_* / set_makeup_type ──▶ ParameterStore ──┘
//! ```
//!
//! Every accepted change bumps the generation counter. Only the newest
//! handled generation can reach the result slot.

pub mod parameters;
pub mod product;
pub mod state;

pub use parameters::{
    Intensity, MakeupType, Mutation, ParameterDefaults, ParameterStore, Region, RegionConfig,
    RegionParams, RejectReason, Rgb,
};
pub use product::{BoundProduct, CategoryRule, CategoryRules, ProductBinding};
pub use state::{Disposition, InputMode, SessionEvent, SessionStatus};

use crate::backends::camera::{CameraBackend, CameraConstraints, CameraGuard};
use crate::backends::render::RenderService;
use crate::cart::{CartHandoff, Notification};
use crate::config::Config;
use crate::errors::{BindingError, CameraError, CaptureError, RenderError};
use crate::pipelines::capture::{CaptureSource, SourceImage, Upload};
use crate::pipelines::render::{RenderOutcome, RenderPipeline, RenderRequest, Resolution};
use crate::pipelines::result::{ImageSlot, RenderedImage, ResultSlot};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

struct PendingCamera {
    attempt: u64,
    task: AbortHandle,
}

pub struct Session {
    params: ParameterStore,
    rules: CategoryRules,
    capture: CaptureSource,
    camera_backend: Arc<dyn CameraBackend>,
    camera_constraints: CameraConstraints,
    camera: CameraGuard,
    pending_camera: Option<PendingCamera>,
    camera_attempts: u64,
    camera_tx: mpsc::UnboundedSender<SessionEvent>,
    camera_rx: mpsc::UnboundedReceiver<SessionEvent>,
    pipeline: RenderPipeline,
    render_rx: mpsc::UnboundedReceiver<RenderOutcome>,
    source: ImageSlot<SourceImage>,
    result: ResultSlot,
    input_mode: InputMode,
    generation: u64,
    renders_issued: u64,
    status: SessionStatus,
    message: Option<String>,
}

impl Session {
    pub fn new(
        config: &Config,
        render_service: Arc<dyn RenderService>,
        camera_backend: Arc<dyn CameraBackend>,
    ) -> Self {
        let (render_tx, render_rx) = mpsc::unbounded_channel();
        let (camera_tx, camera_rx) = mpsc::unbounded_channel();

        Self {
            params: ParameterStore::new(config.defaults),
            rules: config.category_rules.clone(),
            capture: CaptureSource::new(config.capture_quality),
            camera_backend,
            camera_constraints: config.camera_constraints(),
            camera: CameraGuard::new(),
            pending_camera: None,
            camera_attempts: 0,
            camera_tx,
            camera_rx,
            pipeline: RenderPipeline::new(
                render_service,
                config.render_timeout(),
                config.cancel_superseded,
                render_tx,
            ),
            render_rx,
            source: ImageSlot::new(),
            result: ResultSlot::new(),
            input_mode: InputMode::Upload,
            generation: 0,
            renders_issued: 0,
            status: SessionStatus::Idle,
            message: None,
        }
    }

    /// Constrain the session to a catalog product
    ///
    /// An unrecognized category leaves the session unbound.
    pub fn bind_product(&mut self, binding: &ProductBinding) -> Result<Mutation, BindingError> {
        let product = BoundProduct::resolve(binding, &self.rules).inspect_err(|e| {
            warn!(product_id = %binding.product_id, error = %e, "Product binding rejected");
        })?;

        info!(
            product_id = %product.id,
            region = %product.locked_region,
            color = %product.locked_color,
            "Binding product"
        );
        let mutation = self.params.bind_product(product);
        Ok(self.after_mutation(mutation))
    }

    // Input mode and camera

    /// Switch input mode; switching away from the camera always releases it
    pub fn set_input_mode(&mut self, mode: InputMode) {
        if mode == self.input_mode {
            return;
        }
        info!(?mode, "Input mode changed");

        match mode {
            InputMode::Upload => {
                self.release_camera();
                self.input_mode = InputMode::Upload;
                if self.status == SessionStatus::Capturing {
                    self.status = self.settled_status();
                }
            }
            InputMode::Camera => {
                if let Err(e) = self.request_camera() {
                    debug!(error = %e, "Camera mode already requested");
                }
            }
        }
    }

    /// Ask for camera access without waiting for the answer
    ///
    /// Fails with [`CameraError::Busy`] while an earlier request is still
    /// waiting on the permission prompt. Any open stream is closed before the
    /// new request goes out.
    pub fn request_camera(&mut self) -> Result<(), CameraError> {
        if let Some(pending) = &self.pending_camera {
            debug!(attempt = pending.attempt, "Camera request already pending");
            return Err(CameraError::Busy);
        }

        self.camera.close();
        self.stop_queued_grants();
        self.input_mode = InputMode::Camera;
        self.camera_attempts += 1;
        let attempt = self.camera_attempts;

        let backend = Arc::clone(&self.camera_backend);
        let constraints = self.camera_constraints;
        let events = self.camera_tx.clone();
        let task = tokio::spawn(async move {
            let result = backend.open(&constraints).await;
            if let Err(unsent) = events.send(SessionEvent::CameraOpened { attempt, result })
                && let SessionEvent::CameraOpened {
                    result: Ok(mut stream),
                    ..
                } = unsent.0
            {
                stream.stop();
            }
        });

        debug!(attempt, "Camera requested");
        self.pending_camera = Some(PendingCamera {
            attempt,
            task: task.abort_handle(),
        });
        self.status = SessionStatus::Capturing;
        Ok(())
    }

    /// Snapshot the live camera into a new source image
    ///
    /// On success the camera is closed and the input mode reverts to upload.
    pub async fn capture_from_camera(&mut self) -> Result<(), CaptureError> {
        let frame = match self.camera.capture_frame() {
            Ok(frame) => frame,
            Err(e) => return Err(self.capture_failed(e.into())),
        };

        match self.capture.from_frame(frame).await {
            Ok(image) => {
                self.release_camera();
                self.input_mode = InputMode::Upload;
                self.install_source(image);
                Ok(())
            }
            Err(e) => Err(self.capture_failed(e)),
        }
    }

    // Capture

    /// Validate an uploaded file and make it the source image
    ///
    /// A rejected upload leaves the previous source and result untouched.
    pub async fn load_upload(&mut self, upload: Upload) -> Result<(), CaptureError> {
        let captured = self.capture.from_upload(upload).await;
        self.accept_upload(captured)
    }

    pub async fn load_file(&mut self, path: &Path) -> Result<(), CaptureError> {
        let captured = self.capture.from_file(path).await;
        self.accept_upload(captured)
    }

    fn accept_upload(
        &mut self,
        captured: Result<SourceImage, CaptureError>,
    ) -> Result<(), CaptureError> {
        match captured {
            Ok(image) => {
                if self.input_mode == InputMode::Camera {
                    self.release_camera();
                    self.input_mode = InputMode::Upload;
                }
                self.install_source(image);
                Ok(())
            }
            Err(e) => Err(self.capture_failed(e)),
        }
    }

    // Parameters

    pub fn set_makeup_type(&mut self, makeup_type: MakeupType) -> Mutation {
        let mutation = self.params.set_makeup_type(makeup_type);
        self.after_mutation(mutation)
    }

    pub fn set_region_color(&mut self, region: Region, color: Rgb) -> Mutation {
        let mutation = self.params.set_region_color(region, color);
        self.after_mutation(mutation)
    }

    pub fn set_region_intensity(&mut self, region: Region, value: u8) -> Mutation {
        let mutation = self.params.set_region_intensity(region, value);
        self.after_mutation(mutation)
    }

    // Render control

    /// Re-issue the current state as a new generation
    ///
    /// Returns false when there is no source image to render.
    pub fn retry_render(&mut self) -> bool {
        if self.source.is_empty() {
            return false;
        }
        info!(generation = self.generation + 1, "Manual render retry");
        self.bump_generation();
        self.trigger_render()
    }

    /// Restore default parameters and drop the source and result images
    ///
    /// Releases the camera, cancels all renders, and marks every generation
    /// issued so far stale. Calling it twice is the same as calling it once.
    pub fn reset(&mut self) {
        info!(generation = self.generation, "Resetting session");
        self.release_camera();
        self.input_mode = InputMode::Upload;
        self.pipeline.cancel_all();
        self.pipeline.invalidate_before(self.generation + 1);
        self.source.clear();
        self.result.clear();
        self.params.reset();
        self.status = SessionStatus::Idle;
        self.message = None;
    }

    /// Release every resource the session holds
    pub fn close(&mut self) {
        self.release_camera();
        self.pipeline.cancel_all();
        self.source.clear();
        self.result.clear();
    }

    // Event loop

    /// Wait for the next background completion
    ///
    /// Returns `None` when nothing is outstanding.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if !self.pipeline.is_busy() && self.pending_camera.is_none() {
            return None;
        }

        tokio::select! {
            Some(outcome) = self.render_rx.recv() => Some(SessionEvent::RenderCompleted(outcome)),
            Some(event) = self.camera_rx.recv() => Some(event),
            else => None,
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> Disposition {
        match event {
            SessionEvent::RenderCompleted(outcome) => self.on_render_completed(outcome),
            SessionEvent::CameraOpened { attempt, result } => {
                let current = self
                    .pending_camera
                    .as_ref()
                    .is_some_and(|pending| pending.attempt == attempt);

                if !current || self.input_mode != InputMode::Camera {
                    if let Ok(mut stream) = result {
                        info!(attempt, stream = stream.label(), "Closing late camera grant");
                        stream.stop();
                    }
                    return Disposition::CameraIgnored;
                }

                self.pending_camera = None;
                match result {
                    Ok(stream) => {
                        self.camera.install(stream);
                        self.message = None;
                        self.status = self.settled_status();
                        Disposition::CameraReady
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Camera unavailable, back to upload");
                        self.input_mode = InputMode::Upload;
                        self.status = SessionStatus::Error;
                        self.message = Some(e.to_string());
                        Disposition::CameraFailed
                    }
                }
            }
        }
    }

    /// Handle completions until nothing is outstanding
    pub async fn settle(&mut self) -> Vec<Disposition> {
        let mut handled = Vec::new();
        while let Some(event) = self.next_event().await {
            handled.push(self.handle_event(event));
        }
        handled
    }

    /// Handle whatever has already completed without waiting
    pub fn poll_events(&mut self) -> Vec<Disposition> {
        let mut handled = Vec::new();
        while let Ok(outcome) = self.render_rx.try_recv() {
            handled.push(self.on_render_completed(outcome));
        }
        while let Ok(event) = self.camera_rx.try_recv() {
            handled.push(self.handle_event(event));
        }
        handled
    }

    /// Forward the bound product to the cart; session state is unaffected
    pub async fn add_to_cart(&self, handoff: &CartHandoff) -> Notification {
        handoff.add_bound_product_to_cart(self.params.bound_product()).await
    }

    // Accessors

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// User-facing message for the current status, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    pub fn region(&self, region: Region) -> &RegionParams {
        self.params.region(region)
    }

    pub fn makeup_type(&self) -> MakeupType {
        self.params.makeup_type()
    }

    pub fn active_regions(&self) -> Vec<Region> {
        self.params.active_regions()
    }

    pub fn bound_product(&self) -> Option<&BoundProduct> {
        self.params.bound_product()
    }

    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source.current()
    }

    pub fn latest_result(&self) -> Option<&RenderedImage> {
        self.result.current()
    }

    pub fn is_camera_open(&self) -> bool {
        self.camera.is_open()
    }

    pub fn is_camera_pending(&self) -> bool {
        self.pending_camera.is_some()
    }

    pub fn camera_guard(&self) -> &CameraGuard {
        &self.camera
    }

    /// Render requests issued over the session's lifetime
    pub fn renders_issued(&self) -> u64 {
        self.renders_issued
    }

    pub fn renders_in_flight(&self) -> usize {
        self.pipeline.in_flight_count()
    }

    pub fn source_releases(&self) -> u64 {
        self.source.released_count()
    }

    pub fn result_releases(&self) -> u64 {
        self.result.released_count()
    }

    // Internals

    fn after_mutation(&mut self, mutation: Mutation) -> Mutation {
        if mutation.is_applied() {
            self.bump_generation();
            self.trigger_render();
        }
        mutation
    }

    fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn install_source(&mut self, image: SourceImage) {
        info!(id = %image.id(), origin = ?image.origin(), "New source image");
        self.source.publish(image);
        let generation = self.bump_generation();
        self.pipeline.invalidate_before(generation);
        self.message = None;
        self.trigger_render();
    }

    fn trigger_render(&mut self) -> bool {
        let Some(source) = self.source.current() else {
            debug!(generation = self.generation, "No source image, render deferred");
            return false;
        };

        let request = RenderRequest::new(
            self.generation,
            source,
            self.params.regions(),
            self.params.makeup_type(),
        );
        self.pipeline.submit(request);
        self.renders_issued += 1;
        self.status = self.settled_status();
        true
    }

    fn on_render_completed(&mut self, outcome: RenderOutcome) -> Disposition {
        match self.pipeline.resolve(outcome) {
            Resolution::Accepted(image) => {
                let generation = image.generation();
                self.result.publish(image);
                self.message = None;
                self.status = self.settled_status();
                Disposition::Published { generation }
            }
            Resolution::Failed { generation, error } => {
                self.status = SessionStatus::Error;
                self.message = Some(render_failure_message(&error));
                Disposition::RenderFailed { generation }
            }
            Resolution::Stale { generation } => Disposition::Discarded { generation },
        }
    }

    fn capture_failed(&mut self, error: CaptureError) -> CaptureError {
        warn!(error = %error, "Capture rejected");
        self.status = SessionStatus::Error;
        self.message = Some(error.to_string());
        error
    }

    fn release_camera(&mut self) {
        if let Some(pending) = self.pending_camera.take() {
            debug!(attempt = pending.attempt, "Abandoning camera request");
            pending.task.abort();
        }
        self.stop_queued_grants();
        self.camera.close();
    }

    /// Stop streams granted to an abandoned request that the loop never saw
    fn stop_queued_grants(&mut self) {
        while let Ok(event) = self.camera_rx.try_recv() {
            if let SessionEvent::CameraOpened {
                attempt,
                result: Ok(mut stream),
            } = event
            {
                info!(attempt, stream = stream.label(), "Closing queued camera grant");
                stream.stop();
            }
        }
    }

    fn settled_status(&self) -> SessionStatus {
        if self.pending_camera.is_some() {
            SessionStatus::Capturing
        } else if self.pipeline.is_rendering() {
            SessionStatus::Rendering
        } else {
            SessionStatus::Idle
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

fn render_failure_message(error: &RenderError) -> String {
    if error.is_fatal() {
        format!("{}. Try again when the service is reachable", error)
    } else {
        error.to_string()
    }
}
