// SPDX-License-Identifier: GPL-3.0-only

//! Shared test doubles for the render service and camera

#![allow(dead_code)]

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tryon::backends::camera::{
    CameraBackend, CameraConstraints, CameraFrame, CameraStream,
};
use tryon::backends::render::RenderService;
use tryon::errors::{CameraError, RenderError};
use tryon::pipelines::{RenderRequest, Upload};

pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn face_upload() -> Upload {
    Upload::new(png(16, 16, [220, 180, 160])).with_mime("image/png")
}

/// Render service answering with a `(generation + 1) x 1` PNG filled with
/// the request's lips color
#[derive(Default)]
pub struct FakeRenderService {
    default_delay: Mutex<Duration>,
    delays: Mutex<HashMap<u64, Duration>>,
    failures: Mutex<HashSet<u64>>,
    unavailable: AtomicBool,
    requests: Mutex<Vec<RenderRequest>>,
}

impl FakeRenderService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            default_delay: Mutex::new(Duration::from_millis(20)),
            ..Default::default()
        })
    }

    pub fn set_delay(&self, generation: u64, delay: Duration) {
        self.delays.lock().unwrap().insert(generation, delay);
    }

    pub fn set_default_delay(&self, delay: Duration) {
        *self.default_delay.lock().unwrap() = delay;
    }

    pub fn fail_generation(&self, generation: u64) {
        self.failures.lock().unwrap().insert(generation);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenderService for FakeRenderService {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RenderError::Unavailable("connection refused".into()));
        }

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(&request.generation)
            .copied()
            .unwrap_or(*self.default_delay.lock().unwrap());
        tokio::time::sleep(delay).await;

        if self.failures.lock().unwrap().contains(&request.generation) {
            return Err(RenderError::Server {
                status: 500,
                detail: "render worker crashed".into(),
            });
        }

        let lips = request.regions.lips.color;
        Ok(png(
            request.generation as u32 + 1,
            1,
            [lips.r, lips.g, lips.b],
        ))
    }
}

/// Counters shared between a fake camera and its streams
#[derive(Default)]
pub struct CameraCounters {
    pub opens: AtomicUsize,
    pub granted: AtomicUsize,
    pub stops: AtomicUsize,
    pub live: AtomicUsize,
}

pub struct FakeCamera {
    pub counters: Arc<CameraCounters>,
    deny: AtomicBool,
    delay: Mutex<Duration>,
}

impl FakeCamera {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            counters: Arc::new(CameraCounters::default()),
            deny: AtomicBool::new(false),
            delay: Mutex::new(Duration::from_millis(10)),
        })
    }

    pub fn denying() -> Arc<Self> {
        let camera = Self::new();
        camera.deny.store(true, Ordering::SeqCst);
        camera
    }

    /// Simulate a permission prompt the user takes `delay` to answer
    pub fn set_prompt_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.counters.stops.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraBackend for FakeCamera {
    fn name(&self) -> &str {
        "fake"
    }

    async fn open(
        &self,
        _constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        tokio::time::sleep(delay).await;

        if self.deny.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied("user dismissed prompt".into()));
        }

        self.counters.granted.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            counters: Arc::clone(&self.counters),
            live: true,
        }))
    }
}

struct FakeStream {
    counters: Arc<CameraCounters>,
    live: bool,
}

impl CameraStream for FakeStream {
    fn label(&self) -> &str {
        "fake stream"
    }

    fn capture_frame(&mut self) -> Result<CameraFrame, CameraError> {
        if !self.live {
            return Err(CameraError::NotOpen);
        }
        let frame = RgbaImage::from_pixel(8, 6, Rgba([90, 60, 50, 255]));
        Ok(CameraFrame::from_rgba(8, 6, frame.into_raw()))
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.counters.stops.fetch_add(1, Ordering::SeqCst);
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
