// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the try-on session

mod common;

use common::{FakeCamera, FakeRenderService, face_upload, png};
use image::Rgba;
use std::sync::Arc;
use std::time::Duration;
use tryon::Config;
use tryon::backends::camera::{CameraBackend, CameraConstraints};
use tryon::errors::{CameraError, CaptureError};
use tryon::pipelines::Upload;
use tryon::pipelines::capture::SourceOrigin;
use tryon::session::{
    Disposition, InputMode, MakeupType, Mutation, ParameterDefaults, ProductBinding, Region,
    RejectReason, Rgb, Session, SessionEvent, SessionStatus,
};

fn config(cancel_superseded: bool) -> Config {
    Config {
        cancel_superseded,
        ..Config::default()
    }
}

fn session_with(
    config: &Config,
) -> (Session, Arc<FakeRenderService>, Arc<FakeCamera>) {
    let service = FakeRenderService::new();
    let camera = FakeCamera::new();
    let session = Session::new(config, service.clone(), camera.clone());
    (session, service, camera)
}

fn rgb(hex: &str) -> Rgb {
    Rgb::parse_hex(hex).unwrap()
}

fn lipstick() -> ProductBinding {
    ProductBinding {
        product_id: "65f1c0ffee0000000000abcd".into(),
        locked_color: "#AA0000".into(),
        category: "Son môi".into(),
    }
}

fn blush() -> ProductBinding {
    ProductBinding {
        product_id: "65f1c0ffee0000000000dcba".into(),
        locked_color: "#F4A6A6".into(),
        category: "Blush".into(),
    }
}

fn result_color(session: &Session) -> Rgba<u8> {
    *session.latest_result().unwrap().pixels().get_pixel(0, 0)
}

#[tokio::test(start_paused = true)]
async fn test_slow_older_response_never_overwrites_newer() {
    let (mut session, service, _camera) = session_with(&config(false));
    service.set_delay(1, Duration::from_millis(500));
    service.set_delay(2, Duration::from_millis(50));

    session.load_upload(face_upload()).await.unwrap();
    session.set_region_color(Region::Lips, rgb("#00FF00"));
    assert_eq!(session.generation(), 2);
    assert_eq!(session.status(), SessionStatus::Rendering);

    let handled = session.settle().await;

    assert_eq!(
        handled,
        vec![
            Disposition::Published { generation: 2 },
            Disposition::Discarded { generation: 1 },
        ]
    );
    let result = session.latest_result().unwrap();
    assert_eq!(result.generation(), 2);
    assert_eq!(result.width(), 3);
    assert_eq!(result_color(&session), Rgba([0, 255, 0, 255]));
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_request_is_cancelled() {
    let (mut session, service, _camera) = session_with(&config(true));
    service.set_delay(1, Duration::from_millis(500));
    service.set_delay(2, Duration::from_millis(50));

    session.load_upload(face_upload()).await.unwrap();
    session.set_region_intensity(Region::Lips, 10);

    let handled = session.settle().await;

    assert_eq!(handled, vec![Disposition::Published { generation: 2 }]);
    assert_eq!(session.renders_in_flight(), 0);
    assert_eq!(session.latest_result().unwrap().generation(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_publish_only_the_newest() {
    let (mut session, service, _camera) = session_with(&config(false));
    // Earlier generations answer later
    for generation in 1..=5 {
        service.set_delay(generation, Duration::from_millis(600 - generation * 100));
    }

    session.load_upload(face_upload()).await.unwrap();
    for value in [20, 30, 40, 50] {
        session.set_region_intensity(Region::Lips, value);
    }

    session.settle().await;

    assert_eq!(service.calls(), 5);
    assert_eq!(session.latest_result().unwrap().generation(), 5);
    assert_eq!(session.result_releases(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_each_request_carries_full_snapshot() {
    let (mut session, service, _camera) = session_with(&config(true));
    session.set_makeup_type(MakeupType::Both);
    session.set_region_color(Region::Cheeks, rgb("#112233"));

    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;

    let requests = service.requests();
    assert_eq!(requests.len(), 1, "Edits before an image exist do not render");
    let request = &requests[0];
    assert_eq!(request.generation, session.generation());
    assert_eq!(request.makeup_type, MakeupType::Both);
    assert_eq!(request.regions.cheeks.color, rgb("#112233"));
    assert_eq!(request.regions.lips, ParameterDefaults::default().lips);
    assert_eq!(request.image_id, session.source_image().unwrap().id());
}

#[tokio::test(start_paused = true)]
async fn test_superseded_results_are_released() {
    let (mut session, _service, _camera) = session_with(&config(true));
    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;

    for value in [10, 20] {
        session.set_region_intensity(Region::Cheeks, value);
        session.settle().await;
    }
    assert_eq!(session.result_releases(), 2);

    session.reset();
    assert_eq!(session.result_releases(), 3);
    assert_eq!(session.source_releases(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_three_camera_opens_leave_one_stream() {
    let (mut session, _service, camera) = session_with(&config(true));

    for _ in 0..3 {
        session.request_camera().unwrap();
        let handled = session.settle().await;
        assert_eq!(handled, vec![Disposition::CameraReady]);
    }

    assert_eq!(camera.opens(), 3);
    assert_eq!(camera.stops(), 2);
    assert_eq!(camera.live(), 1);
    assert_eq!(session.camera_guard().closed_count(), 2);
    assert!(session.is_camera_open());

    drop(session);
    assert_eq!(camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_locked_color_is_never_mutated() {
    let (mut session, service, _camera) = session_with(&config(true));
    session.bind_product(&lipstick()).unwrap();
    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;

    let generation = session.generation();
    let calls = service.calls();

    let mutation = session.set_region_color(Region::Lips, rgb("#00FF00"));

    assert_eq!(
        mutation,
        Mutation::Rejected(RejectReason::LockedColor(Region::Lips))
    );
    assert_eq!(session.region(Region::Lips).color, rgb("#AA0000"));
    assert_eq!(session.generation(), generation);
    assert_eq!(service.calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_mutations_do_not_render() {
    let (mut session, service, _camera) = session_with(&config(true));
    session.bind_product(&lipstick()).unwrap();
    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;

    let generation = session.generation();
    let calls = service.calls();

    assert_eq!(
        session.set_makeup_type(MakeupType::Both),
        Mutation::Rejected(RejectReason::MakeupTypeFixed)
    );
    assert!(!session.set_region_color(Region::Lips, rgb("#123456")).is_applied());
    let current = session.region(Region::Lips).intensity.get();
    assert_eq!(
        session.set_region_intensity(Region::Lips, current),
        Mutation::Unchanged
    );

    assert_eq!(session.renders_in_flight(), 0);
    assert_eq!(session.generation(), generation);
    assert_eq!(service.calls(), calls);

    // Intensity of the locked region stays editable
    assert!(session.set_region_intensity(Region::Lips, 15).is_applied());
    assert_eq!(session.generation(), generation + 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_twice_equals_reset_once() {
    let (mut session, _service, _camera) = session_with(&config(true));
    session.load_upload(face_upload()).await.unwrap();
    session.set_makeup_type(MakeupType::Both);
    session.set_region_color(Region::Cheeks, rgb("#000000"));
    session.settle().await;

    session.reset();
    let once = (
        *session.parameters().regions(),
        session.makeup_type(),
        session.generation(),
        session.status(),
        session.result_releases(),
    );
    session.reset();
    let twice = (
        *session.parameters().regions(),
        session.makeup_type(),
        session.generation(),
        session.status(),
        session.result_releases(),
    );

    assert_eq!(once, twice);
    assert_eq!(session.makeup_type(), MakeupType::Both);
    assert!(session.source_image().is_none());
    assert!(session.latest_result().is_none());
    assert_eq!(
        *session.parameters().regions(),
        ParameterDefaults::default().regions()
    );
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_reset_discards_in_flight_renders() {
    let (mut session, service, _camera) = session_with(&config(false));
    service.set_default_delay(Duration::from_millis(300));
    session.load_upload(face_upload()).await.unwrap();

    session.reset();
    assert!(session.settle().await.is_empty());
    assert!(session.latest_result().is_none());

    session.load_upload(face_upload()).await.unwrap();
    let handled = session.settle().await;
    assert_eq!(
        handled,
        vec![Disposition::Published {
            generation: session.generation()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_blush_binding_silences_lips() {
    let mut config = config(true);
    config.defaults.lips.intensity = 90.into();
    config.defaults.makeup_type = MakeupType::Both;
    let (mut session, _service, _camera) = session_with(&config);

    session.bind_product(&blush()).unwrap();

    assert_eq!(session.region(Region::Lips).intensity.get(), 0);
    assert_eq!(session.region(Region::Cheeks).color, rgb("#F4A6A6"));
    assert!(session.region(Region::Cheeks).intensity.get() > 0);
    assert_eq!(session.makeup_type(), MakeupType::Cheeks);
    assert_eq!(session.active_regions(), vec![Region::Cheeks]);

    // Still silenced after a reset
    session.reset();
    assert_eq!(session.region(Region::Lips).intensity.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_category_leaves_session_unbound() {
    let (mut session, _service, _camera) = session_with(&config(true));
    let binding = ProductBinding {
        category: "Mascara".into(),
        ..lipstick()
    };

    assert!(session.bind_product(&binding).is_err());
    assert!(session.bound_product().is_none());
    assert_eq!(session.generation(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_last_good_result() {
    let (mut session, service, _camera) = session_with(&config(true));
    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;
    let before = session.latest_result().unwrap().generation();

    service.fail_generation(2);
    session.set_region_intensity(Region::Lips, 5);
    let handled = session.settle().await;

    assert_eq!(handled, vec![Disposition::RenderFailed { generation: 2 }]);
    assert_eq!(session.status(), SessionStatus::Error);
    assert_eq!(session.latest_result().unwrap().generation(), before);
    assert!(session.message().unwrap().contains("render worker crashed"));
    assert_eq!(session.result_releases(), 0);

    // The next edit is a fresh generation and recovers
    session.set_region_intensity(Region::Lips, 6);
    session.settle().await;
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(session.latest_result().unwrap().generation(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_service_needs_manual_retry() {
    let (mut session, service, _camera) = session_with(&config(true));
    service.set_unavailable(true);
    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;

    assert_eq!(session.status(), SessionStatus::Error);
    assert!(session.latest_result().is_none());
    assert_eq!(service.calls(), 1, "Failures are not retried automatically");

    service.set_unavailable(false);
    assert!(session.retry_render());
    session.settle().await;
    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(session.latest_result().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_slow_render_times_out() {
    let mut config = config(true);
    config.render_timeout_ms = 100;
    let (mut session, service, _camera) = session_with(&config);
    service.set_default_delay(Duration::from_secs(5));

    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;

    assert_eq!(session.status(), SessionStatus::Error);
    assert!(session.message().unwrap().contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn test_camera_snapshot_flow() {
    let (mut session, _service, camera) = session_with(&config(true));

    session.set_input_mode(InputMode::Camera);
    assert_eq!(session.status(), SessionStatus::Capturing);
    assert!(session.is_camera_pending());

    assert_eq!(session.settle().await, vec![Disposition::CameraReady]);
    assert!(session.is_camera_open());
    assert_eq!(session.generation(), 0, "Opening the camera does not render");

    session.capture_from_camera().await.unwrap();

    assert_eq!(session.input_mode(), InputMode::Upload);
    assert!(!session.is_camera_open());
    assert_eq!(camera.stops(), 1);
    let source = session.source_image().unwrap();
    assert_eq!(source.origin(), SourceOrigin::Camera);
    assert_eq!((source.width(), source.height()), (8, 6));

    assert_eq!(
        session.settle().await,
        vec![Disposition::Published { generation: 1 }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_denied_camera_falls_back_to_upload() {
    let service = FakeRenderService::new();
    let camera = FakeCamera::denying();
    let mut session = Session::new(&config(true), service.clone(), camera.clone());

    session.set_input_mode(InputMode::Camera);
    assert_eq!(session.settle().await, vec![Disposition::CameraFailed]);

    assert_eq!(session.status(), SessionStatus::Error);
    assert_eq!(session.input_mode(), InputMode::Upload);
    assert!(session.message().unwrap().contains("permission denied"));
    assert!(session.source_image().is_none());
    assert_eq!(session.generation(), 0);

    // Upload still works after a denial
    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;
    assert!(session.latest_result().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_pending_prompt_does_not_block_edits() {
    let (mut session, _service, camera) = session_with(&config(true));
    camera.set_prompt_delay(Duration::from_secs(60));

    session.set_input_mode(InputMode::Camera);
    assert!(matches!(session.request_camera(), Err(CameraError::Busy)));
    assert_eq!(
        session.set_region_intensity(Region::Lips, 12),
        Mutation::Applied
    );
    assert_eq!(session.generation(), 1);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(camera.opens(), 1, "A second request while pending is ignored");
}

#[tokio::test(start_paused = true)]
async fn test_switching_away_abandons_pending_grant() {
    let (mut session, _service, camera) = session_with(&config(true));
    camera.set_prompt_delay(Duration::from_secs(5));

    session.set_input_mode(InputMode::Camera);
    tokio::time::sleep(Duration::from_millis(1)).await;
    session.set_input_mode(InputMode::Upload);
    assert!(!session.is_camera_pending());
    assert_eq!(session.status(), SessionStatus::Idle);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(session.poll_events().is_empty());
    assert_eq!(camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_switching_away_stops_grant_already_queued() {
    let (mut session, _service, camera) = session_with(&config(true));

    session.set_input_mode(InputMode::Camera);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(camera.live(), 1, "Grant is waiting in the queue");

    session.set_input_mode(InputMode::Upload);
    assert_eq!(camera.live(), 0);
    assert!(session.settle().await.is_empty());

    session.set_input_mode(InputMode::Camera);
    assert_eq!(session.settle().await, vec![Disposition::CameraReady]);
    assert_eq!(camera.live(), 1);

    drop(session);
    assert_eq!(camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_stops_unhandled_grant() {
    let (mut session, _service, camera) = session_with(&config(true));

    session.request_camera().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(camera.live(), 1);

    drop(session);
    assert_eq!(camera.live(), 0);
    assert_eq!(camera.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_grant_is_closed_on_arrival() {
    let (mut session, _service, camera) = session_with(&config(true));
    let constraints = CameraConstraints {
        ideal_width: 640,
        ideal_height: 480,
        facing: Default::default(),
    };
    let stream = camera.open(&constraints).await;
    assert_eq!(camera.live(), 1);

    let disposition = session.handle_event(SessionEvent::CameraOpened {
        attempt: 42,
        result: stream,
    });

    assert_eq!(disposition, Disposition::CameraIgnored);
    assert_eq!(camera.live(), 0);
    assert!(!session.is_camera_open());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_upload_leaves_state_untouched() {
    let (mut session, _service, _camera) = session_with(&config(true));
    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;

    let source_id = session.source_image().unwrap().id();
    let result_generation = session.latest_result().unwrap().generation();
    let generation = session.generation();

    let err = session
        .load_upload(Upload::new(b"%PDF-1.7".to_vec()))
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::InvalidImage(_)));
    assert_eq!(session.source_image().unwrap().id(), source_id);
    assert_eq!(session.latest_result().unwrap().generation(), result_generation);
    assert_eq!(session.generation(), generation);
    assert_eq!(session.status(), SessionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn test_new_image_supersedes_pending_render() {
    let (mut session, service, _camera) = session_with(&config(false));
    service.set_delay(1, Duration::from_millis(500));

    session.load_upload(face_upload()).await.unwrap();
    session
        .load_upload(Upload::new(png(4, 4, [1, 2, 3])))
        .await
        .unwrap();

    assert_eq!(
        session.settle().await,
        vec![Disposition::Published { generation: 2 }]
    );
    assert_eq!(session.source_releases(), 1);
    assert_eq!(
        session.latest_result().unwrap().generation(),
        session.generation()
    );
}

#[tokio::test(start_paused = true)]
async fn test_mode_toggle_does_not_render() {
    let (mut session, service, camera) = session_with(&config(true));
    session.load_upload(face_upload()).await.unwrap();
    session.settle().await;
    let generation = session.generation();

    session.set_input_mode(InputMode::Camera);
    session.settle().await;
    session.set_input_mode(InputMode::Upload);

    assert_eq!(session.generation(), generation);
    assert_eq!(service.calls(), 1);
    assert_eq!(camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_upload_while_camera_open_releases_camera() {
    let (mut session, _service, camera) = session_with(&config(true));
    session.set_input_mode(InputMode::Camera);
    session.settle().await;

    session.load_upload(face_upload()).await.unwrap();

    assert_eq!(session.input_mode(), InputMode::Upload);
    assert_eq!(camera.live(), 0);
}
