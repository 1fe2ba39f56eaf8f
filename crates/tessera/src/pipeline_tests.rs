//! Pipeline ordering, recovery, and controller behavior.

use std::sync::Arc;
use std::time::Duration;

use tessera_testing::{
    check_in_response, reward_due_response, BackendCall, MemoryStore, NoticeRecorder, TestBackend,
    TestLoader, TestModule, TestRouter, TestScanner,
};

use crate::{
    ApiError, AttemptOutcome, CameraDevice, CameraManager, CheckInPipeline, DecodeHandler,
    Disposition, Notice, NoticeBus, ScanController, ScanStatus, Severity, View,
};

const TEST_RESUME_DELAY: Duration = Duration::from_millis(20);

fn noop_handler() -> DecodeHandler {
    Arc::new(|_| Box::pin(async {}))
}

struct Rig {
    scanner: Arc<TestScanner>,
    backend: Arc<TestBackend>,
    router: Arc<TestRouter>,
    notices: NoticeBus,
    recorder: NoticeRecorder,
    camera: Arc<CameraManager>,
    pipeline: CheckInPipeline,
}

fn rig() -> Rig {
    let scanner = TestScanner::new();
    let backend = TestBackend::new();
    let router = TestRouter::new();
    let notices = NoticeBus::new();
    let recorder = NoticeRecorder::attach(&notices);
    let module = TestModule::new(
        vec![CameraDevice::new("cam1", "Front camera")],
        scanner.clone(),
    );
    let camera = Arc::new(CameraManager::new(
        Arc::new(TestLoader::new(module)),
        MemoryStore::new(),
        notices.clone(),
        "reader",
    ));
    let pipeline = CheckInPipeline::new(
        camera.clone(),
        backend.clone(),
        notices.clone(),
        router.clone(),
        TEST_RESUME_DELAY,
    );
    Rig {
        scanner,
        backend,
        router,
        notices,
        recorder,
        camera,
        pipeline,
    }
}

async fn scanning_rig() -> Rig {
    let rig = rig();
    rig.camera.initialize(noop_handler()).await.unwrap();
    rig
}

fn success_text(notices: &[Notice]) -> Option<String> {
    notices.iter().find_map(|n| match n {
        Notice::Status {
            text,
            severity: Severity::Success,
        } => Some(text.clone()),
        _ => None,
    })
}

#[tokio::test]
async fn test_successful_check_in_confirms_and_navigates() {
    let rig = scanning_rig().await;
    rig.backend.queue_reward_due(Ok(reward_due_response(false)));
    rig.backend
        .queue_check_in(Ok(check_in_response("Mario", "Rossi")));

    let (attempt, disposition) = rig.pipeline.handle_decode("ABC123").await;

    assert_eq!(disposition, Disposition::Navigated);
    assert_eq!(attempt.reward_due, Some(false));
    assert!(matches!(
        attempt.outcome,
        Some(AttemptOutcome::Success { ref customer_name }) if customer_name == "Mario Rossi"
    ));

    let notices = rig.recorder.drain();
    assert!(!notices.contains(&Notice::RewardDue));
    let confirmation = success_text(&notices).unwrap();
    assert!(confirmation.contains("Mario Rossi"));

    assert_eq!(rig.router.get_navigations(), vec![View::CustomerList]);
    // Navigation implies no restart: the camera stays stopped.
    assert_eq!(rig.camera.status().await, ScanStatus::Stopped);
}

#[tokio::test]
async fn test_lookup_completes_before_submission_starts() {
    let rig = scanning_rig().await;
    rig.backend.queue_reward_due(Ok(reward_due_response(false)));
    rig.backend
        .queue_check_in(Ok(check_in_response("Anna", "Bianchi")));

    rig.pipeline.handle_decode("QR-1").await;

    let calls = rig.backend.get_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], BackendCall::RewardDue("QR-1".to_string()));
    assert!(matches!(
        calls[1],
        BackendCall::CheckIn(ref request) if request.qr_code == "QR-1"
    ));
    // The camera was stopped before either call went out.
    assert_eq!(rig.scanner.get_stop_count(), 1);
}

#[tokio::test]
async fn test_reward_due_emits_banner_and_forwards_flag() {
    let rig = scanning_rig().await;
    rig.backend.queue_reward_due(Ok(reward_due_response(true)));
    rig.backend
        .queue_check_in(Ok(check_in_response("Anna", "Bianchi")));

    let (attempt, disposition) = rig.pipeline.handle_decode("QR-2").await;

    assert_eq!(disposition, Disposition::Navigated);
    assert_eq!(attempt.reward_due, Some(true));

    // Banner first, confirmation second, both before navigation returned.
    let notices = rig.recorder.drain();
    let banner = notices.iter().position(|n| *n == Notice::RewardDue);
    let confirmation = notices.iter().position(|n| {
        matches!(
            n,
            Notice::Status {
                severity: Severity::Success,
                ..
            }
        )
    });
    assert!(banner.unwrap() < confirmation.unwrap());
    assert_eq!(rig.router.get_navigations(), vec![View::CustomerList]);

    // The submission tells the backend this access redeems the reward.
    let calls = rig.backend.get_calls();
    assert!(matches!(
        calls[1],
        BackendCall::CheckIn(ref request) if request.reward == Some(true)
    ));
}

#[tokio::test]
async fn test_lookup_failure_shows_message_then_resumes() {
    let rig = scanning_rig().await;
    rig.backend
        .queue_reward_due(Err(ApiError::from_response(404, r#"{"details":"not found"}"#)));

    let (attempt, disposition) = rig.pipeline.handle_decode("XYZ").await;

    assert_eq!(disposition, Disposition::Resumed);
    assert!(matches!(
        attempt.outcome,
        Some(AttemptOutcome::Failure { ref message }) if message == "not found"
    ));

    // No submission was attempted for the abandoned attempt.
    assert_eq!(
        rig.backend.get_calls(),
        vec![BackendCall::RewardDue("XYZ".to_string())]
    );

    let notices = rig.recorder.drain();
    assert!(notices.contains(&Notice::error("not found")));
    assert!(notices.contains(&Notice::ClearStatus));

    assert_eq!(rig.camera.status().await, ScanStatus::Scanning);
    assert_eq!(rig.scanner.get_starts(), vec!["cam1", "cam1"]);
    assert!(rig.router.get_navigations().is_empty());
}

#[tokio::test]
async fn test_submit_failure_shows_message_then_resumes() {
    let rig = scanning_rig().await;
    rig.backend.queue_reward_due(Ok(reward_due_response(false)));
    rig.backend
        .queue_check_in(Err(ApiError::transport("connection refused")));

    let (attempt, disposition) = rig.pipeline.handle_decode("QR-3").await;

    assert_eq!(disposition, Disposition::Resumed);
    assert!(matches!(
        attempt.outcome,
        Some(AttemptOutcome::Failure { ref message }) if message == "connection refused"
    ));
    assert_eq!(rig.camera.status().await, ScanStatus::Scanning);
    assert!(rig.router.get_navigations().is_empty());
}

#[tokio::test]
async fn test_stop_failure_aborts_before_any_network_call() {
    let rig = scanning_rig().await;
    rig.scanner.set_fail_stop(true);

    let (attempt, disposition) = rig.pipeline.handle_decode("QR-4").await;

    assert_eq!(disposition, Disposition::Stopped);
    assert!(matches!(attempt.outcome, Some(AttemptOutcome::Failure { .. })));
    assert!(rig.backend.get_calls().is_empty());
    assert_eq!(rig.camera.status().await, ScanStatus::Stopped);
    assert!(rig.router.get_navigations().is_empty());
}

#[tokio::test]
async fn test_teardown_mid_run_drops_the_result() {
    let rig = scanning_rig().await;
    rig.backend.set_delay(Duration::from_millis(50));
    rig.backend.queue_reward_due(Ok(reward_due_response(true)));
    rig.backend
        .queue_check_in(Ok(check_in_response("Mario", "Rossi")));

    let pipeline = rig.pipeline;
    let run = tokio::spawn(async move { pipeline.handle_decode("QR-5").await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    rig.camera.teardown().await;

    let (_, disposition) = run.await.unwrap();
    assert_eq!(disposition, Disposition::Ignored);
    assert!(rig.router.get_navigations().is_empty());
    let notices = rig.recorder.drain();
    assert!(!notices.contains(&Notice::RewardDue));
    assert!(success_text(&notices).is_none());
}

#[tokio::test]
async fn test_teardown_during_recovery_skips_the_restart() {
    let rig = scanning_rig().await;
    rig.backend
        .queue_reward_due(Err(ApiError::transport("offline")));

    let pipeline = rig.pipeline;
    let run = tokio::spawn(async move { pipeline.handle_decode("QR-6").await });

    // Tear down while the failure message is still being displayed.
    tokio::time::sleep(Duration::from_millis(5)).await;
    rig.camera.teardown().await;

    let (_, disposition) = run.await.unwrap();
    assert_eq!(disposition, Disposition::Ignored);
    assert_eq!(rig.scanner.get_starts(), vec!["cam1"]);
    assert_eq!(rig.camera.status().await, ScanStatus::Stopped);
}

#[tokio::test]
async fn test_controller_drives_a_decode_to_navigation() {
    let rig = rig();
    rig.backend.queue_reward_due(Ok(reward_due_response(false)));
    rig.backend
        .queue_check_in(Ok(check_in_response("Mario", "Rossi")));

    let controller = ScanController::new(
        rig.camera.clone(),
        rig.backend.clone(),
        rig.notices.clone(),
        rig.router.clone(),
        TEST_RESUME_DELAY,
    );
    controller.enter().await.unwrap();
    assert_eq!(rig.camera.status().await, ScanStatus::Scanning);

    let run = tokio::spawn(controller.run());
    rig.scanner.emit_decode("ABC123").await;
    run.await.unwrap();

    assert_eq!(rig.router.get_navigations(), vec![View::CustomerList]);
    // run() tears the session down after navigating away.
    assert_eq!(rig.camera.status().await, ScanStatus::Stopped);
    assert!(success_text(&rig.recorder.drain()).is_some());
}

#[tokio::test]
async fn test_failed_attempts_alternate_lookup_and_submission() {
    let rig = scanning_rig().await;
    let rounds = 6;
    for _ in 0..rounds {
        rig.backend.queue_reward_due(Ok(reward_due_response(false)));
        rig.backend
            .queue_check_in(Err(ApiError::transport("offline")));
    }

    for _ in 0..rounds {
        let code = format!("QR-{:08x}", fastrand::u32(..));
        let (_, disposition) = rig.pipeline.handle_decode(code.as_str()).await;
        assert_eq!(disposition, Disposition::Resumed);
    }

    // Strict sequencing: every run is a lookup followed by its own
    // submission, never two network calls of one kind back to back.
    let calls = rig.backend.get_calls();
    assert_eq!(calls.len(), rounds * 2);
    for pair in calls.chunks(2) {
        let BackendCall::RewardDue(code) = &pair[0] else {
            panic!("expected a lookup first, got {:?}", pair[0]);
        };
        assert!(matches!(
            pair[1],
            BackendCall::CheckIn(ref request) if request.qr_code == *code
        ));
    }
    assert_eq!(rig.camera.status().await, ScanStatus::Scanning);
}
