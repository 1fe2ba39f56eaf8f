//! # Kiosk Demo
//!
//! Runs the scan-to-check-in workflow end to end against simulated
//! collaborators: the first walk-up scans a code the backend does not know
//! (the kiosk shows the error and resumes scanning), the second checks
//! Mario Rossi in with a reward due and navigates to the customer list.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tessera_core::{ApiError, CameraDevice, CameraManager, Notice, NoticeBus, ScanController};
use tessera_testing::{
    check_in_response, reward_due_response, MemoryStore, TestBackend, TestLoader, TestModule,
    TestRouter, TestScanner,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // ========================================================================
    // Simulated collaborators
    // ========================================================================

    let scanner = TestScanner::new();
    let module = TestModule::new(
        vec![
            CameraDevice::new("cam1", "Counter camera"),
            CameraDevice::new("cam2", "Door camera"),
        ],
        scanner.clone(),
    );
    let store = MemoryStore::new();
    let notices = NoticeBus::new();
    let router = TestRouter::new();

    let backend = TestBackend::new();
    // First decode: the code is unknown to the backend.
    backend.queue_reward_due(Err(ApiError::from_response(
        404,
        r#"{"details":"Customer not found"}"#,
    )));
    // Second decode: a regular check-in with a reward due.
    backend.queue_reward_due(Ok(reward_due_response(true)));
    backend.queue_check_in(Ok(check_in_response("Mario", "Rossi")));

    // ========================================================================
    // Notice printer (stands in for the page rendering banners/status lines)
    // ========================================================================

    let mut notice_rx = notices.subscribe();
    tokio::spawn(async move {
        while let Ok(notice) = notice_rx.recv().await {
            match notice {
                Notice::RewardDue => println!(">> reward banner shown"),
                Notice::Status { text, severity } => println!(">> [{severity:?}] {text}"),
                Notice::ClearStatus => println!(">> (status cleared)"),
            }
        }
    });

    // ========================================================================
    // Scan view lifecycle
    // ========================================================================

    let camera = Arc::new(CameraManager::new(
        Arc::new(TestLoader::new(module)),
        store,
        notices.clone(),
        "reader",
    ));
    let controller = ScanController::new(
        camera.clone(),
        backend.clone(),
        notices.clone(),
        router.clone(),
        Duration::from_millis(1000),
    );

    controller.enter().await?;
    println!(
        "Scanning on {}",
        camera.active_device_id().await.unwrap_or_default()
    );

    let run = tokio::spawn(controller.run());

    // Two walk-up customers. The second waits out the recovery delay the
    // first one triggered.
    scanner.emit_decode("UNKNOWN-CODE").await;
    tokio::time::sleep(Duration::from_millis(1200)).await;
    scanner.emit_decode("QR-MARIO-0001").await;

    run.await?;
    println!("Navigated to: {:?}", router.get_navigations());

    Ok(())
}
