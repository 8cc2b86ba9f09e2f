//! Decoded codes reach the item workflow exactly once

use std::sync::Arc;
use std::time::Duration;

use listscan::camera::FakeCameraBackend;
use listscan::decoder::StillImage;
use listscan::lookup::simulated::describe_code;
use listscan::lookup::SimulatedLookup;
use listscan::session::{ScanFailure, ScanMode, SessionOptions, SessionOutcome, SimulationOptions};

use crate::common::{drafting_controller, ean_frame, PRODUCT_CODE};

#[tokio::test(start_paused = true)]
async fn test_live_scan_drafts_item_from_lookup() {
    let camera = FakeCameraBackend::new().with_frames(vec![
        String::new(),
        "code_128:ABC-1".to_string(),
        ean_frame(PRODUCT_CODE),
    ]);
    let lookup = Arc::new(SimulatedLookup::new(Duration::from_millis(10), Some(7)));
    let (controller, mut drafts) = drafting_controller(camera, Some(lookup));

    let session = controller
        .start_session(ScanMode::LiveStream, SessionOptions::default())
        .await
        .unwrap();
    let outcome = session.wait().await;

    // The Code128 frame wins: it arrives before the EAN-13 frame
    let result = outcome.result().unwrap();
    assert_eq!(result.code, "ABC-1");

    let draft = drafts.recv().await.unwrap();
    assert_eq!(draft.barcode, "ABC-1");
    assert_eq!(draft.quantity, 1);
    assert!(draft.price.is_some());
    assert!(drafts.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_brazilian_code_gets_simulated_product_name() {
    let camera = FakeCameraBackend::new().with_frames(vec![ean_frame(PRODUCT_CODE)]);
    let lookup = Arc::new(SimulatedLookup::new(Duration::from_millis(10), Some(7)));
    let (controller, mut drafts) = drafting_controller(camera, Some(lookup));

    let session = controller
        .start_session(ScanMode::LiveStream, SessionOptions::default())
        .await
        .unwrap();
    session.wait().await;

    let draft = drafts.recv().await.unwrap();
    let (category, name) = describe_code(PRODUCT_CODE);
    assert_eq!(draft.name, name);
    assert_eq!(draft.category, category);
    let price = draft.price.unwrap();
    assert!((5.0..30.0).contains(&price));
}

#[tokio::test]
async fn test_still_scan_without_lookup_uses_fallback_draft() {
    let (controller, mut drafts) = drafting_controller(FakeCameraBackend::new(), None);

    let session = controller
        .start_session(ScanMode::StillImage, SessionOptions::default())
        .await
        .unwrap();
    session
        .submit_image(StillImage::new(ean_frame(PRODUCT_CODE)))
        .unwrap();

    assert!(matches!(session.wait().await, SessionOutcome::Succeeded(_)));
    let draft = drafts.recv().await.unwrap();
    assert_eq!(draft.name, "Product 7891");
    assert_eq!(draft.price, None);
}

#[tokio::test(start_paused = true)]
async fn test_simulated_scan_drafts_the_synthesized_code() {
    let (controller, mut drafts) = drafting_controller(FakeCameraBackend::new(), None);
    let options = SessionOptions::default().with_simulation(SimulationOptions {
        seed: Some(99),
        ..SimulationOptions::default()
    });

    let session = controller
        .start_session(ScanMode::Simulated, options)
        .await
        .unwrap();
    let outcome = session.wait().await;

    let code = outcome.result().unwrap().code.clone();
    assert_eq!(code.len(), 13);
    assert_eq!(drafts.recv().await.unwrap().barcode, code);
}

#[tokio::test(start_paused = true)]
async fn test_failed_and_cancelled_scans_draft_nothing() {
    let (controller, mut drafts) = drafting_controller(FakeCameraBackend::new(), None);

    let timed_out = controller
        .start_session(
            ScanMode::LiveStream,
            SessionOptions::default().with_timeout(Duration::from_millis(500)),
        )
        .await
        .unwrap();
    assert_eq!(
        timed_out.wait().await,
        SessionOutcome::Failed(ScanFailure::ScanTimeout {
            timeout: Duration::from_millis(500)
        })
    );

    let cancelled = controller
        .start_session(ScanMode::LiveStream, SessionOptions::default())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(cancelled.cancel_and_wait().await, SessionOutcome::Cancelled);

    assert!(drafts.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_slow_lookup_does_not_hold_the_session_open() {
    let lookup = Arc::new(SimulatedLookup::default());
    let (controller, mut drafts) = drafting_controller(FakeCameraBackend::new(), Some(lookup));

    let started = tokio::time::Instant::now();
    let session = controller
        .start_session(ScanMode::Simulated, SessionOptions::default())
        .await
        .unwrap();
    let outcome = session.wait().await;

    assert!(matches!(outcome, SessionOutcome::Succeeded(_)));
    assert!(started.elapsed() < Duration::from_millis(2500));
    assert!(drafts.try_recv().is_err());

    let next = controller
        .start_session(ScanMode::Simulated, SessionOptions::default())
        .await
        .unwrap();
    assert_eq!(next.cancel_and_wait().await, SessionOutcome::Cancelled);
    assert!(started.elapsed() < Duration::from_millis(2500));

    let draft = drafts.recv().await.unwrap();
    assert_eq!(draft.barcode, outcome.result().unwrap().code);
    assert!(started.elapsed() >= Duration::from_millis(3500));
}
