//! Outcome reporting for real sessions

use listscan::app::startup::{exit_code, outcome_json, render_outcome, EXIT_CANCELLED, EXIT_SUCCESS};
use listscan::camera::FakeCameraBackend;
use listscan::session::{ScanMode, SessionOptions, SessionOutcome, SimulationOptions};

use crate::common::drafting_controller;

#[tokio::test(start_paused = true)]
async fn test_simulated_session_report() {
    let (controller, mut drafts) = drafting_controller(FakeCameraBackend::new(), None);
    let options = SessionOptions::default().with_simulation(SimulationOptions {
        seed: Some(3),
        ..SimulationOptions::default()
    });

    let session = controller
        .start_session(ScanMode::Simulated, options)
        .await
        .unwrap();
    let outcome = session.wait().await;
    let draft = drafts.recv().await.unwrap();
    let code = outcome.result().unwrap().code.clone();

    assert_eq!(exit_code(&outcome), EXIT_SUCCESS);

    let text = render_outcome(&outcome, Some(&draft), false);
    assert!(text.starts_with(&format!("Scanned {} (EAN-13)", code)));
    assert!(text.contains("Quantity: 1"));

    let document = outcome_json(&session.snapshot(), &outcome, Some(&draft));
    assert_eq!(document["session"]["mode"], "simulated");
    assert_eq!(document["session"]["state"], "Succeeded");
    assert_eq!(document["result"]["code"], code.as_str());
    assert_eq!(document["draft"]["barcode"], code.as_str());
    assert!(document["error"].is_null());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_session_report() {
    let (controller, _drafts) = drafting_controller(FakeCameraBackend::new(), None);

    let session = controller
        .start_session(ScanMode::LiveStream, SessionOptions::default())
        .await
        .unwrap();
    let outcome = session.cancel_and_wait().await;

    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(exit_code(&outcome), EXIT_CANCELLED);
    assert_eq!(render_outcome(&outcome, None, false), "Scan cancelled");
}
