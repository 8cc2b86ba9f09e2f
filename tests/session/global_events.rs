//! Sessions publish their lifecycle on the process-wide notification service

use std::sync::Arc;

use serial_test::serial;

use listscan::camera::{CameraStreamManager, FakeCameraBackend};
use listscan::decoder::{DecodeEngineAdapter, FixtureDecoder};
use listscan::notifications::api::{
    get_notification_service_arc, Event, EventFilter, SessionEventType,
};
use listscan::session::{ScanMode, ScanSessionController, SessionOptions, SessionState};
use listscan::sink::NullSink;

#[tokio::test(start_paused = true)]
#[serial]
async fn test_simulated_session_lifecycle_events() {
    let notifications = get_notification_service_arc();
    let mut events = notifications
        .lock()
        .await
        .subscribe(
            "lifecycle-test".to_string(),
            EventFilter::SessionOnly,
            "test".to_string(),
        )
        .unwrap();

    let controller = ScanSessionController::new(
        Arc::new(CameraStreamManager::new(Arc::new(FakeCameraBackend::new()))),
        Arc::new(DecodeEngineAdapter::new(Arc::new(FixtureDecoder::new()), Vec::new())),
        Arc::new(NullSink),
        Arc::clone(&notifications),
    );
    let session = controller
        .start_session(ScanMode::Simulated, SessionOptions::default())
        .await
        .unwrap();
    session.wait().await;

    // The terminal event follows the status update, so read until it arrives
    let mut seen = Vec::new();
    while let Some(Event::Session(event)) = events.recv().await {
        assert_eq!(event.session_id, session.id());
        let terminal = event.is_terminal();
        seen.push((event.event_type, event.state));
        if terminal {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            (SessionEventType::Started, SessionState::Initializing),
            (SessionEventType::StateChanged, SessionState::Active),
            (SessionEventType::StateChanged, SessionState::Decoding),
            (SessionEventType::Succeeded, SessionState::Succeeded),
        ]
    );

    assert!(notifications.lock().await.unsubscribe("lifecycle-test"));
}
