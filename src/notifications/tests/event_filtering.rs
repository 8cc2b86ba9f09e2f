//! Unit tests for Event and EventFilter

use crate::notifications::api::{
    DeviceEvent, DeviceEventType, Event, EventFilter, FrameEvent, FrameEventType, SessionEvent,
    SessionEventType,
};
use crate::session::types::{ScanMode, SessionState};

fn all_kinds() -> [Event; 3] {
    [
        Event::Session(SessionEvent::new(
            SessionEventType::StateChanged,
            "s1".to_string(),
            ScanMode::StillImage,
            SessionState::Active,
        )),
        Event::Frame(FrameEvent::with_message(
            FrameEventType::Hit,
            "s1".to_string(),
            4,
            "EAN-13".to_string(),
        )),
        Event::Device(DeviceEvent::with_zoom(
            DeviceEventType::ZoomApplied,
            "s1".to_string(),
            9,
            2.5,
        )),
    ]
}

#[test]
fn test_filter_matrix() {
    let [session, frame, device] = all_kinds();

    let expectations = [
        (EventFilter::SessionOnly, [true, false, false]),
        (EventFilter::FrameOnly, [false, true, false]),
        (EventFilter::DeviceOnly, [false, false, true]),
        (EventFilter::SessionAndFrame, [true, true, false]),
        (EventFilter::All, [true, true, true]),
    ];

    for (filter, expected) in expectations {
        let actual = [
            filter.accepts(&session),
            filter.accepts(&frame),
            filter.accepts(&device),
        ];
        assert_eq!(actual, expected, "{:?}", filter);
    }
}

#[test]
fn test_event_accessors() {
    let [session, frame, device] = all_kinds();
    assert_eq!(session.kind(), "Session");
    assert_eq!(frame.kind(), "Frame");
    assert_eq!(device.kind(), "Device");
    assert!(all_kinds().iter().all(|e| e.session_id() == "s1"));

    match device {
        Event::Device(event) => {
            assert_eq!(event.zoom, Some(2.5));
            assert_eq!(event.handle_id, 9);
        }
        _ => panic!("expected device event"),
    }
}

#[test]
fn test_session_event_terminal_flag() {
    let running = SessionEvent::new(
        SessionEventType::StateChanged,
        "s2".to_string(),
        ScanMode::LiveStream,
        SessionState::Decoding,
    );
    let failed = SessionEvent::with_message(
        SessionEventType::Failed,
        "s2".to_string(),
        ScanMode::LiveStream,
        SessionState::Failed,
        "scan timed out".to_string(),
    );
    assert!(!running.is_terminal());
    assert!(failed.is_terminal());
    assert_eq!(failed.message.as_deref(), Some("scan timed out"));
}
