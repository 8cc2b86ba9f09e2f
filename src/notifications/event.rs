//! Event types for the notification system

use std::time::SystemTime;

use crate::session::types::{ScanMode, SessionState};

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEventType {
    Started,
    StateChanged,
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FrameEventType {
    Miss,
    Hit,
    /// A hit that arrived after the session already had its result
    Ignored,
    DeviceLost,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEventType {
    Acquired,
    ZoomApplied,
    ZoomUnsupported,
    Released,
    ReleaseFailed,
}

/// Lifecycle of a scan session
#[derive(Clone, Debug)]
pub struct SessionEvent {
    pub event_type: SessionEventType,
    pub timestamp: SystemTime,
    pub session_id: String,
    pub mode: ScanMode,
    pub state: SessionState,
    pub message: Option<String>,
}

impl SessionEvent {
    pub fn new(
        event_type: SessionEventType,
        session_id: String,
        mode: ScanMode,
        state: SessionState,
    ) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            session_id,
            mode,
            state,
            message: None,
        }
    }

    pub fn with_message(
        event_type: SessionEventType,
        session_id: String,
        mode: ScanMode,
        state: SessionState,
        message: String,
    ) -> Self {
        Self {
            message: Some(message),
            ..Self::new(event_type, session_id, mode, state)
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// One decode attempt against a live frame
#[derive(Clone, Debug)]
pub struct FrameEvent {
    pub event_type: FrameEventType,
    pub timestamp: SystemTime,
    pub session_id: String,
    /// Running count of attempts within the session
    pub attempt: u64,
    pub message: Option<String>,
}

impl FrameEvent {
    pub fn new(event_type: FrameEventType, session_id: String, attempt: u64) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            session_id,
            attempt,
            message: None,
        }
    }

    pub fn with_message(
        event_type: FrameEventType,
        session_id: String,
        attempt: u64,
        message: String,
    ) -> Self {
        Self {
            message: Some(message),
            ..Self::new(event_type, session_id, attempt)
        }
    }
}

/// Capture device activity on behalf of a session
#[derive(Clone, Debug)]
pub struct DeviceEvent {
    pub event_type: DeviceEventType,
    pub timestamp: SystemTime,
    pub session_id: String,
    pub handle_id: u64,
    pub zoom: Option<f64>,
    pub message: Option<String>,
}

impl DeviceEvent {
    pub fn new(event_type: DeviceEventType, session_id: String, handle_id: u64) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            session_id,
            handle_id,
            zoom: None,
            message: None,
        }
    }

    pub fn with_zoom(
        event_type: DeviceEventType,
        session_id: String,
        handle_id: u64,
        zoom: f64,
    ) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::new(event_type, session_id, handle_id)
        }
    }

    pub fn with_message(
        event_type: DeviceEventType,
        session_id: String,
        handle_id: u64,
        message: String,
    ) -> Self {
        Self {
            message: Some(message),
            ..Self::new(event_type, session_id, handle_id)
        }
    }
}

/// Unified event enum that encompasses all event types
#[derive(Clone, Debug)]
pub enum Event {
    Session(SessionEvent),
    Frame(FrameEvent),
    Device(DeviceEvent),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Session(_) => "Session",
            Event::Frame(_) => "Frame",
            Event::Device(_) => "Device",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Event::Session(e) => &e.session_id,
            Event::Frame(e) => &e.session_id,
            Event::Device(e) => &e.session_id,
        }
    }
}

/// Event filtering options for subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum EventFilter {
    SessionOnly,
    FrameOnly,
    DeviceOnly,
    SessionAndFrame,
    All,
}

impl EventFilter {
    /// Check if an event should be accepted by this filter
    pub fn accepts(&self, event: &Event) -> bool {
        matches!(
            (self, event),
            (EventFilter::SessionOnly, Event::Session(_))
                | (EventFilter::FrameOnly, Event::Frame(_))
                | (EventFilter::DeviceOnly, Event::Device(_))
                | (EventFilter::SessionAndFrame, Event::Session(_))
                | (EventFilter::SessionAndFrame, Event::Frame(_))
                | (EventFilter::All, _)
        )
    }
}
