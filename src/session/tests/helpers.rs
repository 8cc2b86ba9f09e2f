//! Shared fixtures for session tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::camera::{CameraStreamManager, FakeCameraBackend, FakeCameraStats};
use crate::decoder::{DecodeEngineAdapter, DecodeResult, FixtureDecoder};
use crate::notifications::api::{
    new_notification_service, Event, EventFilter, EventReceiver, NotificationService,
};
use crate::session::ScanSessionController;
use crate::sink::{ResultSink, SinkResult};

pub const PRODUCT_CODE: &str = "7891234567890";

/// Sink that remembers every result it is given
#[derive(Default)]
pub struct RecordingSink {
    results: Mutex<Vec<DecodeResult>>,
}

impl RecordingSink {
    pub fn results(&self) -> Vec<DecodeResult> {
        self.results.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn accept(&self, result: &DecodeResult) -> SinkResult<()> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

pub struct Harness {
    pub controller: ScanSessionController,
    pub camera: Arc<CameraStreamManager>,
    pub camera_stats: Arc<FakeCameraStats>,
    pub decoder: Arc<FixtureDecoder>,
    pub sink: Arc<RecordingSink>,
    pub notifications: NotificationService,
}

impl Harness {
    pub fn new(camera: FakeCameraBackend) -> Self {
        Self::with_decoder(camera, FixtureDecoder::new())
    }

    pub fn with_decoder(camera: FakeCameraBackend, decoder: FixtureDecoder) -> Self {
        let camera_stats = camera.stats();
        let camera = Arc::new(CameraStreamManager::new(Arc::new(camera)));
        let decoder = Arc::new(decoder);
        let adapter = Arc::new(DecodeEngineAdapter::new(decoder.clone(), Vec::new()));
        let sink = Arc::new(RecordingSink::default());
        let notifications = new_notification_service();

        let controller = ScanSessionController::new(
            Arc::clone(&camera),
            adapter,
            sink.clone(),
            Arc::clone(&notifications),
        );

        Self {
            controller,
            camera,
            camera_stats,
            decoder,
            sink,
            notifications,
        }
    }

    pub async fn subscribe(&self, filter: EventFilter) -> EventReceiver {
        self.notifications
            .lock()
            .await
            .subscribe("session-test".to_string(), filter, "test".to_string())
            .unwrap()
    }

    /// True when no capture handle is outstanding and every opened stream was stopped
    pub fn camera_idle(&self) -> bool {
        self.camera.outstanding().unwrap().is_none()
            && self.camera_stats.opened() == self.camera_stats.stopped()
    }
}

/// Everything already queued on `receiver`
pub fn drain(receiver: &mut EventReceiver) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

/// Payload for a frame showing one EAN-13 code
pub fn ean_frame(code: &str) -> Vec<u8> {
    format!("ean_13:{}", code).into_bytes()
}
