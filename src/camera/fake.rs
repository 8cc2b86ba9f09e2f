//! Scripted capture backend
//!
//! Plays a fixed list of frame payloads at a steady interval, then either ends the
//! stream or keeps producing empty frames. Counters record what the manager did to it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::error::{CameraError, CameraResult};
use super::traits::{CaptureBackend, CaptureStream, ZoomControl};
use super::types::{CaptureConstraints, DeviceInfo, FacingMode, Frame, Resolution, ZoomRange};
use crate::core::sync::handle_mutex_poison;

/// What the fake backend has been asked to do, across all streams it opened
#[derive(Debug, Default)]
pub struct FakeCameraStats {
    opened: AtomicUsize,
    stopped: AtomicUsize,
    zoom_calls: AtomicUsize,
    frames_delivered: AtomicUsize,
    last_zoom: Mutex<Option<f64>>,
}

impl FakeCameraStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn zoom_calls(&self) -> usize {
        self.zoom_calls.load(Ordering::SeqCst)
    }

    pub fn frames_delivered(&self) -> usize {
        self.frames_delivered.load(Ordering::SeqCst)
    }

    pub fn last_zoom(&self) -> Option<f64> {
        handle_mutex_poison(self.last_zoom.lock(), |reason| reason)
            .ok()
            .and_then(|zoom| *zoom)
    }

    /// Streams opened but not yet stopped
    pub fn open_streams(&self) -> usize {
        self.opened().saturating_sub(self.stopped())
    }

    fn record_zoom(&self, level: f64) {
        self.zoom_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = handle_mutex_poison(self.last_zoom.lock(), |reason| reason) {
            *last = Some(level);
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeCameraBackend {
    devices: Vec<DeviceInfo>,
    script: Vec<Vec<u8>>,
    frame_interval: Duration,
    end_after_script: bool,
    deny_permission: bool,
    zoom_range: Option<ZoomRange>,
    fail_stop: bool,
    stats: Arc<FakeCameraStats>,
}

impl Default for FakeCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCameraBackend {
    /// One rear-facing device with a 1x-5x zoom, frames every 100ms, empty script
    pub fn new() -> Self {
        Self {
            devices: vec![DeviceInfo::new(
                "fake-rear",
                "Fake rear camera",
                FacingMode::Environment,
            )],
            script: Vec::new(),
            frame_interval: Duration::from_millis(100),
            end_after_script: false,
            deny_permission: false,
            zoom_range: Some(ZoomRange::new(1.0, 5.0)),
            fail_stop: false,
            stats: Arc::new(FakeCameraStats::default()),
        }
    }

    pub fn with_devices(mut self, devices: Vec<DeviceInfo>) -> Self {
        self.devices = devices;
        self
    }

    /// Payloads delivered in order, one per frame
    pub fn with_frames<I, B>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        self.script = frames.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// End the stream once the script is exhausted instead of idling
    pub fn ending_after_script(mut self) -> Self {
        self.end_after_script = true;
        self
    }

    pub fn denying_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    pub fn with_zoom_range(mut self, zoom_range: Option<ZoomRange>) -> Self {
        self.zoom_range = zoom_range;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn stats(&self) -> Arc<FakeCameraStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl CaptureBackend for FakeCameraBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn enumerate(&self) -> CameraResult<Vec<DeviceInfo>> {
        if self.deny_permission {
            return Err(CameraError::PermissionDenied);
        }
        Ok(self.devices.clone())
    }

    async fn open(
        &self,
        device: &DeviceInfo,
        constraints: &CaptureConstraints,
    ) -> CameraResult<Box<dyn CaptureStream>> {
        if self.deny_permission {
            return Err(CameraError::PermissionDenied);
        }
        if !self.devices.iter().any(|known| known.id == device.id) {
            return Err(CameraError::Backend {
                reason: format!("unknown device '{}'", device.id),
            });
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "Fake camera opened '{}' at {}",
            device.id,
            constraints.resolution
        );

        Ok(Box::new(FakeCaptureStream {
            script: self.script.iter().cloned().collect(),
            sequence: 0,
            interval: self.frame_interval,
            end_after_script: self.end_after_script,
            resolution: constraints.resolution,
            zoom_range: self.zoom_range,
            fail_stop: self.fail_stop,
            stopped: false,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct FakeCaptureStream {
    script: VecDeque<Vec<u8>>,
    sequence: u64,
    interval: Duration,
    end_after_script: bool,
    resolution: Resolution,
    zoom_range: Option<ZoomRange>,
    fail_stop: bool,
    stopped: bool,
    stats: Arc<FakeCameraStats>,
}

#[async_trait]
impl CaptureStream for FakeCaptureStream {
    async fn next_frame(&mut self) -> CameraResult<Option<Frame>> {
        if self.stopped {
            return Err(CameraError::StreamEnded);
        }

        tokio::time::sleep(self.interval).await;

        let data = match self.script.pop_front() {
            Some(data) => data,
            None if self.end_after_script => return Ok(None),
            None => Vec::new(),
        };

        self.sequence += 1;
        self.stats.frames_delivered.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Frame {
            sequence: self.sequence,
            width: self.resolution.width,
            height: self.resolution.height,
            data,
            captured_at: Utc::now(),
        }))
    }

    fn zoom_control(&mut self) -> Option<Box<dyn ZoomControl>> {
        let range = self.zoom_range.take()?;
        Some(Box::new(FakeZoomControl {
            range,
            stats: Arc::clone(&self.stats),
        }))
    }

    async fn stop(&mut self) -> CameraResult<()> {
        self.stopped = true;
        self.stats.stopped.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(CameraError::Backend {
                reason: "fake stop failure".to_string(),
            });
        }
        Ok(())
    }
}

struct FakeZoomControl {
    range: ZoomRange,
    stats: Arc<FakeCameraStats>,
}

#[async_trait]
impl ZoomControl for FakeZoomControl {
    fn range(&self) -> ZoomRange {
        self.range
    }

    async fn set_zoom(&mut self, level: f64) -> CameraResult<()> {
        self.stats.record_zoom(level);
        Ok(())
    }
}
