//! Capture backend seams
//!
//! A real driver implements `CaptureBackend` to enumerate and open devices; each open
//! device yields a `CaptureStream`. The manager owns the stream through a
//! `CaptureHandle` and is the only caller of `stop`. Zoom lives on a separate
//! `ZoomControl` so it can be driven while a frame read is in flight.

use async_trait::async_trait;

use super::error::CameraResult;
use super::types::{CaptureConstraints, DeviceInfo, Frame, ZoomRange};

#[async_trait]
pub trait CaptureBackend: Send + Sync {
    fn name(&self) -> &str;

    /// List the devices currently available; `PermissionDenied` when access is refused
    async fn enumerate(&self) -> CameraResult<Vec<DeviceInfo>>;

    async fn open(
        &self,
        device: &DeviceInfo,
        constraints: &CaptureConstraints,
    ) -> CameraResult<Box<dyn CaptureStream>>;
}

#[async_trait]
pub trait CaptureStream: Send {
    /// Wait for the next frame; `Ok(None)` once the stream has ended
    async fn next_frame(&mut self) -> CameraResult<Option<Frame>>;

    /// Detach the zoom control; `None` when the device has none
    ///
    /// Called once, right after the stream is opened.
    fn zoom_control(&mut self) -> Option<Box<dyn ZoomControl>>;

    async fn stop(&mut self) -> CameraResult<()>;
}

#[async_trait]
pub trait ZoomControl: Send {
    fn range(&self) -> ZoomRange;

    /// Apply a level already clamped into `range`
    async fn set_zoom(&mut self, level: f64) -> CameraResult<()>;
}
