//! Opaque handle to an acquired capture stream

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::error::{CameraError, CameraResult};
use super::traits::{CaptureStream, ZoomControl};
use super::types::{CaptureConstraints, DeviceInfo, Frame, ZoomOutcome};
use crate::core::sync::handle_mutex_poison;

/// Reservation of the manager's single capture slot
///
/// Dropping the guard frees the slot, so an acquisition abandoned halfway (cancelled
/// future, failed open) never leaves the camera marked busy.
pub(crate) struct SlotGuard {
    slot: Arc<Mutex<Option<u64>>>,
    id: u64,
}

impl SlotGuard {
    pub(crate) fn reserve(slot: &Arc<Mutex<Option<u64>>>, id: u64) -> CameraResult<Self> {
        let mut holder = handle_mutex_poison(slot.lock(), |reason| CameraError::Backend {
            reason,
        })?;
        if let Some(current) = *holder {
            return Err(CameraError::DeviceBusy { holder: current });
        }
        *holder = Some(id);
        Ok(Self {
            slot: Arc::clone(slot),
            id,
        })
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        match handle_mutex_poison(self.slot.lock(), |reason| reason) {
            Ok(mut holder) => {
                if *holder == Some(self.id) {
                    *holder = None;
                    log::trace!("Capture slot {} freed", self.id);
                }
            }
            Err(reason) => log::warn!("Could not free capture slot {}: {}", self.id, reason),
        }
    }
}

struct HandleInner {
    id: u64,
    device: DeviceInfo,
    constraints: CaptureConstraints,
    stream: tokio::sync::Mutex<Box<dyn CaptureStream>>,
    zoom: Option<tokio::sync::Mutex<Box<dyn ZoomControl>>>,
    released: AtomicBool,
    slot: Mutex<Option<SlotGuard>>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        if !self.released.load(Ordering::Acquire) {
            log::warn!(
                "Capture handle {} dropped without release; device '{}' was not stopped",
                self.id,
                self.device.id
            );
        }
    }
}

/// Handle to one acquired device stream
///
/// Cloning shares the same underlying stream. Only `CameraStreamManager::release`
/// stops the stream and frees the capture slot.
#[derive(Clone)]
pub struct CaptureHandle {
    inner: Arc<HandleInner>,
}

impl CaptureHandle {
    pub(crate) fn new(
        id: u64,
        device: DeviceInfo,
        constraints: CaptureConstraints,
        mut stream: Box<dyn CaptureStream>,
        slot: SlotGuard,
    ) -> Self {
        let zoom = stream.zoom_control().map(tokio::sync::Mutex::new);
        Self {
            inner: Arc::new(HandleInner {
                id,
                device,
                constraints,
                stream: tokio::sync::Mutex::new(stream),
                zoom,
                released: AtomicBool::new(false),
                slot: Mutex::new(Some(slot)),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.inner.device
    }

    pub fn constraints(&self) -> &CaptureConstraints {
        &self.inner.constraints
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Next frame from the device; `StreamEnded` once the handle is released
    pub async fn next_frame(&self) -> CameraResult<Option<Frame>> {
        if self.is_released() {
            return Err(CameraError::StreamEnded);
        }
        let mut stream = self.inner.stream.lock().await;
        stream.next_frame().await
    }

    /// Clamp into the device range and apply; `Unsupported` without a zoom control
    ///
    /// Never waits on the frame stream, so a pending `next_frame` does not hold it up.
    pub(crate) async fn zoom_to(&self, level: f64) -> CameraResult<ZoomOutcome> {
        let Some(zoom) = &self.inner.zoom else {
            return Ok(ZoomOutcome::Unsupported);
        };
        let mut control = zoom.lock().await;
        let clamped = control.range().clamp(level);
        control.set_zoom(clamped).await?;
        Ok(ZoomOutcome::Applied(clamped))
    }

    pub(crate) async fn stop_stream(&self) -> CameraResult<()> {
        let mut stream = self.inner.stream.lock().await;
        stream.stop().await
    }

    /// Mark released; true only for the first caller
    pub(crate) fn mark_released(&self) -> bool {
        !self.inner.released.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn free_slot(&self) {
        let guard = match handle_mutex_poison(self.inner.slot.lock(), |reason| reason) {
            Ok(mut slot) => slot.take(),
            Err(reason) => {
                log::warn!("Capture handle {} slot lock poisoned: {}", self.inner.id, reason);
                None
            }
        };
        drop(guard);
    }
}

impl std::fmt::Debug for CaptureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureHandle")
            .field("id", &self.inner.id)
            .field("device", &self.inner.device.id)
            .field("released", &self.is_released())
            .finish()
    }
}
