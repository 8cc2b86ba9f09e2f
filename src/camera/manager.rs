//! Camera Stream Manager
//!
//! Owns the single capture slot. `acquire` reserves the slot before touching the
//! backend, `release` stops the stream and frees it. A second acquisition while a
//! handle is outstanding fails with `DeviceBusy`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::error::{CameraError, CameraResult};
use super::handle::{CaptureHandle, SlotGuard};
use super::traits::CaptureBackend;
use super::types::{CaptureConstraints, DeviceInfo, FacingMode, ZoomOutcome};
use crate::core::sync::handle_mutex_poison;

pub struct CameraStreamManager {
    backend: Arc<dyn CaptureBackend>,
    slot: Arc<Mutex<Option<u64>>>,
    next_id: AtomicU64,
}

impl CameraStreamManager {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            slot: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Id of the handle currently holding the camera, if any
    pub fn outstanding(&self) -> CameraResult<Option<u64>> {
        let holder = handle_mutex_poison(self.slot.lock(), |reason| CameraError::Backend {
            reason,
        })?;
        Ok(*holder)
    }

    /// Acquire a device matching `constraints`
    ///
    /// A device with the requested facing is preferred, otherwise the first one
    /// enumerated is used.
    pub async fn acquire(&self, constraints: &CaptureConstraints) -> CameraResult<CaptureHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let reservation = SlotGuard::reserve(&self.slot, id)?;

        let devices = self.backend.enumerate().await?;
        let device = select_device(&devices, constraints.facing)
            .cloned()
            .ok_or(CameraError::NoDevice)?;

        log::debug!(
            "Opening '{}' ({}) on {} backend for handle {}",
            device.label,
            device.facing,
            self.backend.name(),
            id
        );
        let stream = self.backend.open(&device, constraints).await?;

        log::info!("Camera '{}' acquired (handle {})", device.id, id);
        Ok(CaptureHandle::new(
            id,
            device,
            constraints.clone(),
            stream,
            reservation,
        ))
    }

    /// Best-effort zoom; a device without zoom control is left alone
    pub async fn apply_zoom(&self, handle: &CaptureHandle, level: f64) -> CameraResult<ZoomOutcome> {
        if handle.is_released() {
            return Err(CameraError::StreamEnded);
        }
        let outcome = handle.zoom_to(level).await?;
        match outcome {
            ZoomOutcome::Applied(applied) => {
                log::debug!("Handle {} zoom set to {:.2}", handle.id(), applied)
            }
            ZoomOutcome::Unsupported => {
                log::debug!("Handle {} has no zoom control; ignoring {:.2}", handle.id(), level)
            }
        }
        Ok(outcome)
    }

    /// Stop the stream and free the slot
    ///
    /// Returns `Ok(false)` when the handle was already released. The slot is freed
    /// even when the backend fails to stop.
    pub async fn release(&self, handle: &CaptureHandle) -> CameraResult<bool> {
        if !handle.mark_released() {
            log::trace!("Handle {} already released", handle.id());
            return Ok(false);
        }

        let stopped = handle.stop_stream().await;
        handle.free_slot();
        stopped?;

        log::info!("Camera '{}' released (handle {})", handle.device().id, handle.id());
        Ok(true)
    }
}

fn select_device(devices: &[DeviceInfo], facing: FacingMode) -> Option<&DeviceInfo> {
    devices
        .iter()
        .find(|device| device.facing == facing)
        .or_else(|| devices.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::fake::FakeCameraBackend;
    use crate::camera::types::ZoomRange;

    fn manager_with(backend: FakeCameraBackend) -> CameraStreamManager {
        CameraStreamManager::new(Arc::new(backend))
    }

    #[test]
    fn test_select_device_prefers_facing() {
        let devices = vec![
            DeviceInfo::new("front", "Front", FacingMode::User),
            DeviceInfo::new("rear", "Rear", FacingMode::Environment),
        ];
        assert_eq!(
            select_device(&devices, FacingMode::Environment).map(|d| d.id.as_str()),
            Some("rear")
        );

        let only_front = vec![DeviceInfo::new("front", "Front", FacingMode::User)];
        assert_eq!(
            select_device(&only_front, FacingMode::Environment).map(|d| d.id.as_str()),
            Some("front")
        );
        assert!(select_device(&[], FacingMode::User).is_none());
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let backend = FakeCameraBackend::new();
        let stats = backend.stats();
        let manager = manager_with(backend);

        let handle = manager
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();
        assert_eq!(handle.device().id, "fake-rear");
        assert_eq!(manager.outstanding().unwrap(), Some(handle.id()));
        assert_eq!(stats.opened(), 1);

        assert!(manager.release(&handle).await.unwrap());
        assert!(handle.is_released());
        assert_eq!(manager.outstanding().unwrap(), None);
        assert_eq!(stats.stopped(), 1);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let backend = FakeCameraBackend::new();
        let stats = backend.stats();
        let manager = manager_with(backend);
        let handle = manager
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();

        assert!(manager.release(&handle).await.unwrap());
        assert!(!manager.release(&handle).await.unwrap());
        assert!(!manager.release(&handle.clone()).await.unwrap());
        assert_eq!(stats.stopped(), 1);
    }

    #[tokio::test]
    async fn test_second_acquire_is_busy() {
        let manager = manager_with(FakeCameraBackend::new());
        let first = manager
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();

        let second = manager.acquire(&CaptureConstraints::default()).await;
        assert!(matches!(
            second,
            Err(CameraError::DeviceBusy { holder }) if holder == first.id()
        ));

        manager.release(&first).await.unwrap();
        let third = manager
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();
        manager.release(&third).await.unwrap();
    }

    #[tokio::test]
    async fn test_permission_denied_frees_reservation() {
        let manager = manager_with(FakeCameraBackend::new().denying_permission());

        let result = manager.acquire(&CaptureConstraints::default()).await;
        assert!(matches!(result, Err(CameraError::PermissionDenied)));
        assert_eq!(manager.outstanding().unwrap(), None);
    }

    #[tokio::test]
    async fn test_no_devices() {
        let manager = manager_with(FakeCameraBackend::new().with_devices(Vec::new()));

        let result = manager.acquire(&CaptureConstraints::default()).await;
        assert!(matches!(result, Err(CameraError::NoDevice)));
        assert_eq!(manager.outstanding().unwrap(), None);
    }

    #[tokio::test]
    async fn test_zoom_is_clamped_to_device_range() {
        let backend = FakeCameraBackend::new().with_zoom_range(Some(ZoomRange::new(1.0, 3.0)));
        let stats = backend.stats();
        let manager = manager_with(backend);
        let handle = manager
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();

        let outcome = manager.apply_zoom(&handle, 4.5).await.unwrap();
        assert_eq!(outcome, ZoomOutcome::Applied(3.0));
        assert_eq!(stats.last_zoom(), Some(3.0));

        manager.release(&handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_zoom_without_capability_is_silent_noop() {
        let backend = FakeCameraBackend::new().with_zoom_range(None);
        let stats = backend.stats();
        let manager = manager_with(backend);
        let handle = manager
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();

        let outcome = manager.apply_zoom(&handle, 2.0).await.unwrap();
        assert_eq!(outcome, ZoomOutcome::Unsupported);
        assert_eq!(stats.zoom_calls(), 0);

        manager.release(&handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_stop_still_frees_slot() {
        let manager = manager_with(FakeCameraBackend::new().failing_stop());
        let handle = manager
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();

        assert!(manager.release(&handle).await.is_err());
        assert!(handle.is_released());
        assert_eq!(manager.outstanding().unwrap(), None);
        assert!(!manager.release(&handle).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_follow_script_then_end() {
        let manager = manager_with(
            FakeCameraBackend::new()
                .with_frames(["a", "b"])
                .ending_after_script(),
        );
        let handle = manager
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();

        let first = handle.next_frame().await.unwrap().unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.data, b"a".to_vec());
        assert_eq!((first.width, first.height), (640, 480));
        assert_eq!(handle.next_frame().await.unwrap().unwrap().data, b"b".to_vec());
        assert!(handle.next_frame().await.unwrap().is_none());

        manager.release(&handle).await.unwrap();
        assert!(matches!(
            handle.next_frame().await,
            Err(CameraError::StreamEnded)
        ));
    }
}
