//! Scan Session Controller
//!
//! Starts and supervises scan sessions. At most one session runs per controller;
//! starting a new one cancels the previous session and waits for its teardown, so
//! the capture device is never held twice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, watch, Mutex};

use super::error::{SessionError, SessionResult};
use super::handle::{CallbackSlot, SessionHandle};
use super::runner::{SessionDeps, SessionRunner};
use super::types::{ScanMode, SessionOptions, SessionOutcome, SessionStatus};
use super::validate_zoom_level;
use crate::camera::{CameraStreamManager, CaptureConstraints};
use crate::decoder::{DecodeEngineAdapter, StillImage};
use crate::notifications::api::NotificationService;
use crate::sink::ResultSink;

pub struct ScanSessionController {
    deps: SessionDeps,
    current: Mutex<Option<SessionHandle>>,
    counter: AtomicU64,
}

impl ScanSessionController {
    pub fn new(
        camera: Arc<CameraStreamManager>,
        decoder: Arc<DecodeEngineAdapter>,
        sink: Arc<dyn ResultSink>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            deps: SessionDeps {
                camera,
                decoder,
                sink,
                notifications,
                constraints: CaptureConstraints::default(),
            },
            current: Mutex::new(None),
            counter: AtomicU64::new(0),
        }
    }

    /// Constraints used when live sessions open the camera
    pub fn with_constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.deps.constraints = constraints;
        self
    }

    pub fn constraints(&self) -> &CaptureConstraints {
        &self.deps.constraints
    }

    /// Start a session in `mode`
    ///
    /// A session that is still running is cancelled first and this call waits until
    /// it has released its device. Failures while acquiring the device or preparing
    /// the decoder surface as the new session's outcome, not as an error here.
    pub async fn start_session(
        &self,
        mode: ScanMode,
        options: SessionOptions,
    ) -> SessionResult<SessionHandle> {
        validate_options(mode, &options)?;

        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            if !previous.state().is_terminal() {
                log::info!("Cancelling session {} for a new {} session", previous.id(), mode);
                previous.cancel_and_wait().await;
            }
        }

        let started_at = Utc::now();
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        let id = session_id(mode, started_at, sequence);

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus::default());
        let callbacks = Arc::new(StdMutex::new(CallbackSlot::default()));

        let handle = SessionHandle::new(
            id.clone(),
            mode,
            started_at,
            commands_tx,
            status_rx,
            Arc::clone(&callbacks),
        );

        log::debug!("Starting {} session {}", mode, id);
        let runner = SessionRunner::new(id, mode, options, self.deps.clone(), status_tx, callbacks);
        tokio::spawn(runner.run(commands_rx));

        *current = Some(handle.clone());
        Ok(handle)
    }

    /// The most recently started session, finished or not
    pub async fn current_session(&self) -> Option<SessionHandle> {
        self.current.lock().await.clone()
    }

    /// Cancel the running session, if any; idempotent
    pub async fn cancel(&self) {
        if let Some(handle) = self.current.lock().await.as_ref() {
            handle.cancel();
        }
    }

    pub async fn set_zoom(&self, level: f64) -> SessionResult<()> {
        self.running()
            .await
            .ok_or(SessionError::NoActiveSession)?
            .set_zoom(level)
    }

    pub async fn submit_image(&self, image: StillImage) -> SessionResult<()> {
        self.running()
            .await
            .ok_or(SessionError::NoActiveSession)?
            .submit_image(image)
    }

    /// Cancel the running session and wait for its teardown
    pub async fn shutdown(&self) -> Option<SessionOutcome> {
        let handle = self.current.lock().await.take()?;
        Some(handle.cancel_and_wait().await)
    }

    async fn running(&self) -> Option<SessionHandle> {
        self.current
            .lock()
            .await
            .as_ref()
            .filter(|handle| !handle.state().is_terminal())
            .cloned()
    }
}

impl Drop for ScanSessionController {
    fn drop(&mut self) {
        if let Some(handle) = self.current.get_mut().take() {
            handle.cancel();
        }
    }
}

fn validate_options(mode: ScanMode, options: &SessionOptions) -> SessionResult<()> {
    if let Some(level) = options.zoom_level {
        validate_zoom_level(level)?;
        if mode != ScanMode::LiveStream {
            log::debug!("Zoom {} ignored for {} session", level, mode);
        }
    }
    if options.timeout.is_some_and(|timeout| timeout.is_zero()) {
        return Err(SessionError::InvalidOptions {
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn session_id(mode: ScanMode, started_at: DateTime<Utc>, sequence: u64) -> String {
    let digest = Sha256::digest(format!(
        "{}:{}:{}",
        mode,
        started_at.timestamp_nanos_opt().unwrap_or_default(),
        sequence
    ));
    let mut id = format!("{:x}", digest);
    id.truncate(16);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_session_ids_differ_per_sequence() {
        let now = Utc::now();
        let first = session_id(ScanMode::LiveStream, now, 0);
        let second = session_id(ScanMode::LiveStream, now, 1);
        assert_eq!(first.len(), 16);
        assert_ne!(first, second);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_options_validation() {
        assert!(validate_options(ScanMode::LiveStream, &SessionOptions::default()).is_ok());
        assert_eq!(
            validate_options(ScanMode::LiveStream, &SessionOptions::default().with_zoom(6.0)),
            Err(SessionError::InvalidZoom { level: 6.0 })
        );
        assert!(matches!(
            validate_options(
                ScanMode::StillImage,
                &SessionOptions::default().with_timeout(Duration::ZERO)
            ),
            Err(SessionError::InvalidOptions { .. })
        ));
    }
}
