//! Caller-side view of a running session
//!
//! A `SessionHandle` talks to the session task through a command channel and
//! observes it through a watch channel. When every handle of a session is dropped
//! the command channel closes and the task cancels itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};

use super::error::{ScanFailure, SessionError, SessionResult};
use super::types::{ScanMode, ScanSession, SessionOutcome, SessionState, SessionStatus};
use super::validate_zoom_level;
use crate::core::sync::handle_mutex_poison;
use crate::decoder::{DecodeResult, StillImage};

pub(crate) type ResultCallback = Box<dyn FnOnce(&DecodeResult) + Send + 'static>;

/// Requests from handles to the session task
#[derive(Debug)]
pub(crate) enum Command {
    Cancel,
    SetZoom(f64),
    SubmitImage(StillImage),
}

/// Result callbacks waiting for the session to succeed
#[derive(Default)]
pub(crate) struct CallbackSlot {
    pending: Vec<ResultCallback>,
    delivered: Option<DecodeResult>,
    closed: bool,
}

impl CallbackSlot {
    /// Record the result and hand back the callbacks to run
    pub(crate) fn deliver(&mut self, result: &DecodeResult) -> Vec<ResultCallback> {
        self.delivered = Some(result.clone());
        self.closed = true;
        std::mem::take(&mut self.pending)
    }

    /// The session ended without a result; waiting callbacks never fire
    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
    }
}

struct HandleInner {
    id: String,
    mode: ScanMode,
    started_at: DateTime<Utc>,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SessionStatus>,
    callbacks: Arc<Mutex<CallbackSlot>>,
    image_submitted: AtomicBool,
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: String,
        mode: ScanMode,
        started_at: DateTime<Utc>,
        commands: mpsc::UnboundedSender<Command>,
        status: watch::Receiver<SessionStatus>,
        callbacks: Arc<Mutex<CallbackSlot>>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id,
                mode,
                started_at,
                commands,
                status,
                callbacks,
                image_submitted: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn mode(&self) -> ScanMode {
        self.inner.mode
    }

    pub fn state(&self) -> SessionState {
        self.inner.status.borrow().state
    }

    /// Terminal outcome, once published
    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.inner.status.borrow().outcome.clone()
    }

    pub fn snapshot(&self) -> ScanSession {
        let status = self.inner.status.borrow();
        ScanSession {
            id: self.inner.id.clone(),
            mode: self.inner.mode,
            state: status.state,
            started_at: self.inner.started_at,
            zoom_level: status.zoom_level,
        }
    }

    /// A receiver that sees every published status change
    pub fn watch(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.clone()
    }

    /// Request cancellation; no effect once the session has finished
    pub fn cancel(&self) {
        if self.state().is_terminal() {
            return;
        }
        if self.inner.commands.send(Command::Cancel).is_err() {
            log::trace!("Session {} already stopped listening", self.inner.id);
        }
    }

    /// Wait for the terminal outcome
    ///
    /// Resolves only after the device is released and the result sink has run.
    pub async fn wait(&self) -> SessionOutcome {
        let mut status = self.inner.status.clone();
        let outcome = match status.wait_for(|s| s.outcome.is_some()).await {
            Ok(status) => status.outcome.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| {
            log::error!("Session {} task ended without an outcome", self.inner.id);
            SessionOutcome::Failed(ScanFailure::DecodeEngineError {
                reason: "session task ended unexpectedly".to_string(),
            })
        })
    }

    pub async fn cancel_and_wait(&self) -> SessionOutcome {
        self.cancel();
        self.wait().await
    }

    /// Change zoom on a live session
    ///
    /// Before the device is acquired the level is kept and applied on acquisition.
    pub fn set_zoom(&self, level: f64) -> SessionResult<()> {
        if self.inner.mode != ScanMode::LiveStream {
            return Err(SessionError::WrongMode {
                operation: "set_zoom",
                mode: self.inner.mode,
            });
        }
        validate_zoom_level(level)?;
        self.send(Command::SetZoom(level))
    }

    /// Hand the image to a still-image session; accepted once per session
    pub fn submit_image(&self, image: StillImage) -> SessionResult<()> {
        if self.inner.mode != ScanMode::StillImage {
            return Err(SessionError::WrongMode {
                operation: "submit_image",
                mode: self.inner.mode,
            });
        }
        if self.state().is_terminal() {
            return Err(SessionError::SessionClosed);
        }
        if self.inner.image_submitted.swap(true, Ordering::SeqCst) {
            return Err(SessionError::ImageAlreadySubmitted);
        }
        self.send(Command::SubmitImage(image))
    }

    /// Run `callback` with the decode result if the session succeeds
    ///
    /// Fires immediately when the session already succeeded. Never fires for a
    /// session that failed or was cancelled.
    pub fn on_result<F>(&self, callback: F)
    where
        F: FnOnce(&DecodeResult) + Send + 'static,
    {
        let mut slot = match handle_mutex_poison(self.inner.callbacks.lock(), |reason| reason) {
            Ok(slot) => slot,
            Err(reason) => {
                log::warn!("Dropping result callback for {}: {}", self.inner.id, reason);
                return;
            }
        };
        if let Some(result) = slot.delivered.clone() {
            drop(slot);
            callback(&result);
            return;
        }
        if !slot.closed {
            slot.pending.push(Box::new(callback));
        }
    }

    fn send(&self, command: Command) -> SessionResult<()> {
        if self.state().is_terminal() {
            return Err(SessionError::SessionClosed);
        }
        self.inner
            .commands
            .send(command)
            .map_err(|_| SessionError::SessionClosed)
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.inner.id)
            .field("mode", &self.inner.mode)
            .field("state", &self.state())
            .finish()
    }
}
