//! Session task
//!
//! One task per session drives the state machine, owns the capture handle, and
//! tears everything down before publishing the terminal status. The order at the
//! end of a session is fixed: stop the decode loop, join it, release the device,
//! deliver the result to the sink and callbacks, then publish the outcome.

use std::future::pending;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep, sleep_until, Instant};

use super::error::ScanFailure;
use super::handle::{CallbackSlot, Command};
use super::state::{next_state, Trigger};
use super::types::{ScanMode, SessionOptions, SessionOutcome, SessionState, SessionStatus};
use crate::camera::{CameraStreamManager, CaptureConstraints, CaptureHandle, ZoomOutcome};
use crate::core::sync::handle_mutex_poison;
use crate::decoder::{
    synthesize_code, DecodeEngineAdapter, DecodeResult, DecodeSource, FrameAttempt, FrameAttempts,
    StillOutcome,
};
use crate::notifications::api::{
    DeviceEvent, DeviceEventType, Event, FrameEvent, FrameEventType, NotificationService,
    SessionEvent, SessionEventType,
};
use crate::sink::ResultSink;

/// Collaborators a session needs, shared with the controller
#[derive(Clone)]
pub(crate) struct SessionDeps {
    pub camera: Arc<CameraStreamManager>,
    pub decoder: Arc<DecodeEngineAdapter>,
    pub sink: Arc<dyn ResultSink>,
    pub notifications: NotificationService,
    pub constraints: CaptureConstraints,
}

pub(crate) struct SessionRunner {
    id: String,
    mode: ScanMode,
    options: SessionOptions,
    deps: SessionDeps,
    status: watch::Sender<SessionStatus>,
    callbacks: Arc<Mutex<CallbackSlot>>,
    state: SessionState,
    attempts: u64,
    pending_zoom: Option<f64>,
}

impl SessionRunner {
    pub(crate) fn new(
        id: String,
        mode: ScanMode,
        options: SessionOptions,
        deps: SessionDeps,
        status: watch::Sender<SessionStatus>,
        callbacks: Arc<Mutex<CallbackSlot>>,
    ) -> Self {
        Self {
            id,
            mode,
            options,
            deps,
            status,
            callbacks,
            state: SessionState::Idle,
            attempts: 0,
            pending_zoom: None,
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.advance(Trigger::Begin).await;

        let outcome = match self.mode {
            ScanMode::LiveStream => self.run_live(&mut commands).await,
            ScanMode::StillImage => self.run_still(&mut commands).await,
            ScanMode::Simulated => self.run_simulated(&mut commands).await,
        };

        self.finish(outcome).await;
    }

    async fn run_live(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) -> SessionOutcome {
        let camera = Arc::clone(&self.deps.camera);
        let decoder = Arc::clone(&self.deps.decoder);
        let constraints = self.deps.constraints.clone();

        let setup = async {
            decoder.prepare(DecodeSource::Frame).await?;
            Ok::<_, ScanFailure>(camera.acquire(&constraints).await?)
        };
        tokio::pin!(setup);

        // Dropping `setup` before it completes frees any reserved device slot
        let acquired = loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    None | Some(Command::Cancel) => return SessionOutcome::Cancelled,
                    Some(Command::SetZoom(level)) => self.pending_zoom = Some(level),
                    Some(Command::SubmitImage(_)) => {
                        log::debug!("Session {} ignores submitted image in live mode", self.id)
                    }
                },
                acquired = &mut setup => break acquired,
            }
        };

        let handle = match acquired {
            Ok(handle) => handle,
            Err(failure) => return SessionOutcome::Failed(failure),
        };
        self.publish(Event::Device(DeviceEvent::new(
            DeviceEventType::Acquired,
            self.id.clone(),
            handle.id(),
        )))
        .await;
        self.advance(Trigger::Ready).await;

        let initial_zoom = self
            .pending_zoom
            .take()
            .or(self.options.zoom_level)
            .unwrap_or(constraints.zoom);
        self.apply_zoom(&handle, initial_zoom).await;

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let mut attempts = decoder.decode_frames(handle.clone(), stop_rx);

        let outcome = self.drive_live(&handle, &mut attempts, commands).await;

        if stop_tx.send(()).is_err() {
            log::trace!("Decode loop for session {} already gone", self.id);
        }
        for late in attempts.drain_pending() {
            if let FrameAttempt::Hit(result) = late {
                self.publish(Event::Frame(FrameEvent::with_message(
                    FrameEventType::Ignored,
                    self.id.clone(),
                    self.attempts,
                    format!("{} {}", result.format, result.code),
                )))
                .await;
            }
        }
        attempts.finish().await;
        self.release(&handle).await;

        outcome
    }

    async fn drive_live(
        &mut self,
        handle: &CaptureHandle,
        attempts: &mut FrameAttempts,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> SessionOutcome {
        let deadline = self.options.timeout.map(|timeout| Instant::now() + timeout);
        let timer = expire_at(deadline);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    None | Some(Command::Cancel) => return SessionOutcome::Cancelled,
                    Some(Command::SetZoom(level)) => self.apply_zoom(handle, level).await,
                    Some(Command::SubmitImage(_)) => {
                        log::debug!("Session {} ignores submitted image in live mode", self.id)
                    }
                },
                attempt = attempts.next_attempt() => {
                    self.attempts += 1;
                    match attempt {
                        Some(FrameAttempt::Hit(result)) => {
                            self.publish(Event::Frame(FrameEvent::with_message(
                                FrameEventType::Hit,
                                self.id.clone(),
                                self.attempts,
                                format!("{} {}", result.format, result.code),
                            )))
                            .await;
                            self.advance(Trigger::Decode).await;
                            return SessionOutcome::Succeeded(result);
                        }
                        Some(FrameAttempt::Miss) => {
                            log::trace!("Session {} attempt {} missed", self.id, self.attempts);
                            self.publish(Event::Frame(FrameEvent::new(
                                FrameEventType::Miss,
                                self.id.clone(),
                                self.attempts,
                            )))
                            .await;
                        }
                        Some(FrameAttempt::DeviceLost(reason)) => {
                            self.publish(Event::Frame(FrameEvent::with_message(
                                FrameEventType::DeviceLost,
                                self.id.clone(),
                                self.attempts,
                                reason.clone(),
                            )))
                            .await;
                            return SessionOutcome::Failed(ScanFailure::DeviceUnavailable { reason });
                        }
                        None => {
                            return SessionOutcome::Failed(ScanFailure::DeviceUnavailable {
                                reason: "decode loop ended".to_string(),
                            });
                        }
                    }
                },
                _ = &mut timer => return self.timed_out(),
            }
        }
    }

    async fn run_still(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) -> SessionOutcome {
        let decoder = Arc::clone(&self.deps.decoder);
        let prepare = decoder.prepare(DecodeSource::Still);
        tokio::pin!(prepare);

        // An image submitted while the backend initialises waits for it
        let mut early_image = None;
        let prepared = loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    None | Some(Command::Cancel) => return SessionOutcome::Cancelled,
                    Some(Command::SubmitImage(image)) => early_image = Some(image),
                    Some(Command::SetZoom(_)) => {}
                },
                prepared = &mut prepare => break prepared,
            }
        };
        if let Err(e) = prepared {
            return SessionOutcome::Failed(e.into());
        }
        self.advance(Trigger::Ready).await;

        let deadline = self.options.timeout.map(|timeout| Instant::now() + timeout);
        let timer = expire_at(deadline);
        tokio::pin!(timer);

        let image = loop {
            if let Some(image) = early_image.take() {
                break image;
            }
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    None | Some(Command::Cancel) => return SessionOutcome::Cancelled,
                    Some(Command::SubmitImage(image)) => break image,
                    Some(Command::SetZoom(_)) => {}
                },
                _ = &mut timer => return self.timed_out(),
            }
        };
        self.advance(Trigger::Decode).await;

        let decode = decoder.decode_still(&image);
        tokio::pin!(decode);
        let decoded = loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    None | Some(Command::Cancel) => return SessionOutcome::Cancelled,
                    Some(_) => {}
                },
                decoded = &mut decode => break decoded,
            }
        };

        match decoded {
            Ok(StillOutcome::Found(result)) => SessionOutcome::Succeeded(result),
            Ok(StillOutcome::NotFound) => SessionOutcome::Failed(ScanFailure::NoCodeFound),
            Err(e) => SessionOutcome::Failed(e.into()),
        }
    }

    /// No camera or decoder; the timeout option does not apply
    async fn run_simulated(
        &mut self,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> SessionOutcome {
        self.advance(Trigger::Ready).await;

        let delay = sleep(self.options.simulation.delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    None | Some(Command::Cancel) => return SessionOutcome::Cancelled,
                    Some(_) => {}
                },
                _ = &mut delay => break,
            }
        }
        self.advance(Trigger::Decode).await;

        let symbology = self.options.simulation.symbology;
        let mut rng = match self.options.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SessionOutcome::Succeeded(DecodeResult {
            code: synthesize_code(symbology, &mut rng),
            format: symbology,
            source: DecodeSource::Frame,
        })
    }

    fn timed_out(&self) -> SessionOutcome {
        SessionOutcome::Failed(ScanFailure::ScanTimeout {
            timeout: self.options.timeout.unwrap_or_default(),
        })
    }

    async fn apply_zoom(&mut self, handle: &CaptureHandle, level: f64) {
        match self.deps.camera.apply_zoom(handle, level).await {
            Ok(ZoomOutcome::Applied(applied)) => {
                self.status.send_modify(|status| status.zoom_level = Some(applied));
                self.publish(Event::Device(DeviceEvent::with_zoom(
                    DeviceEventType::ZoomApplied,
                    self.id.clone(),
                    handle.id(),
                    applied,
                )))
                .await;
            }
            Ok(ZoomOutcome::Unsupported) => {
                log::debug!("Device {} has no zoom; keeping default view", handle.device().id);
                self.publish(Event::Device(DeviceEvent::new(
                    DeviceEventType::ZoomUnsupported,
                    self.id.clone(),
                    handle.id(),
                )))
                .await;
            }
            Err(e) => log::warn!("Zoom to {} failed for session {}: {}", level, self.id, e),
        }
    }

    async fn release(&self, handle: &CaptureHandle) {
        match self.deps.camera.release(handle).await {
            Ok(true) => {
                self.publish(Event::Device(DeviceEvent::new(
                    DeviceEventType::Released,
                    self.id.clone(),
                    handle.id(),
                )))
                .await
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!("Releasing capture handle {} failed: {}", handle.id(), e);
                self.publish(Event::Device(DeviceEvent::with_message(
                    DeviceEventType::ReleaseFailed,
                    self.id.clone(),
                    handle.id(),
                    e.to_string(),
                )))
                .await;
            }
        }
    }

    /// Move to the next non-terminal state and tell observers
    async fn advance(&mut self, trigger: Trigger) {
        let next = match next_state(self.state, trigger) {
            Some(next) => next,
            None => {
                log::error!(
                    "Session {} cannot apply {:?} in state {}",
                    self.id,
                    trigger,
                    self.state
                );
                return;
            }
        };
        self.state = next;
        self.status.send_modify(|status| status.state = next);

        let event_type = if trigger == Trigger::Begin {
            SessionEventType::Started
        } else {
            SessionEventType::StateChanged
        };
        self.publish(Event::Session(SessionEvent::new(
            event_type,
            self.id.clone(),
            self.mode,
            next,
        )))
        .await;
    }

    async fn finish(mut self, outcome: SessionOutcome) {
        let trigger = match &outcome {
            SessionOutcome::Succeeded(_) => Trigger::Decoded,
            SessionOutcome::Failed(_) => Trigger::Fail,
            SessionOutcome::Cancelled => Trigger::Cancel,
        };
        let terminal = next_state(self.state, trigger).unwrap_or_else(|| {
            log::error!(
                "Session {} ended as {} from state {}",
                self.id,
                outcome.state(),
                self.state
            );
            outcome.state()
        });
        self.state = terminal;

        match &outcome {
            SessionOutcome::Succeeded(result) => {
                if let Err(e) = self.deps.sink.accept(result).await {
                    log::warn!("Result sink rejected {}: {}", result.code, e);
                }
                self.deliver(result);
                log::info!(
                    "Session {} decoded {} {} from {}",
                    self.id,
                    result.format,
                    result.code,
                    result.source
                );
            }
            SessionOutcome::Failed(failure) => {
                self.close_callbacks();
                log::info!("Session {} failed: {}", self.id, failure);
            }
            SessionOutcome::Cancelled => {
                self.close_callbacks();
                log::info!("Session {} cancelled", self.id);
            }
        }

        let (event_type, message) = match &outcome {
            SessionOutcome::Succeeded(result) => (SessionEventType::Succeeded, result.code.clone()),
            SessionOutcome::Failed(failure) => (SessionEventType::Failed, failure.to_string()),
            SessionOutcome::Cancelled => (SessionEventType::Cancelled, "cancelled".to_string()),
        };

        self.status.send_modify(|status| {
            status.state = terminal;
            status.outcome = Some(outcome);
        });
        self.publish(Event::Session(SessionEvent::with_message(
            event_type,
            self.id.clone(),
            self.mode,
            terminal,
            message,
        )))
        .await;
    }

    fn deliver(&self, result: &DecodeResult) {
        let pending = match handle_mutex_poison(self.callbacks.lock(), |reason| reason) {
            Ok(mut slot) => slot.deliver(result),
            Err(reason) => {
                log::warn!("Result callbacks for {} skipped: {}", self.id, reason);
                Vec::new()
            }
        };
        for callback in pending {
            callback(result);
        }
    }

    fn close_callbacks(&self) {
        match handle_mutex_poison(self.callbacks.lock(), |reason| reason) {
            Ok(mut slot) => slot.close(),
            Err(reason) => log::warn!("Result callbacks for {} not closed: {}", self.id, reason),
        }
    }

    async fn publish(&self, event: Event) {
        let mut notifications = self.deps.notifications.lock().await;
        if let Err(e) = notifications.publish(event).await {
            log::trace!("Session {} event not delivered: {}", self.id, e);
        }
    }
}

async fn expire_at(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}
