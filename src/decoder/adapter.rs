//! Decode Engine Adapter
//!
//! Wraps a `DecodeBackend`, checks it can serve the requested source, and normalises
//! its raw detections. Live decoding runs as a background task that pulls frames from a
//! `CaptureHandle` and feeds `FrameAttempt`s into a bounded channel, exposed as a
//! `futures::Stream`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use strum::IntoEnumIterator;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::error::{EngineError, EngineResult};
use super::traits::DecodeBackend;
use super::types::{
    DecodeResult, DecodeSource, FrameAttempt, RawDetection, StillImage, StillOutcome, Symbology,
};
use crate::camera::CaptureHandle;

const ATTEMPT_BUFFER: usize = 16;

pub struct DecodeEngineAdapter {
    backend: Arc<dyn DecodeBackend>,
    enabled: Vec<Symbology>,
}

impl DecodeEngineAdapter {
    /// An empty `enabled` list enables every symbology
    pub fn new(backend: Arc<dyn DecodeBackend>, enabled: Vec<Symbology>) -> Self {
        let enabled = if enabled.is_empty() {
            Symbology::iter().collect()
        } else {
            enabled
        };
        Self { backend, enabled }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn enabled(&self) -> &[Symbology] {
        &self.enabled
    }

    /// Enabled symbologies the backend can actually read
    pub fn active_symbologies(&self) -> Vec<Symbology> {
        let supported = self.backend.capabilities().symbologies;
        self.enabled
            .iter()
            .copied()
            .filter(|symbology| supported.contains(symbology))
            .collect()
    }

    /// Check capabilities and initialise the backend for `source`
    pub async fn prepare(&self, source: DecodeSource) -> EngineResult<()> {
        let capabilities = self.backend.capabilities();
        let served = match source {
            DecodeSource::Frame => capabilities.live,
            DecodeSource::Still => capabilities.still,
        };
        if !served {
            return Err(EngineError::UnsupportedSource {
                backend: self.backend.name().to_string(),
                mode: source,
            });
        }
        if self.active_symbologies().is_empty() {
            return Err(EngineError::NoEnabledSymbology {
                backend: self.backend.name().to_string(),
            });
        }

        self.backend.initialize(source).await?;
        log::debug!(
            "Decoder '{}' prepared for {} input ({} symbologies)",
            self.backend.name(),
            source,
            self.active_symbologies().len()
        );
        Ok(())
    }

    /// Start the continuous decode loop against `handle`
    ///
    /// The loop ends when `stop` fires, when the returned stream is dropped, or after
    /// reporting `DeviceLost`. Per-frame engine errors are reported as `Miss`.
    pub fn decode_frames(
        &self,
        handle: CaptureHandle,
        mut stop: broadcast::Receiver<()>,
    ) -> FrameAttempts {
        let backend = Arc::clone(&self.backend);
        let accepted = self.active_symbologies();
        let (tx, rx) = mpsc::channel(ATTEMPT_BUFFER);

        let task = tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = stop.recv() => break,
                    next = handle.next_frame() => next,
                };

                let attempt = match next {
                    Ok(Some(frame)) => match backend.decode_frame(&frame).await {
                        Ok(detections) => {
                            match normalize_detections(detections, &accepted, DecodeSource::Frame) {
                                Some(result) => FrameAttempt::Hit(result),
                                None => FrameAttempt::Miss,
                            }
                        }
                        Err(e) => {
                            log::trace!("Frame {} absorbed as miss: {}", frame.sequence, e);
                            FrameAttempt::Miss
                        }
                    },
                    Ok(None) => FrameAttempt::DeviceLost("capture stream ended".to_string()),
                    Err(e) => FrameAttempt::DeviceLost(e.to_string()),
                };

                let device_lost = matches!(attempt, FrameAttempt::DeviceLost(_));
                tokio::select! {
                    _ = stop.recv() => break,
                    sent = tx.send(attempt) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
                if device_lost {
                    break;
                }
            }
            log::trace!("Decode loop for handle {} finished", handle.id());
        });

        FrameAttempts {
            rx,
            task: Some(task),
        }
    }

    /// Single-shot decode of one image
    pub async fn decode_still(&self, image: &StillImage) -> EngineResult<StillOutcome> {
        let detections = self.backend.decode_still(image).await?;
        let accepted = self.active_symbologies();
        Ok(
            match normalize_detections(detections, &accepted, DecodeSource::Still) {
                Some(result) => StillOutcome::Found(result),
                None => StillOutcome::NotFound,
            },
        )
    }
}

/// First detection with a non-empty code in an accepted, known format
pub fn normalize_detections(
    detections: Vec<RawDetection>,
    accepted: &[Symbology],
    source: DecodeSource,
) -> Option<DecodeResult> {
    detections.into_iter().find_map(|detection| {
        let code = detection.code.trim();
        if code.is_empty() {
            return None;
        }
        let format = match detection.format.trim().parse::<Symbology>() {
            Ok(format) => format,
            Err(_) => {
                log::trace!("Ignoring detection with unknown format '{}'", detection.format);
                return None;
            }
        };
        if !accepted.contains(&format) {
            log::trace!("Ignoring {} detection; symbology not enabled", format);
            return None;
        }
        Some(DecodeResult {
            code: code.to_string(),
            format,
            source,
        })
    })
}

/// Attempts produced by a running decode loop
pub struct FrameAttempts {
    rx: mpsc::Receiver<FrameAttempt>,
    task: Option<JoinHandle<()>>,
}

impl FrameAttempts {
    pub async fn next_attempt(&mut self) -> Option<FrameAttempt> {
        self.rx.recv().await
    }

    /// Attempts already queued, without waiting for more
    pub fn drain_pending(&mut self) -> Vec<FrameAttempt> {
        let mut pending = Vec::new();
        while let Ok(attempt) = self.rx.try_recv() {
            pending.push(attempt);
        }
        pending
    }

    /// Close the channel and wait for the decode task to exit
    ///
    /// Callers signal the stop channel first; closing the receiver also unblocks a
    /// task waiting to deliver an attempt.
    pub async fn finish(mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Decode task ended abnormally: {}", e);
            }
        }
    }
}

impl Stream for FrameAttempts {
    type Item = FrameAttempt;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
