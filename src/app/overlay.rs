//! Terminal scan overlay
//!
//! A passive observer of session and frame events: it animates while the session is
//! looking for a code, counts misses, and clears itself when the session ends. It
//! never touches session state.

use std::io::Write;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration};

use crate::notifications::api::{
    Event, EventFilter, EventReceiver, FrameEvent, FrameEventType, NotificationService,
};

type Result<T> = std::result::Result<T, OverlayError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OverlayError {
    #[error("Failed to subscribe to events: {reason}")]
    SubscribeFailed { reason: String },
}

const BRAILLE_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Show the overlay only on a terminal and when info logging would not interleave with it
pub fn should_show_overlay() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr()) && !log::log_enabled!(log::Level::Info)
}

pub struct ScanOverlay<W: Write> {
    out: W,
    frame_index: usize,
    misses: u64,
}

impl<W: Write> ScanOverlay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frame_index: 0,
            misses: 0,
        }
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn tick(&mut self) {
        let frame = BRAILLE_FRAMES[self.frame_index];
        self.frame_index = (self.frame_index + 1) % BRAILLE_FRAMES.len();

        let _ = write!(self.out, "\r{} scanning ({} frames)", frame, self.misses);
        let _ = self.out.flush();
    }

    pub fn finish(&mut self) {
        let _ = write!(self.out, "\r\x1b[2K");
        let _ = self.out.flush();
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Subscribe to `notifications` and draw on stderr until the session ends
pub async fn run_overlay(
    notifications: NotificationService,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    if !should_show_overlay() {
        return Ok(());
    }

    let events = notifications
        .lock()
        .await
        .subscribe(
            "scan-overlay".to_string(),
            EventFilter::SessionAndFrame,
            "cli".to_string(),
        )
        .map_err(|e| OverlayError::SubscribeFailed {
            reason: e.to_string(),
        })?;

    let mut overlay = ScanOverlay::new(std::io::stderr());
    follow_events(&mut overlay, events, shutdown_rx).await;
    Ok(())
}

/// Drive `overlay` from `events` until a terminal session event or shutdown
pub async fn follow_events<W: Write>(
    overlay: &mut ScanOverlay<W>,
    mut events: EventReceiver,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut redraw = interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,

            event = events.recv() => match event {
                Some(Event::Frame(FrameEvent { event_type: FrameEventType::Miss, .. })) => {
                    overlay.record_miss();
                }
                Some(Event::Session(session)) if session.is_terminal() => break,
                Some(_) => {}
                None => break,
            },

            _ = redraw.tick() => overlay.tick(),
        }
    }
    overlay.finish();
}
