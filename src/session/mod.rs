//! Scan Session Controller component
//!
//! Owns the session state machine and coordinates the camera, the decoder and the
//! result sink for live-stream, still-image and simulated scans.

pub mod controller;
pub mod error;
pub mod handle;
pub(crate) mod runner;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

pub use controller::ScanSessionController;
pub use error::{ScanFailure, SessionError, SessionResult};
pub use handle::SessionHandle;
pub use state::{next_state, Trigger};
pub use types::{
    ScanMode, ScanSession, SessionOptions, SessionOutcome, SessionState, SessionStatus,
    SimulationOptions, DEFAULT_SIMULATION_DELAY, MAX_ZOOM, MIN_ZOOM,
};

/// Accept zoom levels from 1.0 to 5.0 inclusive
pub fn validate_zoom_level(level: f64) -> SessionResult<()> {
    if (MIN_ZOOM..=MAX_ZOOM).contains(&level) {
        Ok(())
    } else {
        Err(SessionError::InvalidZoom { level })
    }
}
