//! Camera Stream Manager component
//!
//! Acquires and releases capture devices through a pluggable `CaptureBackend`,
//! applies capture constraints and zoom, and guarantees a single outstanding
//! `CaptureHandle` at a time.

pub mod error;
pub mod fake;
pub mod handle;
pub mod manager;
pub mod traits;
pub mod types;

pub use error::{CameraError, CameraResult};
pub use fake::{FakeCameraBackend, FakeCameraStats};
pub use handle::CaptureHandle;
pub use manager::CameraStreamManager;
pub use traits::{CaptureBackend, CaptureStream, ZoomControl};
pub use types::{
    CaptureConstraints, DeviceInfo, FacingMode, Frame, Resolution, ZoomOutcome, ZoomRange,
};
