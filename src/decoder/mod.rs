//! Decode Engine Adapter component
//!
//! Wraps interchangeable decoding backends behind one adapter that checks backend
//! capabilities, runs the live decode loop, decodes still images, and normalises
//! engine-specific detections into `DecodeResult`s.

pub mod adapter;
pub mod error;
pub mod fixture;
pub mod simulate;
pub mod traits;
pub mod types;

pub use adapter::{normalize_detections, DecodeEngineAdapter, FrameAttempts};
pub use error::{EngineError, EngineResult};
pub use fixture::FixtureDecoder;
pub use simulate::synthesize_code;
pub use traits::DecodeBackend;
pub use types::{
    DecodeResult, DecodeSource, DecoderCapabilities, FrameAttempt, RawDetection, StillImage,
    StillOutcome, Symbology,
};
