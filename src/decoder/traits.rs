//! Decode backend seam
//!
//! A backend reads barcodes out of image data and reports them in its own label
//! vocabulary. `DecodeEngineAdapter` turns those detections into `DecodeResult`s.

use async_trait::async_trait;

use super::error::EngineResult;
use super::types::{DecodeSource, DecoderCapabilities, RawDetection, StillImage};
use crate::camera::Frame;

#[async_trait]
pub trait DecodeBackend: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> DecoderCapabilities;

    /// Called once per session before any decode for `source`
    async fn initialize(&self, source: DecodeSource) -> EngineResult<()>;

    /// Detections in one live frame; an empty list is a miss
    async fn decode_frame(&self, frame: &Frame) -> EngineResult<Vec<RawDetection>>;

    async fn decode_still(&self, image: &StillImage) -> EngineResult<Vec<RawDetection>>;
}
