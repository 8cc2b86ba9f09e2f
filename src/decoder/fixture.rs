//! Fixture decode backend
//!
//! Treats frame and image bytes as UTF-8 text, one detection per line in the form
//! `<format label>:<code>`. A line reading `!error` makes that decode call fail.
//! Bytes that are not UTF-8 decode to nothing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use strum::IntoEnumIterator;

use super::error::{EngineError, EngineResult};
use super::traits::DecodeBackend;
use super::types::{DecodeSource, DecoderCapabilities, RawDetection, StillImage, Symbology};
use crate::camera::Frame;

const ERROR_MARKER: &str = "!error";

#[derive(Debug)]
pub struct FixtureDecoder {
    capabilities: DecoderCapabilities,
    init_failure: Option<String>,
    init_delay: Option<Duration>,
    initializations: AtomicUsize,
    frames_seen: AtomicUsize,
}

impl Default for FixtureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureDecoder {
    /// Live and still decoding of every symbology
    pub fn new() -> Self {
        Self {
            capabilities: DecoderCapabilities {
                symbologies: Symbology::iter().collect(),
                live: true,
                still: true,
            },
            init_failure: None,
            init_delay: None,
            initializations: AtomicUsize::new(0),
            frames_seen: AtomicUsize::new(0),
        }
    }

    pub fn with_symbologies(mut self, symbologies: Vec<Symbology>) -> Self {
        self.capabilities.symbologies = symbologies;
        self
    }

    pub fn live_only(mut self) -> Self {
        self.capabilities.still = false;
        self
    }

    pub fn still_only(mut self) -> Self {
        self.capabilities.live = false;
        self
    }

    pub fn failing_initialization(mut self, reason: impl Into<String>) -> Self {
        self.init_failure = Some(reason.into());
        self
    }

    /// Hold every `initialize` call for `delay` before answering
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = Some(delay);
        self
    }

    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen.load(Ordering::SeqCst)
    }
}

/// Parse fixture text into detections; `Err(())` when the error marker is present
fn parse_payload(bytes: &[u8]) -> Result<Vec<RawDetection>, ()> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return Ok(Vec::new()),
    };

    let mut detections = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line == ERROR_MARKER {
            return Err(());
        }
        if let Some((format, code)) = line.split_once(':') {
            detections.push(RawDetection::new(format.trim(), code.trim()));
        }
    }
    Ok(detections)
}

#[async_trait]
impl DecodeBackend for FixtureDecoder {
    fn name(&self) -> &str {
        "fixture"
    }

    fn capabilities(&self) -> DecoderCapabilities {
        self.capabilities.clone()
    }

    async fn initialize(&self, source: DecodeSource) -> EngineResult<()> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.init_failure {
            Some(reason) => Err(EngineError::Initialization {
                backend: self.name().to_string(),
                reason: reason.clone(),
            }),
            None => {
                log::trace!("Fixture decoder ready for {} input", source);
                Ok(())
            }
        }
    }

    async fn decode_frame(&self, frame: &Frame) -> EngineResult<Vec<RawDetection>> {
        self.frames_seen.fetch_add(1, Ordering::SeqCst);
        parse_payload(&frame.data).map_err(|_| EngineError::Frame {
            reason: format!("fixture error marker in frame {}", frame.sequence),
        })
    }

    async fn decode_still(&self, image: &StillImage) -> EngineResult<Vec<RawDetection>> {
        parse_payload(&image.bytes).map_err(|_| EngineError::Still {
            reason: "fixture error marker in image".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_lines() {
        let detections = parse_payload(b"ean_13:7891234567890\n\n code_128 : ABC-1 \nnoise").unwrap();
        assert_eq!(
            detections,
            vec![
                RawDetection::new("ean_13", "7891234567890"),
                RawDetection::new("code_128", "ABC-1"),
            ]
        );
    }

    #[test]
    fn test_parse_payload_error_marker_and_binary() {
        assert!(parse_payload(b"ean_8:96385074\n!error").is_err());
        assert!(parse_payload(&[0xff, 0xfe, 0x00]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initialization_failure() {
        let decoder = FixtureDecoder::new().failing_initialization("no wasm support");
        let result = decoder.initialize(DecodeSource::Frame).await;
        assert!(matches!(
            result,
            Err(EngineError::Initialization { reason, .. }) if reason == "no wasm support"
        ));
        assert_eq!(decoder.initializations(), 1);
    }

    #[tokio::test]
    async fn test_decode_still_reports_error_marker() {
        let decoder = FixtureDecoder::new();
        let result = decoder.decode_still(&StillImage::new("!error")).await;
        assert!(matches!(result, Err(EngineError::Still { .. })));
    }
}
