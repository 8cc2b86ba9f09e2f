//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::mpsc;

use listscan::camera::{CameraStreamManager, FakeCameraBackend};
use listscan::decoder::{DecodeEngineAdapter, FixtureDecoder};
use listscan::lookup::ProductLookup;
use listscan::notifications::api::new_notification_service;
use listscan::session::ScanSessionController;
use listscan::sink::{DraftItemWorkflow, ForwardingSink, ItemDraft};

pub const PRODUCT_CODE: &str = "7891234567890";

/// Controller wired to a draft workflow the way the binary wires it
pub fn drafting_controller(
    camera: FakeCameraBackend,
    lookup: Option<Arc<dyn ProductLookup>>,
) -> (ScanSessionController, mpsc::UnboundedReceiver<ItemDraft>) {
    let camera = Arc::new(CameraStreamManager::new(Arc::new(camera)));
    let decoder = Arc::new(DecodeEngineAdapter::new(
        Arc::new(FixtureDecoder::new()),
        Vec::new(),
    ));
    let (workflow, drafts) = DraftItemWorkflow::new(lookup);
    let sink = Arc::new(ForwardingSink::new(Arc::new(workflow)));
    let controller = ScanSessionController::new(camera, decoder, sink, new_notification_service());
    (controller, drafts)
}

/// Frame payload showing one EAN-13 code
pub fn ean_frame(code: &str) -> String {
    format!("ean_13:{}", code)
}

/// Temporary file holding `contents`
pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
