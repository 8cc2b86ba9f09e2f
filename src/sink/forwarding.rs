use std::sync::Arc;

use async_trait::async_trait;

use super::error::SinkResult;
use super::traits::{ItemWorkflow, ResultSink};
use crate::decoder::DecodeResult;

/// Hands the decoded code to an `ItemWorkflow`
pub struct ForwardingSink {
    workflow: Arc<dyn ItemWorkflow>,
}

impl ForwardingSink {
    pub fn new(workflow: Arc<dyn ItemWorkflow>) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl ResultSink for ForwardingSink {
    async fn accept(&self, result: &DecodeResult) -> SinkResult<()> {
        log::debug!(
            "Forwarding {} code {} from {}",
            result.format,
            result.code,
            result.source
        );
        self.workflow.on_product_code_scanned(&result.code).await
    }
}

/// Discards results; for callers that only read the session outcome
pub struct NullSink;

#[async_trait]
impl ResultSink for NullSink {
    async fn accept(&self, result: &DecodeResult) -> SinkResult<()> {
        log::trace!("Result {} not forwarded", result.code);
        Ok(())
    }
}
