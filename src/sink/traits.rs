use async_trait::async_trait;

use super::error::SinkResult;
use crate::decoder::DecodeResult;

/// Receives the single decode result of a successful session
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn accept(&self, result: &DecodeResult) -> SinkResult<()>;
}

/// The item-creation workflow downstream of the scanner
#[async_trait]
pub trait ItemWorkflow: Send + Sync {
    async fn on_product_code_scanned(&self, code: &str) -> SinkResult<()>;
}
