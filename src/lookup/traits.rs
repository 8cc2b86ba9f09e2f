use async_trait::async_trait;

use super::error::LookupResult;
use super::types::ProductInfo;

/// Product metadata for a scanned code
#[async_trait]
pub trait ProductLookup: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the code is unknown to the provider
    async fn lookup(&self, code: &str) -> LookupResult<Option<ProductInfo>>;
}
