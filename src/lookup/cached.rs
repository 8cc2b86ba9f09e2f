//! Caching decorator for product lookups

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::LookupResult;
use super::traits::ProductLookup;
use super::types::ProductInfo;

/// Remembers found products by code; misses and errors go to the inner lookup again
pub struct CachedLookup<L> {
    inner: L,
    cache: Mutex<HashMap<String, ProductInfo>>,
    hits: AtomicUsize,
}

impl<L: ProductLookup> CachedLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
        }
    }

    pub fn cache_hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[async_trait]
impl<L: ProductLookup> ProductLookup for CachedLookup<L> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(&self, code: &str) -> LookupResult<Option<ProductInfo>> {
        if let Some(product) = self.cache.lock().await.get(code) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("Product cache hit for {}", code);
            return Ok(Some(product.clone()));
        }

        let found = self.inner.lookup(code).await?;
        if let Some(product) = &found {
            self.cache
                .lock()
                .await
                .insert(code.to_string(), product.clone());
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::types::Category;
    use std::sync::Arc;

    struct CountingLookup {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProductLookup for CountingLookup {
        fn name(&self) -> &str {
            "counting"
        }

        async fn lookup(&self, code: &str) -> LookupResult<Option<ProductInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if code.starts_with('0') {
                return Ok(None);
            }
            Ok(Some(ProductInfo {
                name: format!("Item {}", code),
                category: Category::Other,
                price: None,
                image_url: None,
            }))
        }
    }

    #[tokio::test]
    async fn test_found_products_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lookup = CachedLookup::new(CountingLookup {
            calls: Arc::clone(&calls),
        });

        let first = lookup.lookup("789").await.unwrap();
        let second = lookup.lookup("789").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lookup.cache_hits(), 1);
        assert_eq!(lookup.cached_len().await, 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lookup = CachedLookup::new(CountingLookup {
            calls: Arc::clone(&calls),
        });

        assert!(lookup.lookup("0123").await.unwrap().is_none());
        assert!(lookup.lookup("0123").await.unwrap().is_none());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(lookup.cached_len().await, 0);
    }
}
