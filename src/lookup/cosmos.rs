//! Cosmos GTIN lookup over HTTP
//!
//! `GET <base>/gtins/<code>` authenticated with the `X-Cosmos-Token` header. A 404 is
//! a clean "not found"; transport failures, 429 and 5xx are retried. Only numeric
//! codes are GTINs, anything else is not found without a request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use super::error::{LookupError, LookupResult};
use super::traits::ProductLookup;
use super::types::{Category, ProductInfo};
use crate::core::retry::{retry_async, RetryPolicy};

pub const DEFAULT_COSMOS_URL: &str = "https://api.cosmos.bluesoft.com.br";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct CosmosProduct {
    description: Option<String>,
    avg_price: Option<f64>,
    thumbnail: Option<String>,
    category: Option<CosmosCategory>,
    gpc: Option<CosmosCategory>,
}

#[derive(Debug, Deserialize)]
struct CosmosCategory {
    description: Option<String>,
}

impl CosmosProduct {
    fn into_product(self, code: &str) -> ProductInfo {
        let category = self
            .category
            .and_then(|c| c.description)
            .or_else(|| self.gpc.and_then(|c| c.description))
            .map(|name| Category::from_provider(&name))
            .unwrap_or(Category::Other);

        ProductInfo {
            name: self
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| format!("Product {}", code)),
            category,
            price: self.avg_price,
            image_url: self.thumbnail,
        }
    }
}

pub struct CosmosLookup {
    http: Client,
    base_url: Url,
    token: String,
    retry: RetryPolicy,
}

impl CosmosLookup {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> LookupResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(LookupError::Configuration {
                reason: "cosmos lookup needs a token (--cosmos-token or cosmos-token)".to_string(),
            });
        }

        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| LookupError::Configuration {
                reason: format!("'{}' is not a usable cosmos URL", base_url),
            })?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LookupError::Configuration {
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url,
            token,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The code always lands in a single escaped path segment
    fn url_for(&self, code: &str) -> LookupResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::Configuration {
                reason: format!("'{}' is not a usable cosmos URL", self.base_url),
            })?
            .pop_if_empty()
            .push("gtins")
            .push(code);
        Ok(url)
    }

    async fn fetch(&self, code: &str) -> LookupResult<Option<ProductInfo>> {
        let response = self
            .http
            .get(self.url_for(code)?)
            .header("X-Cosmos-Token", &self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LookupError::Http {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        let product: CosmosProduct = response.json().await.map_err(|e| LookupError::Decode {
            reason: e.to_string(),
        })?;
        Ok(Some(product.into_product(code)))
    }
}

#[async_trait]
impl ProductLookup for CosmosLookup {
    fn name(&self) -> &str {
        "cosmos"
    }

    async fn lookup(&self, code: &str) -> LookupResult<Option<ProductInfo>> {
        if !is_gtin(code) {
            log::debug!("Skipping cosmos lookup for non-GTIN code '{}'", code);
            return Ok(None);
        }
        retry_async(
            "cosmos_lookup",
            self.retry.clone(),
            LookupError::is_transient,
            || self.fetch(code),
        )
        .await
    }
}

fn is_gtin(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned HTTP responses in order, one per connection
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buffer = vec![0u8; 4096];
                let read = socket.read(&mut buffer).await.unwrap();
                let request = String::from_utf8_lossy(&buffer[..read]).to_lowercase();
                assert!(request.contains("x-cosmos-token: secret"), "{}", request);
                counter.fetch_add(1, Ordering::SeqCst);

                let reply = format!(
                    "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (format!("http://{}", addr), requests)
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_empty_token_is_configuration_error() {
        assert!(matches!(
            CosmosLookup::new(DEFAULT_COSMOS_URL, "  "),
            Err(LookupError::Configuration { .. })
        ));
    }

    #[test]
    fn test_url_building() {
        let lookup = CosmosLookup::new("https://cosmos.test/", "t").unwrap();
        assert_eq!(
            lookup.url_for("789").unwrap().as_str(),
            "https://cosmos.test/gtins/789"
        );

        let nested = CosmosLookup::new("https://cosmos.test/api", "t").unwrap();
        assert_eq!(
            nested.url_for("789").unwrap().as_str(),
            "https://cosmos.test/api/gtins/789"
        );
    }

    #[test]
    fn test_code_cannot_rewrite_request_path() {
        let lookup = CosmosLookup::new("https://cosmos.test", "t").unwrap();
        let url = lookup.url_for("A/../../admin?x=1 %").unwrap();

        assert_eq!(url.host_str(), Some("cosmos.test"));
        assert_eq!(url.query(), None);
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], "gtins");
        assert!(segments[1].starts_with("A%2F"));
        assert!(!url.path().contains("/admin"));
    }

    #[test]
    fn test_unusable_base_url_is_configuration_error() {
        for base in ["not a url", "mailto:cosmos@test"] {
            assert!(matches!(
                CosmosLookup::new(base, "t"),
                Err(LookupError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn test_gtin_detection() {
        assert!(is_gtin("7891234567890"));
        assert!(is_gtin("12345670"));
        assert!(!is_gtin(""));
        assert!(!is_gtin("ABC-1"));
        assert!(!is_gtin("78912 3"));
    }

    #[tokio::test]
    async fn test_non_numeric_code_is_not_requested() {
        let (base, requests) = serve(Vec::new()).await;
        let lookup = CosmosLookup::new(base, "secret").unwrap();

        assert!(lookup.lookup("CODE39 $/+%").await.unwrap().is_none());
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_product_mapping() {
        let raw: CosmosProduct = serde_json::from_str(
            r#"{"description":"Leite Integral 1L","avg_price":4.79,
                "thumbnail":"https://img.test/1.png",
                "gpc":{"description":"Bebidas"}}"#,
        )
        .unwrap();
        let product = raw.into_product("7891000100103");
        assert_eq!(product.name, "Leite Integral 1L");
        assert_eq!(product.category, Category::Beverages);
        assert_eq!(product.price, Some(4.79));

        let bare: CosmosProduct = serde_json::from_str("{}").unwrap();
        let product = bare.into_product("123");
        assert_eq!(product.name, "Product 123");
        assert_eq!(product.category, Category::Other);
    }

    #[tokio::test]
    async fn test_found_product() {
        let (base, requests) = serve(vec![(
            200,
            r#"{"description":"Detergente Ypê","category":{"description":"Limpeza"}}"#,
        )])
        .await;
        let lookup = CosmosLookup::new(base, "secret").unwrap();

        let product = lookup.lookup("7896098900208").await.unwrap().unwrap();
        assert_eq!(product.category, Category::Cleaning);
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_none_without_retry() {
        let (base, requests) = serve(vec![(404, "{}")]).await;
        let lookup = CosmosLookup::new(base, "secret")
            .unwrap()
            .with_retry(quick_retry());

        assert!(lookup.lookup("0000000000000").await.unwrap().is_none());
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let (base, requests) = serve(vec![
            (503, "{}"),
            (200, r#"{"description":"Café"}"#),
        ])
        .await;
        let lookup = CosmosLookup::new(base, "secret")
            .unwrap()
            .with_retry(quick_retry());

        let product = lookup.lookup("7891").await.unwrap().unwrap();
        assert_eq!(product.name, "Café");
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }
}
