//! Pharmacy platform API client.
//!
//! # Architecture
//!
//! - Plain REST JSON over `reqwest` - the platform is the source of truth,
//!   this service holds only transient copies
//! - In-memory caching via `moka` for read-mostly catalog and schedule
//!   lookups (5 minute TTL)
//! - The 404 → `PlatformError::NotFound` mapping is load-bearing: the draft
//!   order coordinator treats it as "resource deleted server-side" and only
//!   then falls back to creating a fresh order
//!
//! # Example
//!
//! ```rust,ignore
//! use fernhill_booking::platform::PlatformClient;
//!
//! let client = PlatformClient::new(&config.platform);
//!
//! // Get a service and its treatments
//! let service = client.get_service(&slug).await?;
//! let medicines = client.get_medicines(&slug).await?;
//!
//! // Create a draft order
//! let order = client.create_order(&new_order).await?;
//! ```

mod cache;
pub mod types;

mod appointments;
mod auth;
mod catalog;
mod email;
mod orders;
mod payments;

pub use email::EmailReceipt;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::PlatformConfig;

use cache::{CacheKey, CacheValue};

/// Catalog/schedule cache TTL.
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Errors that can occur when interacting with the platform API.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status other than 404/429.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found (HTTP 404).
    ///
    /// Distinguished from [`PlatformError::Api`] because the order update
    /// path recovers from it by recreating the order; every other failure
    /// must propagate without side effects.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl PlatformError {
    /// Whether this error is a true "resource not found" response.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Client for the pharmacy platform REST API.
///
/// Cheaply cloneable; all clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct PlatformClient {
    inner: Arc<PlatformClientInner>,
}

struct PlatformClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl PlatformClient {
    /// Create a new platform API client.
    ///
    /// # Panics
    ///
    /// Panics if the configured bearer token contains non-header characters;
    /// config validation rejects such tokens before this point.
    #[must_use]
    pub fn new(config: &PlatformConfig) -> Self {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_header =
            HeaderValue::from_str(&auth_value).unwrap_or_else(|_| HeaderValue::from_static(""));
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(PlatformClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        }
    }

    /// Build a full URL for an API path.
    fn url(&self, path: &str) -> String {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    /// Execute a GET request and decode the JSON response.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, PlatformError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    /// Execute a GET request with a caller-supplied bearer token
    /// (customer-scoped endpoints).
    async fn get_json_as<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, PlatformError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Execute a POST request with a JSON body and decode the response.
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PlatformError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Execute a PATCH request with a JSON body and decode the response.
    async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PlatformError> {
        let response = self
            .inner
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Map a response to a decoded body or a `PlatformError`.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PlatformError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(PlatformError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PlatformError::NotFound(
                body.chars().take(200).collect::<String>(),
            ));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Platform API returned non-success status"
            );
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect::<String>(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse platform API response"
            );
            PlatformError::Parse(e.to_string())
        })
    }

    /// Look up a cached value.
    async fn cache_get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.inner.cache.get(key).await
    }

    /// Insert a value into the cache.
    async fn cache_put(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_client(base: &str) -> PlatformClient {
        PlatformClient::new(&PlatformConfig {
            api_url: base.parse().unwrap(),
            api_token: SecretString::from("svc_3kQ9xW7pL2mN8vB4"),
        })
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = test_client("https://api.fernhill.test/");
        assert_eq!(
            client.url("/orders/abc"),
            "https://api.fernhill.test/orders/abc"
        );
        assert_eq!(client.url("services"), "https://api.fernhill.test/services");
    }

    #[test]
    fn test_not_found_is_distinguished() {
        let err = PlatformError::NotFound("order gone".to_string());
        assert!(err.is_not_found());
        let err = PlatformError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = PlatformError::Api {
            status: 502,
            message: "upstream sad".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - upstream sad");

        let err = PlatformError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }
}
