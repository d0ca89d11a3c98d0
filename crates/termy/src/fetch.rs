//! HTTP-backed [`HtmlFetcher`] (feature: `fetch`).
//!
//! Embeddings that can reach published pages directly (no CORS proxy
//! needed) can use this instead of wiring their own fetch capability.

use std::time::Duration;

use async_trait::async_trait;

use crate::capabilities::{CapabilityError, HtmlFetcher};

/// [`HtmlFetcher`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HtmlFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str, timeout: Duration) -> Result<String, CapabilityError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    CapabilityError::Timeout(timeout)
                } else {
                    CapabilityError::Network(err.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CapabilityError::AuthRequired);
        }
        if !status.is_success() {
            return Err(CapabilityError::Network(format!("status {status}")));
        }

        response
            .text()
            .await
            .map_err(|err| CapabilityError::Network(err.to_string()))
    }
}
