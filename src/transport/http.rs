// src/transport/http.rs

//! HTTP retrieval from the Bureau's public product mirror.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::FeedConfig;
use crate::transport::{FeedSource, file_name};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; forecast/0.1)";

/// HTTP-backed feed source. The product file name is appended to the base URL.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFeedSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Create a source with a configured asynchronous HTTP client.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::new(client, &config.http_base_url))
    }

    /// URL for a remote product path.
    pub fn url_for(&self, remote_path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            file_name(remote_path)
        )
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, remote_path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(remote_path);
        log::info!("Retrieving {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::transport("dial", format!("{url}: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::transport("retrieve", format!("{url}: {e}")))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::transport("retrieve", format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_uses_file_name() {
        let source = HttpFeedSource::new(reqwest::Client::new(), "http://www.bom.gov.au/fwo/");
        assert_eq!(
            source.url_for("/anon/gen/fwo/IDN11060.xml"),
            "http://www.bom.gov.au/fwo/IDN11060.xml"
        );
    }
}
