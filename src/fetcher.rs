//! HTTP retrieval and validation of a single image.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::sanitize::is_image_content_type;
use crate::types::ImageResource;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

/// Fetches images anonymously (no cookie store, no credentials)
#[derive(Clone, Debug)]
pub struct ImageFetcher {
    client: reqwest::Client,
    accept: String,
}

impl ImageFetcher {
    /// Build a fetcher from configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create HTTP client: {}",
                e
            )))
        })?;

        Ok(Self::with_client(client, config.accept.clone()))
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client, accept: impl Into<String>) -> Self {
        Self {
            client,
            accept: accept.into(),
        }
    }

    /// Fetch `url` and check that it is an image.
    ///
    /// # Errors
    ///
    /// - [`Error::Network`] when the request cannot be sent or the body cannot be read
    /// - [`Error::HttpStatus`] for a non-2xx reply
    /// - [`Error::InvalidContentType`] when the declared type is not `image/*`
    pub async fn fetch(&self, url: &str) -> Result<ImageResource> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, self.accept.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .trim()
            .to_string();

        if !is_image_content_type(&content_type) {
            return Err(Error::InvalidContentType(content_type));
        }

        let bytes = response.bytes().await?;

        tracing::debug!(
            url,
            content_type = %content_type,
            size_bytes = bytes.len(),
            "Fetched image"
        );

        Ok(ImageResource {
            source_url: url.to_string(),
            bytes,
            content_type,
        })
    }
}
