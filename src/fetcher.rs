//! Network retrieval and decoding of images.
//!
//! [`ImageFetcher`] is the seam the coordinator talks to; [`HttpFetcher`] is the
//! production implementation. Fetching performs one GET with no retries and no
//! URL validation up front: a malformed URL fails inside the HTTP client.

use crate::config::FetchConfig;
use crate::error::{Error, FetchError, Result};
use crate::types::DecodedImage;

/// Abstraction over image retrieval, enabling testability.
#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download `url` and decode the body as a raster image
    async fn fetch(&self, url: &str) -> std::result::Result<DecodedImage, FetchError>;
}

/// Production [`ImageFetcher`] backed by a shared `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: Option<u64>,
}

impl HttpFetcher {
    /// Build the HTTP client from fetch settings
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            Error::config("fetch", format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    async fn read_body(
        &self,
        mut response: reqwest::Response,
        url: &str,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let Some(limit) = self.max_body_bytes else {
            let bytes = response.bytes().await.map_err(FetchError::Body)?;
            return Ok(bytes.to_vec());
        };

        let too_large = || FetchError::TooLarge {
            limit,
            url: url.to_string(),
        };

        // Reject early when the server announces the size
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(FetchError::Body)? {
            if body.len() as u64 + chunk.len() as u64 > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<DecodedImage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = self.read_body(response, url).await?;
        tracing::trace!(url, bytes = body.len(), "response body received");

        // Decoding is CPU-bound; keep it off the async worker threads
        tokio::task::spawn_blocking(move || decode_image(&body))
            .await
            .map_err(|e| FetchError::DecodeTask(e.to_string()))?
    }
}

/// Decode raw bytes in any format the `image` crate recognizes
pub fn decode_image(bytes: &[u8]) -> std::result::Result<DecodedImage, FetchError> {
    let image = image::load_from_memory(bytes)?;
    Ok(DecodedImage::new(image))
}
