use std::time::Duration;

use async_trait::async_trait;

use crate::assets::decode::{DecodedImage, decode_image};
use crate::assets::source::{ImageSource, data_url_payload};
use crate::foundation::error::{MemeError, MemeResult};

/// Remote byte retrieval for `http`/`https` image URLs.
///
/// Implementations must map every failure to [`MemeError::ImageAcquisition`] and must not
/// return more than `max_bytes` bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the raw bytes behind `url`.
    async fn fetch(&self, url: &url::Url, max_bytes: usize) -> MemeResult<Vec<u8>>;
}

/// [`ImageFetcher`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with a whole-request timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> MemeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| MemeError::Other(anyhow::anyhow!("build http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &url::Url, max_bytes: usize) -> MemeResult<Vec<u8>> {
        let mut resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MemeError::image_acquisition(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MemeError::image_acquisition(format!(
                "GET {url}: http status {status}"
            )));
        }
        if let Some(len) = resp.content_length()
            && len > max_bytes as u64
        {
            return Err(MemeError::image_acquisition(format!(
                "GET {url}: content-length {len} exceeds limit of {max_bytes} bytes"
            )));
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| MemeError::image_acquisition(format!("GET {url}: read body: {e}")))?
        {
            if body.len() + chunk.len() > max_bytes {
                return Err(MemeError::image_acquisition(format!(
                    "GET {url}: body exceeds limit of {max_bytes} bytes"
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Resolve an [`ImageSource`] to decoded pixels.
///
/// This is the only suspension point of a render. Nothing is drawn until it returns.
#[tracing::instrument(skip(source, fetcher), fields(source = %source.describe()))]
pub async fn acquire_image(
    source: &ImageSource,
    fetcher: &dyn ImageFetcher,
    max_bytes: usize,
) -> MemeResult<DecodedImage> {
    let bytes = match source {
        ImageSource::Bytes(b) => {
            check_len(b.len(), max_bytes)?;
            return decode_image(b);
        }
        ImageSource::Url(url) => match url.scheme() {
            "http" | "https" => fetcher.fetch(url, max_bytes).await?,
            "data" => data_url_payload(url)?,
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    MemeError::image_acquisition(format!("{url} is not a local file path"))
                })?;
                tokio::fs::read(&path).await.map_err(|e| {
                    MemeError::image_acquisition(format!("read {}: {e}", path.display()))
                })?
            }
            other => {
                return Err(MemeError::image_acquisition(format!(
                    "unsupported image url scheme \"{other}\""
                )));
            }
        },
    };

    check_len(bytes.len(), max_bytes)?;
    tracing::debug!(bytes = bytes.len(), "acquired image payload");
    decode_image(&bytes)
}

fn check_len(len: usize, max_bytes: usize) -> MemeResult<()> {
    if len > max_bytes {
        return Err(MemeError::image_acquisition(format!(
            "image payload of {len} bytes exceeds limit of {max_bytes} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
