use std::sync::Arc;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{MemeError, MemeResult};

/// Where the base image comes from. Exactly one of a URL or an in-memory buffer.
///
/// JSON form: `{"url": "https://..."}` or `{"bytes": "<base64>"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// `http`, `https`, `data`, or `file` URL.
    Url(url::Url),
    /// Encoded image bytes (PNG, JPEG, GIF, WebP, BMP, ...).
    Bytes(#[serde(with = "base64_payload")] Arc<[u8]>),
}

impl ImageSource {
    /// Parse a URL reference. A malformed URL can never be fetched, so it is an acquisition error.
    pub fn url(s: &str) -> MemeResult<Self> {
        let url = url::Url::parse(s.trim())
            .map_err(|e| MemeError::image_acquisition(format!("invalid image url {s:?}: {e}")))?;
        Ok(Self::Url(url))
    }

    /// Wrap an encoded image buffer.
    pub fn bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Short description for logs; never includes payload bytes.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(u) if u.scheme() == "data" => "data: url".to_owned(),
            Self::Url(u) => u.to_string(),
            Self::Bytes(b) => format!("{} in-memory bytes", b.len()),
        }
    }
}

mod base64_payload {
    use std::sync::Arc;

    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(bytes: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Arc<[u8]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.trim())
            .map(Arc::from)
            .map_err(serde::de::Error::custom)
    }
}

/// Decode the payload of a `data:` URL. Malformed percent escapes are kept literally, as
/// browsers do.
pub(crate) fn data_url_payload(url: &url::Url) -> MemeResult<Vec<u8>> {
    let body = url.path();
    let (meta, payload) = body
        .split_once(',')
        .ok_or_else(|| MemeError::image_acquisition("data url has no ',' separator"))?;
    let decoded: Vec<u8> = percent_encoding::percent_decode_str(payload).collect();

    if meta.ends_with(";base64") {
        let compact: Vec<u8> = decoded
            .into_iter()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        return base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| MemeError::image_acquisition(format!("data url base64: {e}")));
    }
    Ok(decoded)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
