//! Image inliner: converts remote image URLs into embedded base64 data URLs.
//!
//! Exported files must be self-contained, and a canvas refuses to export pixels
//! once a cross-origin bitmap has been drawn into it. Inlining the base image up
//! front avoids both problems. There is no cache; every call re-fetches.

use crate::error::InlineError;
use crate::types::{is_data_url, is_external_url};
use base64::Engine;
use std::collections::HashMap;

/// Raw bytes of a fetched image together with the server-reported content type.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    /// Response body
    pub bytes: Vec<u8>,
    /// Value of the `Content-Type` header, if any
    pub content_type: Option<String>,
}

/// Source of remote image bytes.
///
/// The HTTP implementation is [`HttpFetcher`]; tests substitute their own.
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    /// Performs a GET for `url`.
    async fn fetch(&self, url: &str) -> Result<FetchedImage, InlineError>;
}

/// [`ImageFetcher`] backed by `reqwest`; uses the browser's `fetch` on wasm.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, InlineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| InlineError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InlineError::Fetch(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("request rejected")
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| InlineError::Read(e.to_string()))?;

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// Converts `url` into a `data:` URL.
///
/// Data URLs are returned unchanged without touching the network, which makes
/// `inline(inline(u)) == inline(u)`.
pub async fn inline<F: ImageFetcher>(fetcher: &F, url: &str) -> Result<String, InlineError> {
    if is_data_url(url) {
        return Ok(url.to_string());
    }
    if !is_external_url(url) {
        return Err(InlineError::Fetch(format!("Unsupported image URL: {url}")));
    }

    log::debug!("Inlining external image {url}");
    let fetched = fetcher.fetch(url).await?;
    let data_url = to_data_url(&fetched)?;
    log::info!("Image successfully converted to embedded data URL ({} bytes)", fetched.bytes.len());
    Ok(data_url)
}

/// Inlines several URLs concurrently. URLs that fail map to themselves, with a warning.
pub async fn inline_all<F: ImageFetcher>(fetcher: &F, urls: &[String]) -> HashMap<String, String> {
    let jobs = urls.iter().map(|url| async move {
        match inline(fetcher, url).await {
            Ok(data_url) => (url.clone(), data_url),
            Err(e) => {
                log::warn!("Failed to convert image {url}: {e}");
                (url.clone(), url.clone())
            }
        }
    });
    futures::future::join_all(jobs).await.into_iter().collect()
}

/// Encodes fetched bytes as a base64 data URL.
///
/// The MIME type comes from the `Content-Type` header when it names an image;
/// otherwise it is sniffed from the payload.
pub fn to_data_url(fetched: &FetchedImage) -> Result<String, InlineError> {
    if fetched.bytes.is_empty() {
        return Err(InlineError::Read("empty response body".to_string()));
    }

    let declared = fetched
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| ct.starts_with("image/"));

    let mime = match declared {
        Some(mime) => mime,
        None => sniff_mime(&fetched.bytes).ok_or_else(|| {
            InlineError::Read(format!(
                "payload is not an image (content type {})",
                fetched.content_type.as_deref().unwrap_or("unknown")
            ))
        })?,
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(&fetched.bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

/// Splits a data URL into its MIME type and decoded payload.
///
/// Handles both base64 and plain (percent-free) payloads. Returns `None` for anything else.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, body) = rest.split_once(',')?;
    let mut parts = header.split(';');
    let mime = parts.next().filter(|m| !m.is_empty()).unwrap_or("text/plain").to_ascii_lowercase();
    let bytes = if parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD.decode(body.trim()).ok()?
    } else {
        body.as_bytes().to_vec()
    };
    Some((mime, bytes))
}

fn sniff_mime(bytes: &[u8]) -> Option<String> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type().to_string());
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some("image/svg+xml".to_string());
    }
    None
}
