//! Error types for the export pipeline and its collaborators.

use thiserror::Error;

/// Errors raised while turning a remote image into an embedded data URL.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InlineError {
    /// The request failed or the server rejected it.
    #[error("Failed to fetch image: {0}")]
    Fetch(String),

    /// The payload arrived but could not be turned into a data URL.
    #[error("Failed to read image data: {0}")]
    Read(String),
}

/// Errors raised while rasterizing the logo to PNG.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    /// The logo still references an image by external URL, which would taint the canvas.
    #[error("The logo contains an external image ({0}) that cannot be converted to PNG. Try downloading as SVG instead.")]
    ExternalImage(String),

    /// The serialized SVG could not be decoded as an image.
    #[error("Failed to load SVG image: {0}")]
    Decode(String),

    /// The SVG did not finish decoding in time.
    #[error("SVG image load timed out after {0} ms")]
    Timeout(u32),

    /// The canvas refused to hand out its pixels, usually because a cross-origin image tainted it.
    #[error("Failed to extract PNG data from canvas: {0}")]
    Tainted(String),

    /// Drawing or encoding failed.
    #[error("Failed to render PNG: {0}")]
    Render(String),
}

impl RasterError {
    /// Whether switching to SVG export is likely to succeed where PNG failed.
    pub fn suggests_svg(&self) -> bool {
        matches!(self, Self::ExternalImage(_) | Self::Tainted(_) | Self::Decode(_))
    }
}

/// Errors raised while handing an artifact to the user's device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DownloadError {
    /// The primary download path failed.
    #[error("Download failed: {0}")]
    Primary(String),

    /// The primary path failed and no fallback tab could be opened.
    #[error("Please allow pop-ups to download the file. Alternatively, right-click the logo and select \"Save Image As...\"")]
    PopupBlocked,

    /// Writing the artifact to disk failed (native targets).
    #[error("Failed to save file: {0}")]
    Io(String),

    /// The user dismissed the save dialog (native targets).
    #[error("Save cancelled")]
    Cancelled,
}

/// Errors raised by the AI image backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The backend answered with HTTP 429 or a rate-limit message.
    #[error("Too many requests: {0}")]
    RateLimited(String),

    /// The backend reported a billing or quota problem.
    #[error("Billing issue: {0}")]
    Billing(String),

    /// The backend could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend rejected our credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The backend answered but returned nothing usable.
    #[error("No images returned from backend")]
    Empty,

    /// Anything else.
    #[error("Backend API error: {0}")]
    Other(String),
}

impl ApiError {
    /// Classifies an HTTP failure by status code and backend message.
    pub fn from_status(status: u16, message: &str) -> Self {
        let lower = message.to_lowercase();
        if status == 429 || lower.contains("too many requests") {
            Self::RateLimited(message.to_string())
        } else if lower.contains("billing") || lower.contains("quota") {
            Self::Billing(message.to_string())
        } else if status == 401 || status == 403 {
            Self::Auth(format!("HTTP {status}: {message}"))
        } else {
            Self::Other(format!("HTTP {status}: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_classified_by_status_and_message() {
        assert!(matches!(ApiError::from_status(429, "slow down"), ApiError::RateLimited(_)));
        assert!(matches!(ApiError::from_status(500, "Billing hard limit reached"), ApiError::Billing(_)));
        assert!(matches!(ApiError::from_status(401, "nope"), ApiError::Auth(_)));
        assert!(matches!(ApiError::from_status(502, "bad gateway"), ApiError::Other(_)));
    }

    #[test]
    fn raster_errors_steer_towards_svg() {
        assert!(RasterError::ExternalImage("https://x".into()).suggests_svg());
        assert!(RasterError::Tainted("insecure".into()).suggests_svg());
        assert!(!RasterError::Timeout(10_000).suggests_svg());
    }
}
