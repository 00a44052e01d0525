//! Core data types for the logo maker.
//!
//! This module defines the logo configuration record, image references, and the
//! values that flow through the export pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shape drawn behind the logo text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LogoShape {
    /// A circle centered in the viewBox
    #[default]
    Circle,
    /// An axis-aligned square centered in the viewBox
    Square,
    /// An upward-pointing triangle
    Triangle,
    /// No shape; text only
    None,
}

impl LogoShape {
    /// All selectable shapes, in display order.
    pub const ALL: [LogoShape; 4] = [Self::Circle, Self::Square, Self::Triangle, Self::None];

    /// Human-friendly label used in the edit pane and in AI prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
            Self::Triangle => "triangle",
            Self::None => "none",
        }
    }
}

/// An 8-bit RGB color parsed from `#rrggbb` or `#rgb` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Opaque white.
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    /// Parses a CSS hex color. Returns `None` for anything that is not `#rgb` or `#rrggbb`.
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            3 => {
                let expand = |c: &str| channel(&c.repeat(2));
                Some(Self {
                    r: expand(&hex[0..1])?,
                    g: expand(&hex[1..2])?,
                    b: expand(&hex[2..3])?,
                })
            }
            _ => None,
        }
    }

    /// Formats as lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Reference to an image used as the base of the logo.
///
/// Data URLs are self-contained and can be painted on a canvas immediately.
/// External URLs must be inlined first and may fail because of cross-origin rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageReference {
    /// An embedded `data:` URL
    DataUrl(String),
    /// An `http://` or `https://` URL
    External(String),
}

impl ImageReference {
    /// Classifies a raw image string. Returns `None` for relative paths, blank strings and other schemes.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if is_data_url(raw) {
            Some(Self::DataUrl(raw.to_string()))
        } else if is_external_url(raw) {
            Some(Self::External(raw.to_string()))
        } else {
            None
        }
    }

    /// The raw URL string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::DataUrl(url) | Self::External(url) => url,
        }
    }

    /// Whether this reference is already embedded.
    pub fn is_data_url(&self) -> bool {
        matches!(self, Self::DataUrl(_))
    }
}

/// Checks if a URL is a data URL (already embedded).
pub fn is_data_url(url: &str) -> bool {
    url.starts_with("data:")
}

/// Checks if a URL points at an externally-hosted resource.
pub fn is_external_url(url: &str) -> bool {
    !is_data_url(url) && (url.starts_with("http://") || url.starts_with("https://"))
}

/// Flat record of every visual attribute of the logo.
///
/// The record is treated as an immutable snapshot: edits produce a new value that
/// replaces the old one wholesale, so the exporter never observes a half-applied edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogoDescriptor {
    /// Brand name shown under the preview and used for the download filename
    pub brand: String,
    /// Text drawn inside the logo
    pub logo_text: String,
    /// Shape drawn behind the text
    pub shape: LogoShape,
    /// Shape radius / half-side and text size, before minimums are applied
    pub logo_size: f32,
    /// Fill color for the shape and text (`#rrggbb`)
    pub logo_color: String,
    /// Background fill (`#rrggbb`)
    pub background_color: String,
    /// Border stroke color (`#rrggbb`)
    pub border_color: String,
    /// Border stroke width in user units
    pub border_width: f32,
    /// Rotation in degrees around the visual center
    pub rotation: f32,
    /// Transparency from 0 (opaque) to 100 (as transparent as allowed)
    pub transparency: f32,
    /// Font family for logo text
    pub font_family: String,
    /// Free-form effects description, forwarded to the AI backend
    pub effects: String,
    /// Placement hint forwarded to the AI backend
    pub position: String,
    /// Outer margin around the preview frame (logical pixels)
    pub margin: f32,
    /// Horizontal padding inside the preview frame (logical pixels)
    pub padding_x: f32,
    /// Vertical padding inside the preview frame (logical pixels)
    pub padding_y: f32,
    /// Base image replacing the shape, if any
    pub selected_image: Option<ImageReference>,
    /// Whether the brand name is shown under the preview
    pub show_brand: bool,
    /// Whether the shape is drawn
    pub show_shape: bool,
    /// Whether the text is drawn
    pub show_text: bool,
    /// Whether the border is drawn
    pub show_border: bool,
    /// Whether the background is filled
    pub show_background: bool,
}

impl Default for LogoDescriptor {
    fn default() -> Self {
        Self {
            brand: String::new(),
            logo_text: "LOGO".to_string(),
            shape: LogoShape::Circle,
            logo_size: 40.0,
            logo_color: "#3b82f6".to_string(),
            background_color: "#ffffff".to_string(),
            border_color: "#000000".to_string(),
            border_width: 1.0,
            rotation: 0.0,
            transparency: 0.0,
            font_family: "Arial, sans-serif".to_string(),
            effects: String::new(),
            position: "center".to_string(),
            margin: 0.0,
            padding_x: 0.0,
            padding_y: 0.0,
            selected_image: None,
            show_brand: true,
            show_shape: true,
            show_text: true,
            show_border: false,
            show_background: true,
        }
    }
}

impl LogoDescriptor {
    /// Returns a copy with the given base image selected.
    pub fn with_selected_image(&self, image: Option<ImageReference>) -> Self {
        Self {
            selected_image: image,
            ..self.clone()
        }
    }

    /// Filename stem for exports: the brand, or `logo` when blank.
    ///
    /// Path separators and characters rejected by common filesystems are replaced with `_`.
    pub fn file_stem(&self) -> String {
        let brand = self.brand.trim();
        if brand.is_empty() {
            return "logo".to_string();
        }
        brand
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    }

    /// Serializes the descriptor to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restores a descriptor from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Inlining state of the selected base image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedImage {
    /// The external image is still being fetched
    Pending {
        /// URL being fetched
        original_url: String,
    },
    /// The image is embedded and safe to rasterize
    Inlined(String),
    /// Inlining failed; the original URL is displayed but PNG export will not work
    Degraded {
        /// URL that could not be inlined
        original_url: String,
        /// Why inlining failed
        reason: String,
    },
}

impl ResolvedImage {
    /// Starting state for a freshly selected image reference.
    pub fn for_reference(reference: &ImageReference) -> Self {
        match reference {
            ImageReference::DataUrl(url) => Self::Inlined(url.clone()),
            ImageReference::External(url) => Self::Pending {
                original_url: url.clone(),
            },
        }
    }

    /// URL the preview should paint.
    pub fn href(&self) -> &str {
        match self {
            Self::Pending { original_url } | Self::Degraded { original_url, .. } => original_url,
            Self::Inlined(url) => url,
        }
    }

    /// Whether the image is still being fetched.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// An image produced by the AI backend (or its mock fallback), kept in the gallery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GalleryImage {
    /// Stable identity across accumulate/clear operations
    pub id: Uuid,
    /// The image itself
    pub reference: ImageReference,
}

impl GalleryImage {
    /// Wraps a reference with a fresh id.
    pub fn new(reference: ImageReference) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference,
        }
    }
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Vector markup
    Svg,
    /// Raster image
    Png,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// MIME type of the payload.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml;charset=utf-8",
            Self::Png => "image/png",
        }
    }
}

/// Serialized SVG element together with its rendered bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgNode {
    /// Element id of the root `<svg>`
    pub id: String,
    /// Serialized markup of the whole subtree
    pub markup: String,
    /// Rendered width in logical pixels
    pub width: f32,
    /// Rendered height in logical pixels
    pub height: f32,
}

/// Result of one export: the bytes, their name, and a data URL for the fallback page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// File contents
    pub payload: Vec<u8>,
    /// MIME type of the payload
    pub mime: String,
    /// Suggested filename
    pub filename: String,
    /// Embedded copy used when the primary save mechanism fails
    pub fallback_data_url: Option<String>,
}

impl ExportArtifact {
    /// Whether the payload can be shown in an `<img>` tag.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_reference_accepts_only_data_and_http_urls() {
        assert!(matches!(
            ImageReference::parse("data:image/png;base64,AAAA"),
            Some(ImageReference::DataUrl(_))
        ));
        assert!(matches!(
            ImageReference::parse("https://cdn.example.com/a.png"),
            Some(ImageReference::External(_))
        ));
        assert!(ImageReference::parse("/images/a.png").is_none());
        assert!(ImageReference::parse("   ").is_none());
        assert!(ImageReference::parse("ftp://example.com/a.png").is_none());
    }

    #[test]
    fn hex_colors_parse_in_short_and_long_form() {
        assert_eq!(Rgb::parse_hex("#3b82f6"), Some(Rgb { r: 0x3b, g: 0x82, b: 0xf6 }));
        assert_eq!(Rgb::parse_hex("#fff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::parse_hex("blue"), None);
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::WHITE.to_hex(), "#ffffff");
    }

    #[test]
    fn file_stem_never_contains_path_separators() {
        let mut descriptor = LogoDescriptor::default();
        assert_eq!(descriptor.file_stem(), "logo");
        descriptor.brand = "../Acme/Corp\\Inc".into();
        let stem = descriptor.file_stem();
        assert!(!stem.contains('/'));
        assert!(!stem.contains('\\'));
        assert_eq!(stem, ".._Acme_Corp_Inc");
    }

    #[test]
    fn descriptor_round_trips_through_json_with_defaults() {
        let restored = LogoDescriptor::from_json(r#"{"brand":"Acme","shape":"Triangle"}"#).unwrap();
        assert_eq!(restored.brand, "Acme");
        assert_eq!(restored.shape, LogoShape::Triangle);
        assert_eq!(restored.logo_color, "#3b82f6");
    }

    #[test]
    fn resolved_image_starts_pending_for_external_urls() {
        let external = ImageReference::External("https://x.test/a.png".into());
        assert!(ResolvedImage::for_reference(&external).is_pending());
        let embedded = ImageReference::DataUrl("data:image/png;base64,AA".into());
        assert_eq!(
            ResolvedImage::for_reference(&embedded),
            ResolvedImage::Inlined("data:image/png;base64,AA".into())
        );
    }
}
