//! Shared application-wide constants.
//! Centralizes tweakable values used across composing, exporting and downloading.

// Preview document
/// Element id of the composed logo SVG; the exporter looks the node up by this id.
pub const LOGO_SVG_ID: &str = "logo-svg";
/// Side length of the square SVG viewBox (in user units).
pub const VIEWBOX_SIZE: f32 = 300.0;
/// Visual center of the viewBox; rotation and shapes are anchored here.
pub const VIEWBOX_CENTER: f32 = VIEWBOX_SIZE / 2.0;

// Shapes and text
/// Smallest radius/half-side a shape is drawn with.
pub const MIN_SHAPE_SIZE: f32 = 20.0;
/// Smallest font size used for logo text.
pub const MIN_FONT_SIZE: f32 = 12.0;
/// Baseline of logo text when a shape is drawn above it.
pub const TEXT_Y_WITH_SHAPE: f32 = 200.0;
/// Baseline of the text overlay drawn on top of a base image.
pub const TEXT_Y_OVERLAY: f32 = 250.0;

// Opacity
/// Lowest opacity a shape, text or base image may be rendered with.
pub const MIN_OPACITY: f32 = 0.1;
/// Lowest opacity for text drawn over a base image, so it stays legible.
pub const MIN_OVERLAY_TEXT_OPACITY: f32 = 0.8;

// Raster export
/// Upper bound for the side of exported PNG images (in pixels).
pub const MAX_EXPORT_DIMENSION: u32 = 600;
/// How long the browser may take to decode the SVG before raster export gives up.
pub const SVG_DECODE_TIMEOUT_MS: u32 = 10_000;

// Platform detection
/// Viewports at most this wide count as mobile when the device supports touch.
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;

// Download timing
/// Grace period before revoking an object URL on desktop.
pub const DESKTOP_REVOKE_DELAY_MS: u32 = 100;
/// How long the transient anchor stays mounted on mobile after the click.
pub const MOBILE_ANCHOR_LINGER_MS: u32 = 500;
/// Additional delay before revoking the object URL on mobile.
pub const MOBILE_REVOKE_DELAY_MS: u32 = 1_000;

// AI backend
/// API base URL used when no build-time or runtime override is present.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";
/// Number of placeholder images produced when the backend is unavailable.
pub const MOCK_LOGO_COUNT: usize = 4;
