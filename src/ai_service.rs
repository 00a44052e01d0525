//! Client for the AI logo generation backend.
//!
//! The backend is an external collaborator. Whenever it cannot deliver (offline,
//! rate limited, bad credentials, empty response) the client substitutes
//! deterministic placeholder logos so the UI keeps working. Which of the two
//! happened is reported through [`GenerationMode`].

use crate::composer::escape_xml;
use crate::config::AppConfig;
use crate::constants;
use crate::error::ApiError;
use crate::types::{ImageReference, LogoDescriptor};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Horizontal and vertical padding forwarded to the backend.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Padding {
    /// Horizontal padding
    pub x: f32,
    /// Vertical padding
    pub y: f32,
}

/// Logo settings sent alongside the prompt.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogoSettings {
    /// Brand name, when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    /// Primary color
    pub logo_color: String,
    /// Background color
    pub background_color: String,
    /// Font family
    pub typography: String,
    /// Shape label
    pub shape: String,
    /// Text to include in the image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_overlay: Option<String>,
    /// Free-form effects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<String>,
    /// Opacity as a percentage (100 = opaque)
    pub opacity: u32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Placement hint
    pub position: String,
    /// Padding around the logo
    pub padding: Padding,
}

impl LogoSettings {
    /// Default primary color; not mentioned in prompts.
    pub const DEFAULT_COLOR: &'static str = "#3b82f6";
    /// Default background color; not mentioned in prompts.
    pub const DEFAULT_BACKGROUND: &'static str = "#ffffff";
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl From<&LogoDescriptor> for LogoSettings {
    fn from(d: &LogoDescriptor) -> Self {
        let opacity = crate::composer::opacity_from_transparency(d.transparency, 0.0);
        Self {
            brand_name: non_blank(&d.brand),
            logo_color: d.logo_color.clone(),
            background_color: d.background_color.clone(),
            typography: d.font_family.clone(),
            shape: d.shape.label().to_string(),
            text_overlay: if d.show_text { non_blank(&d.logo_text) } else { None },
            effects: non_blank(&d.effects),
            opacity: (opacity * 100.0).round() as u32,
            rotation: d.rotation,
            position: d.position.clone(),
            padding: Padding {
                x: d.padding_x,
                y: d.padding_y,
            },
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(rename = "logoSettings")]
    logo_settings: &'a LogoSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    failed_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Where the images of a [`GenerationResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Generated by the backend
    Backend,
    /// Placeholder images produced locally after a backend failure
    Mock,
}

/// Images returned by [`AiLogoClient::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Generated images, in backend order
    pub images: Vec<ImageReference>,
    /// Whether the images are real or placeholders
    pub mode: GenerationMode,
    /// Number of generations the backend reported as failed
    pub failed_count: u32,
    /// Backend failure that caused a fallback to placeholders
    pub error: Option<ApiError>,
}

/// Static description of the client, shown in the edit pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    /// Whether generation is available at all
    pub configured: bool,
    /// Short mode label
    pub mode: String,
    /// Human-readable status line
    pub message: String,
}

/// HTTP client for the logo generation backend.
#[derive(Debug, Clone)]
pub struct AiLogoClient {
    base_url: String,
    client: reqwest::Client,
}

impl AiLogoClient {
    /// Creates a client for the backend configured in `config`.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Describes the client for the UI.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            configured: true,
            mode: "Backend API".to_string(),
            message: format!("AI generation enabled via backend at {}", self.base_url),
        }
    }

    /// Generates logos for `prompt`, falling back to placeholders on any backend failure.
    pub async fn generate(&self, prompt: &str, settings: &LogoSettings) -> GenerationResult {
        let enhanced = enhance_prompt(prompt, settings);
        log::info!("Generating AI logos for prompt: {enhanced}");

        match self.request(&enhanced, settings).await {
            Ok((images, failed_count)) => {
                if failed_count > 0 {
                    log::warn!("{failed_count} logo generations failed on backend");
                }
                log::info!("Generated {} AI logos via backend", images.len());
                GenerationResult {
                    images,
                    mode: GenerationMode::Backend,
                    failed_count,
                    error: None,
                }
            }
            Err(e) => {
                match &e {
                    ApiError::RateLimited(_) => log::warn!("Rate limit exceeded on backend, using mock logos"),
                    ApiError::Billing(_) => log::warn!("Billing issue detected on backend, using mock logos"),
                    ApiError::Network(_) => log::warn!("Backend unavailable, using mock logos: {e}"),
                    ApiError::Auth(_) => log::warn!("Authentication failed on backend, using mock logos"),
                    ApiError::Empty | ApiError::Other(_) => log::warn!("{e}; using mock logos"),
                }
                let images = mock_logos(prompt, settings)
                    .into_iter()
                    .map(ImageReference::DataUrl)
                    .collect();
                GenerationResult {
                    images,
                    mode: GenerationMode::Mock,
                    failed_count: 0,
                    error: Some(e),
                }
            }
        }
    }

    async fn request(&self, prompt: &str, settings: &LogoSettings) -> Result<(Vec<ImageReference>, u32), ApiError> {
        let response = self
            .client
            .post(format!("{}/api/generate-logo", self.base_url))
            .json(&GenerateRequest {
                prompt,
                logo_settings: settings,
            })
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(ApiError::from_status(status.as_u16(), &message));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Other(format!("invalid response body: {e}")))?;

        if !body.success {
            return Err(ApiError::Empty);
        }
        let images: Vec<ImageReference> = body
            .images
            .iter()
            .filter_map(|raw| {
                let parsed = ImageReference::parse(raw);
                if parsed.is_none() {
                    log::warn!("Ignoring unusable image reference from backend");
                }
                parsed
            })
            .collect();
        if images.is_empty() {
            return Err(ApiError::Empty);
        }
        Ok((images, body.failed_count))
    }

    /// Checks that the backend answers `GET /api/health`.
    pub async fn health(&self) -> bool {
        match self.client.get(format!("{}/api/health", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::error!("Backend connection test failed: {e}");
                false
            }
        }
    }
}

fn classify_transport(e: reqwest::Error) -> ApiError {
    #[cfg(not(target_arch = "wasm32"))]
    let unreachable = e.is_connect() || e.is_timeout() || e.is_request();
    #[cfg(target_arch = "wasm32")]
    let unreachable = e.is_timeout() || e.is_request();
    if unreachable {
        ApiError::Network(e.to_string())
    } else {
        ApiError::Other(e.to_string())
    }
}

/// Adds the non-default settings to `prompt` so the backend produces matching logos.
pub fn enhance_prompt(prompt: &str, settings: &LogoSettings) -> String {
    let mut enhanced = prompt.trim().to_string();

    if let Some(brand) = &settings.brand_name {
        enhanced = format!("{brand} logo: {enhanced}");
    }

    let mut details: Vec<String> = Vec::new();
    if !settings.logo_color.is_empty() && settings.logo_color != LogoSettings::DEFAULT_COLOR {
        details.push(format!("primary color {}", settings.logo_color));
    }
    if !settings.background_color.is_empty() && settings.background_color != LogoSettings::DEFAULT_BACKGROUND {
        details.push(format!("background {}", settings.background_color));
    }
    let typography = settings.typography.trim();
    if !typography.is_empty() && typography != "Arial, sans-serif" {
        details.push(format!("{typography} typography"));
    }
    if settings.shape != "circle" && settings.shape != "none" {
        details.push(format!("{} shape", settings.shape));
    }
    if let Some(effects) = &settings.effects {
        details.push(format!("with {effects} effects"));
    }
    if settings.rotation != 0.0 {
        details.push(format!("rotated {} degrees", settings.rotation));
    }
    if settings.opacity != 100 {
        details.push(format!("{}% opacity", settings.opacity));
    }

    if let Some(text) = &settings.text_overlay {
        enhanced.push_str(&format!(", including text \"{text}\""));
    }
    if !details.is_empty() {
        enhanced.push_str(", ");
        enhanced.push_str(&details.join(", "));
    }
    let position = settings.position.trim();
    if !position.is_empty() && position != "center" {
        enhanced.push_str(&format!(", positioned {position}"));
    }
    if !enhanced.to_lowercase().contains("logo") {
        enhanced.push_str(" logo design");
    }
    enhanced
}

/// Builds the placeholder logos returned when the backend is unavailable.
///
/// Output depends only on the inputs, so the same prompt always yields the same images.
pub fn mock_logos(prompt: &str, settings: &LogoSettings) -> Vec<String> {
    let color = escape_xml(non_blank(&settings.logo_color).as_deref().unwrap_or(LogoSettings::DEFAULT_COLOR));
    let background = escape_xml(
        non_blank(&settings.background_color)
            .as_deref()
            .unwrap_or(LogoSettings::DEFAULT_BACKGROUND),
    );
    let typography = escape_xml(non_blank(&settings.typography).as_deref().unwrap_or("Arial"));
    let is_circle = settings.shape == "circle";
    let text = escape_xml(&mock_text(prompt));

    (0..constants::MOCK_LOGO_COUNT)
        .map(|index| {
            let font = |size: u32, fill: &str| {
                format!(
                    "<text x=\"200\" y=\"215\" font-family=\"{typography}, sans-serif\" font-size=\"{size}\" font-weight=\"bold\" text-anchor=\"middle\" fill=\"{fill}\">{text}</text>"
                )
            };
            let body = match (index % 4, is_circle) {
                // gradient
                (2, circle) => {
                    let shape = if circle {
                        format!("<circle cx=\"200\" cy=\"200\" r=\"180\" fill=\"url(#grad{index})\" stroke=\"{color}\" stroke-width=\"3\"/>")
                    } else {
                        format!("<rect x=\"40\" y=\"40\" width=\"320\" height=\"320\" rx=\"20\" fill=\"url(#grad{index})\" stroke=\"{color}\" stroke-width=\"3\"/>")
                    };
                    format!(
                        "<defs><linearGradient id=\"grad{index}\" x1=\"0%\" y1=\"0%\" x2=\"100%\" y2=\"100%\"><stop offset=\"0%\" stop-color=\"{color}\"/><stop offset=\"100%\" stop-color=\"{color}\" stop-opacity=\"0.8\"/></linearGradient></defs>{shape}{}",
                        font(28, &background)
                    )
                }
                // outline
                (1, true) => format!(
                    "<circle cx=\"200\" cy=\"200\" r=\"180\" fill=\"none\" stroke=\"{color}\" stroke-width=\"6\"/><circle cx=\"200\" cy=\"200\" r=\"140\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"/>{}",
                    font(24, &color)
                ),
                (1, false) => format!(
                    "<rect x=\"40\" y=\"40\" width=\"320\" height=\"320\" rx=\"20\" fill=\"none\" stroke=\"{color}\" stroke-width=\"6\"/><rect x=\"70\" y=\"70\" width=\"260\" height=\"260\" rx=\"15\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"/>{}",
                    font(24, &color)
                ),
                // solid and minimal
                (_, true) => format!(
                    "<circle cx=\"200\" cy=\"200\" r=\"180\" fill=\"{color}\" stroke=\"{color}\" stroke-width=\"2\"/>{}",
                    font(26, &background)
                ),
                (_, false) => format!(
                    "<rect x=\"40\" y=\"40\" width=\"320\" height=\"320\" rx=\"20\" fill=\"{color}\" stroke=\"{color}\" stroke-width=\"2\"/>{}",
                    font(26, &background)
                ),
            };
            let svg = format!(
                "<svg width=\"400\" height=\"400\" viewBox=\"0 0 400 400\" xmlns=\"http://www.w3.org/2000/svg\"><rect width=\"400\" height=\"400\" fill=\"{background}\"/>{body}</svg>"
            );
            format!(
                "data:image/svg+xml;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(svg.as_bytes())
            )
        })
        .collect()
}

/// First two words of the prompt, upper-cased and cut to 8 characters; `LOGO` when empty.
fn mock_text(prompt: &str) -> String {
    let text: String = prompt
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
        .chars()
        .take(8)
        .collect();
    if text.is_empty() {
        "LOGO".to_string()
    } else {
        text
    }
}
