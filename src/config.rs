//! Runtime configuration.
//!
//! The API base URL is baked in at build time from `LOGO_API_BASE_URL`. Native
//! builds may override it at runtime through the same environment variable.

use crate::constants;

/// Name of the environment variable holding the AI backend base URL.
pub const API_BASE_URL_ENV: &str = "LOGO_API_BASE_URL";

/// Settings shared by the AI client and the export pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the AI image backend, without a trailing slash
    pub api_base_url: String,
    /// Upper bound for the side of exported PNG images
    pub max_export_dimension: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: constants::DEFAULT_API_BASE_URL.to_string(),
            max_export_dimension: constants::MAX_EXPORT_DIMENSION,
        }
    }
}

impl AppConfig {
    /// Builds the configuration from the build-time and (on native) runtime environment.
    pub fn from_env() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let runtime = std::env::var(API_BASE_URL_ENV).ok();
        #[cfg(target_arch = "wasm32")]
        let runtime: Option<String> = None;

        let config = Self::default().with_api_base_url(runtime.as_deref().or(option_env!("LOGO_API_BASE_URL")));
        log::info!("API base URL: {}", config.api_base_url);
        config
    }

    /// Returns a copy using `url` as the API base, when it is present and non-blank.
    pub fn with_api_base_url(mut self, url: Option<&str>) -> Self {
        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        self
    }
}
