//! Application state structures for the logo maker.
//!
//! The logo itself lives in one [`LogoDescriptor`] that is replaced wholesale on every
//! edit. Background work reports back through [`TaskResult`] messages on an mpsc
//! channel that the UI drains once per frame.

use crate::ai_service::{AiLogoClient, GenerationMode, GenerationResult};
use crate::composer;
use crate::config::AppConfig;
use crate::error::{InlineError, RasterError};
use crate::export::{ExportOutcome, ResvgRasterizer};
use crate::types::*;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use uuid::Uuid;

/// Key under which UI preferences are stored by eframe.
pub const STORAGE_KEY: &str = "app_state";

/// Results sent from background tasks back to the UI thread.
#[derive(Debug)]
pub enum TaskResult {
    /// An external base image finished inlining (or failed to)
    ImageInlined {
        /// The URL that was fetched
        url: String,
        /// The data URL, or why it could not be produced
        result: Result<String, InlineError>,
    },
    /// AI generation finished, with real or placeholder images
    LogosGenerated(GenerationResult),
    /// An export request ran to completion
    ExportFinished {
        /// Format that was requested
        format: ExportFormat,
        /// What happened
        outcome: ExportOutcome,
    },
    /// Result of the backend health check
    BackendHealth(bool),
    /// External gallery images were fetched for thumbnails; URLs that failed map to themselves
    GalleryInlined(HashMap<String, String>),
}

/// Modal dialogs waiting for user input.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingDialog {
    /// PNG export failed: retry, or download SVG instead
    RasterFailed {
        /// Why rasterization failed
        reason: RasterError,
    },
    /// A message the user has to acknowledge
    Notice {
        /// Window title
        title: String,
        /// Body text
        message: String,
    },
}

/// Channel used by background tasks.
pub struct TaskState {
    /// Cloned into every spawned task
    pub sender: mpsc::Sender<TaskResult>,
    /// Drained each frame
    pub receiver: mpsc::Receiver<TaskResult>,
}

impl Default for TaskState {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }
}

/// AI generation and the gallery of generated images.
#[derive(Default)]
pub struct GalleryState {
    /// Generated images, oldest first
    pub images: Vec<GalleryImage>,
    /// Text typed into the prompt box
    pub prompt: String,
    /// A generation request is in flight
    pub is_generating: bool,
    /// Where the most recent batch came from
    pub last_mode: Option<GenerationMode>,
    /// Why the most recent batch fell back to placeholders
    pub last_error: Option<String>,
    /// Thumbnail textures keyed by gallery image id
    pub thumbnails: HashMap<Uuid, egui::TextureHandle>,
    /// Gallery images whose thumbnail could not be decoded
    pub failed_thumbnails: HashSet<Uuid>,
    /// Data URLs of external gallery images, keyed by their original URL
    pub inlined: HashMap<String, String>,
}

impl GalleryState {
    /// The data URL a thumbnail for `image` can be rendered from, if there is one yet.
    pub fn thumbnail_source<'a>(&'a self, image: &'a GalleryImage) -> Option<&'a str> {
        match &image.reference {
            ImageReference::DataUrl(url) => Some(url.as_str()),
            ImageReference::External(url) => self
                .inlined
                .get(url)
                .map(String::as_str)
                .filter(|data_url| is_data_url(data_url)),
        }
    }
}

/// Cached preview texture.
pub struct PreviewState {
    /// Rasterized preview, rebuilt when the markup or pixel size changes
    pub texture: Option<egui::TextureHandle>,
    /// Markup the texture was rendered from
    pub rendered_markup: String,
    /// Pixel side the texture was rendered at
    pub rendered_pixels: u32,
    /// Size the logo occupied on screen last frame, in points
    pub rendered_size: (f32, f32),
    /// Last rendering failure
    pub error: Option<String>,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self {
            texture: None,
            rendered_markup: String::new(),
            rendered_pixels: 0,
            rendered_size: (crate::constants::VIEWBOX_SIZE, crate::constants::VIEWBOX_SIZE),
            error: None,
        }
    }
}

/// The main application state for the logo maker.
///
/// Only UI preferences survive a restart; the logo and gallery start fresh each session.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct LogoMakerApp {
    /// The logo being edited
    #[serde(skip)]
    pub descriptor: LogoDescriptor,
    /// Inlining state of `descriptor.selected_image`
    #[serde(skip)]
    pub resolved_image: Option<ResolvedImage>,
    /// Generated images and prompt
    #[serde(skip)]
    pub gallery: GalleryState,
    /// Cached preview texture
    #[serde(skip)]
    pub preview: PreviewState,
    /// Background task channel
    #[serde(skip)]
    pub tasks: TaskState,
    /// Modal dialog, if any
    #[serde(skip)]
    pub dialog: Option<PendingDialog>,
    /// One-line status shown under the export buttons
    #[serde(skip)]
    pub status_message: Option<String>,
    /// Format of the export currently running
    #[serde(skip)]
    pub export_in_flight: Option<ExportFormat>,
    /// URL typed into the image URL field
    #[serde(skip)]
    pub image_url_input: String,
    /// Backend reachability, once checked
    #[serde(skip)]
    pub backend_online: Option<bool>,
    /// Runtime configuration
    #[serde(skip)]
    pub config: AppConfig,
    /// AI backend client
    #[serde(skip)]
    pub ai_client: AiLogoClient,
    /// Renderer for the preview and native PNG export
    #[serde(skip)]
    pub rasterizer: ResvgRasterizer,
    /// Whether dark mode is enabled
    pub dark_mode: bool,
    /// Width of the edit panel in points
    pub edit_panel_width: f32,
}

impl Default for LogoMakerApp {
    fn default() -> Self {
        let config = AppConfig::default();
        Self {
            descriptor: LogoDescriptor::default(),
            resolved_image: None,
            gallery: GalleryState::default(),
            preview: PreviewState::default(),
            tasks: TaskState::default(),
            dialog: None,
            status_message: None,
            export_in_flight: None,
            image_url_input: String::new(),
            backend_online: None,
            ai_client: AiLogoClient::new(&config),
            config,
            rasterizer: ResvgRasterizer::new(),
            dark_mode: true,
            edit_panel_width: 340.0,
        }
    }
}

impl LogoMakerApp {
    /// Creates the app, restoring UI preferences from eframe storage when available.
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = cc
            .storage
            .and_then(|storage| storage.get_string(STORAGE_KEY))
            .and_then(|json| match Self::from_json(&json) {
                Ok(app) => Some(app),
                Err(e) => {
                    log::warn!("Ignoring stored app state: {e}");
                    None
                }
            })
            .unwrap_or_default();
        app.set_config(config);
        app.check_backend(&cc.egui_ctx);
        app
    }

    /// Replaces the configuration and the client built from it.
    pub fn set_config(&mut self, config: AppConfig) {
        self.ai_client = AiLogoClient::new(&config);
        self.config = config;
    }

    /// Serializes the persisted part of the state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restores state from JSON; session-only fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Swaps in a new descriptor. Every edit goes through here.
    pub fn apply_descriptor(&mut self, next: LogoDescriptor) {
        debug_assert_eq!(next.selected_image, self.descriptor.selected_image, "use select_image");
        self.descriptor = next;
    }

    /// Selects (or clears) the base image.
    ///
    /// Returns the URL that still has to be inlined, if any.
    pub fn select_image(&mut self, reference: Option<ImageReference>) -> Option<String> {
        self.descriptor = self.descriptor.with_selected_image(reference.clone());
        self.resolved_image = reference.as_ref().map(ResolvedImage::for_reference);
        match reference {
            Some(ImageReference::External(url)) => Some(url),
            _ => None,
        }
    }

    /// Records the outcome of inlining `url`. Results for a no-longer-selected image are dropped.
    pub fn finish_inlining(&mut self, url: &str, result: Result<String, InlineError>) {
        let still_selected = matches!(
            &self.resolved_image,
            Some(ResolvedImage::Pending { original_url }) if original_url == url
        );
        if !still_selected {
            log::debug!("Discarding stale inlining result for {url}");
            return;
        }

        self.resolved_image = Some(match result {
            Ok(data_url) => {
                log::info!("Inlined base image {url}");
                ResolvedImage::Inlined(data_url)
            }
            Err(e) => {
                log::warn!("Could not inline {url}, PNG export will be unavailable: {e}");
                ResolvedImage::Degraded {
                    original_url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        });
    }

    /// Adds a batch of generated images to the gallery.
    pub fn add_generated(&mut self, result: GenerationResult) {
        self.gallery.is_generating = false;
        self.gallery.last_mode = Some(result.mode);
        self.gallery.last_error = result.error.map(|e| e.to_string());
        if result.failed_count > 0 {
            log::warn!("{} logo generations failed", result.failed_count);
        }
        self.gallery
            .images
            .extend(result.images.into_iter().map(GalleryImage::new));
    }

    /// Empties the gallery and deselects any gallery image.
    pub fn clear_gallery(&mut self) {
        let selected_from_gallery = self
            .descriptor
            .selected_image
            .as_ref()
            .is_some_and(|selected| self.gallery.images.iter().any(|img| &img.reference == selected));
        self.gallery.images.clear();
        self.gallery.thumbnails.clear();
        self.gallery.failed_thumbnails.clear();
        self.gallery.inlined.clear();
        if selected_from_gallery {
            self.select_image(None);
        }
    }

    /// Composes the logo at its current on-screen size.
    pub fn current_node(&self) -> SvgNode {
        composer::compose(&self.descriptor, self.resolved_image.as_ref(), self.preview.rendered_size)
    }
}
