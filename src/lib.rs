//! # Logo Maker
//!
//! A logo customization tool: configure shape, colors, text and effects, preview
//! the result as SVG, optionally start from AI-generated images, and export the
//! logo as SVG or PNG.
//!
//! ## Export pipeline
//! - **Composer** builds the SVG document from a [`LogoDescriptor`]
//! - **Image inliner** embeds remote base images as data URLs
//! - **Exporters** serialize to SVG or rasterize to a bounded, square PNG
//! - **Download dispatcher** saves the file with a platform-specific strategy and
//!   a manual-save fallback page
//!
//! The pipeline runs natively (resvg + file dialogs) and in the browser
//! (HTML canvas + object URLs).

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod ai_service;
pub mod composer;
pub mod config;
pub mod constants;
pub mod download;
pub mod error;
pub mod export;
pub mod inliner;
pub mod platform;
mod types;
mod ui;

// Re-export public types and functions
pub use config::AppConfig;
pub use error::*;
pub use types::*;
pub use ui::LogoMakerApp;

/// Runs the logo maker with default settings.
///
/// This function initializes the egui application window and starts the main event loop.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use logo_maker::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Logo Maker",
        options,
        Box::new(|cc| Ok(Box::new(LogoMakerApp::new(cc, AppConfig::from_env())))),
    )
}

/// Starts the web build on the canvas with id `logo_maker_canvas`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    use wasm_bindgen::JsCast;

    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document found");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("logo_maker_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("Canvas #logo_maker_canvas not found");
            return;
        };

        let result = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(|cc| Ok(Box::new(LogoMakerApp::new(cc, AppConfig::from_env())))),
            )
            .await;
        if let Err(e) = result {
            log::error!("Failed to start eframe: {e:?}");
        }
    });
}
