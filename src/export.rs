//! Export utilities: turn the composed logo into SVG and PNG artifacts.
//!
//! Notes:
//! - SVG export is a plain serialization and always succeeds.
//! - PNG export rasterizes the SVG data URL onto a square canvas whose side is
//!   capped by the configured maximum. Any base image must already be a data URL;
//!   an external `href` aborts early with [`RasterError::ExternalImage`].
//! - Native builds rasterize with resvg. The browser build draws on an HTML canvas,
//!   where a cross-origin bitmap surfaces as [`RasterError::Tainted`].

use crate::config::AppConfig;
use crate::download::{encode_data_url, ArtifactSink, DownloadReport};
use crate::error::{DownloadError, RasterError};
use crate::types::{ExportArtifact, ExportFormat, LogoDescriptor, ResolvedImage, Rgb, SvgNode};
use base64::Engine;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static EXTERNAL_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href\s*=\s*["'](https?://[^"']+)["']"#).expect("valid external href pattern")
});

/// Everything a [`Rasterizer`] needs to paint one PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterJob {
    /// Serialized SVG markup
    pub markup: String,
    /// The same markup as a `data:image/svg+xml;base64,` URL
    pub data_url: String,
    /// Side of the square output in pixels
    pub side: u32,
    /// Solid color painted before the logo
    pub background: Rgb,
}

/// Paints a [`RasterJob`] and encodes the result as PNG bytes.
#[allow(async_fn_in_trait)]
pub trait Rasterizer {
    /// Rasterizes `job` into PNG bytes.
    async fn rasterize(&self, job: &RasterJob) -> Result<Vec<u8>, RasterError>;
}

/// Serializes `node` into an SVG artifact named `<stem>.svg`.
pub fn to_svg(node: &SvgNode, stem: &str) -> ExportArtifact {
    ExportArtifact {
        payload: node.markup.as_bytes().to_vec(),
        mime: ExportFormat::Svg.mime().to_string(),
        filename: format!("{stem}.{}", ExportFormat::Svg.extension()),
        fallback_data_url: Some(svg_data_url(&node.markup)),
    }
}

/// Rasterizes `node` into a square PNG artifact named `<stem>.png`.
pub async fn to_png<R: Rasterizer>(
    rasterizer: &R,
    node: &SvgNode,
    background: Rgb,
    max_dimension: u32,
    stem: &str,
) -> Result<ExportArtifact, RasterError> {
    if let Some(url) = find_external_image(&node.markup) {
        return Err(RasterError::ExternalImage(url));
    }

    let job = RasterJob {
        markup: node.markup.clone(),
        data_url: svg_data_url(&node.markup),
        side: raster_side(node, max_dimension),
        background,
    };
    log::debug!("Rasterizing {} at {}x{}", node.id, job.side, job.side);

    let png = rasterizer.rasterize(&job).await?;
    let fallback = encode_data_url(&png, ExportFormat::Png.mime());
    Ok(ExportArtifact {
        payload: png,
        mime: ExportFormat::Png.mime().to_string(),
        filename: format!("{stem}.{}", ExportFormat::Png.extension()),
        fallback_data_url: Some(fallback),
    })
}

/// Side of the square PNG: the smaller rendered dimension, capped at `max_dimension`.
pub fn raster_side(node: &SvgNode, max_dimension: u32) -> u32 {
    let side = node.width.min(node.height).min(max_dimension as f32);
    if side.is_finite() {
        (side.floor() as u32).max(1)
    } else {
        max_dimension.max(1)
    }
}

/// Encodes SVG markup as a base64 data URL.
pub fn svg_data_url(markup: &str) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(markup.as_bytes())
    )
}

/// Returns the first `http(s)` URL referenced from an `href` in `markup`.
pub fn find_external_image(markup: &str) -> Option<String> {
    EXTERNAL_HREF.captures(markup).map(|c| c[1].to_string())
}

/// What the UI should do after preparing an export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPlan {
    /// The artifact is ready to hand to the download dispatcher
    Ready(ExportArtifact),
    /// The base image is still being inlined; ask the user to retry shortly
    WaitForImage,
    /// PNG export failed; offer a retry or a switch to SVG
    RasterFailed(RasterError),
}

/// Prepares an export of the current logo.
///
/// `image` is the inlining state of the selected base image, if any. A degraded
/// (not inlined) image makes PNG export fail fast instead of producing a corrupt file.
pub async fn prepare<R: Rasterizer>(
    rasterizer: &R,
    descriptor: &LogoDescriptor,
    image: Option<&ResolvedImage>,
    node: &SvgNode,
    format: ExportFormat,
    config: &AppConfig,
) -> ExportPlan {
    let stem = descriptor.file_stem();
    match format {
        ExportFormat::Svg => ExportPlan::Ready(to_svg(node, &stem)),
        ExportFormat::Png => {
            match image {
                Some(ResolvedImage::Pending { .. }) => return ExportPlan::WaitForImage,
                Some(ResolvedImage::Degraded { original_url, .. }) => {
                    log::warn!("PNG export blocked: base image {original_url} was never inlined");
                    return ExportPlan::RasterFailed(RasterError::ExternalImage(original_url.clone()));
                }
                _ => {}
            }

            let background = Rgb::parse_hex(&descriptor.background_color).unwrap_or(Rgb::WHITE);
            match to_png(rasterizer, node, background, config.max_export_dimension, &stem).await {
                Ok(artifact) => ExportPlan::Ready(artifact),
                Err(e) => {
                    log::error!("PNG conversion failed: {e}");
                    ExportPlan::RasterFailed(e)
                }
            }
        }
    }
}

/// How an export request ended, from the user's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// The artifact reached the user
    Delivered {
        /// Name of the delivered file
        filename: String,
        /// How the download went
        report: DownloadReport,
    },
    /// PNG export failed; the user may retry or switch to SVG
    OfferSvgFallback {
        /// Why rasterization failed
        reason: RasterError,
    },
    /// The base image is still being inlined
    WaitForImage,
    /// The user dismissed the save dialog
    Cancelled,
    /// Delivery failed; `instruction` tells the user what to do next
    Failed {
        /// User-facing instruction
        instruction: String,
    },
}

/// Composes export preparation and delivery into one user-triggered action.
#[derive(Debug)]
pub struct ExportPipeline<R, S> {
    rasterizer: R,
    sink: S,
    config: AppConfig,
}

impl<R: Rasterizer, S: ArtifactSink> ExportPipeline<R, S> {
    /// Creates a pipeline from its collaborators.
    pub fn new(rasterizer: R, sink: S, config: AppConfig) -> Self {
        Self { rasterizer, sink, config }
    }

    /// The sink artifacts are delivered to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Exports `node` as `format` and delivers it. Every path ends in an outcome the UI can show.
    pub async fn export(
        &self,
        descriptor: &LogoDescriptor,
        image: Option<&ResolvedImage>,
        node: &SvgNode,
        format: ExportFormat,
    ) -> ExportOutcome {
        let artifact = match prepare(&self.rasterizer, descriptor, image, node, format, &self.config).await {
            ExportPlan::Ready(artifact) => artifact,
            ExportPlan::WaitForImage => return ExportOutcome::WaitForImage,
            ExportPlan::RasterFailed(reason) => return ExportOutcome::OfferSvgFallback { reason },
        };

        match self.sink.deliver(&artifact).await {
            Ok(report) => ExportOutcome::Delivered {
                filename: artifact.filename,
                report,
            },
            Err(DownloadError::Cancelled) => ExportOutcome::Cancelled,
            Err(e) => {
                log::error!("Delivery of {} failed: {e}", artifact.filename);
                ExportOutcome::Failed {
                    instruction: e.to_string(),
                }
            }
        }
    }
}

/// Rasterizer backed by resvg and tiny-skia. Also renders the live preview.
#[derive(Clone)]
pub struct ResvgRasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl std::fmt::Debug for ResvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResvgRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResvgRasterizer {
    /// Creates a rasterizer, loading system fonts where the platform has them.
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut db = fontdb::Database::new();
        #[cfg(not(target_arch = "wasm32"))]
        db.load_system_fonts();
        Self::with_database(db)
    }

    /// Creates a rasterizer that only knows the faces bundled with egui.
    pub fn bundled_fonts_only() -> Self {
        Self::with_database(fontdb::Database::new())
    }

    fn with_database(mut db: fontdb::Database) -> Self {
        let bundled = load_bundled_faces(&mut db);
        map_generic_families(&mut db, &bundled);
        log::debug!("Rasterizer font database holds {} faces", db.len());
        Self { fontdb: Arc::new(db) }
    }

    /// Renders `markup` into a `side`×`side` pixmap, stretching it to fill the square.
    pub fn render_pixmap(
        &self,
        markup: &str,
        side: u32,
        background: Option<Rgb>,
    ) -> Result<tiny_skia::Pixmap, RasterError> {
        let mut opt = usvg::Options::default();
        opt.fontdb = self.fontdb.clone();

        let tree = usvg::Tree::from_str(markup, &opt).map_err(|e| RasterError::Decode(e.to_string()))?;

        let mut pixmap = tiny_skia::Pixmap::new(side, side)
            .ok_or_else(|| RasterError::Render(format!("Failed to create pixmap {side}x{side}")))?;

        if let Some(c) = background {
            pixmap.fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, 255));
        }

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            side as f32 / size.width(),
            side as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

/// Faces egui ships with, usable on hosts without any system fonts.
const BUNDLED_FACES: [&str; 2] = ["Ubuntu-Light", "Hack"];

const SANS_SERIF_FAMILIES: [&str; 6] = ["Arial", "Helvetica", "Liberation Sans", "DejaVu Sans", "Noto Sans", "Verdana"];
const SERIF_FAMILIES: [&str; 5] = ["Times New Roman", "Georgia", "Liberation Serif", "DejaVu Serif", "Noto Serif"];
const MONOSPACE_FAMILIES: [&str; 5] = ["Courier New", "Liberation Mono", "DejaVu Sans Mono", "Noto Sans Mono", "Hack"];

/// Registers egui's bundled faces and returns their family names, sans-serif first.
fn load_bundled_faces(db: &mut fontdb::Database) -> Vec<String> {
    let definitions = egui::FontDefinitions::default();
    let mut families = Vec::new();
    for name in BUNDLED_FACES {
        let Some(data) = definitions.font_data.get(name) else {
            log::warn!("egui does not bundle the {name} face");
            continue;
        };
        let ids = db.load_font_source(fontdb::Source::Binary(Arc::new(data.font.to_vec())));
        for id in ids {
            if let Some((family, _)) = db.face(id).and_then(|face| face.families.first()) {
                if !families.contains(family) {
                    families.push(family.clone());
                }
            }
        }
    }
    families
}

fn has_family(db: &fontdb::Database, name: &str) -> bool {
    db.faces().any(|face| face.families.iter().any(|(family, _)| family == name))
}

fn first_installed(db: &fontdb::Database, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|name| has_family(db, name))
        .map(|name| name.to_string())
}

/// Points the CSS generic families at faces that exist, so `font-family="Arial, sans-serif"`
/// resolves on hosts without Arial.
fn map_generic_families(db: &mut fontdb::Database, bundled: &[String]) {
    let Some(sans) = first_installed(db, &SANS_SERIF_FAMILIES).or_else(|| bundled.first().cloned()) else {
        log::warn!("No fonts available; logo text will not be rendered");
        return;
    };
    let serif = first_installed(db, &SERIF_FAMILIES).unwrap_or_else(|| sans.clone());
    let monospace = first_installed(db, &MONOSPACE_FAMILIES).unwrap_or_else(|| sans.clone());

    db.set_serif_family(serif);
    db.set_monospace_family(monospace);
    db.set_cursive_family(sans.clone());
    db.set_fantasy_family(sans.clone());
    db.set_sans_serif_family(sans);
}

impl Rasterizer for ResvgRasterizer {
    async fn rasterize(&self, job: &RasterJob) -> Result<Vec<u8>, RasterError> {
        let pixmap = self.render_pixmap(&job.markup, job.side, Some(job.background))?;
        pixmap.encode_png().map_err(|e| RasterError::Render(e.to_string()))
    }
}

/// Rasterizer that draws on an offscreen HTML canvas, like a browser would.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct CanvasRasterizer;

#[cfg(target_arch = "wasm32")]
impl Rasterizer for CanvasRasterizer {
    async fn rasterize(&self, job: &RasterJob) -> Result<Vec<u8>, RasterError> {
        use futures::channel::oneshot;
        use std::cell::RefCell;
        use std::rc::Rc;
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::{JsCast, JsValue};

        let window = web_sys::window().ok_or_else(|| RasterError::Render("No window found".into()))?;
        let document = window
            .document()
            .ok_or_else(|| RasterError::Render("No document found".into()))?;

        let canvas = document
            .create_element("canvas")
            .map_err(|_| RasterError::Render("Failed to create canvas".into()))?
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .map_err(|_| RasterError::Render("Failed to cast to canvas element".into()))?;
        canvas.set_width(job.side);
        canvas.set_height(job.side);

        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<web_sys::CanvasRenderingContext2d>().ok())
            .ok_or_else(|| RasterError::Render("Failed to get canvas context".into()))?;

        // Decode the SVG data URL, racing a timeout
        let image = web_sys::HtmlImageElement::new()
            .map_err(|_| RasterError::Render("Failed to create image element".into()))?;
        let (tx, rx) = oneshot::channel::<Result<(), RasterError>>();
        let tx = Rc::new(RefCell::new(Some(tx)));
        let settle = move |tx: &Rc<RefCell<Option<oneshot::Sender<Result<(), RasterError>>>>>, result| {
            if let Some(sender) = tx.borrow_mut().take() {
                let _ = sender.send(result);
            }
        };

        let onload = {
            let tx = tx.clone();
            Closure::<dyn FnMut()>::new(move || settle(&tx, Ok(())))
        };
        let onerror = {
            let tx = tx.clone();
            Closure::<dyn FnMut()>::new(move || {
                settle(
                    &tx,
                    Err(RasterError::Decode("SVG image failed to load - may contain external references".into())),
                )
            })
        };
        let ontimeout = {
            let tx = tx.clone();
            let ms = crate::constants::SVG_DECODE_TIMEOUT_MS;
            Closure::<dyn FnMut()>::new(move || settle(&tx, Err(RasterError::Timeout(ms))))
        };

        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        let timeout_handle = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                ontimeout.as_ref().unchecked_ref(),
                crate::constants::SVG_DECODE_TIMEOUT_MS as i32,
            )
            .map_err(|_| RasterError::Render("Failed to schedule decode timeout".into()))?;
        image.set_src(&job.data_url);

        let loaded = rx
            .await
            .unwrap_or_else(|_| Err(RasterError::Decode("image load was cancelled".into())));
        window.clear_timeout_with_handle(timeout_handle);
        image.set_onload(None);
        image.set_onerror(None);
        drop((onload, onerror, ontimeout));
        loaded?;

        ctx.set_fill_style_str(&job.background.to_hex());
        let side = f64::from(job.side);
        ctx.fill_rect(0.0, 0.0, side, side);
        ctx.draw_image_with_html_image_element_and_dw_and_dh(&image, 0.0, 0.0, side, side)
            .map_err(|e| RasterError::Render(format!("Failed to draw image: {e:?}")))?;

        // Extract PNG bytes; a tainted canvas throws or yields a null blob
        let (blob_tx, blob_rx) = oneshot::channel::<Option<web_sys::Blob>>();
        let blob_tx = Rc::new(RefCell::new(Some(blob_tx)));
        let on_blob = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            if let Some(sender) = blob_tx.borrow_mut().take() {
                let _ = sender.send(value.dyn_into::<web_sys::Blob>().ok());
            }
        });
        canvas
            .to_blob_with_type(on_blob.as_ref().unchecked_ref(), "image/png")
            .map_err(|e| RasterError::Tainted(format!("{e:?}")))?;
        let blob = blob_rx
            .await
            .ok()
            .flatten()
            .ok_or_else(|| RasterError::Tainted("Failed to convert canvas to blob".into()))?;
        drop(on_blob);

        let buffer = wasm_bindgen_futures::JsFuture::from(blob.array_buffer())
            .await
            .map_err(|e| RasterError::Render(format!("Failed to read PNG blob: {e:?}")))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}
