//! Background work for the logo maker: image inlining, AI generation, backend health.
//!
//! Tasks run on tokio natively and on the browser event loop in wasm builds. Each
//! one sends its [`TaskResult`]s back and asks egui for a repaint.

use super::state::{LogoMakerApp, PendingDialog, TaskResult};
use crate::ai_service::{GenerationMode, LogoSettings};
use crate::download::DownloadState;
use crate::export::ExportOutcome;
use crate::inliner::{self, HttpFetcher};
use crate::types::*;
use eframe::egui;
use std::future::Future;

/// Runs `task` in the background.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn spawn_task<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(e) => log::error!("Cannot start background task: {e}"),
    }
}

/// Runs `task` in the background.
#[cfg(target_arch = "wasm32")]
pub(crate) fn spawn_task<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task);
}

/// The distinct `http(s)` URLs among `images`.
pub(crate) fn external_urls(images: &[ImageReference]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for image in images {
        if let ImageReference::External(url) = image {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
    }
    urls
}

impl LogoMakerApp {
    /// Drains finished background tasks into the app state.
    pub fn handle_task_results(&mut self) {
        while let Ok(result) = self.tasks.receiver.try_recv() {
            self.handle_task_result(result);
        }
    }

    /// Applies one finished task.
    pub fn handle_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::ImageInlined { url, result } => self.finish_inlining(&url, result),
            TaskResult::LogosGenerated(generation) => {
                let count = generation.images.len();
                let mode = generation.mode;
                self.add_generated(generation);
                self.status_message = Some(match mode {
                    GenerationMode::Backend => format!("Generated {count} logos"),
                    GenerationMode::Mock => format!("Backend unavailable, showing {count} placeholder logos"),
                });
            }
            TaskResult::ExportFinished { format, outcome } => {
                self.export_in_flight = None;
                self.finish_export(format, outcome);
            }
            TaskResult::GalleryInlined(inlined) => {
                let embedded = inlined.values().filter(|url| is_data_url(url)).count();
                log::info!("Embedded {embedded} of {} external gallery images", inlined.len());
                self.gallery.inlined.extend(inlined);
            }
            TaskResult::BackendHealth(online) => {
                log::info!(
                    "AI backend at {} is {}",
                    self.ai_client.base_url(),
                    if online { "online" } else { "offline" }
                );
                self.backend_online = Some(online);
            }
        }
    }

    fn finish_export(&mut self, format: ExportFormat, outcome: ExportOutcome) {
        match outcome {
            ExportOutcome::Delivered { filename, report } => {
                self.status_message = Some(match report.final_state() {
                    DownloadState::FallbackSucceeded => {
                        format!("Opened {filename} in a new tab, save it from there")
                    }
                    _ => format!("Downloaded {filename}"),
                });
            }
            ExportOutcome::OfferSvgFallback { reason } => {
                self.dialog = Some(PendingDialog::RasterFailed { reason });
            }
            ExportOutcome::WaitForImage => {
                self.dialog = Some(PendingDialog::Notice {
                    title: "Image still converting".to_string(),
                    message: "The selected image is still being prepared for download. Please wait a moment and try again.".to_string(),
                });
            }
            ExportOutcome::Cancelled => {
                self.status_message = Some(format!("{} export cancelled", format.extension().to_uppercase()));
            }
            ExportOutcome::Failed { instruction } => {
                self.dialog = Some(PendingDialog::Notice {
                    title: "Download failed".to_string(),
                    message: instruction,
                });
            }
        }
    }

    /// Selects `reference` as the base image and starts inlining it when it is external.
    ///
    /// Gallery images that were already fetched for their thumbnail are reused.
    pub fn use_image(&mut self, ctx: &egui::Context, reference: Option<ImageReference>) {
        let Some(url) = self.select_image(reference) else {
            return;
        };
        let fetched = self
            .gallery
            .inlined
            .get(&url)
            .filter(|data_url| is_data_url(data_url))
            .cloned();
        match fetched {
            Some(data_url) => self.finish_inlining(&url, Ok(data_url)),
            None => self.start_inlining(ctx, url),
        }
    }

    fn start_inlining(&self, ctx: &egui::Context, url: String) {
        log::info!("Inlining base image {url}");
        let sender = self.tasks.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let fetcher = HttpFetcher::new();
            let result = inliner::inline(&fetcher, &url).await;
            let _ = sender.send(TaskResult::ImageInlined { url, result });
            ctx.request_repaint();
        });
    }

    /// Requests a batch of AI logos for the current prompt.
    pub fn start_generation(&mut self, ctx: &egui::Context) {
        let prompt = self.gallery.prompt.trim().to_string();
        if prompt.is_empty() || self.gallery.is_generating {
            return;
        }
        self.gallery.is_generating = true;

        let client = self.ai_client.clone();
        let settings = LogoSettings::from(&self.descriptor);
        let sender = self.tasks.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let result = client.generate(&prompt, &settings).await;
            let external = external_urls(&result.images);
            let _ = sender.send(TaskResult::LogosGenerated(result));
            ctx.request_repaint();

            // Fetch external images so the gallery can show them
            if !external.is_empty() {
                let inlined = inliner::inline_all(&HttpFetcher::new(), &external).await;
                let _ = sender.send(TaskResult::GalleryInlined(inlined));
                ctx.request_repaint();
            }
        });
    }

    /// Checks whether the AI backend is reachable.
    pub fn check_backend(&self, ctx: &egui::Context) {
        let client = self.ai_client.clone();
        let sender = self.tasks.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let online = client.health().await;
            let _ = sender.send(TaskResult::BackendHealth(online));
            ctx.request_repaint();
        });
    }
}
