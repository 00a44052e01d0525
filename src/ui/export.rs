//! Export buttons and the export request flow.

use super::state::LogoMakerApp;
use super::tasks::spawn_task;
use super::state::TaskResult;
use crate::download;
use crate::export::ExportPipeline;
use crate::types::*;
use eframe::egui;

impl LogoMakerApp {
    /// Starts exporting the current logo as `format`.
    ///
    /// The descriptor and image state are snapshotted here, so edits made while the
    /// export runs do not leak into the file.
    pub fn request_export(&mut self, ctx: &egui::Context, format: ExportFormat) {
        if self.export_in_flight.is_some() {
            return;
        }
        self.export_in_flight = Some(format);
        self.status_message = None;

        let node = self.current_node();
        let descriptor = self.descriptor.clone();
        let image = self.resolved_image.clone();
        let config = self.config.clone();
        let sender = self.tasks.sender.clone();
        let ctx = ctx.clone();

        #[cfg(not(target_arch = "wasm32"))]
        let rasterizer = self.rasterizer.clone();
        #[cfg(target_arch = "wasm32")]
        let rasterizer = crate::export::CanvasRasterizer;

        log::info!("Exporting {} as {}", descriptor.file_stem(), format.extension());
        spawn_task(async move {
            let pipeline = ExportPipeline::new(rasterizer, download::platform_sink(), config);
            let outcome = pipeline.export(&descriptor, image.as_ref(), &node, format).await;
            let _ = sender.send(TaskResult::ExportFinished { format, outcome });
            ctx.request_repaint();
        });
    }

    /// Draws the download buttons and the format hint for external images.
    pub fn draw_export_controls(&mut self, ui: &mut egui::Ui) {
        let external_image = self
            .descriptor
            .selected_image
            .as_ref()
            .is_some_and(|r| !r.is_data_url());

        if external_image {
            let png_status = match &self.resolved_image {
                Some(ResolvedImage::Inlined(_)) => "Available",
                Some(ResolvedImage::Pending { .. }) => "Waiting for the image to finish converting",
                _ => "Limited due to external URLs",
            };
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.label(egui::RichText::new("AI image download info").strong());
                ui.label("SVG: recommended, works everywhere and scales");
                ui.label(format!("PNG: {png_status}"));
            });
        }

        let busy = self.export_in_flight.is_some();
        ui.horizontal(|ui| {
            let svg_label = if external_image { "Download SVG ⭐" } else { "Download SVG" };
            if ui.add_enabled(!busy, egui::Button::new(svg_label)).clicked() {
                self.request_export(ui.ctx(), ExportFormat::Svg);
            }
            if ui.add_enabled(!busy, egui::Button::new("Download PNG")).clicked() {
                self.request_export(ui.ctx(), ExportFormat::Png);
            }
            if busy {
                ui.spinner();
            }
        });

        if let Some(message) = &self.status_message {
            ui.label(egui::RichText::new(message).small());
        }
    }
}
