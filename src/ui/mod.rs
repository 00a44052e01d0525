//! User interface for the logo maker.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main LogoMakerApp
//! - `editor` - The edit pane: logo settings, base image, AI gallery
//! - `rendering` - Live preview and gallery thumbnails
//! - `export` - Download buttons and export requests
//! - `tasks` - Background work and its results

mod editor;
mod export;
mod rendering;
mod state;
mod tasks;

pub use state::LogoMakerApp;

use self::state::{PendingDialog, STORAGE_KEY};
use crate::types::ExportFormat;
use eframe::egui;

impl eframe::App for LogoMakerApp {
    /// Persist UI preferences between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string(STORAGE_KEY, json);
            }
            Err(err) => {
                log::error!("Failed to serialize app state: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// Lays out the edit pane on the left and the preview in the center, then shows
    /// any pending dialog on top.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        // Apply finished background work
        self.handle_task_results();

        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let max_allowed = (viewport_width * 0.6).max(240.0);
        let clamped_width = self.edit_panel_width.clamp(240.0, max_allowed);

        egui::SidePanel::left("edit_panel")
            .resizable(true)
            .default_width(clamped_width)
            .show(ctx, |ui| {
                self.edit_panel_width = ui.available_width().clamp(240.0, max_allowed);
                self.draw_edit_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Logo Preview");
            });
            ui.add_space(8.0);
            self.draw_preview(ui);
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                self.draw_export_controls(ui);
            });
        });

        self.draw_dialog(ctx);
    }
}

impl LogoMakerApp {
    fn draw_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.dialog.clone() else {
            return;
        };

        match dialog {
            PendingDialog::RasterFailed { reason } => {
                egui::Window::new("PNG download not available")
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                    .show(ctx, |ui| {
                        ui.label(reason.to_string());
                        if reason.suggests_svg() {
                            ui.add_space(4.0);
                            ui.label("SVG files work everywhere and keep full quality.");
                            ui.label("SVG is the recommended format for logos.");
                        }
                        ui.horizontal(|ui| {
                            if ui.button("Download SVG instead").clicked() {
                                self.dialog = None;
                                self.request_export(ctx, ExportFormat::Svg);
                            }
                            if ui.button("Retry PNG").clicked() {
                                self.dialog = None;
                                self.request_export(ctx, ExportFormat::Png);
                            }
                            if ui.button("Cancel").clicked() {
                                self.dialog = None;
                            }
                        });
                    });
            }
            PendingDialog::Notice { title, message } => {
                egui::Window::new(title)
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                    .show(ctx, |ui| {
                        ui.label(message);
                        if ui.button("OK").clicked() {
                            self.dialog = None;
                        }
                    });
            }
        }
    }
}

#[cfg(test)]
mod tests;
