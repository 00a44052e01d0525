//! The edit pane: logo settings, base image, AI generation and the gallery.
//!
//! Widgets edit a scratch copy of the descriptor. When anything changed the copy
//! replaces the app's descriptor in one step.

use super::rendering::THUMBNAIL_PIXELS;
use super::state::LogoMakerApp;
use crate::ai_service::GenerationMode;
use crate::types::*;
use eframe::egui;

const FONT_FAMILIES: [&str; 6] = [
    "Arial, sans-serif",
    "Helvetica, sans-serif",
    "Georgia, serif",
    "Times New Roman, serif",
    "Courier New, monospace",
    "Verdana, sans-serif",
];

/// Color picker plus hex field bound to a `#rrggbb` string.
fn color_row(ui: &mut egui::Ui, label: &str, hex: &mut String) {
    ui.horizontal(|ui| {
        ui.label(label);
        let current = Rgb::parse_hex(hex).unwrap_or(Rgb::WHITE);
        let mut srgb = [current.r, current.g, current.b];
        if ui.color_edit_button_srgb(&mut srgb).changed() {
            *hex = Rgb {
                r: srgb[0],
                g: srgb[1],
                b: srgb[2],
            }
            .to_hex();
        }
        ui.add(egui::TextEdit::singleline(hex).desired_width(80.0));
    });
}

fn section(ui: &mut egui::Ui, title: &str, visible: Option<&mut bool>, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        let shown = ui
            .horizontal(|ui| {
                ui.strong(title);
                match visible {
                    Some(flag) => {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.checkbox(flag, "Show");
                        });
                        *flag
                    }
                    None => true,
                }
            })
            .inner;
        if shown {
            add_contents(ui);
        }
    });
}

/// Draws the logo settings into `next`.
pub fn draw_descriptor_controls(ui: &mut egui::Ui, next: &mut LogoDescriptor) {
    section(ui, "Brand", Some(&mut next.show_brand), |ui| {
        ui.text_edit_singleline(&mut next.brand);
    });

    section(ui, "Shape", Some(&mut next.show_shape), |ui| {
        egui::ComboBox::from_id_salt("logo_shape")
            .selected_text(next.shape.label())
            .show_ui(ui, |ui| {
                for shape in LogoShape::ALL {
                    ui.selectable_value(&mut next.shape, shape, shape.label());
                }
            });
        ui.add(egui::Slider::new(&mut next.logo_size, 10.0..=150.0).text("Size"));
        color_row(ui, "Color", &mut next.logo_color);
    });

    section(ui, "Text", Some(&mut next.show_text), |ui| {
        ui.text_edit_singleline(&mut next.logo_text);
        egui::ComboBox::from_id_salt("font_family")
            .selected_text(next.font_family.clone())
            .show_ui(ui, |ui| {
                for family in FONT_FAMILIES {
                    ui.selectable_value(&mut next.font_family, family.to_string(), family);
                }
            });
    });

    section(ui, "Background", Some(&mut next.show_background), |ui| {
        color_row(ui, "Color", &mut next.background_color);
    });

    section(ui, "Border", Some(&mut next.show_border), |ui| {
        color_row(ui, "Color", &mut next.border_color);
        ui.add(egui::Slider::new(&mut next.border_width, 0.0..=20.0).text("Width"));
    });

    section(ui, "Transform", None, |ui| {
        ui.add(
            egui::Slider::new(&mut next.rotation, -180.0..=180.0)
                .text("Rotation")
                .suffix("°"),
        );
        ui.add(
            egui::Slider::new(&mut next.transparency, 0.0..=100.0)
                .text("Transparency")
                .suffix("%"),
        );
    });

    section(ui, "Layout", None, |ui| {
        ui.add(egui::Slider::new(&mut next.margin, 0.0..=64.0).text("Margin"));
        ui.add(egui::Slider::new(&mut next.padding_x, 0.0..=64.0).text("Padding X"));
        ui.add(egui::Slider::new(&mut next.padding_y, 0.0..=64.0).text("Padding Y"));
        ui.horizontal(|ui| {
            ui.label("Position");
            ui.text_edit_singleline(&mut next.position);
        });
        ui.horizontal(|ui| {
            ui.label("Effects");
            ui.text_edit_singleline(&mut next.effects);
        });
    });
}

impl LogoMakerApp {
    /// Draws the whole edit pane.
    pub fn draw_edit_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Customize");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let theme = if self.dark_mode { "☀" } else { "🌙" };
                if ui.button(theme).on_hover_text("Toggle dark mode").clicked() {
                    self.dark_mode = !self.dark_mode;
                }
                if ui.button("Reset").clicked() {
                    let reset = LogoDescriptor {
                        selected_image: self.descriptor.selected_image.clone(),
                        ..LogoDescriptor::default()
                    };
                    self.apply_descriptor(reset);
                }
            });
        });
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            let mut next = self.descriptor.clone();
            draw_descriptor_controls(ui, &mut next);
            if next != self.descriptor {
                self.apply_descriptor(next);
            }

            ui.add_space(8.0);
            self.draw_base_image_controls(ui);
            ui.add_space(8.0);
            self.draw_ai_section(ui);
        });
    }

    fn draw_base_image_controls(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        section(ui, "Base image", None, |ui| {
            match &self.resolved_image {
                Some(ResolvedImage::Pending { .. }) => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Converting image...");
                    });
                }
                Some(ResolvedImage::Inlined(_)) => {
                    ui.label("Image embedded, PNG and SVG export available");
                }
                Some(ResolvedImage::Degraded { reason, .. }) => {
                    ui.colored_label(
                        ui.visuals().warn_fg_color,
                        format!("Image could not be embedded ({reason}). SVG export is recommended."),
                    );
                }
                None => {
                    ui.label("No base image selected");
                }
            }

            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.image_url_input)
                        .hint_text("https://... or data:...")
                        .desired_width(180.0),
                );
                if ui.button("Use URL").clicked() {
                    match ImageReference::parse(self.image_url_input.trim()) {
                        Some(reference) => {
                            self.image_url_input.clear();
                            self.use_image(&ctx, Some(reference));
                        }
                        None => {
                            self.status_message = Some("Enter an http(s) or data: image URL".to_string());
                        }
                    }
                }
            });

            if self.descriptor.selected_image.is_some() && ui.button("Remove image").clicked() {
                self.use_image(&ctx, None);
            }
        });
    }

    fn draw_ai_section(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        section(ui, "AI logo generation", None, |ui| {
            let status = self.ai_client.status();
            let backend = match self.backend_online {
                Some(true) => "online",
                Some(false) => "offline, placeholders will be used",
                None => "checking...",
            };
            ui.label(egui::RichText::new(format!("{} ({backend})", status.message)).small());

            ui.add(
                egui::TextEdit::multiline(&mut self.gallery.prompt)
                    .hint_text("Describe your logo")
                    .desired_rows(2)
                    .desired_width(f32::INFINITY),
            );
            ui.horizontal(|ui| {
                let can_generate = !self.gallery.is_generating && !self.gallery.prompt.trim().is_empty();
                if ui.add_enabled(can_generate, egui::Button::new("Generate")).clicked() {
                    self.start_generation(&ctx);
                }
                if self.gallery.is_generating {
                    ui.spinner();
                }
                if !self.gallery.images.is_empty() && ui.button("Clear All").clicked() {
                    self.clear_gallery();
                }
            });

            if self.gallery.last_mode == Some(GenerationMode::Mock) {
                let reason = self.gallery.last_error.as_deref().unwrap_or("backend unavailable");
                ui.colored_label(ui.visuals().warn_fg_color, format!("Showing placeholder logos: {reason}"));
            }

            self.draw_gallery(ui);
        });
    }

    fn draw_gallery(&mut self, ui: &mut egui::Ui) {
        if self.gallery.images.is_empty() {
            return;
        }
        let ctx = ui.ctx().clone();
        let thumb = THUMBNAIL_PIXELS as f32 / ctx.pixels_per_point();
        let images = self.gallery.images.clone();
        let mut clicked = None;

        ui.horizontal_wrapped(|ui| {
            for image in &images {
                let selected = self.descriptor.selected_image.as_ref() == Some(&image.reference);
                let response = match self.thumbnail(&ctx, image) {
                    Some(texture) => ui.add(
                        egui::Button::image(egui::Image::new((texture.id(), egui::vec2(thumb, thumb))))
                            .selected(selected),
                    ),
                    None => {
                        let label = match &image.reference {
                            ImageReference::External(url) if !self.gallery.inlined.contains_key(url) => "Loading...",
                            ImageReference::External(_) => "External image",
                            ImageReference::DataUrl(_) => "Unreadable image",
                        };
                        ui.add_sized([thumb, thumb], egui::Button::new(label).selected(selected))
                    }
                };
                if response.on_hover_text(image.reference.as_str().chars().take(60).collect::<String>()).clicked() {
                    clicked = Some(image.reference.clone());
                }
            }
        });

        if let Some(reference) = clicked {
            self.use_image(&ctx, Some(reference));
        }
        if self.descriptor.selected_image.is_some() {
            ui.label("Base logo selected! Customize with colors, text, and effects.");
        }
    }
}
