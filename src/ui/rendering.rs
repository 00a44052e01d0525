//! Live preview and gallery thumbnail rendering.
//!
//! Both go through resvg: the composed logo markup for the preview, and the decoded
//! data URL for each gallery image. Textures are cached and only rebuilt when their
//! source changes.

use super::state::LogoMakerApp;
use crate::inliner::decode_data_url;
use crate::types::*;
use eframe::egui;

/// Upper bound for the preview texture side, in physical pixels.
const MAX_PREVIEW_PIXELS: u32 = 1024;

/// Side of gallery thumbnails, in physical pixels.
pub(crate) const THUMBNAIL_PIXELS: u32 = 96;

/// Largest margin or padding the preview frame honors.
const MAX_SPACING: f32 = 64.0;

fn spacing(value: f32) -> i8 {
    value.clamp(0.0, MAX_SPACING).round() as i8
}

/// Converts a premultiplied tiny-skia pixmap into an egui image.
pub(crate) fn pixmap_to_color_image(pixmap: &tiny_skia::Pixmap) -> egui::ColorImage {
    egui::ColorImage::from_rgba_premultiplied(
        [pixmap.width() as usize, pixmap.height() as usize],
        pixmap.data(),
    )
}

impl LogoMakerApp {
    /// Draws the logo preview with its frame and the brand name below it.
    pub fn draw_preview(&mut self, ui: &mut egui::Ui) {
        let margin = spacing(self.descriptor.margin);
        let (pad_x, pad_y) = (spacing(self.descriptor.padding_x), spacing(self.descriptor.padding_y));

        let available = ui.available_size();
        let side = (available.x - 2.0 * (f32::from(margin) + f32::from(pad_x)))
            .min(available.y * 0.7 - 2.0 * (f32::from(margin) + f32::from(pad_y)))
            .clamp(120.0, 480.0);
        self.preview.rendered_size = (side, side);

        let node = self.current_node();
        let pixels = ((side * ui.ctx().pixels_per_point()).round() as u32).clamp(1, MAX_PREVIEW_PIXELS);
        self.refresh_preview_texture(ui.ctx(), &node.markup, pixels);

        ui.vertical_centered(|ui| {
            egui::Frame::new()
                .outer_margin(egui::Margin::same(margin))
                .inner_margin(egui::Margin::symmetric(pad_x, pad_y))
                .show(ui, |ui| match &self.preview.texture {
                    Some(texture) => {
                        ui.add(egui::Image::new((texture.id(), egui::vec2(side, side))));
                    }
                    None => {
                        ui.allocate_space(egui::vec2(side, side));
                    }
                });

            if let Some(error) = &self.preview.error {
                ui.colored_label(ui.visuals().error_fg_color, error);
            }

            let brand = self.descriptor.brand.trim();
            if self.descriptor.show_brand && !brand.is_empty() {
                ui.label(egui::RichText::new(brand).heading().strong());
            }
        });
    }

    /// Re-renders the preview texture when the markup or pixel size changed.
    pub fn refresh_preview_texture(&mut self, ctx: &egui::Context, markup: &str, pixels: u32) {
        if self.preview.texture.is_some()
            && self.preview.rendered_pixels == pixels
            && self.preview.rendered_markup == markup
        {
            return;
        }

        match self.rasterizer.render_pixmap(markup, pixels, None) {
            Ok(pixmap) => {
                let image = pixmap_to_color_image(&pixmap);
                match &mut self.preview.texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.preview.texture = Some(ctx.load_texture("logo-preview", image, egui::TextureOptions::LINEAR));
                    }
                }
                self.preview.error = None;
            }
            Err(e) => {
                log::error!("Preview rendering failed: {e}");
                self.preview.error = Some(e.to_string());
            }
        }
        self.preview.rendered_markup = markup.to_string();
        self.preview.rendered_pixels = pixels;
    }

    /// Returns the thumbnail texture for `image`, rendering it on first use.
    ///
    /// External URLs have no thumbnail until their background fetch lands. Images
    /// that fail to decode are remembered and not retried.
    pub fn thumbnail(&mut self, ctx: &egui::Context, image: &GalleryImage) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.gallery.thumbnails.get(&image.id) {
            return Some(texture.clone());
        }
        if self.gallery.failed_thumbnails.contains(&image.id) {
            return None;
        }

        let url = self.gallery.thumbnail_source(image)?.to_string();
        let color_image = match self.decode_thumbnail(&url) {
            Ok(color_image) => color_image,
            Err(e) => {
                log::warn!("Could not render thumbnail for gallery image {}: {e}", image.id);
                self.gallery.failed_thumbnails.insert(image.id);
                return None;
            }
        };
        let texture = ctx.load_texture(
            format!("thumb-{}", image.id),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        self.gallery.thumbnails.insert(image.id, texture.clone());
        Some(texture)
    }

    fn decode_thumbnail(&self, url: &str) -> Result<egui::ColorImage, String> {
        let (mime, bytes) = decode_data_url(url).ok_or("malformed data URL")?;
        if mime == "image/svg+xml" {
            let markup = String::from_utf8(bytes).map_err(|e| e.to_string())?;
            let pixmap = self
                .rasterizer
                .render_pixmap(&markup, THUMBNAIL_PIXELS, None)
                .map_err(|e| e.to_string())?;
            return Ok(pixmap_to_color_image(&pixmap));
        }

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| e.to_string())?
            .thumbnail(THUMBNAIL_PIXELS, THUMBNAIL_PIXELS)
            .to_rgba8();
        Ok(egui::ColorImage::from_rgba_unmultiplied(
            [decoded.width() as usize, decoded.height() as usize],
            decoded.as_raw(),
        ))
    }
}
