//! Logo composer: turns a [`LogoDescriptor`] into SVG markup.
//!
//! The composed document is what the preview paints and what both exporters
//! consume. Its root element always carries the id [`constants::LOGO_SVG_ID`].

use crate::constants;
use crate::types::{LogoDescriptor, LogoShape, ResolvedImage, SvgNode};
use std::fmt::Write as _;

/// Converts a 0–100 transparency input into an alpha value that never drops below `floor`.
pub fn opacity_from_transparency(transparency: f32, floor: f32) -> f32 {
    let t = if transparency.is_finite() { transparency.clamp(0.0, 100.0) } else { 0.0 };
    (1.0 - t / 100.0).max(floor)
}

/// Builds the logo SVG for `descriptor`.
///
/// `image` is the inlining state of `descriptor.selected_image`; pass `None` when no
/// base image is selected. `rendered` is the on-screen size of the preview in
/// logical pixels, recorded on the node so the raster exporter can size its canvas.
pub fn compose(descriptor: &LogoDescriptor, image: Option<&ResolvedImage>, rendered: (f32, f32)) -> SvgNode {
    let size = constants::VIEWBOX_SIZE;
    let center = constants::VIEWBOX_CENTER;
    let (width, height) = (rendered.0.max(1.0), rendered.1.max(1.0));
    let opacity = opacity_from_transparency(descriptor.transparency, constants::MIN_OPACITY);
    let color = non_empty_or(&descriptor.logo_color, "#3b82f6");
    let font_family = non_empty_or(&descriptor.font_family, "Arial, sans-serif");

    let mut out = String::new();

    let _ = writeln!(
        out,
        "<svg id=\"{}\" xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" preserveAspectRatio=\"xMidYMid meet\">",
        constants::LOGO_SVG_ID,
        width,
        height,
        size,
        size
    );

    // Rotation stays a transform around the visual center
    let rotation = if descriptor.rotation.is_finite() { descriptor.rotation } else { 0.0 };
    let _ = writeln!(out, "<g transform=\"rotate({} {} {})\">", rotation, center, center);

    // Background first, either solid or transparent
    let background = if descriptor.show_background {
        escape_xml(non_empty_or(&descriptor.background_color, "#ffffff"))
    } else {
        "none".to_string()
    };
    let _ = writeln!(
        out,
        "  <rect x=\"0\" y=\"0\" width=\"{s}\" height=\"{s}\" fill=\"{}\" />",
        background,
        s = size
    );

    match image {
        Some(image) => {
            let _ = writeln!(
                out,
                "  <image xlink:href=\"{}\" x=\"0\" y=\"0\" width=\"{s}\" height=\"{s}\" preserveAspectRatio=\"xMidYMid meet\" opacity=\"{}\" />",
                escape_xml(image.href()),
                opacity,
                s = size
            );
            if image.is_pending() {
                let _ = writeln!(
                    out,
                    "  <text x=\"{}\" y=\"20\" text-anchor=\"middle\" fill=\"#666\" font-size=\"12\" font-family=\"Arial, sans-serif\">Converting image...</text>",
                    center
                );
            }
            if descriptor.show_text && !descriptor.logo_text.is_empty() {
                let _ = writeln!(
                    out,
                    "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"{}\" font-size=\"{}\" font-family=\"{}\" font-weight=\"bold\" opacity=\"{}\" stroke=\"white\" stroke-width=\"1\">{}</text>",
                    center,
                    constants::TEXT_Y_OVERLAY,
                    escape_xml(color),
                    descriptor.logo_size.max(constants::MIN_FONT_SIZE),
                    escape_xml(font_family),
                    opacity_from_transparency(descriptor.transparency, constants::MIN_OVERLAY_TEXT_OPACITY),
                    escape_xml(&descriptor.logo_text)
                );
            }
        }
        None => {
            let shape_drawn = descriptor.show_shape && descriptor.shape != LogoShape::None;
            if shape_drawn {
                let r = descriptor.logo_size.max(constants::MIN_SHAPE_SIZE);
                let fill = escape_xml(color);
                match descriptor.shape {
                    LogoShape::Circle => {
                        let _ = writeln!(
                            out,
                            "  <circle cx=\"{c}\" cy=\"{c}\" r=\"{}\" fill=\"{}\" opacity=\"{}\" />",
                            r,
                            fill,
                            opacity,
                            c = center
                        );
                    }
                    LogoShape::Square => {
                        let _ = writeln!(
                            out,
                            "  <rect x=\"{o}\" y=\"{o}\" width=\"{d}\" height=\"{d}\" fill=\"{}\" opacity=\"{}\" />",
                            fill,
                            opacity,
                            o = center - r,
                            d = r * 2.0
                        );
                    }
                    LogoShape::Triangle => {
                        let _ = writeln!(
                            out,
                            "  <polygon points=\"{c},{top} {left},{bottom} {right},{bottom}\" fill=\"{}\" opacity=\"{}\" />",
                            fill,
                            opacity,
                            c = center,
                            top = center - r,
                            left = center - r,
                            right = center + r,
                            bottom = center + r
                        );
                    }
                    LogoShape::None => {}
                }
            }
            if descriptor.show_text && !descriptor.logo_text.is_empty() {
                let y = if shape_drawn { constants::TEXT_Y_WITH_SHAPE } else { center };
                let _ = writeln!(
                    out,
                    "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"{}\" font-size=\"{}\" font-family=\"{}\" font-weight=\"bold\" opacity=\"{}\">{}</text>",
                    center,
                    y,
                    escape_xml(color),
                    descriptor.logo_size.max(constants::MIN_FONT_SIZE),
                    escape_xml(font_family),
                    opacity,
                    escape_xml(&descriptor.logo_text)
                );
            }
        }
    }

    if descriptor.show_border && descriptor.border_width > 0.0 {
        let bw = descriptor.border_width.min(size / 2.0);
        let _ = writeln!(
            out,
            "  <rect x=\"{h}\" y=\"{h}\" width=\"{d}\" height=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" />",
            escape_xml(non_empty_or(&descriptor.border_color, "#000000")),
            bw,
            h = bw / 2.0,
            d = size - bw
        );
    }

    let _ = writeln!(out, "</g>");
    let _ = writeln!(out, "</svg>");

    SvgNode {
        id: constants::LOGO_SVG_ID.to_string(),
        markup: out,
        width,
        height,
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

/// Escapes the five XML special characters.
pub fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}
