use super::*;
use crate::ai_service::{GenerationMode, GenerationResult};
use crate::download::{DownloadReport, DownloadState, DownloadStrategy};
use crate::error::{ApiError, InlineError, RasterError};
use crate::export::ExportOutcome;
use crate::types::*;
use eframe::egui;
use super::state::{PendingDialog, TaskResult};
use super::tasks::external_urls;
use std::collections::HashMap;

/// Run a single headless egui frame with the provided input events and closure.
fn run_ui_with(events: Vec<egui::Event>, mut f: impl FnMut(&egui::Context)) -> egui::FullOutput {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(1200.0, 800.0),
    ));
    raw.events = events;

    let ctx = egui::Context::default();
    ctx.run(raw, |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        f(ctx);
    })
}

fn draw_app(app: &mut LogoMakerApp, ctx: &egui::Context) {
    egui::SidePanel::left("edit_panel").show(ctx, |ui| {
        app.draw_edit_panel(ui);
    });
    egui::CentralPanel::default().show(ctx, |ui| {
        app.draw_preview(ui);
        app.draw_export_controls(ui);
    });
    app.draw_dialog(ctx);
}

fn mock_result(urls: &[&str]) -> GenerationResult {
    GenerationResult {
        images: urls.iter().filter_map(|u| ImageReference::parse(u)).collect(),
        mode: GenerationMode::Mock,
        failed_count: 0,
        error: Some(ApiError::Network("connection refused".into())),
    }
}

fn backend_result(urls: &[&str]) -> GenerationResult {
    GenerationResult {
        mode: GenerationMode::Backend,
        error: None,
        ..mock_result(urls)
    }
}

const EXTERNAL: &str = "https://images.example.com/generated.png";
const EMBEDDED: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHdpZHRoPSIxMCIgaGVpZ2h0PSIxMCIvPg==";

#[test]
fn first_frame_renders_square_preview() {
    let mut app = LogoMakerApp::default();

    run_ui_with(vec![], |ctx| draw_app(&mut app, ctx));

    assert!(app.preview.texture.is_some(), "preview texture should be created on first draw");
    assert!(app.preview.error.is_none());
    let (w, h) = app.preview.rendered_size;
    assert_eq!(w, h);
    assert!(app.preview.rendered_markup.contains("id=\"logo-svg\""));
}

#[test]
fn preview_texture_is_reused_until_the_logo_changes() {
    let mut app = LogoMakerApp::default();
    let ctx = egui::Context::default();
    let node = app.current_node();

    app.refresh_preview_texture(&ctx, &node.markup, 200);
    let first = app.preview.texture.as_ref().map(|t| t.id());
    app.refresh_preview_texture(&ctx, &node.markup, 200);
    assert_eq!(app.preview.texture.as_ref().map(|t| t.id()), first);

    app.apply_descriptor(LogoDescriptor {
        logo_text: "ACME".into(),
        ..app.descriptor.clone()
    });
    let node = app.current_node();
    app.refresh_preview_texture(&ctx, &node.markup, 200);
    assert!(app.preview.rendered_markup.contains(">ACME</text>"));
}

#[test]
fn edits_replace_the_descriptor_wholesale() {
    let mut app = LogoMakerApp::default();
    let before = app.descriptor.clone();

    let next = LogoDescriptor {
        shape: LogoShape::Triangle,
        transparency: 100.0,
        ..before.clone()
    };
    app.apply_descriptor(next.clone());

    assert_eq!(app.descriptor, next);
    let markup = app.current_node().markup;
    assert!(markup.contains("<polygon"));
    assert!(markup.contains("opacity=\"0.1\""));
}

#[test]
fn selecting_an_embedded_image_needs_no_inlining() {
    let mut app = LogoMakerApp::default();
    let reference = ImageReference::parse(EMBEDDED).unwrap();

    assert_eq!(app.select_image(Some(reference.clone())), None);
    assert_eq!(app.descriptor.selected_image, Some(reference));
    assert_eq!(app.resolved_image, Some(ResolvedImage::Inlined(EMBEDDED.to_string())));
}

#[test]
fn external_image_is_pending_until_inlined() {
    let mut app = LogoMakerApp::default();
    let reference = ImageReference::parse(EXTERNAL).unwrap();

    assert_eq!(app.select_image(Some(reference)), Some(EXTERNAL.to_string()));
    assert!(app.resolved_image.as_ref().is_some_and(ResolvedImage::is_pending));
    assert!(app.current_node().markup.contains("Converting image..."));

    app.handle_task_result(TaskResult::ImageInlined {
        url: EXTERNAL.to_string(),
        result: Ok("data:image/png;base64,AAAA".to_string()),
    });
    assert_eq!(
        app.resolved_image,
        Some(ResolvedImage::Inlined("data:image/png;base64,AAAA".to_string()))
    );
    assert!(!app.current_node().markup.contains(EXTERNAL));
}

#[test]
fn failed_inlining_degrades_to_the_original_url() {
    let mut app = LogoMakerApp::default();
    app.select_image(ImageReference::parse(EXTERNAL));

    app.handle_task_result(TaskResult::ImageInlined {
        url: EXTERNAL.to_string(),
        result: Err(InlineError::Fetch("CORS".into())),
    });

    match &app.resolved_image {
        Some(ResolvedImage::Degraded { original_url, reason }) => {
            assert_eq!(original_url, EXTERNAL);
            assert!(reason.contains("CORS"));
        }
        other => panic!("expected degraded image, got {other:?}"),
    }
    assert!(app.current_node().markup.contains(EXTERNAL));
}

#[test]
fn stale_inlining_results_are_ignored() {
    let mut app = LogoMakerApp::default();
    app.select_image(ImageReference::parse(EXTERNAL));
    app.select_image(ImageReference::parse(EMBEDDED));

    app.handle_task_result(TaskResult::ImageInlined {
        url: EXTERNAL.to_string(),
        result: Err(InlineError::Fetch("late".into())),
    });

    assert_eq!(app.resolved_image, Some(ResolvedImage::Inlined(EMBEDDED.to_string())));
}

#[test]
fn generated_images_accumulate_until_cleared() {
    let mut app = LogoMakerApp::default();
    app.gallery.is_generating = true;

    app.handle_task_result(TaskResult::LogosGenerated(mock_result(&[EMBEDDED, EXTERNAL])));
    app.handle_task_result(TaskResult::LogosGenerated(mock_result(&[EMBEDDED])));

    assert!(!app.gallery.is_generating);
    assert_eq!(app.gallery.images.len(), 3);
    assert_eq!(app.gallery.last_mode, Some(GenerationMode::Mock));
    assert!(app.gallery.last_error.as_deref().is_some_and(|e| e.contains("connection refused")));
    // Every gallery entry gets its own identity, even for identical URLs
    assert_ne!(app.gallery.images[0].id, app.gallery.images[2].id);

    app.select_image(Some(app.gallery.images[0].reference.clone()));
    app.clear_gallery();

    assert!(app.gallery.images.is_empty());
    assert!(app.descriptor.selected_image.is_none());
    assert!(app.resolved_image.is_none());
}

#[test]
fn clearing_the_gallery_keeps_a_manually_entered_image() {
    let mut app = LogoMakerApp::default();
    app.handle_task_result(TaskResult::LogosGenerated(mock_result(&[EMBEDDED])));
    let manual = "data:image/png;base64,iVBORw0KGgo=";
    app.select_image(ImageReference::parse(manual));

    app.clear_gallery();

    assert_eq!(app.descriptor.selected_image, ImageReference::parse(manual));
}

#[test]
fn gallery_thumbnails_are_rendered_from_data_urls() {
    let mut app = LogoMakerApp::default();
    app.handle_task_result(TaskResult::LogosGenerated(mock_result(&[EMBEDDED, EXTERNAL])));
    let ctx = egui::Context::default();
    let images = app.gallery.images.clone();

    assert!(app.thumbnail(&ctx, &images[0]).is_some());
    assert!(app.thumbnail(&ctx, &images[1]).is_none());
    assert_eq!(app.gallery.thumbnails.len(), 1);
}

#[test]
fn external_gallery_images_get_thumbnails_once_fetched() {
    let mut app = LogoMakerApp::default();
    let other = "https://images.example.com/other.png";
    app.handle_task_result(TaskResult::LogosGenerated(backend_result(&[EXTERNAL, other])));
    let ctx = egui::Context::default();
    let images = app.gallery.images.clone();
    assert!(app.thumbnail(&ctx, &images[0]).is_none());

    // `other` could not be fetched and maps to itself
    app.handle_task_result(TaskResult::GalleryInlined(HashMap::from([
        (EXTERNAL.to_string(), EMBEDDED.to_string()),
        (other.to_string(), other.to_string()),
    ])));

    assert!(app.thumbnail(&ctx, &images[0]).is_some());
    assert!(app.thumbnail(&ctx, &images[1]).is_none());
    assert!(app.gallery.failed_thumbnails.is_empty());
}

#[test]
fn generated_batches_list_each_external_url_once() {
    let images: Vec<ImageReference> = [EXTERNAL, EMBEDDED, EXTERNAL]
        .iter()
        .filter_map(|u| ImageReference::parse(u))
        .collect();
    assert_eq!(external_urls(&images), vec![EXTERNAL.to_string()]);
}

#[test]
fn selecting_a_fetched_gallery_image_skips_refetching() {
    let mut app = LogoMakerApp::default();
    app.handle_task_result(TaskResult::LogosGenerated(backend_result(&[EXTERNAL])));
    app.handle_task_result(TaskResult::GalleryInlined(HashMap::from([(
        EXTERNAL.to_string(),
        EMBEDDED.to_string(),
    )])));
    let ctx = egui::Context::default();

    let reference = app.gallery.images[0].reference.clone();
    app.use_image(&ctx, Some(reference.clone()));

    assert_eq!(app.descriptor.selected_image, Some(reference));
    assert_eq!(app.resolved_image, Some(ResolvedImage::Inlined(EMBEDDED.to_string())));
}

#[test]
fn undecodable_thumbnails_are_not_retried() {
    let mut app = LogoMakerApp::default();
    app.handle_task_result(TaskResult::LogosGenerated(backend_result(&["data:image/png;base64,AAAA"])));
    let ctx = egui::Context::default();
    let image = app.gallery.images[0].clone();

    for _ in 0..3 {
        assert!(app.thumbnail(&ctx, &image).is_none());
    }
    assert!(app.gallery.thumbnails.is_empty());
    assert_eq!(app.gallery.failed_thumbnails.len(), 1);
    assert!(app.gallery.failed_thumbnails.contains(&image.id));

    app.clear_gallery();
    assert!(app.gallery.failed_thumbnails.is_empty());
}

#[test]
fn raster_failure_offers_svg_fallback() {
    let mut app = LogoMakerApp::default();
    app.export_in_flight = Some(ExportFormat::Png);

    app.handle_task_result(TaskResult::ExportFinished {
        format: ExportFormat::Png,
        outcome: ExportOutcome::OfferSvgFallback {
            reason: RasterError::ExternalImage(EXTERNAL.into()),
        },
    });

    assert!(app.export_in_flight.is_none());
    assert!(matches!(
        app.dialog,
        Some(PendingDialog::RasterFailed {
            reason: RasterError::ExternalImage(_)
        })
    ));

    // The dialog draws without needing any input
    run_ui_with(vec![], |ctx| app.draw_dialog(ctx));
    assert!(app.dialog.is_some());
}

#[test]
fn export_outcomes_never_end_silently() {
    let mut app = LogoMakerApp::default();

    app.handle_task_result(TaskResult::ExportFinished {
        format: ExportFormat::Png,
        outcome: ExportOutcome::WaitForImage,
    });
    assert!(matches!(app.dialog, Some(PendingDialog::Notice { .. })));
    app.dialog = None;

    app.handle_task_result(TaskResult::ExportFinished {
        format: ExportFormat::Svg,
        outcome: ExportOutcome::Failed {
            instruction: "Please allow pop-ups to download the file.".into(),
        },
    });
    match &app.dialog {
        Some(PendingDialog::Notice { message, .. }) => assert!(message.contains("allow pop-ups")),
        other => panic!("expected notice, got {other:?}"),
    }

    app.handle_task_result(TaskResult::ExportFinished {
        format: ExportFormat::Svg,
        outcome: ExportOutcome::Delivered {
            filename: "acme.svg".into(),
            report: DownloadReport {
                strategy: DownloadStrategy::MobileDelayed,
                transitions: vec![
                    DownloadState::Idle,
                    DownloadState::Attempting,
                    DownloadState::FallbackAttempting,
                    DownloadState::FallbackSucceeded,
                ],
                primary_error: None,
            },
        },
    });
    assert!(app.status_message.as_deref().is_some_and(|m| m.contains("new tab")));

    app.handle_task_result(TaskResult::ExportFinished {
        format: ExportFormat::Png,
        outcome: ExportOutcome::Cancelled,
    });
    assert_eq!(app.status_message.as_deref(), Some("PNG export cancelled"));
}

#[test]
fn task_results_are_drained_from_the_channel() {
    let mut app = LogoMakerApp::default();
    app.tasks.sender.send(TaskResult::BackendHealth(false)).unwrap();
    app.tasks
        .sender
        .send(TaskResult::LogosGenerated(mock_result(&[EMBEDDED])))
        .unwrap();

    app.handle_task_results();

    assert_eq!(app.backend_online, Some(false));
    assert_eq!(app.gallery.images.len(), 1);
    assert!(app.tasks.receiver.try_recv().is_err());
}

#[test]
fn only_ui_preferences_are_persisted() {
    let mut app = LogoMakerApp::default();
    app.dark_mode = false;
    app.edit_panel_width = 420.0;
    app.apply_descriptor(LogoDescriptor {
        brand: "Acme".into(),
        ..LogoDescriptor::default()
    });

    let json = app.to_json().unwrap();
    assert!(!json.contains("Acme"));

    let restored = LogoMakerApp::from_json(&json).unwrap();
    assert!(!restored.dark_mode);
    assert_eq!(restored.edit_panel_width, 420.0);
    assert_eq!(restored.descriptor, LogoDescriptor::default());
    assert!(restored.gallery.images.is_empty());
}

#[test]
fn export_controls_flag_external_images() {
    let mut app = LogoMakerApp::default();
    app.select_image(ImageReference::parse(EXTERNAL));

    let output = run_ui_with(vec![], |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| app.draw_export_controls(ui));
    });

    assert!(!output.shapes.is_empty());
    assert!(app.export_in_flight.is_none());
}
