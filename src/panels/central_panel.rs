use egui::{Color32, Rect, Sense, pos2};

use crate::SketchApp;

pub fn central_panel(app: &mut SketchApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;

        app.fit_canvas(rect, ctx.pixels_per_point());
        app.handle_pointer(ctx, response.hovered());

        painter.rect_filled(rect, 0.0, Color32::WHITE);
        if let Some(texture) = app.surface_texture(ctx) {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    });
}

/// Confirmation before wiping the surface
pub fn clear_dialog(app: &mut SketchApp, ctx: &egui::Context) {
    egui::Window::new("Clear the canvas?")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label("The drawing can be brought back with Undo.");
            ui.horizontal(|ui| {
                if ui.button("Clear").clicked() {
                    app.clear();
                    app.show_clear_confirm = false;
                }
                if ui.button("Cancel").clicked() {
                    app.show_clear_confirm = false;
                }
            });
        });
}
