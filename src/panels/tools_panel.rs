use egui::Slider;

use crate::SketchApp;
use crate::tool::ToolMode;

pub fn tools_panel(app: &mut SketchApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Tools");

            if let Some(error) = app.open_failed() {
                ui.colored_label(egui::Color32::RED, format!("Canvas unavailable: {error}"));
                return;
            }
            let Some(canvas) = app.canvas_mut() else {
                ui.label("Preparing canvas…");
                return;
            };

            let mut tool = canvas.tool().clone();
            ui.horizontal(|ui| {
                for mode in [ToolMode::Brush, ToolMode::Eraser] {
                    if ui.selectable_label(tool.mode == mode, mode.name()).clicked() {
                        log::info!("Tool selected from UI: {}", mode.name());
                        tool.mode = mode;
                    }
                }
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Color:");
                egui::color_picker::color_edit_button_srgba(
                    ui,
                    &mut tool.color,
                    egui::color_picker::Alpha::Opaque,
                );
            });
            ui.horizontal(|ui| {
                ui.label("Size:");
                ui.add(Slider::new(&mut tool.width, 1.0..=50.0));
            });
            ui.horizontal(|ui| {
                ui.label("Opacity:");
                ui.add(Slider::new(&mut tool.opacity, 0.05..=1.0));
            });

            if &tool != canvas.tool() {
                canvas.set_mode(tool.mode);
                canvas.set_color(tool.color);
                canvas.set_width(tool.width);
                canvas.set_opacity(tool.opacity);
            }

            let mut autosave = canvas.autosave();
            if ui.checkbox(&mut autosave, "Autosave").changed() {
                canvas.set_autosave(autosave);
            }

            ui.separator();

            let can_undo = canvas.history().can_undo();
            let can_redo = canvas.history().can_redo();
            let depth = canvas.depth();

            ui.horizontal(|ui| {
                if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                    app.undo();
                }
                if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                    app.redo();
                }
                if ui.button("Clear").clicked() {
                    app.show_clear_confirm = true;
                }
            });
            ui.horizontal(|ui| {
                if ui.button("Export PNG").clicked() {
                    app.export();
                }
                if ui
                    .add_enabled(!app.copy_in_progress(), egui::Button::new("Copy"))
                    .clicked()
                {
                    app.copy();
                }
            });

            ui.separator();
            ui.label(format!("States: {depth}"));
            if let Some(status) = app.status() {
                ui.label(status);
            }
        });
}
