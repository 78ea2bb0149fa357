use egui::{Key, KeyboardShortcut, Modifiers, Rect, TextureHandle, TextureOptions};
use futures::future::{BoxFuture, FutureExt};

use crate::config::SketchConfig;
use crate::error::ClipboardError;
use crate::panels::{central_panel, clear_dialog, tools_panel};
use crate::state::{Canvas, HostServices};
use crate::tool::ToolMode;

const UNDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
const REDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Y);
const REDO_SHIFT: KeyboardShortcut =
    KeyboardShortcut::new(Modifiers::COMMAND.plus(Modifiers::SHIFT), Key::Z);

/// Desktop/web host around a single `Canvas`
pub struct SketchApp {
    config: SketchConfig,
    /// Opened on the first frame, once the drawing area is known
    canvas: Option<Canvas>,
    open_failed: Option<String>,
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    pointer_captured: bool,
    pub(crate) show_clear_confirm: bool,
    pending_copy: Option<BoxFuture<'static, Result<(), ClipboardError>>>,
    status: Option<String>,
}

impl SketchApp {
    /// Called once before the first frame.
    pub fn new(_cc: &eframe::CreationContext<'_>, config: SketchConfig) -> Self {
        Self {
            config,
            canvas: None,
            open_failed: None,
            texture: None,
            texture_dirty: true,
            pointer_captured: false,
            show_clear_confirm: false,
            pending_copy: None,
            status: None,
        }
    }

    fn host_services(&self) -> HostServices {
        #[cfg(not(target_arch = "wasm32"))]
        {
            HostServices {
                store: Some(Box::new(crate::state::JsonFileStore::new(
                    self.config.storage_path.clone(),
                ))),
                downloads: Box::new(crate::export::DirectorySink::new(self.config.export_dir.clone())),
                clipboard: Box::new(crate::export::SystemClipboard),
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            HostServices {
                store: Some(Box::new(crate::state::LocalStore)),
                downloads: Box::new(crate::export::BrowserDownload),
                clipboard: Box::new(crate::export::WebClipboard),
            }
        }
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn canvas_mut(&mut self) -> Option<&mut Canvas> {
        self.canvas.as_mut()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn open_failed(&self) -> Option<&str> {
        self.open_failed.as_deref()
    }

    pub fn copy_in_progress(&self) -> bool {
        self.pending_copy.is_some()
    }

    /// Open the canvas on first layout, then keep it matched to the drawing area
    pub(crate) fn fit_canvas(&mut self, rect: Rect, pixels_per_point: f32) {
        if self.open_failed.is_some() {
            return;
        }
        if self.canvas.is_none() {
            match Canvas::open(&self.config, rect, pixels_per_point, self.host_services()) {
                Ok(canvas) => {
                    log::info!("Canvas opened at {}x{} points", rect.width(), rect.height());
                    self.canvas = Some(canvas);
                }
                Err(e) => {
                    log::error!("Failed to open canvas: {}", e);
                    self.open_failed = Some(e.to_string());
                }
            }
            self.texture_dirty = true;
            return;
        }
        let Some(canvas) = &mut self.canvas else {
            return;
        };

        let surface = canvas.surface();
        let density = pixels_per_point.min(self.config.max_pixels_per_point);
        if surface.logical_size() != rect.size() || surface.pixels_per_point() != density {
            if let Err(e) = canvas.resize(rect, pixels_per_point) {
                log::error!("Failed to repaint after resize: {}", e);
            }
            self.texture_dirty = true;
        } else {
            canvas.set_surface_rect(rect);
        }
    }

    /// Route this frame's primary-pointer activity into the canvas
    pub(crate) fn handle_pointer(&mut self, ctx: &egui::Context, hovered: bool) {
        let Some(canvas) = &mut self.canvas else {
            return;
        };
        let (pressed, released, moving, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.is_moving(),
                i.pointer.interact_pos(),
            )
        });

        let mut result = Ok(());
        if pressed && hovered {
            if let Some(pos) = pos {
                self.pointer_captured = true;
                result = canvas.on_pointer_down(pos).map(drop);
            }
        } else if self.pointer_captured && moving {
            if let Some(pos) = pos {
                result = canvas.on_pointer_move(pos).map(drop);
            }
        }
        // A press and release can land in the same frame.
        if released && self.pointer_captured {
            self.pointer_captured = false;
            let pos = pos.unwrap_or_default();
            result = result.and(canvas.on_pointer_up(pos).map(drop));
        }

        if let Err(e) = result {
            log::error!("Stroke failed: {}", e);
        }
        if pressed || released || self.pointer_captured {
            self.texture_dirty = true;
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (redo, undo, eraser, brush) = ctx.input_mut(|i| {
            let redo = i.consume_shortcut(&REDO_SHIFT) || i.consume_shortcut(&REDO);
            let undo = i.consume_shortcut(&UNDO);
            let plain = i.modifiers.is_none();
            (
                redo,
                undo,
                plain && i.key_pressed(Key::E),
                plain && i.key_pressed(Key::B),
            )
        });

        if redo {
            self.redo();
        }
        if undo {
            self.undo();
        }
        if let Some(canvas) = &mut self.canvas {
            if eraser {
                canvas.set_mode(ToolMode::Eraser);
            }
            if brush {
                canvas.set_mode(ToolMode::Brush);
            }
        }
    }

    pub fn undo(&mut self) {
        if let Some(canvas) = &mut self.canvas {
            if let Err(e) = canvas.undo() {
                log::error!("Undo failed: {}", e);
            }
            self.texture_dirty = true;
        }
    }

    pub fn redo(&mut self) {
        if let Some(canvas) = &mut self.canvas {
            if let Err(e) = canvas.redo() {
                log::error!("Redo failed: {}", e);
            }
            self.texture_dirty = true;
        }
    }

    pub fn clear(&mut self) {
        if let Some(canvas) = &mut self.canvas {
            if let Err(e) = canvas.clear() {
                log::error!("Clear failed: {}", e);
            }
            self.texture_dirty = true;
        }
    }

    pub fn export(&mut self) {
        let Some(canvas) = &mut self.canvas else {
            return;
        };
        self.status = Some(match canvas.export_image() {
            Ok(image) => format!("Exported {} ({}x{})", canvas.export_filename(), image.width, image.height),
            Err(e) => {
                log::error!("Export failed: {}", e);
                format!("Export failed: {e}")
            }
        });
    }

    pub fn copy(&mut self) {
        if self.pending_copy.is_some() {
            return;
        }
        if let Some(canvas) = &self.canvas {
            self.pending_copy = Some(canvas.copy_to_clipboard());
            self.status = Some("Copying…".to_owned());
        }
    }

    fn poll_copy(&mut self, ctx: &egui::Context) {
        let Some(pending) = &mut self.pending_copy else {
            return;
        };
        match pending.as_mut().now_or_never() {
            Some(Ok(())) => {
                self.status = Some("Image copied to clipboard".to_owned());
                self.pending_copy = None;
            }
            Some(Err(e)) => {
                log::warn!("Copy failed: {}", e);
                self.status = Some(format!("Could not copy: {e}"));
                self.pending_copy = None;
            }
            None => ctx.request_repaint(),
        }
    }

    /// Upload the surface if it changed since the last frame
    pub(crate) fn surface_texture(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        let canvas = self.canvas.as_ref()?;
        if self.texture_dirty || self.texture.is_none() {
            let image = canvas.surface().to_color_image();
            match &mut self.texture {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => {
                    self.texture = Some(ctx.load_texture("sketch_surface", image, TextureOptions::LINEAR));
                }
            }
            self.texture_dirty = false;
        }
        self.texture.as_ref()
    }
}

impl eframe::App for SketchApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_copy(ctx);
        self.handle_shortcuts(ctx);

        tools_panel(self, ctx);
        central_panel(self, ctx);

        if self.show_clear_confirm {
            clear_dialog(self, ctx);
        }
    }
}
