//! The drawing context a host application owns.
//!
//! A `Canvas` bundles the raster surface, the tool settings, the stroke in
//! progress and the bounded snapshot history. Hosts create as many as they
//! need; nothing is shared between instances.
//!
//! # Lifecycle
//!
//! - `Canvas::open` seeds history from the persisted snapshot, or commits a
//!   blank surface when there is none.
//! - Pointer and touch handlers drive the stroke renderer; a finished stroke
//!   is committed as a new snapshot.
//! - `undo`, `redo` and `clear` move through history and repaint the surface.
//!
//! # Example
//!
//! ```rust,no_run
//! use sketch_studio::{Canvas, HostServices, SketchConfig};
//!
//! let config = SketchConfig::default();
//! let rect = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(640.0, 480.0));
//! let mut canvas = Canvas::open(&config, rect, 1.0, HostServices::headless()).unwrap();
//!
//! canvas.on_pointer_down(egui::pos2(10.0, 10.0)).unwrap();
//! canvas.on_pointer_move(egui::pos2(50.0, 40.0)).unwrap();
//! canvas.on_pointer_up(egui::pos2(50.0, 40.0)).unwrap();
//! assert_eq!(canvas.depth(), 2);
//!
//! canvas.undo().unwrap();
//! assert_eq!(canvas.depth(), 1);
//! ```
use egui::{Color32, Pos2, Rect};
use futures::future::{self, BoxFuture, FutureExt};

use super::persistence::{KeyValueStore, PersistenceBridge};
use crate::config::SketchConfig;
use crate::error::{ClipboardError, SketchResult};
use crate::export::{ClipboardHost, ClipboardImage, DownloadSink, ExportedImage, UnavailableClipboard};
use crate::history::SnapshotHistory;
use crate::input::{
    InputTranslator, PointerEvent, PointerPhase, StrokeSample, TouchEvent, TouchPhase, Translation,
};
use crate::stroke::{StrokeOutcome, StrokeRenderer};
use crate::surface::Surface;
use crate::tool::{ToolMode, ToolState};

/// The host collaborators a canvas talks to
pub struct HostServices {
    /// Durable storage for the persisted snapshot; `None` disables persistence
    pub store: Option<Box<dyn KeyValueStore>>,
    pub downloads: Box<dyn DownloadSink>,
    pub clipboard: Box<dyn ClipboardHost>,
}

impl HostServices {
    /// No storage, no clipboard, downloads are dropped
    pub fn headless() -> Self {
        Self {
            store: None,
            downloads: Box::new(DiscardDownloads),
            clipboard: Box::new(UnavailableClipboard),
        }
    }
}

struct DiscardDownloads;

impl DownloadSink for DiscardDownloads {
    fn deliver(&mut self, filename: &str, image: &ExportedImage) -> SketchResult<()> {
        log::debug!(
            "Dropping download {} ({}x{}), no download sink",
            filename,
            image.width,
            image.height
        );
        Ok(())
    }
}

/// The main drawing context.
pub struct Canvas {
    surface: Surface,
    translator: InputTranslator,
    tool: ToolState,
    stroke: StrokeRenderer,
    history: SnapshotHistory,
    persistence: Option<PersistenceBridge>,
    downloads: Box<dyn DownloadSink>,
    clipboard: Box<dyn ClipboardHost>,
    autosave: bool,
    eraser_color: Color32,
    export_filename: String,
}

impl Canvas {
    /// Create a canvas covering `surface_rect` (screen points) and restore
    /// the persisted snapshot if one can be read.
    ///
    /// Storage failures are logged and fall back to a blank seed.
    pub fn open(
        config: &SketchConfig,
        surface_rect: Rect,
        pixels_per_point: f32,
        services: HostServices,
    ) -> SketchResult<Self> {
        let HostServices {
            store,
            downloads,
            clipboard,
        } = services;

        let mut canvas = Self {
            surface: Surface::new(
                surface_rect.size(),
                pixels_per_point,
                config.max_pixels_per_point,
            ),
            translator: InputTranslator::new(surface_rect),
            tool: config.tool.clone(),
            stroke: StrokeRenderer::new(),
            history: SnapshotHistory::new(config.history_limit),
            persistence: store.map(|s| PersistenceBridge::new(s, config.storage_key.clone())),
            downloads,
            clipboard,
            autosave: config.autosave,
            eraser_color: config.eraser_color,
            export_filename: config.export_filename.clone(),
        };

        if !canvas.restore_saved() {
            canvas.commit()?;
        }
        Ok(canvas)
    }

    /// Seed history from storage. Returns false if there was nothing usable.
    fn restore_saved(&mut self) -> bool {
        let Some(bridge) = &self.persistence else {
            return false;
        };
        let saved = match bridge.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("Ignoring saved drawing: {}", e);
                return false;
            }
        };

        if let Err(e) = self.surface.render_snapshot(&saved) {
            log::warn!("Saved drawing could not be painted: {}", e);
            self.surface.clear();
            return false;
        }
        log::info!("Restored saved drawing {}", saved.id());
        self.history.push(saved);
        true
    }

    /// Capture the surface as a new history entry and persist it when autosave is on.
    ///
    /// Persistence failures are logged, never returned.
    pub fn commit(&mut self) -> SketchResult<()> {
        let snapshot = self.surface.to_snapshot()?;
        log::debug!(
            "Committing snapshot {} (depth {})",
            snapshot.id(),
            self.history.depth() + 1
        );

        if self.autosave {
            if let Some(bridge) = &mut self.persistence {
                if let Err(e) = bridge.save(&snapshot) {
                    log::warn!("Autosave failed: {}", e);
                }
            }
        }
        self.history.push(snapshot);
        Ok(())
    }

    /// Step back one snapshot. A no-op when only the seed is left.
    ///
    /// The target is decoded before history changes, so a decode failure
    /// leaves history, redo buffer and surface as they were.
    pub fn undo(&mut self) -> SketchResult<()> {
        let Some(target) = self.history.undo_target().cloned() else {
            return Ok(());
        };
        let request = self.surface.begin_restore(target);
        let decoded = futures::executor::block_on(request.decode())?;

        self.history.undo();
        self.surface.finish_restore(decoded);
        log::debug!("Undo, depth now {}", self.history.depth());
        Ok(())
    }

    /// Reapply the most recently undone snapshot. A no-op when there is none.
    pub fn redo(&mut self) -> SketchResult<()> {
        let Some(target) = self.history.redo_target().cloned() else {
            return Ok(());
        };
        let request = self.surface.begin_restore(target);
        let decoded = futures::executor::block_on(request.decode())?;

        self.history.redo();
        self.surface.finish_restore(decoded);
        log::debug!("Redo, depth now {}", self.history.depth());
        Ok(())
    }

    /// Blank the surface and commit it. This adds a history entry.
    pub fn clear(&mut self) -> SketchResult<()> {
        self.surface.clear();
        self.commit()
    }

    /// Current history length
    pub fn depth(&self) -> usize {
        self.history.depth()
    }

    pub fn set_autosave(&mut self, enabled: bool) {
        self.autosave = enabled;
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    /// Reconfigure the surface for a new on-screen rect and density, repainting
    /// the last committed snapshot.
    pub fn resize(&mut self, surface_rect: Rect, pixels_per_point: f32) -> SketchResult<()> {
        self.translator.set_surface_rect(surface_rect);
        self.surface
            .resize(surface_rect.size(), pixels_per_point, self.history.current())
    }

    /// Move the surface on screen without changing its size
    pub fn set_surface_rect(&mut self, surface_rect: Rect) {
        self.translator.set_surface_rect(surface_rect);
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.tool.set_mode(mode);
    }

    pub fn set_color(&mut self, color: Color32) {
        self.tool.set_color(color);
    }

    pub fn set_width(&mut self, width: f32) {
        self.tool.set_width(width);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.tool.set_opacity(opacity);
    }

    pub fn on_pointer_down(&mut self, position: Pos2) -> SketchResult<Translation> {
        self.on_pointer(&PointerEvent { phase: PointerPhase::Down, position })
    }

    pub fn on_pointer_move(&mut self, position: Pos2) -> SketchResult<Translation> {
        self.on_pointer(&PointerEvent { phase: PointerPhase::Move, position })
    }

    pub fn on_pointer_up(&mut self, position: Pos2) -> SketchResult<Translation> {
        self.on_pointer(&PointerEvent { phase: PointerPhase::Up, position })
    }

    pub fn on_touch_start(&mut self, touches: Vec<Pos2>) -> SketchResult<Translation> {
        self.on_touch(&TouchEvent { phase: TouchPhase::Start, touches })
    }

    pub fn on_touch_move(&mut self, touches: Vec<Pos2>) -> SketchResult<Translation> {
        self.on_touch(&TouchEvent { phase: TouchPhase::Move, touches })
    }

    pub fn on_touch_end(&mut self, touches: Vec<Pos2>) -> SketchResult<Translation> {
        self.on_touch(&TouchEvent { phase: TouchPhase::End, touches })
    }

    pub fn on_pointer(&mut self, event: &PointerEvent) -> SketchResult<Translation> {
        let translation = self.translator.translate_pointer(event);
        self.apply(translation)
    }

    pub fn on_touch(&mut self, event: &TouchEvent) -> SketchResult<Translation> {
        let translation = self.translator.translate_touch(event);
        self.apply(translation)
    }

    fn apply(&mut self, translation: Translation) -> SketchResult<Translation> {
        if let Some(sample) = translation.sample {
            self.apply_sample(sample)?;
        }
        Ok(translation)
    }

    /// Feed one surface-local sample to the stroke renderer, committing on stroke end
    pub fn apply_sample(&mut self, sample: StrokeSample) -> SketchResult<StrokeOutcome> {
        let outcome = self
            .stroke
            .handle(sample, &self.tool, self.eraser_color, &mut self.surface);
        if outcome == StrokeOutcome::Finished {
            self.commit()?;
        }
        Ok(outcome)
    }

    /// Encode the surface at full buffer resolution and hand it to the download sink
    pub fn export_image(&mut self) -> SketchResult<ExportedImage> {
        let image = ExportedImage::from_surface(&self.surface)?;
        self.downloads.deliver(&self.export_filename, &image)?;
        Ok(image)
    }

    /// Place the surface on the clipboard. The future resolves once the host
    /// has accepted or refused the write; refusals come back as errors.
    pub fn copy_to_clipboard(&self) -> BoxFuture<'static, Result<(), ClipboardError>> {
        match ClipboardImage::from_surface(&self.surface) {
            Ok(image) => self.clipboard.write_image(image),
            Err(e) => future::ready(Err(ClipboardError::WriteFailed(e.to_string()))).boxed(),
        }
    }

    pub fn tool(&self) -> &ToolState {
        &self.tool
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_drawing()
    }

    pub fn export_filename(&self) -> &str {
        &self.export_filename
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("surface", &self.surface.size_px())
            .field("tool", &self.tool)
            .field("stroke", &self.stroke.state())
            .field("depth", &self.history.depth())
            .field("redo", &self.history.redo_len())
            .field("autosave", &self.autosave)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SketchError;
    use crate::snapshot::Snapshot;
    use crate::state::persistence::MemoryStore;
    use egui::vec2;

    fn rect() -> Rect {
        Rect::from_min_size(Pos2::new(10.0, 20.0), vec2(32.0, 24.0))
    }

    fn headless() -> Canvas {
        Canvas::open(&SketchConfig::default(), rect(), 1.0, HostServices::headless()).unwrap()
    }

    fn stroke(canvas: &mut Canvas, from: Pos2, to: Pos2) {
        canvas.on_pointer_down(from).unwrap();
        canvas.on_pointer_move(to).unwrap();
        canvas.on_pointer_up(to).unwrap();
    }

    #[test]
    fn test_open_seeds_blank_snapshot() {
        let canvas = headless();
        assert_eq!(canvas.depth(), 1);
        assert!(canvas.surface().is_blank());
        assert!(!canvas.is_drawing());
    }

    #[test]
    fn test_pointer_positions_are_offset_by_surface_origin() {
        let mut canvas = headless();
        canvas.set_color(Color32::RED);
        let p = Pos2::new(26.0, 32.0);
        canvas.on_pointer_down(p).unwrap();
        assert!(canvas.is_drawing());
        canvas.on_pointer_up(p).unwrap();

        assert_eq!(canvas.surface().pixels().get_pixel(16, 12)[0], 255);
        assert_eq!(canvas.depth(), 2);
    }

    #[test]
    fn test_pointer_up_without_stroke_does_not_commit() {
        let mut canvas = headless();
        canvas.on_pointer_move(Pos2::new(15.0, 25.0)).unwrap();
        canvas.on_pointer_up(Pos2::new(15.0, 25.0)).unwrap();
        assert_eq!(canvas.depth(), 1);
        assert!(canvas.surface().is_blank());
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut canvas = headless();
        stroke(&mut canvas, Pos2::new(12.0, 22.0), Pos2::new(30.0, 30.0));
        let drawn = canvas.history().current().cloned().unwrap();

        canvas.clear().unwrap();
        assert_eq!(canvas.depth(), 3);
        assert!(canvas.surface().is_blank());

        canvas.undo().unwrap();
        assert!(canvas.surface().to_snapshot().unwrap().same_image(&drawn));
    }

    #[test]
    fn test_autosave_writes_only_when_enabled() {
        let store = MemoryStore::new();
        let mut config = SketchConfig::default();
        config.autosave = false;
        let services = HostServices {
            store: Some(Box::new(store.clone())),
            ..HostServices::headless()
        };
        let mut canvas = Canvas::open(&config, rect(), 1.0, services).unwrap();
        assert!(store.is_empty());

        canvas.set_autosave(true);
        stroke(&mut canvas, Pos2::new(12.0, 22.0), Pos2::new(20.0, 30.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_undecodable_target_leaves_history_untouched() {
        let mut canvas = headless();
        canvas.history.push(Snapshot::unchecked(vec![0, 1, 2, 3], 32, 24));
        stroke(&mut canvas, Pos2::new(12.0, 22.0), Pos2::new(30.0, 30.0));
        let before = canvas.surface().to_snapshot().unwrap();

        assert!(matches!(canvas.undo(), Err(SketchError::Decode(_))));
        assert_eq!(canvas.depth(), 3);
        assert_eq!(canvas.history().redo_len(), 0);
        assert!(canvas.surface().to_snapshot().unwrap().same_image(&before));
    }

    #[test]
    fn test_undecodable_redo_target_leaves_history_untouched() {
        let mut canvas = headless();
        stroke(&mut canvas, Pos2::new(12.0, 22.0), Pos2::new(30.0, 30.0));
        canvas.history.push(Snapshot::unchecked(vec![9, 9, 9], 32, 24));
        canvas.undo().unwrap();
        let before = canvas.surface().to_snapshot().unwrap();

        assert!(matches!(canvas.redo(), Err(SketchError::Decode(_))));
        assert_eq!(canvas.depth(), 2);
        assert_eq!(canvas.history().redo_len(), 1);
        assert!(canvas.surface().to_snapshot().unwrap().same_image(&before));
    }

    #[test]
    fn test_copy_reports_missing_clipboard() {
        let canvas = headless();
        let result = futures::executor::block_on(canvas.copy_to_clipboard());
        assert!(matches!(result, Err(ClipboardError::ClipboardUnavailable(_))));

        let message = SketchError::from(result.unwrap_err()).to_string();
        assert!(message.contains("Clipboard unavailable"));
    }
}
