use egui::Color32;
use serde::{Deserialize, Serialize};

/// What a stroke does to the surface
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ToolMode {
    #[default]
    Brush,
    Eraser,
}

impl ToolMode {
    pub fn name(&self) -> &'static str {
        match self {
            ToolMode::Brush => "Brush",
            ToolMode::Eraser => "Eraser",
        }
    }
}

/// Current brush/eraser configuration.
///
/// Values are stored exactly as given. The stroke renderer reads them again on
/// every segment, so a change in the middle of a stroke shows up on the next sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolState {
    pub mode: ToolMode,
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            mode: ToolMode::Brush,
            color: Color32::BLACK,
            width: 4.0,
            opacity: 1.0,
        }
    }
}

impl ToolState {
    pub fn set_mode(&mut self, mode: ToolMode) {
        self.mode = mode;
    }

    pub fn set_color(&mut self, color: Color32) {
        self.color = color;
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    /// Color a segment is painted with right now
    pub fn paint_color(&self, eraser_color: Color32) -> Color32 {
        match self.mode {
            ToolMode::Brush => self.color,
            ToolMode::Eraser => eraser_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eraser_paints_eraser_color() {
        let mut tool = ToolState::default();
        tool.set_color(Color32::RED);
        assert_eq!(tool.paint_color(Color32::WHITE), Color32::RED);

        tool.set_mode(ToolMode::Eraser);
        assert_eq!(tool.paint_color(Color32::WHITE), Color32::WHITE);
    }

    #[test]
    fn test_setters_do_not_clamp() {
        let mut tool = ToolState::default();
        tool.set_width(-3.0);
        tool.set_opacity(7.5);
        assert_eq!(tool.width, -3.0);
        assert_eq!(tool.opacity, 7.5);
    }
}
