use egui::{Color32, Pos2};

use crate::input::StrokeSample;
use crate::surface::{StrokeStyle, Surface};
use crate::tool::ToolState;

/// State of the stroke in progress, if any
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing {
        last: Pos2,
    },
}

/// What a sample did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// Nothing happened (move or end without an active stroke)
    Ignored,
    /// A segment was drawn onto the surface
    Drew,
    /// The stroke ended and should be committed to history
    Finished,
}

/// Turns stroke samples into line segments on the surface
#[derive(Debug, Default)]
pub struct StrokeRenderer {
    state: StrokeState,
}

impl StrokeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    /// Feed one sample. Tool settings are read here, per segment.
    pub fn handle(
        &mut self,
        sample: StrokeSample,
        tool: &ToolState,
        eraser_color: Color32,
        surface: &mut Surface,
    ) -> StrokeOutcome {
        match (self.state, sample) {
            (_, StrokeSample::Start(pos)) => {
                if self.is_drawing() {
                    log::debug!("Stroke restarted without an end");
                }
                // A tap without movement still leaves a dot.
                surface.draw_segment(pos, pos, &segment_style(tool, eraser_color));
                self.state = StrokeState::Drawing { last: pos };
                StrokeOutcome::Drew
            }
            (StrokeState::Drawing { last }, StrokeSample::Move(pos)) => {
                surface.draw_segment(last, pos, &segment_style(tool, eraser_color));
                self.state = StrokeState::Drawing { last: pos };
                StrokeOutcome::Drew
            }
            (StrokeState::Drawing { .. }, StrokeSample::End) => {
                self.state = StrokeState::Idle;
                StrokeOutcome::Finished
            }
            (StrokeState::Idle, StrokeSample::Move(_) | StrokeSample::End) => StrokeOutcome::Ignored,
        }
    }
}

fn segment_style(tool: &ToolState, eraser_color: Color32) -> StrokeStyle {
    StrokeStyle {
        color: tool.paint_color(eraser_color),
        width: tool.width,
        opacity: tool.opacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolMode;
    use egui::Vec2;
    use image::Rgba;

    fn setup() -> (StrokeRenderer, ToolState, Surface) {
        let mut tool = ToolState::default();
        tool.set_color(Color32::RED);
        tool.set_width(2.0);
        (
            StrokeRenderer::new(),
            tool,
            Surface::new(Vec2::new(40.0, 40.0), 1.0, 2.0),
        )
    }

    #[test]
    fn test_moves_and_ends_while_idle_are_ignored() {
        let (mut renderer, tool, mut surface) = setup();
        assert_eq!(
            renderer.handle(StrokeSample::Move(Pos2::new(5.0, 5.0)), &tool, Color32::WHITE, &mut surface),
            StrokeOutcome::Ignored
        );
        assert_eq!(
            renderer.handle(StrokeSample::End, &tool, Color32::WHITE, &mut surface),
            StrokeOutcome::Ignored
        );
        assert!(surface.is_blank());
    }

    #[test]
    fn test_full_stroke_lifecycle() {
        let (mut renderer, tool, mut surface) = setup();
        let start = Pos2::new(5.0, 5.0);

        assert_eq!(
            renderer.handle(StrokeSample::Start(start), &tool, Color32::WHITE, &mut surface),
            StrokeOutcome::Drew
        );
        assert_eq!(renderer.state(), StrokeState::Drawing { last: start });

        renderer.handle(StrokeSample::Move(Pos2::new(30.0, 5.0)), &tool, Color32::WHITE, &mut surface);
        assert_eq!(surface.pixels().get_pixel(20, 5), &Rgba([255, 0, 0, 255]));

        assert_eq!(
            renderer.handle(StrokeSample::End, &tool, Color32::WHITE, &mut surface),
            StrokeOutcome::Finished
        );
        assert_eq!(
            renderer.handle(StrokeSample::End, &tool, Color32::WHITE, &mut surface),
            StrokeOutcome::Ignored
        );
    }

    #[test]
    fn test_tool_changes_apply_mid_stroke() {
        let (mut renderer, mut tool, mut surface) = setup();
        renderer.handle(StrokeSample::Start(Pos2::new(5.0, 20.0)), &tool, Color32::WHITE, &mut surface);
        renderer.handle(StrokeSample::Move(Pos2::new(15.0, 20.0)), &tool, Color32::WHITE, &mut surface);

        tool.set_mode(ToolMode::Eraser);
        renderer.handle(StrokeSample::Move(Pos2::new(35.0, 20.0)), &tool, Color32::WHITE, &mut surface);

        assert_eq!(surface.pixels().get_pixel(10, 20), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.pixels().get_pixel(25, 20), &Rgba([255, 255, 255, 255]));
    }
}
