use egui::{Pos2, Rect};

/// Pointer phases the host reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The host lost the pointer (capture lost, cancelled gesture)
    Cancel,
}

/// A raw pointer event in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Pos2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

/// A raw touch event. `touches` lists the active contact points in screen
/// coordinates; it is empty on the final touch-end.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<Pos2>,
}

/// A surface-local stroke sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeSample {
    Start(Pos2),
    Move(Pos2),
    End,
}

/// The outcome of translating one raw event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translation {
    pub sample: Option<StrokeSample>,
    /// The host must suppress its default gesture handling (scroll, zoom) for this event
    pub prevent_default: bool,
}

/// Maps raw pointer and touch events into surface-local samples.
///
/// Stateless apart from the surface's on-screen origin: every event yields at
/// most one sample, right away.
#[derive(Debug, Clone)]
pub struct InputTranslator {
    surface_rect: Rect,
}

impl InputTranslator {
    pub fn new(surface_rect: Rect) -> Self {
        Self { surface_rect }
    }

    /// Update the surface rectangle (e.g. if window is resized)
    pub fn set_surface_rect(&mut self, rect: Rect) {
        self.surface_rect = rect;
    }

    pub fn surface_rect(&self) -> Rect {
        self.surface_rect
    }

    /// Screen position to surface-local position
    pub fn to_local(&self, screen: Pos2) -> Pos2 {
        (screen - self.surface_rect.min).to_pos2()
    }

    pub fn translate_pointer(&self, event: &PointerEvent) -> Translation {
        let sample = match event.phase {
            PointerPhase::Down => StrokeSample::Start(self.to_local(event.position)),
            PointerPhase::Move => StrokeSample::Move(self.to_local(event.position)),
            PointerPhase::Up | PointerPhase::Cancel => StrokeSample::End,
        };
        Translation {
            sample: Some(sample),
            prevent_default: event.phase == PointerPhase::Down,
        }
    }

    /// Only the first contact point draws; a start or move without any contact yields nothing.
    pub fn translate_touch(&self, event: &TouchEvent) -> Translation {
        let first = event.touches.first().map(|p| self.to_local(*p));
        let sample = match (event.phase, first) {
            (TouchPhase::Start, Some(p)) => Some(StrokeSample::Start(p)),
            (TouchPhase::Move, Some(p)) => Some(StrokeSample::Move(p)),
            (TouchPhase::End, _) => Some(StrokeSample::End),
            (_, None) => None,
        };
        Translation {
            sample,
            prevent_default: matches!(event.phase, TouchPhase::Start | TouchPhase::Move),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> InputTranslator {
        InputTranslator::new(Rect::from_min_size(Pos2::new(100.0, 40.0), egui::vec2(300.0, 200.0)))
    }

    #[test]
    fn test_pointer_positions_are_surface_local() {
        let t = translator();
        let down = t.translate_pointer(&PointerEvent {
            phase: PointerPhase::Down,
            position: Pos2::new(110.0, 45.0),
        });
        assert_eq!(down.sample, Some(StrokeSample::Start(Pos2::new(10.0, 5.0))));
        assert!(down.prevent_default);

        // Released outside the surface still ends the stroke.
        let up = t.translate_pointer(&PointerEvent {
            phase: PointerPhase::Up,
            position: Pos2::new(-50.0, 900.0),
        });
        assert_eq!(up.sample, Some(StrokeSample::End));
    }

    #[test]
    fn test_touch_uses_first_contact_and_suppresses_gestures() {
        let t = translator();
        let start = t.translate_touch(&TouchEvent {
            phase: TouchPhase::Start,
            touches: vec![Pos2::new(150.0, 90.0), Pos2::new(0.0, 0.0)],
        });
        assert_eq!(start.sample, Some(StrokeSample::Start(Pos2::new(50.0, 50.0))));
        assert!(start.prevent_default);

        let moved = t.translate_touch(&TouchEvent { phase: TouchPhase::Move, touches: vec![] });
        assert_eq!(moved.sample, None);
        assert!(moved.prevent_default);

        let end = t.translate_touch(&TouchEvent { phase: TouchPhase::End, touches: vec![] });
        assert_eq!(end.sample, Some(StrokeSample::End));
    }

    #[test]
    fn test_surface_rect_updates_apply() {
        let mut t = translator();
        t.set_surface_rect(Rect::from_min_size(Pos2::ZERO, egui::vec2(10.0, 10.0)));
        assert_eq!(t.to_local(Pos2::new(3.0, 4.0)), Pos2::new(3.0, 4.0));
    }
}
