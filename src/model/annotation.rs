//! Drawn rectangle types and drawing-session state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{ImagePoint, NormalizedBbox};
use super::label::BoxLabel;

/// Unique identifier for a drawn rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RectangleId(pub u64);

impl fmt::Display for RectangleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of rectangle identifiers.
///
/// Injected into the engine so tests can produce deterministic ids.
pub trait IdGenerator {
    fn next_id(&mut self) -> RectangleId;
}

/// Monotonic counter id generator.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> RectangleId {
        let id = RectangleId(self.next);
        self.next += 1;
        id
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &mut G {
    fn next_id(&mut self) -> RectangleId {
        (**self).next_id()
    }
}

/// A rectangle on the current image, human-drawn or imported.
///
/// Identity is the `id`: two rectangles with equal geometry are still
/// distinct entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnRectangle {
    pub id: RectangleId,
    pub xyxyn: NormalizedBbox,
    pub label: BoxLabel,
}

impl DrawnRectangle {
    pub fn new(id: RectangleId, xyxyn: NormalizedBbox, label: BoxLabel) -> Self {
        Self { id, xyxyn, label }
    }
}

/// An in-progress two-click drawing, in image-pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentDrawing {
    pub start_x: f64,
    pub start_y: f64,
    pub current_x: f64,
    pub current_y: f64,
}

impl CurrentDrawing {
    /// Start a drawing with both corners at `point`.
    pub fn starting_at(point: ImagePoint) -> Self {
        Self {
            start_x: point.x,
            start_y: point.y,
            current_x: point.x,
            current_y: point.y,
        }
    }

    pub fn start(&self) -> ImagePoint {
        ImagePoint::new(self.start_x, self.start_y)
    }

    pub fn current(&self) -> ImagePoint {
        ImagePoint::new(self.current_x, self.current_y)
    }

    /// Move the free corner.
    pub fn update(&mut self, point: ImagePoint) {
        self.current_x = point.x;
        self.current_y = point.y;
    }
}

/// Drawing-session state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawingState {
    /// Not currently drawing anything.
    #[default]
    Idle,
    /// First corner placed, waiting for the second click.
    ActivelyDrawing(CurrentDrawing),
}

impl DrawingState {
    /// Check if we're currently drawing something.
    pub fn is_drawing(&self) -> bool {
        matches!(self, DrawingState::ActivelyDrawing(_))
    }

    pub fn current(&self) -> Option<&CurrentDrawing> {
        match self {
            DrawingState::Idle => None,
            DrawingState::ActivelyDrawing(drawing) => Some(drawing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_monotonic() {
        let mut ids = SequentialIds::starting_at(10);
        assert_eq!(ids.next_id(), RectangleId(10));
        assert_eq!(ids.next_id(), RectangleId(11));

        fn draw_one(mut ids: impl IdGenerator) -> RectangleId {
            ids.next_id()
        }
        assert_eq!(draw_one(&mut ids), RectangleId(12));
        assert_eq!(ids.next_id(), RectangleId(13));
    }

    #[test]
    fn test_current_drawing_update() {
        let mut drawing = CurrentDrawing::starting_at(ImagePoint::new(5.0, 6.0));
        drawing.update(ImagePoint::new(50.0, 60.0));
        assert_eq!(drawing.start(), ImagePoint::new(5.0, 6.0));
        assert_eq!(drawing.current(), ImagePoint::new(50.0, 60.0));
    }

    #[test]
    fn test_drawing_state_default_is_idle() {
        let state = DrawingState::default();
        assert!(!state.is_drawing());
        assert!(state.current().is_none());
    }
}
