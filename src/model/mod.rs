//! Data models for the annotation engine.

mod annotation;
mod geometry;
mod label;

pub use annotation::{
    CurrentDrawing, DrawingState, DrawnRectangle, IdGenerator, RectangleId, SequentialIds,
};
pub use geometry::{
    Image, ImageBounds, ImagePoint, Normalized, NormalizedBbox, NormalizedPoint, PixelRect, Point,
    Screen, ScreenPoint, ScreenRect, Space,
};
pub use label::{BoxLabel, FalsePositiveType, SmokeType};
