//! Coordinate-space tagged geometry types.
//!
//! Points carry their coordinate space in the type so a screen position can
//! never be handed to a function expecting image pixels or normalized
//! coordinates. Conversions between spaces live in [`crate::transform`].

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

// ============================================================================
// Coordinate Spaces
// ============================================================================

/// Marker for a coordinate space.
pub trait Space: Copy + Clone + fmt::Debug + PartialEq + Default {
    /// Short name used in debug output.
    const NAME: &'static str;
}

/// Screen (viewport/page) pixels, as reported by pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Screen;

/// Pixels of the displayed (aspect-fit, unzoomed) image, origin at its top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Image;

/// Normalized image coordinates in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Normalized;

impl Space for Screen {
    const NAME: &'static str = "screen";
}

impl Space for Image {
    const NAME: &'static str = "image";
}

impl Space for Normalized {
    const NAME: &'static str = "normalized";
}

// ============================================================================
// Point
// ============================================================================

/// A 2D point in the coordinate space `S`.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<S: Space> {
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

/// A point in screen pixels.
pub type ScreenPoint = Point<Screen>;
/// A point in displayed-image pixels.
pub type ImagePoint = Point<Image>;
/// A point in normalized image coordinates.
pub type NormalizedPoint = Point<Normalized>;

impl<S: Space> Point<S> {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    /// The origin of the space.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Component-wise sum, staying in the same space.
    pub fn offset_by(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference, staying in the same space.
    pub fn minus(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Calculate distance to another point in the same space.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<S: Space> Default for Point<S> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<S: Space> fmt::Debug for Point<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:.3}, {:.3})", S::NAME, self.x, self.y)
    }
}

// ============================================================================
// Layout Rectangles
// ============================================================================

/// The rectangle, in container-relative pixels, occupied by the displayed
/// image after aspect-fit scaling.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBounds {
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

impl ImageBounds {
    pub fn new(width: f64, height: f64, x: f64, y: f64) -> Self {
        Self {
            width,
            height,
            x,
            y,
        }
    }

    /// Zero-sized bounds at the origin, used for degenerate layouts.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the bounds cover no area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.width / self.height)
    }

    /// Check if an image-pixel point lies inside the image area (edges inclusive).
    pub fn contains(&self, point: ImagePoint) -> bool {
        !self.is_empty()
            && point.x >= 0.0
            && point.x <= self.width
            && point.y >= 0.0
            && point.y <= self.height
    }
}

/// An axis-aligned pixel rectangle, used for overlay rendering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if a point is inside the rectangle (edges inclusive).
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// On-screen rectangle occupied by the image after zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

// ============================================================================
// Normalized Bounding Box
// ============================================================================

/// A bounding box `[x1, y1, x2, y2]` in normalized image coordinates.
///
/// This is the only coordinate representation that is ever persisted. A
/// valid box (see [`crate::transform::validate_bbox`]) has all values in
/// `[0, 1]` with `x2 > x1` and `y2 > y1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct NormalizedBbox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl NormalizedBbox {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a box from two corners given in any order.
    pub fn from_corners(a: NormalizedPoint, b: NormalizedPoint) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn top_left(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.x1, self.y1)
    }

    pub fn bottom_right(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.x2, self.y2)
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl From<[f64; 4]> for NormalizedBbox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<NormalizedBbox> for [f64; 4] {
    fn from(bbox: NormalizedBbox) -> Self {
        bbox.to_array()
    }
}
