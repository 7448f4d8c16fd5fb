//! Screen, image and normalized coordinate conversions.
//!
//! Every function here is pure: all layout and view state is passed in
//! explicitly. The forward transform used for rendering is
//!
//! ```text
//! screen = container_offset + pan + origin + (bounds.xy + image - origin) * zoom
//! ```
//!
//! where `origin` is the transform origin in container pixels, and
//! [`screen_to_image`] is its exact inverse.

use serde::{Deserialize, Serialize};

use crate::constants::{CENTER_ORIGIN_PERCENT, zoom};
use crate::model::{
    ImageBounds, ImagePoint, NormalizedBbox, NormalizedPoint, PixelRect, ScreenPoint, ScreenRect,
};

/// Transform origin as percentages (0-100) of the image rect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginPercent {
    pub x: f64,
    pub y: f64,
}

impl OriginPercent {
    pub const CENTER: OriginPercent = OriginPercent {
        x: CENTER_ORIGIN_PERCENT,
        y: CENTER_ORIGIN_PERCENT,
    };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for OriginPercent {
    fn default() -> Self {
        Self::CENTER
    }
}

/// View transform applied to the displayed image: `scale(zoom)` around
/// `transform_origin`, followed by a `pan_offset` translation in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub zoom_level: f64,
    pub pan_offset: ScreenPoint,
    pub transform_origin: OriginPercent,
}

impl Transform {
    pub fn new(zoom_level: f64, pan_offset: ScreenPoint, transform_origin: OriginPercent) -> Self {
        Self {
            zoom_level,
            pan_offset,
            transform_origin,
        }
    }

    /// Create an identity transform (zoom=1, no pan, centered origin).
    pub fn identity() -> Self {
        Self::new(zoom::MIN, ScreenPoint::zero(), OriginPercent::CENTER)
    }

    /// The transform origin in container-relative pixels.
    pub fn origin_in_container(&self, bounds: &ImageBounds) -> ScreenPoint {
        ScreenPoint::new(
            bounds.x + self.transform_origin.x / 100.0 * bounds.width,
            bounds.y + self.transform_origin.y / 100.0 * bounds.height,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Object-contain layout of an image inside its container.
///
/// The image is scaled to fit while preserving its aspect ratio and centered
/// on the axis that does not fill the container. Non-positive or non-finite
/// dimensions yield empty bounds at the origin.
pub fn fit_image_to_container(
    natural_w: f64,
    natural_h: f64,
    container_w: f64,
    container_h: f64,
) -> ImageBounds {
    let dims = [natural_w, natural_h, container_w, container_h];
    if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
        return ImageBounds::empty();
    }

    let image_aspect = natural_w / natural_h;
    let container_aspect = container_w / container_h;

    if image_aspect > container_aspect {
        let height = container_w * natural_h / natural_w;
        ImageBounds::new(container_w, height, 0.0, (container_h - height) / 2.0)
    } else {
        let width = container_h * natural_w / natural_h;
        ImageBounds::new(width, container_h, (container_w - width) / 2.0, 0.0)
    }
}

// ============================================================================
// Screen <-> Image
// ============================================================================

/// Convert a screen point into image-pixel space.
///
/// Steps: make the point container-relative, remove the pan, undo the zoom
/// around the transform origin, then make it relative to the image's top-left.
pub fn screen_to_image(
    screen_point: ScreenPoint,
    container_offset: ScreenPoint,
    image_bounds: &ImageBounds,
    transform: &Transform,
) -> ImagePoint {
    let relative = screen_point.minus(container_offset);
    let after_translate = relative.minus(transform.pan_offset);
    let origin = transform.origin_in_container(image_bounds);

    let zoom = if transform.zoom_level > 0.0 {
        transform.zoom_level
    } else {
        1.0
    };
    let unscaled_x = (after_translate.x - origin.x) / zoom + origin.x;
    let unscaled_y = (after_translate.y - origin.y) / zoom + origin.y;

    ImagePoint::new(unscaled_x - image_bounds.x, unscaled_y - image_bounds.y)
}

/// Convert an image-pixel point to its on-screen position.
///
/// Forward counterpart of [`screen_to_image`], used for rendering overlays.
pub fn image_to_screen(
    image_point: ImagePoint,
    container_offset: ScreenPoint,
    image_bounds: &ImageBounds,
    transform: &Transform,
) -> ScreenPoint {
    let origin = transform.origin_in_container(image_bounds);
    let zoom = if transform.zoom_level > 0.0 {
        transform.zoom_level
    } else {
        1.0
    };

    let in_container_x = image_point.x + image_bounds.x;
    let in_container_y = image_point.y + image_bounds.y;
    let scaled = ScreenPoint::new(
        (in_container_x - origin.x) * zoom + origin.x,
        (in_container_y - origin.y) * zoom + origin.y,
    );

    scaled
        .offset_by(transform.pan_offset)
        .offset_by(container_offset)
}

/// The on-screen rectangle covered by the image under `transform`.
pub fn displayed_image_rect(
    container_offset: ScreenPoint,
    image_bounds: &ImageBounds,
    transform: &Transform,
) -> ScreenRect {
    let top_left = image_to_screen(ImagePoint::zero(), container_offset, image_bounds, transform);
    let bottom_right = image_to_screen(
        ImagePoint::new(image_bounds.width, image_bounds.height),
        container_offset,
        image_bounds,
        transform,
    );
    ScreenRect::new(
        top_left.x,
        top_left.y,
        bottom_right.x - top_left.x,
        bottom_right.y - top_left.y,
    )
}

// ============================================================================
// Image <-> Normalized
// ============================================================================

/// Normalize an image-pixel point, clamping each axis to `[0, 1]`.
pub fn image_to_normalized(point: ImagePoint, image_bounds: &ImageBounds) -> NormalizedPoint {
    if image_bounds.is_empty() {
        return NormalizedPoint::zero();
    }
    NormalizedPoint::new(
        (point.x / image_bounds.width).clamp(0.0, 1.0),
        (point.y / image_bounds.height).clamp(0.0, 1.0),
    )
}

/// Scale a normalized point back to image pixels (unclamped).
pub fn normalized_to_image(point: NormalizedPoint, image_bounds: &ImageBounds) -> ImagePoint {
    ImagePoint::new(point.x * image_bounds.width, point.y * image_bounds.height)
}

/// Pixel rectangle of a normalized box within `image_bounds`, for overlay rendering.
pub fn normalized_bbox_to_pixels(bbox: &NormalizedBbox, image_bounds: &ImageBounds) -> PixelRect {
    PixelRect::new(
        bbox.x1 * image_bounds.width,
        bbox.y1 * image_bounds.height,
        (bbox.x2 - bbox.x1) * image_bounds.width,
        (bbox.y2 - bbox.y1) * image_bounds.height,
    )
}

// ============================================================================
// Box Checks
// ============================================================================

/// A box is valid when every value is in `[0, 1]` and it has positive area.
pub fn validate_bbox(bbox: &NormalizedBbox) -> bool {
    let in_range = bbox
        .to_array()
        .iter()
        .all(|v| v.is_finite() && (0.0..=1.0).contains(v));
    in_range && bbox.x2 > bbox.x1 && bbox.y2 > bbox.y1
}

/// Area of a normalized box; degenerate boxes have zero area.
pub fn bbox_area(bbox: &NormalizedBbox) -> f64 {
    if bbox.x2 > bbox.x1 && bbox.y2 > bbox.y1 {
        (bbox.x2 - bbox.x1) * (bbox.y2 - bbox.y1)
    } else {
        0.0
    }
}
