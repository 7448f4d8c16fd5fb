//! Zoom and pan state machine.
//!
//! Owns the [`Transform`] applied to the displayed image. Other components
//! read it through [`ZoomPanController::transform`] but never mutate it.

use crate::config::ZoomConfig;
use crate::constants::ZOOM_EPSILON;
use crate::model::{ImageBounds, ScreenPoint, ScreenRect};
use crate::transform::{OriginPercent, Transform};

/// Pan drag interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanDragState {
    /// Not dragging
    #[default]
    Idle,
    /// Dragging with last pointer position (screen space)
    Dragging { last_pos: ScreenPoint },
}

impl PanDragState {
    /// Check if currently dragging
    pub fn is_dragging(&self) -> bool {
        matches!(self, PanDragState::Dragging { .. })
    }

    /// Get the last drag position if dragging
    pub fn last_pos(&self) -> Option<ScreenPoint> {
        match self {
            PanDragState::Dragging { last_pos } => Some(*last_pos),
            PanDragState::Idle => None,
        }
    }
}

/// Clamp a proposed pan offset so the zoomed image cannot leave the view.
///
/// Each axis may move at most half of the extra size gained by zooming,
/// `(dimension * zoom - dimension) / 2`, in either direction. At zoom 1 or
/// below the offset is returned unchanged.
pub fn constrain_pan(proposed: ScreenPoint, image_rect: &ImageBounds, zoom_level: f64) -> ScreenPoint {
    if zoom_level <= 1.0 {
        return proposed;
    }
    let max_x = (image_rect.width * zoom_level - image_rect.width) / 2.0;
    let max_y = (image_rect.height * zoom_level - image_rect.height) / 2.0;
    ScreenPoint::new(
        proposed.x.clamp(-max_x, max_x),
        proposed.y.clamp(-max_y, max_y),
    )
}

/// Pointer position as a percentage of `rect`, clamped to 0-100.
fn origin_from_pointer(pointer: ScreenPoint, rect: &ScreenRect) -> Option<OriginPercent> {
    if rect.is_empty() || !pointer.is_finite() {
        return None;
    }
    Some(OriginPercent::new(
        ((pointer.x - rect.left) / rect.width * 100.0).clamp(0.0, 100.0),
        ((pointer.y - rect.top) / rect.height * 100.0).clamp(0.0, 100.0),
    ))
}

/// Zoom level, pan offset and transform origin, with their invariants.
///
/// At the minimum zoom the pan is always `{0, 0}` and the origin centered.
#[derive(Debug, Clone)]
pub struct ZoomPanController {
    transform: Transform,
    limits: ZoomConfig,
    drag: PanDragState,
}

impl ZoomPanController {
    pub fn new(limits: ZoomConfig) -> Self {
        let mut transform = Transform::identity();
        transform.zoom_level = limits.min;
        Self {
            transform,
            limits,
            drag: PanDragState::Idle,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn zoom_level(&self) -> f64 {
        self.transform.zoom_level
    }

    pub fn limits(&self) -> &ZoomConfig {
        &self.limits
    }

    pub fn is_at_min_zoom(&self) -> bool {
        self.transform.zoom_level <= self.limits.min + ZOOM_EPSILON
    }

    pub fn drag_state(&self) -> PanDragState {
        self.drag
    }

    pub fn is_panning(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Zoom towards the cursor.
    ///
    /// The transform origin moves to the pointer's position within the
    /// on-screen `image_rect` so the zoom appears to grow from the cursor.
    /// Negative `delta` (wheel up) zooms in. Returns true if the transform changed.
    pub fn on_wheel(&mut self, pointer: ScreenPoint, image_rect: &ScreenRect, delta: f64) -> bool {
        if delta == 0.0 || !delta.is_finite() {
            return false;
        }
        let before = self.transform;

        if let Some(origin) = origin_from_pointer(pointer, image_rect) {
            self.transform.transform_origin = origin;
        }

        // The displayed rect is the unzoomed image scaled by the current zoom
        let unscaled = ImageBounds::new(
            image_rect.width / self.transform.zoom_level,
            image_rect.height / self.transform.zoom_level,
            0.0,
            0.0,
        );
        let direction = if delta < 0.0 { 1.0 } else { -1.0 };
        self.step_zoom(direction, &unscaled);

        log::debug!(
            "🔍 Wheel zoom: {:.2}x at origin ({:.1}%, {:.1}%)",
            self.transform.zoom_level,
            self.transform.transform_origin.x,
            self.transform.transform_origin.y
        );
        self.transform != before
    }

    /// Zoom in by one step keeping the current origin.
    pub fn zoom_in(&mut self, image_bounds: &ImageBounds) -> bool {
        let before = self.transform;
        self.step_zoom(1.0, image_bounds);
        self.transform != before
    }

    /// Zoom out by one step keeping the current origin.
    pub fn zoom_out(&mut self, image_bounds: &ImageBounds) -> bool {
        let before = self.transform;
        self.step_zoom(-1.0, image_bounds);
        self.transform != before
    }

    /// Return to the neutral transform and drop any pan drag.
    pub fn reset(&mut self) {
        self.transform = Transform::identity();
        self.transform.zoom_level = self.limits.min;
        self.drag = PanDragState::Idle;
        log::debug!("🔄 View reset");
    }

    /// Clamp the current pan to new image bounds, e.g. after a resize.
    /// Returns true if the pan offset changed.
    pub fn reconstrain(&mut self, image_bounds: &ImageBounds) -> bool {
        let constrained =
            constrain_pan(self.transform.pan_offset, image_bounds, self.transform.zoom_level);
        if constrained == self.transform.pan_offset {
            return false;
        }
        log::debug!(
            "Pan re-clamped to ({:.1}, {:.1})",
            constrained.x,
            constrained.y
        );
        self.transform.pan_offset = constrained;
        true
    }

    fn step_zoom(&mut self, direction: f64, image_bounds: &ImageBounds) {
        let raw = self.transform.zoom_level + direction * self.limits.step;
        // Snap to a fixed grid so repeated steps don't drift
        let snapped = (raw * 1e6).round() / 1e6;
        let new_zoom = snapped.clamp(self.limits.min, self.limits.max);

        if new_zoom <= self.limits.min + ZOOM_EPSILON {
            self.transform = Transform::identity();
            self.transform.zoom_level = self.limits.min;
            self.drag = PanDragState::Idle;
            return;
        }

        self.transform.zoom_level = new_zoom;
        self.transform.pan_offset = constrain_pan(self.transform.pan_offset, image_bounds, new_zoom);
    }

    // ========================================================================
    // Pan Drag
    // ========================================================================

    /// Start a pan drag. Refused while drawing or at the minimum zoom.
    pub fn begin_pan(&mut self, pointer: ScreenPoint, drawing_mode: bool) -> bool {
        if drawing_mode || self.is_at_min_zoom() {
            return false;
        }
        self.drag = PanDragState::Dragging { last_pos: pointer };
        true
    }

    /// Continue a pan drag. Returns true if the pan offset changed.
    pub fn pan_to(&mut self, pointer: ScreenPoint, image_bounds: &ImageBounds) -> bool {
        let Some(last) = self.drag.last_pos() else {
            return false;
        };
        self.drag = PanDragState::Dragging { last_pos: pointer };

        let delta = pointer.minus(last);
        let proposed = self.transform.pan_offset.offset_by(delta);
        let constrained = constrain_pan(proposed, image_bounds, self.transform.zoom_level);
        if constrained == self.transform.pan_offset {
            return false;
        }
        self.transform.pan_offset = constrained;
        log::trace!("Pan: ({:.1}, {:.1})", constrained.x, constrained.y);
        true
    }

    /// Finish a pan drag.
    pub fn end_pan(&mut self) {
        self.drag = PanDragState::Idle;
    }

    /// Abort an in-flight pan drag, keeping the offset reached so far.
    pub fn cancel_pan(&mut self) {
        if self.drag.is_dragging() {
            log::debug!("Pan drag cancelled");
        }
        self.drag = PanDragState::Idle;
    }
}

impl Default for ZoomPanController {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn bounds() -> ImageBounds {
        ImageBounds::new(400.0, 300.0, 0.0, 0.0)
    }

    fn rect_at(zoom: f64) -> ScreenRect {
        ScreenRect::new(0.0, 0.0, 400.0 * zoom, 300.0 * zoom)
    }

    #[test]
    fn test_starts_at_identity() {
        let c = ZoomPanController::default();
        assert_eq!(*c.transform(), Transform::identity());
        assert!(c.is_at_min_zoom());
    }

    #[test]
    fn test_wheel_up_zooms_in_from_cursor() {
        let mut c = ZoomPanController::default();
        assert!(c.on_wheel(ScreenPoint::new(100.0, 225.0), &rect_at(1.0), -120.0));
        assert!(approx_eq(c.zoom_level(), 1.2));
        assert!(approx_eq(c.transform().transform_origin.x, 25.0));
        assert!(approx_eq(c.transform().transform_origin.y, 75.0));
    }

    #[test]
    fn test_wheel_clamps_to_max() {
        let mut c = ZoomPanController::default();
        for _ in 0..40 {
            let rect = rect_at(c.zoom_level());
            c.on_wheel(ScreenPoint::new(10.0, 10.0), &rect, -1.0);
        }
        assert!(approx_eq(c.zoom_level(), 4.0));
    }

    #[test]
    fn test_wheel_back_to_min_resets_pan_and_origin() {
        let mut c = ZoomPanController::default();
        c.on_wheel(ScreenPoint::new(50.0, 50.0), &rect_at(1.0), -1.0);
        assert!(c.begin_pan(ScreenPoint::new(0.0, 0.0), false));
        c.pan_to(ScreenPoint::new(15.0, 10.0), &bounds());
        assert_ne!(c.transform().pan_offset, ScreenPoint::zero());

        c.on_wheel(ScreenPoint::new(300.0, 20.0), &rect_at(c.zoom_level()), 1.0);
        assert!(c.is_at_min_zoom());
        assert_eq!(*c.transform(), Transform::identity());
        assert!(!c.is_panning());
    }

    #[test]
    fn test_repeated_steps_do_not_drift() {
        let mut c = ZoomPanController::default();
        for _ in 0..7 {
            c.zoom_in(&bounds());
        }
        for _ in 0..7 {
            c.zoom_out(&bounds());
        }
        assert_eq!(c.zoom_level(), 1.0);
        assert_eq!(*c.transform(), Transform::identity());
    }

    #[test]
    fn test_constrain_pan_limits() {
        let b = bounds();
        let p = constrain_pan(ScreenPoint::new(500.0, -500.0), &b, 2.0);
        assert!(approx_eq(p.x, 200.0));
        assert!(approx_eq(p.y, -150.0));

        let inside = constrain_pan(ScreenPoint::new(10.0, -20.0), &b, 2.0);
        assert_eq!(inside, ScreenPoint::new(10.0, -20.0));
    }

    #[test]
    fn test_constrain_pan_noop_at_unit_zoom() {
        let p = ScreenPoint::new(500.0, -500.0);
        assert_eq!(constrain_pan(p, &bounds(), 1.0), p);
        assert_eq!(constrain_pan(p, &bounds(), 0.5), p);
    }

    #[test]
    fn test_pan_refused_while_drawing_or_unzoomed() {
        let mut c = ZoomPanController::default();
        assert!(!c.begin_pan(ScreenPoint::zero(), false), "unzoomed");
        c.zoom_in(&bounds());
        assert!(!c.begin_pan(ScreenPoint::zero(), true), "drawing mode");
        assert!(c.begin_pan(ScreenPoint::zero(), false));
    }

    #[test]
    fn test_pan_drag_is_constrained() {
        let mut c = ZoomPanController::default();
        c.zoom_in(&bounds()); // 1.2x -> max pan (40, 30)
        c.begin_pan(ScreenPoint::zero(), false);
        assert!(c.pan_to(ScreenPoint::new(1000.0, 5.0), &bounds()));
        assert!(approx_eq(c.transform().pan_offset.x, 40.0));
        assert!(approx_eq(c.transform().pan_offset.y, 5.0));

        c.cancel_pan();
        assert!(!c.pan_to(ScreenPoint::new(0.0, 0.0), &bounds()));
        assert!(approx_eq(c.transform().pan_offset.x, 40.0));
    }

    #[test]
    fn test_zoom_out_reconstrains_pan() {
        let mut c = ZoomPanController::default();
        for _ in 0..5 {
            c.zoom_in(&bounds()); // 2.0x -> max pan (200, 150)
        }
        c.begin_pan(ScreenPoint::zero(), false);
        c.pan_to(ScreenPoint::new(200.0, 150.0), &bounds());
        c.end_pan();

        c.zoom_out(&bounds()); // 1.8x -> max pan (160, 120)
        assert!(approx_eq(c.transform().pan_offset.x, 160.0));
        assert!(approx_eq(c.transform().pan_offset.y, 120.0));
    }

    #[test]
    fn test_reconstrain_after_bounds_shrink() {
        let mut c = ZoomPanController::default();
        for _ in 0..5 {
            c.zoom_in(&bounds());
        }
        c.begin_pan(ScreenPoint::zero(), false);
        c.pan_to(ScreenPoint::new(200.0, -150.0), &bounds());
        c.end_pan();

        // Half-size image at 2.0x -> max pan (100, 75)
        let smaller = ImageBounds::new(200.0, 150.0, 0.0, 0.0);
        assert!(c.reconstrain(&smaller));
        assert!(approx_eq(c.transform().pan_offset.x, 100.0));
        assert!(approx_eq(c.transform().pan_offset.y, -75.0));
        assert!(approx_eq(c.zoom_level(), 2.0));
        assert!(!c.reconstrain(&smaller));
    }

    #[test]
    fn test_degenerate_rect_keeps_origin() {
        let mut c = ZoomPanController::default();
        c.on_wheel(ScreenPoint::new(5.0, 5.0), &ScreenRect::default(), -1.0);
        assert_eq!(c.transform().transform_origin, OriginPercent::CENTER);
    }
}
