//! Rectangle lifecycle: create, select, edit, delete and undo.
//!
//! The engine owns the rectangle set, the ephemeral two-click drawing state,
//! the selection, and the undo history. Every mutation pushes a snapshot of
//! the set before it is applied; no-op operations push nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MIN_DRAWING_SIZE_PX;
use crate::model::{
    BoxLabel, CurrentDrawing, DrawingState, DrawnRectangle, IdGenerator, ImageBounds, ImagePoint,
    NormalizedBbox, RectangleId,
};
use crate::transform::{image_to_normalized, normalized_bbox_to_pixels, validate_bbox};
use crate::undo::{RectangleSet, UndoConfig, UndoStack};

/// Drawing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawingConfig {
    /// Minimum on-screen size in pixels a new rectangle must reach on each axis.
    #[serde(default = "default_min_drawing_size_px")]
    pub min_drawing_size_px: f64,
}

fn default_min_drawing_size_px() -> f64 {
    DEFAULT_MIN_DRAWING_SIZE_PX
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            min_drawing_size_px: default_min_drawing_size_px(),
        }
    }
}

/// Result of a click on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An existing rectangle was hit and is now selected.
    Selected(RectangleId),
    /// First corner of a new rectangle was placed.
    DrawingStarted,
    /// Second corner placed; a new rectangle was created.
    Committed(RectangleId),
    /// Second corner placed but the rectangle was too small.
    Discarded,
    /// Click on empty space cleared the selection.
    Deselected,
    /// Nothing happened.
    Ignored,
}

/// Result of the delete action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The selected rectangle was removed.
    RemovedSelected(RectangleId),
    /// No selection: every rectangle was removed.
    ClearedAll(usize),
    /// Nothing to delete.
    Nothing,
}

// ============================================================================
// Pure Operations
// ============================================================================

/// Find the topmost rectangle containing `point` (image pixels).
///
/// Rectangles are tested in reverse order, so the most recently added one
/// wins where rectangles overlap. Edges count as inside.
pub fn hit_test<'a>(
    point: ImagePoint,
    rectangles: &'a [DrawnRectangle],
    image_bounds: &ImageBounds,
) -> Option<&'a DrawnRectangle> {
    if image_bounds.is_empty() {
        return None;
    }
    rectangles
        .iter()
        .rev()
        .find(|rect| normalized_bbox_to_pixels(&rect.xyxyn, image_bounds).contains(point.x, point.y))
}

/// Replace the label of the rectangle with `id`. No-op if absent.
pub fn update_label(
    rectangles: &[DrawnRectangle],
    id: RectangleId,
    label: BoxLabel,
) -> Vec<DrawnRectangle> {
    rectangles
        .iter()
        .map(|rect| {
            if rect.id == id {
                DrawnRectangle {
                    label: label.clone(),
                    ..rect.clone()
                }
            } else {
                rect.clone()
            }
        })
        .collect()
}

/// Remove the rectangle with `id`.
pub fn remove_rectangle(rectangles: &[DrawnRectangle], id: RectangleId) -> Vec<DrawnRectangle> {
    rectangles.iter().filter(|rect| rect.id != id).cloned().collect()
}

/// Minimum normalized width and height for a new rectangle.
///
/// `min_px` is measured on screen, so it shrinks in image terms as the view
/// zooms in.
pub fn min_normalized_size(min_px: f64, image_bounds: &ImageBounds, zoom_level: f64) -> (f64, f64) {
    if image_bounds.is_empty() {
        return (f64::INFINITY, f64::INFINITY);
    }
    let zoom = zoom_level.max(f64::MIN_POSITIVE);
    (
        min_px / (image_bounds.width * zoom),
        min_px / (image_bounds.height * zoom),
    )
}

// ============================================================================
// Drawing Engine
// ============================================================================

/// Interactive rectangle editor for one image.
#[derive(Debug, Clone)]
pub struct DrawingEngine {
    rectangles: RectangleSet,
    drawing: DrawingState,
    selected: Option<RectangleId>,
    draw_mode: bool,
    history: UndoStack,
    config: DrawingConfig,
    revision: u64,
}

impl DrawingEngine {
    pub fn new(config: DrawingConfig, undo: UndoConfig) -> Self {
        Self {
            rectangles: Arc::from(Vec::new()),
            drawing: DrawingState::Idle,
            selected: None,
            draw_mode: false,
            history: UndoStack::with_config(undo),
            config,
            revision: 0,
        }
    }

    pub fn rectangles(&self) -> &[DrawnRectangle] {
        &self.rectangles
    }

    /// Shared handle to the current set, e.g. for a persistence collaborator.
    pub fn rectangle_set(&self) -> RectangleSet {
        Arc::clone(&self.rectangles)
    }

    pub fn get(&self, id: RectangleId) -> Option<&DrawnRectangle> {
        self.rectangles.iter().find(|rect| rect.id == id)
    }

    pub fn drawing_state(&self) -> &DrawingState {
        &self.drawing
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_drawing()
    }

    pub fn selected(&self) -> Option<RectangleId> {
        self.selected
    }

    pub fn selected_rectangle(&self) -> Option<&DrawnRectangle> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn draw_mode(&self) -> bool {
        self.draw_mode
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Incremented on every change to the rectangle set.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &DrawingConfig {
        &self.config
    }

    // ========================================================================
    // Modes and Selection
    // ========================================================================

    /// Switch draw mode, cancelling any in-progress drawing.
    pub fn set_draw_mode(&mut self, enabled: bool) {
        self.cancel_drawing();
        if self.draw_mode != enabled {
            self.draw_mode = enabled;
            log::debug!("✏️ Draw mode {}", if enabled { "on" } else { "off" });
        }
    }

    pub fn toggle_draw_mode(&mut self) -> bool {
        self.set_draw_mode(!self.draw_mode);
        self.draw_mode
    }

    /// Discard the in-progress drawing, if any.
    pub fn cancel_drawing(&mut self) -> bool {
        if self.drawing.is_drawing() {
            self.drawing = DrawingState::Idle;
            log::debug!("Drawing cancelled");
            true
        } else {
            false
        }
    }

    /// Select a rectangle (or nothing). Selecting cancels any drawing.
    pub fn select(&mut self, id: Option<RectangleId>) {
        let id = id.filter(|id| self.get(*id).is_some());
        if id.is_some() {
            self.cancel_drawing();
        }
        self.selected = id;
    }

    // ========================================================================
    // Pointer Handling
    // ========================================================================

    /// Handle a click at `point` (image pixels).
    ///
    /// A hit always selects, whatever the mode. A miss in draw mode places the
    /// first corner, or the second corner which commits the rectangle when it
    /// reaches the minimum size. A miss outside draw mode deselects.
    pub fn click(
        &mut self,
        point: ImagePoint,
        image_bounds: &ImageBounds,
        zoom_level: f64,
        label: &BoxLabel,
        ids: &mut impl IdGenerator,
    ) -> ClickOutcome {
        if image_bounds.is_empty() || !point.is_finite() {
            return ClickOutcome::Ignored;
        }

        if let Some(hit) = hit_test(point, &self.rectangles, image_bounds) {
            let id = hit.id;
            self.cancel_drawing();
            self.selected = Some(id);
            log::debug!("Selected rectangle {}", id);
            return ClickOutcome::Selected(id);
        }

        if !self.draw_mode {
            return if self.selected.take().is_some() {
                ClickOutcome::Deselected
            } else {
                ClickOutcome::Ignored
            };
        }

        match self.drawing {
            DrawingState::Idle => {
                if !image_bounds.contains(point) {
                    return ClickOutcome::Ignored;
                }
                self.selected = None;
                self.drawing = DrawingState::ActivelyDrawing(CurrentDrawing::starting_at(point));
                log::debug!("✏️ Drawing started at {:?}", point);
                ClickOutcome::DrawingStarted
            }
            DrawingState::ActivelyDrawing(mut current) => {
                current.update(point);
                self.drawing = DrawingState::Idle;
                self.finish_drawing(&current, image_bounds, zoom_level, label, ids)
            }
        }
    }

    /// Track the pointer so the drawing preview follows it.
    pub fn pointer_moved(&mut self, point: ImagePoint) -> bool {
        match &mut self.drawing {
            DrawingState::ActivelyDrawing(current) if point.is_finite() => {
                current.update(point);
                log::trace!("Drawing preview to {:?}", point);
                true
            }
            _ => false,
        }
    }

    /// Normalized preview of the in-progress drawing.
    pub fn preview_bbox(&self, image_bounds: &ImageBounds) -> Option<NormalizedBbox> {
        let current = self.drawing.current()?;
        Some(NormalizedBbox::from_corners(
            image_to_normalized(current.start(), image_bounds),
            image_to_normalized(current.current(), image_bounds),
        ))
    }

    fn finish_drawing(
        &mut self,
        current: &CurrentDrawing,
        image_bounds: &ImageBounds,
        zoom_level: f64,
        label: &BoxLabel,
        ids: &mut impl IdGenerator,
    ) -> ClickOutcome {
        let bbox = NormalizedBbox::from_corners(
            image_to_normalized(current.start(), image_bounds),
            image_to_normalized(current.current(), image_bounds),
        );
        let (min_w, min_h) =
            min_normalized_size(self.config.min_drawing_size_px, image_bounds, zoom_level);

        if bbox.width() < min_w || bbox.height() < min_h || !validate_bbox(&bbox) {
            log::debug!(
                "Drawing discarded: {:.4}x{:.4} below minimum {:.4}x{:.4}",
                bbox.width(),
                bbox.height(),
                min_w,
                min_h
            );
            return ClickOutcome::Discarded;
        }

        let id = ids.next_id();
        self.add_rectangles(vec![DrawnRectangle::new(id, bbox, label.clone())]);
        self.selected = Some(id);
        log::debug!("✅ Committed rectangle {} at {:?}", id, bbox.to_array());
        ClickOutcome::Committed(id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    fn commit(&mut self, next: Vec<DrawnRectangle>) {
        self.history.push(Arc::clone(&self.rectangles));
        self.rectangles = Arc::from(next);
        self.revision += 1;
        if let Some(id) = self.selected {
            if self.get(id).is_none() {
                self.selected = None;
            }
        }
    }

    /// Append rectangles as one undoable step. No-op for an empty batch.
    pub fn add_rectangles(&mut self, new: Vec<DrawnRectangle>) -> usize {
        if new.is_empty() {
            return 0;
        }
        let count = new.len();
        let mut next = self.rectangles.to_vec();
        next.extend(new);
        self.commit(next);
        count
    }

    /// Change the label of a rectangle. Returns false if nothing changed.
    pub fn update_label(&mut self, id: RectangleId, label: BoxLabel) -> bool {
        match self.get(id) {
            Some(rect) if rect.label != label => {}
            _ => return false,
        }
        let next = update_label(&self.rectangles, id, label);
        self.commit(next);
        log::debug!("🏷️ Relabeled rectangle {}", id);
        true
    }

    /// Remove a rectangle. Returns false if it does not exist.
    pub fn remove_rectangle(&mut self, id: RectangleId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        let next = remove_rectangle(&self.rectangles, id);
        self.commit(next);
        log::debug!("🗑️ Removed rectangle {}", id);
        true
    }

    /// Remove every rectangle. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.rectangles.len();
        if count > 0 {
            self.commit(Vec::new());
            log::debug!("🗑️ Cleared {} rectangles", count);
        }
        count
    }

    /// Delete the selected rectangle, or all rectangles when none is selected.
    pub fn delete_selected_or_all(&mut self) -> DeleteOutcome {
        self.cancel_drawing();
        let selected = self.selected;
        match selected {
            Some(id) if self.remove_rectangle(id) => DeleteOutcome::RemovedSelected(id),
            _ => match self.clear() {
                0 => DeleteOutcome::Nothing,
                n => DeleteOutcome::ClearedAll(n),
            },
        }
    }

    /// Restore the previous rectangle set.
    ///
    /// Any in-progress drawing is cancelled first since it has no snapshot.
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.cancel_drawing();
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        self.rectangles = snapshot;
        self.revision += 1;
        if let Some(id) = self.selected {
            if self.get(id).is_none() {
                self.selected = None;
            }
        }
        true
    }

    /// Replace the whole set, e.g. when loading saved annotations.
    ///
    /// Starts a fresh history: previous snapshots belong to another image.
    pub fn load(&mut self, rectangles: Vec<DrawnRectangle>) {
        self.rectangles = Arc::from(rectangles);
        self.drawing = DrawingState::Idle;
        self.selected = None;
        self.history.clear();
        self.revision += 1;
    }
}

impl Default for DrawingEngine {
    fn default() -> Self {
        Self::new(DrawingConfig::default(), UndoConfig::default())
    }
}
