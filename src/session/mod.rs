//! Host-agnostic annotation session.
//!
//! [`AnnotationSession`] ties the viewport, the zoom/pan controller and the
//! drawing engine together behind a single event entry point. A host (web
//! page, desktop shell, test harness) translates its native input into
//! [`EditorEvent`]s and renders from the session's accessors.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::drawing::{ClickOutcome, DeleteOutcome, DrawingEngine};
use crate::keybindings::{KeyChord, ShortcutAction};
use crate::model::{
    BoxLabel, DrawnRectangle, IdGenerator, ImageBounds, ImagePoint, NormalizedBbox, ScreenPoint,
    ScreenRect, SequentialIds, SmokeType,
};
use crate::payload::{PayloadError, SequenceAnnotation};
use crate::predictions::{Prediction, count_importable, import_predictions};
use crate::progress::{AnnotationProgress, SecondaryReview, ValidationError};
use crate::transform::{
    Transform, displayed_image_rect, fit_image_to_container, screen_to_image,
};
use crate::zoom_math::ZoomPanController;

// ============================================================================
// Events and Responses
// ============================================================================

/// Input delivered by the host, processed strictly in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    /// Container position and size, plus the image's natural size.
    Layout {
        container_offset: ScreenPoint,
        container_width: f64,
        container_height: f64,
        natural_width: f64,
        natural_height: f64,
    },
    /// Primary button pressed; starts a pan drag when allowed.
    PointerDown { position: ScreenPoint },
    /// Pointer moved; continues a pan or the drawing preview.
    PointerMove { position: ScreenPoint },
    /// Primary button released.
    PointerUp,
    /// A click at `position`. The first click after a pan drag that moved
    /// is swallowed; a `PointerDown` or `Key` in between resets that.
    Click { position: ScreenPoint },
    /// Wheel over the image; negative delta zooms in.
    Wheel { position: ScreenPoint, delta: f64 },
    Key(KeyChord),
    SetPredictions { predictions: Vec<Prediction> },
    SetSecondaryReview { review: SecondaryReview },
    SetTextInputFocus { focused: bool },
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Accepted(SequenceAnnotation),
    Rejected(Vec<ValidationError>),
}

/// What an event did, so the host knows what to redraw or persist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionResponse {
    /// Anything visible changed.
    pub redraw: bool,
    /// The rectangle set changed; the host may schedule an autosave.
    pub rectangles_changed: bool,
    pub click: Option<ClickOutcome>,
    pub submission: Option<Submission>,
}

impl SessionResponse {
    fn ignored() -> Self {
        Self::default()
    }

    fn redraw_if(changed: bool) -> Self {
        Self {
            redraw: changed,
            ..Self::default()
        }
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// Where the image sits on screen before zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub container_offset: ScreenPoint,
    pub container_width: f64,
    pub container_height: f64,
    pub natural_width: f64,
    pub natural_height: f64,
    /// Object-contain layout derived from the sizes above.
    pub image_bounds: ImageBounds,
}

impl Viewport {
    fn new(
        container_offset: ScreenPoint,
        container_width: f64,
        container_height: f64,
        natural_width: f64,
        natural_height: f64,
    ) -> Self {
        Self {
            container_offset,
            container_width,
            container_height,
            natural_width,
            natural_height,
            image_bounds: fit_image_to_container(
                natural_width,
                natural_height,
                container_width,
                container_height,
            ),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Editing state for one image (or one sequence frame set).
#[derive(Debug)]
pub struct AnnotationSession<G: IdGenerator = SequentialIds> {
    config: EngineConfig,
    viewport: Viewport,
    zoom: ZoomPanController,
    drawing: DrawingEngine,
    ids: G,
    active_label: BoxLabel,
    predictions: Vec<Prediction>,
    secondary_review: SecondaryReview,
    text_input_focused: bool,
    help_open: bool,
    /// Set when a pan drag actually moved; swallows the click that ends it.
    pan_moved: bool,
}

impl AnnotationSession<SequentialIds> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_id_generator(config, SequentialIds::new())
    }
}

impl Default for AnnotationSession<SequentialIds> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<G: IdGenerator> AnnotationSession<G> {
    pub fn with_id_generator(config: EngineConfig, ids: G) -> Self {
        Self {
            zoom: ZoomPanController::new(config.zoom),
            drawing: DrawingEngine::new(config.drawing, config.undo),
            viewport: Viewport::default(),
            ids,
            active_label: BoxLabel::Unreviewed,
            predictions: Vec::new(),
            secondary_review: SecondaryReview::Pending,
            text_input_focused: false,
            help_open: false,
            pan_moved: false,
            config,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn image_bounds(&self) -> &ImageBounds {
        &self.viewport.image_bounds
    }

    pub fn transform(&self) -> &Transform {
        self.zoom.transform()
    }

    pub fn zoom(&self) -> &ZoomPanController {
        &self.zoom
    }

    pub fn drawing(&self) -> &DrawingEngine {
        &self.drawing
    }

    pub fn rectangles(&self) -> &[DrawnRectangle] {
        self.drawing.rectangles()
    }

    pub fn active_label(&self) -> &BoxLabel {
        &self.active_label
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn secondary_review(&self) -> SecondaryReview {
        self.secondary_review
    }

    pub fn is_help_open(&self) -> bool {
        self.help_open
    }

    pub fn is_text_input_focused(&self) -> bool {
        self.text_input_focused
    }

    /// Increments on every rectangle-set change.
    pub fn revision(&self) -> u64 {
        self.drawing.revision()
    }

    pub fn progress(&self) -> AnnotationProgress {
        crate::progress::progress(self.drawing.rectangles())
    }

    /// How many pending predictions an import would add.
    pub fn importable_count(&self) -> usize {
        count_importable(
            &self.predictions,
            self.drawing.rectangles(),
            self.config.predictions.duplicate_tolerance,
        )
    }

    /// Normalized box of the drawing in progress, for the preview overlay.
    pub fn drawing_preview(&self) -> Option<NormalizedBbox> {
        self.drawing.preview_bbox(&self.viewport.image_bounds)
    }

    /// On-screen rectangle covered by the image.
    pub fn displayed_image_rect(&self) -> ScreenRect {
        displayed_image_rect(
            self.viewport.container_offset,
            &self.viewport.image_bounds,
            self.zoom.transform(),
        )
    }

    /// Convert a screen position into image pixels under the current view.
    pub fn screen_to_image(&self, position: ScreenPoint) -> ImagePoint {
        screen_to_image(
            position,
            self.viewport.container_offset,
            &self.viewport.image_bounds,
            self.zoom.transform(),
        )
    }

    // ========================================================================
    // Event Dispatch
    // ========================================================================

    /// Process one host event.
    pub fn apply(&mut self, event: EditorEvent) -> SessionResponse {
        match event {
            EditorEvent::Layout {
                container_offset,
                container_width,
                container_height,
                natural_width,
                natural_height,
            } => self.set_layout(Viewport::new(
                container_offset,
                container_width,
                container_height,
                natural_width,
                natural_height,
            )),
            EditorEvent::PointerDown { position } => self.pointer_down(position),
            EditorEvent::PointerMove { position } => self.pointer_move(position),
            EditorEvent::PointerUp => self.pointer_up(),
            EditorEvent::Click { position } => self.click(position),
            EditorEvent::Wheel { position, delta } => self.wheel(position, delta),
            EditorEvent::Key(chord) => self.key(chord),
            EditorEvent::SetPredictions { predictions } => {
                self.set_predictions(predictions);
                SessionResponse::redraw_if(true)
            }
            EditorEvent::SetSecondaryReview { review } => {
                let changed = self.secondary_review != review;
                self.secondary_review = review;
                SessionResponse::redraw_if(changed)
            }
            EditorEvent::SetTextInputFocus { focused } => {
                self.text_input_focused = focused;
                SessionResponse::ignored()
            }
        }
    }

    fn set_layout(&mut self, viewport: Viewport) -> SessionResponse {
        let new_image = viewport.natural_width != self.viewport.natural_width
            || viewport.natural_height != self.viewport.natural_height;
        let changed = viewport != self.viewport;
        self.viewport = viewport;
        if new_image {
            // A different image size invalidates zoom and any drawing in progress
            self.zoom.reset();
            self.drawing.cancel_drawing();
        } else {
            // Same image in a resized container: keep the zoom, shrink the pan range
            self.zoom.reconstrain(&viewport.image_bounds);
        }
        log::debug!(
            "Layout: image {}x{} fitted to {:.1}x{:.1} at ({:.1}, {:.1})",
            viewport.natural_width,
            viewport.natural_height,
            viewport.image_bounds.width,
            viewport.image_bounds.height,
            viewport.image_bounds.x,
            viewport.image_bounds.y
        );
        SessionResponse::redraw_if(changed)
    }

    fn pointer_down(&mut self, position: ScreenPoint) -> SessionResponse {
        self.pan_moved = false;
        self.zoom.begin_pan(position, self.drawing.draw_mode());
        SessionResponse::ignored()
    }

    fn pointer_move(&mut self, position: ScreenPoint) -> SessionResponse {
        if self.zoom.is_panning() {
            let moved = self.zoom.pan_to(position, &self.viewport.image_bounds);
            self.pan_moved |= moved;
            return SessionResponse::redraw_if(moved);
        }
        if self.drawing.is_drawing() {
            let point = self.screen_to_image(position);
            return SessionResponse::redraw_if(self.drawing.pointer_moved(point));
        }
        SessionResponse::ignored()
    }

    fn pointer_up(&mut self) -> SessionResponse {
        self.zoom.end_pan();
        SessionResponse::ignored()
    }

    fn click(&mut self, position: ScreenPoint) -> SessionResponse {
        if std::mem::take(&mut self.pan_moved) {
            log::trace!("Click swallowed after pan drag");
            return SessionResponse::ignored();
        }
        let point = self.screen_to_image(position);
        let revision = self.revision();
        let outcome = self.drawing.click(
            point,
            &self.viewport.image_bounds,
            self.zoom.zoom_level(),
            &self.active_label,
            &mut self.ids,
        );
        SessionResponse {
            redraw: outcome != ClickOutcome::Ignored,
            rectangles_changed: self.revision() != revision,
            click: Some(outcome),
            submission: None,
        }
    }

    fn wheel(&mut self, position: ScreenPoint, delta: f64) -> SessionResponse {
        let rect = self.displayed_image_rect();
        SessionResponse::redraw_if(self.zoom.on_wheel(position, &rect, delta))
    }

    fn key(&mut self, chord: KeyChord) -> SessionResponse {
        self.pan_moved = false;
        let Some(action) = self.config.keybindings.action_for(chord) else {
            return SessionResponse::ignored();
        };
        if (self.text_input_focused || self.help_open) && action != ShortcutAction::Escape {
            log::trace!("Shortcut {:?} suppressed", action);
            return SessionResponse::ignored();
        }
        self.perform(action)
    }

    /// Run a keyboard action directly, bypassing key lookup and suppression.
    pub fn perform(&mut self, action: ShortcutAction) -> SessionResponse {
        let revision = self.revision();
        let mut response = match action {
            ShortcutAction::ToggleDrawMode => {
                self.toggle_draw_mode();
                SessionResponse::redraw_if(true)
            }
            ShortcutAction::DeleteSelectedOrAll => {
                let outcome = self.delete_selected_or_all();
                SessionResponse::redraw_if(outcome != DeleteOutcome::Nothing)
            }
            ShortcutAction::Undo => SessionResponse::redraw_if(self.undo()),
            ShortcutAction::Submit => SessionResponse {
                submission: Some(self.submit()),
                ..SessionResponse::default()
            },
            ShortcutAction::ImportPredictions => {
                SessionResponse::redraw_if(self.import_predictions() > 0)
            }
            ShortcutAction::SelectLabel(n) => SessionResponse::redraw_if(self.select_label(n)),
            ShortcutAction::ResetZoom => {
                let changed = !self.zoom.is_at_min_zoom();
                self.reset_zoom();
                SessionResponse::redraw_if(changed)
            }
            ShortcutAction::ZoomIn => SessionResponse::redraw_if(self.zoom_in()),
            ShortcutAction::ZoomOut => SessionResponse::redraw_if(self.zoom_out()),
            ShortcutAction::ToggleHelp => {
                self.help_open = !self.help_open;
                SessionResponse::redraw_if(true)
            }
            ShortcutAction::Escape => SessionResponse::redraw_if(self.escape()),
        };
        response.rectangles_changed = self.revision() != revision;
        response
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Flip draw mode. Cancels any drawing and any pan drag.
    pub fn toggle_draw_mode(&mut self) -> bool {
        self.zoom.cancel_pan();
        self.drawing.toggle_draw_mode()
    }

    pub fn delete_selected_or_all(&mut self) -> DeleteOutcome {
        self.drawing.delete_selected_or_all()
    }

    pub fn undo(&mut self) -> bool {
        self.drawing.undo()
    }

    /// Validate and, when everything is labeled, produce the payload.
    pub fn submit(&self) -> Submission {
        let errors = crate::progress::validation_errors(
            self.drawing.rectangles(),
            self.secondary_review,
        );
        if errors.is_empty() {
            log::info!("Submitting {} boxes", self.drawing.rectangles().len());
            Submission::Accepted(self.to_payload())
        } else {
            log::debug!("Submit blocked by {} validation errors", errors.len());
            Submission::Rejected(errors)
        }
    }

    pub fn set_predictions(&mut self, predictions: Vec<Prediction>) {
        log::debug!("Received {} predictions", predictions.len());
        self.predictions = predictions;
    }

    /// Add pending predictions that do not duplicate existing rectangles,
    /// as one undoable step. Returns how many were added.
    pub fn import_predictions(&mut self) -> usize {
        let created = import_predictions(
            &self.predictions,
            &self.active_label,
            self.drawing.rectangles(),
            self.config.predictions.duplicate_tolerance,
            &mut self.ids,
        );
        self.drawing.add_rectangles(created)
    }

    /// Make smoke type `n` (1-based) the active label, and apply it to the
    /// selected rectangle if there is one.
    pub fn select_label(&mut self, n: usize) -> bool {
        let Some(smoke_type) = SmokeType::from_hotkey_index(n) else {
            return false;
        };
        self.set_active_label(BoxLabel::smoke(smoke_type))
    }

    /// Set the label for new rectangles; relabels the selection too.
    pub fn set_active_label(&mut self, label: BoxLabel) -> bool {
        let mut changed = self.active_label != label;
        self.active_label = label.clone();
        if let Some(id) = self.drawing.selected() {
            changed |= self.drawing.update_label(id, label);
        }
        changed
    }

    pub fn reset_zoom(&mut self) {
        self.zoom.reset();
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom.zoom_in(&self.viewport.image_bounds)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom.zoom_out(&self.viewport.image_bounds)
    }

    /// Close the help overlay, else cancel the drawing, else deselect.
    pub fn escape(&mut self) -> bool {
        if self.help_open {
            self.help_open = false;
            return true;
        }
        if self.drawing.cancel_drawing() {
            return true;
        }
        if self.drawing.selected().is_some() {
            self.drawing.select(None);
            return true;
        }
        false
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn to_payload(&self) -> SequenceAnnotation {
        SequenceAnnotation::from_rectangles(self.drawing.rectangles(), self.secondary_review)
    }

    /// Replace the session's annotations with a stored payload.
    ///
    /// History is reset. On error nothing changes.
    pub fn load_payload(&mut self, payload: &SequenceAnnotation) -> Result<usize, PayloadError> {
        let rectangles = payload.to_rectangles(&mut self.ids)?;
        let count = rectangles.len();
        self.drawing.load(rectangles);
        self.secondary_review = payload.secondary_review();
        log::debug!("Loaded {} boxes from payload", count);
        Ok(count)
    }
}
