//! Default values for the annotation engine.
//!
//! These are only defaults: the engine reads every value from
//! [`crate::config::EngineConfig`], which falls back to these.

/// Minimum on-screen size (pixels) a drawn rectangle must reach on each axis.
pub const DEFAULT_MIN_DRAWING_SIZE_PX: f64 = 10.0;

/// Per-coordinate tolerance under which a prediction duplicates a rectangle.
pub const DEFAULT_DUPLICATE_TOLERANCE: f64 = 0.05;

/// Number of rectangle-set snapshots kept for undo.
pub const DEFAULT_UNDO_CAPACITY: usize = 50;

/// Zoom bounds and step.
pub mod zoom {
    /// Minimum zoom level (fit to container).
    pub const MIN: f64 = 1.0;
    /// Maximum zoom level.
    pub const MAX: f64 = 4.0;
    /// Zoom change per wheel notch or keyboard press.
    pub const STEP: f64 = 0.2;
}

/// Neutral transform origin, in percent of the image rect.
pub const CENTER_ORIGIN_PERCENT: f64 = 50.0;

/// Quiescence window before an autosave is due (milliseconds).
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 2_000;

/// Tolerance used when comparing zoom levels against their bounds.
pub const ZOOM_EPSILON: f64 = 1e-9;
