//! Smoke Annotator - bounding-box annotation engine for wildfire smoke detections.
//!
//! Coordinate transforms, zoom and pan, two-click rectangle drawing, prediction
//! import with deduplication, snapshot undo and progress tracking, driven by a
//! host-agnostic [`AnnotationSession`].

pub mod auto_save;
pub mod config;
pub mod constants;
pub mod drawing;
pub mod keybindings;
pub mod model;
pub mod payload;
pub mod predictions;
pub mod progress;
pub mod session;
pub mod transform;
pub mod undo;
pub mod zoom_math;

pub use auto_save::AutoSaveManager;
pub use config::{ConfigError, EngineConfig, LogLevel};
pub use drawing::{ClickOutcome, DeleteOutcome, DrawingEngine};
pub use keybindings::{KeyBindings, KeyChord, KeyCode, ShortcutAction};
pub use payload::{BoxAnnotation, PayloadError, SequenceAnnotation, parse_predictions};
pub use predictions::Prediction;
pub use progress::{AnnotationProgress, SecondaryReview, ValidationError};
pub use session::{AnnotationSession, EditorEvent, SessionResponse, Submission};
pub use transform::Transform;
pub use undo::UndoStack;
pub use zoom_math::ZoomPanController;
