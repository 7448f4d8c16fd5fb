//! Annotation completeness and submit validation.
//!
//! Progress is always derived from the current rectangle set; nothing here
//! is cached.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::DrawnRectangle;

/// Completion summary for one image or sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationProgress {
    pub completed: usize,
    pub total: usize,
    /// Rounded completion percentage; 100 when there is nothing to annotate.
    pub percentage: u8,
    pub remaining: usize,
    /// True only when every box is annotated and there is at least one box.
    pub is_complete: bool,
}

/// State of the secondary review that must accompany a submission
/// (whether the annotator checked the sequence for missed smoke).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryReview {
    /// Not answered yet.
    #[default]
    Pending,
    /// Answered; `missed_smoke` records the answer.
    Completed { missed_smoke: bool },
}

impl SecondaryReview {
    pub fn is_completed(&self) -> bool {
        matches!(self, SecondaryReview::Completed { .. })
    }
}

/// A reason a submission is blocked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Some boxes lack a resolved label.
    #[error("{remaining} of {total} boxes still need a complete label")]
    IncompleteBoxes { remaining: usize, total: usize },

    /// The secondary review has not been answered.
    #[error("secondary review is missing: confirm whether any smoke was missed")]
    MissingSecondaryReview,
}

/// Whether a rectangle carries a fully resolved label.
pub fn has_annotation(rectangle: &DrawnRectangle) -> bool {
    rectangle.label.is_resolved()
}

/// Compute completion over `rectangles`.
pub fn progress(rectangles: &[DrawnRectangle]) -> AnnotationProgress {
    let total = rectangles.len();
    let completed = rectangles.iter().filter(|r| has_annotation(r)).count();
    let percentage = if total == 0 {
        100
    } else {
        (100.0 * completed as f64 / total as f64).round() as u8
    };
    AnnotationProgress {
        completed,
        total,
        percentage,
        remaining: total - completed,
        is_complete: total > 0 && completed == total,
    }
}

/// Every reason the current state cannot be submitted.
///
/// Incomplete boxes and a missing secondary review are independent checks;
/// both are reported when both apply.
pub fn validation_errors(
    rectangles: &[DrawnRectangle],
    secondary_review: SecondaryReview,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let summary = progress(rectangles);
    if summary.remaining > 0 {
        errors.push(ValidationError::IncompleteBoxes {
            remaining: summary.remaining,
            total: summary.total,
        });
    }
    if !secondary_review.is_completed() {
        errors.push(ValidationError::MissingSecondaryReview);
    }
    errors
}

/// Human-readable form of [`validation_errors`].
pub fn validation_messages(
    rectangles: &[DrawnRectangle],
    secondary_review: SecondaryReview,
) -> Vec<String> {
    validation_errors(rectangles, secondary_review)
        .iter()
        .map(ToString::to_string)
        .collect()
}
