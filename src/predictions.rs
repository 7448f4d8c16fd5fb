//! Import of machine predictions as rectangles.
//!
//! Duplicates are detected per coordinate: a prediction matches a rectangle
//! when all four normalized coordinates differ by less than the tolerance.
//! This is deliberately not an IoU test.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DUPLICATE_TOLERANCE;
use crate::model::{BoxLabel, DrawnRectangle, IdGenerator, NormalizedBbox};
use crate::transform::validate_bbox;

/// Prediction import configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Per-coordinate distance below which two boxes are the same.
    #[serde(default = "default_duplicate_tolerance")]
    pub duplicate_tolerance: f64,
}

fn default_duplicate_tolerance() -> f64 {
    DEFAULT_DUPLICATE_TOLERANCE
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            duplicate_tolerance: default_duplicate_tolerance(),
        }
    }
}

/// A detection produced by the model, as received from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub xyxyn: NormalizedBbox,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub class_name: String,
}

impl Prediction {
    pub fn new(xyxyn: NormalizedBbox) -> Self {
        Self {
            xyxyn,
            confidence: 0.0,
            class_name: String::new(),
        }
    }
}

/// True when every coordinate of `a` is within `tolerance` of `b`.
pub fn are_similar(a: &NormalizedBbox, b: &NormalizedBbox, tolerance: f64) -> bool {
    a.to_array()
        .iter()
        .zip(b.to_array().iter())
        .all(|(x, y)| (x - y).abs() < tolerance)
}

/// Valid predictions with no similar existing box, in input order.
///
/// Accepted predictions also suppress later near-identical predictions of
/// the same batch.
fn importable<'a>(
    predictions: &'a [Prediction],
    existing: &[DrawnRectangle],
    tolerance: f64,
) -> Vec<&'a Prediction> {
    let mut accepted: Vec<&Prediction> = Vec::new();
    for prediction in predictions {
        if !validate_bbox(&prediction.xyxyn) {
            log::debug!("Dropping invalid prediction {:?}", prediction.xyxyn.to_array());
            continue;
        }
        let duplicate = existing
            .iter()
            .map(|rect| &rect.xyxyn)
            .chain(accepted.iter().map(|p| &p.xyxyn))
            .any(|bbox| are_similar(&prediction.xyxyn, bbox, tolerance));
        if !duplicate {
            accepted.push(prediction);
        }
    }
    accepted
}

/// Turn predictions into new rectangles carrying `label`, skipping those
/// that duplicate an existing rectangle.
pub fn import_predictions(
    predictions: &[Prediction],
    label: &BoxLabel,
    existing: &[DrawnRectangle],
    tolerance: f64,
    ids: &mut impl IdGenerator,
) -> Vec<DrawnRectangle> {
    let created: Vec<DrawnRectangle> = importable(predictions, existing, tolerance)
        .into_iter()
        .map(|prediction| DrawnRectangle::new(ids.next_id(), prediction.xyxyn, label.clone()))
        .collect();
    log::debug!(
        "📥 Importing {} of {} predictions",
        created.len(),
        predictions.len()
    );
    created
}

/// Number of predictions [`import_predictions`] would create.
pub fn count_importable(
    predictions: &[Prediction],
    existing: &[DrawnRectangle],
    tolerance: f64,
) -> usize {
    importable(predictions, existing, tolerance).len()
}
