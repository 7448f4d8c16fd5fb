//! Persisted annotation payload and prediction input parsing.
//!
//! The payload is the JSON document a host stores after submit: one entry
//! per box plus the secondary review answer.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    BoxLabel, DrawnRectangle, FalsePositiveType, IdGenerator, NormalizedBbox, SmokeType,
};
use crate::predictions::Prediction;
use crate::progress::SecondaryReview;
use crate::transform::validate_bbox;

/// Errors that can occur while reading or writing payloads.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid coordinate values
    #[error("Invalid coordinates in box {index}: {xyxyn:?}")]
    InvalidCoordinates {
        /// Position of the offending box in the payload
        index: usize,
        /// The rejected coordinates
        xyxyn: [f64; 4],
    },
}

/// One stored box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxAnnotation {
    pub xyxyn: [f64; 4],
    /// `None` while the box has not been reviewed.
    #[serde(default)]
    pub is_smoke: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoke_type: Option<SmokeType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub false_positive_types: Vec<FalsePositiveType>,
}

impl BoxAnnotation {
    pub fn from_rectangle(rectangle: &DrawnRectangle) -> Self {
        let label = &rectangle.label;
        Self {
            xyxyn: rectangle.xyxyn.to_array(),
            is_smoke: match label {
                BoxLabel::Unreviewed => None,
                BoxLabel::Smoke { .. } => Some(true),
                BoxLabel::FalsePositive { .. } => Some(false),
            },
            smoke_type: label.smoke_type(),
            false_positive_types: label.false_positive_types().to_vec(),
        }
    }

    /// The label this entry describes.
    pub fn label(&self) -> BoxLabel {
        match self.is_smoke {
            None => BoxLabel::Unreviewed,
            Some(true) => BoxLabel::Smoke {
                smoke_type: self.smoke_type,
            },
            Some(false) => BoxLabel::false_positive(self.false_positive_types.iter().copied()),
        }
    }
}

/// The stored annotation of one image or sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceAnnotation {
    #[serde(default)]
    pub boxes: Vec<BoxAnnotation>,
    /// Answer of the secondary review; `None` while it is pending.
    #[serde(default)]
    pub has_missed_smoke: Option<bool>,
}

impl SequenceAnnotation {
    pub fn from_rectangles(rectangles: &[DrawnRectangle], review: SecondaryReview) -> Self {
        Self {
            boxes: rectangles.iter().map(BoxAnnotation::from_rectangle).collect(),
            has_missed_smoke: match review {
                SecondaryReview::Pending => None,
                SecondaryReview::Completed { missed_smoke } => Some(missed_smoke),
            },
        }
    }

    pub fn secondary_review(&self) -> SecondaryReview {
        match self.has_missed_smoke {
            None => SecondaryReview::Pending,
            Some(missed_smoke) => SecondaryReview::Completed { missed_smoke },
        }
    }

    /// Rebuild rectangles with fresh ids, in payload order.
    ///
    /// Fails on the first box whose coordinates do not form a valid
    /// normalized box.
    pub fn to_rectangles(
        &self,
        ids: &mut impl IdGenerator,
    ) -> Result<Vec<DrawnRectangle>, PayloadError> {
        self.boxes
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let bbox = NormalizedBbox::from(entry.xyxyn);
                if !validate_bbox(&bbox) {
                    return Err(PayloadError::InvalidCoordinates {
                        index,
                        xyxyn: entry.xyxyn,
                    });
                }
                Ok(DrawnRectangle::new(ids.next_id(), bbox, entry.label()))
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, PayloadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), PayloadError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved {} boxes to {:?}", self.boxes.len(), path);
        Ok(())
    }
}

/// Parse a JSON array of predictions, dropping entries with invalid boxes.
pub fn parse_predictions(json: &str) -> Result<Vec<Prediction>, PayloadError> {
    let raw: Vec<Prediction> = serde_json::from_str(json)?;
    let total = raw.len();
    let valid: Vec<Prediction> = raw
        .into_iter()
        .filter(|p| {
            let ok = validate_bbox(&p.xyxyn);
            if !ok {
                log::debug!("Dropping prediction with invalid box {:?}", p.xyxyn.to_array());
            }
            ok
        })
        .collect();
    log::debug!("Parsed {} of {} predictions", valid.len(), total);
    Ok(valid)
}
